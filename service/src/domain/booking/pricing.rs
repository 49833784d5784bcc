//! Pricing calculation of a [`Booking`].

use common::{DateTime, Money, Percent};
use rust_decimal::Decimal;

#[cfg(doc)]
use super::Booking;

/// Number of whole hours a [`Booking`] is billed for.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct BillableHours(u32);

impl BillableHours {
    /// Minimum billed amount, regardless of the actual elapsed time.
    pub const MINIMUM: Self = Self(1);

    /// Hours added on top of the elapsed time when estimating a stay that
    /// hasn't been checked out yet.
    const IN_PROGRESS_PADDING: u32 = 2;

    /// Bills the `[start, end)` interval: any started hour counts as a whole
    /// one, and at least [`MINIMUM`] is always billed.
    ///
    /// [`MINIMUM`]: BillableHours::MINIMUM
    #[must_use]
    pub fn between(start: DateTime, end: DateTime) -> Self {
        if end <= start {
            return Self::MINIMUM;
        }
        Self(Self::ceil_hours(end - start)).max(Self::MINIMUM)
    }

    /// Bills the time elapsed from `from` until `to`.
    ///
    /// A stay that is still in progress (`still_parked`) is padded with 2
    /// extra hours before the [`MINIMUM`] floor applies, estimating it
    /// conservatively in the absence of a check-out.
    ///
    /// [`MINIMUM`]: BillableHours::MINIMUM
    #[must_use]
    pub fn elapsed(from: DateTime, to: DateTime, still_parked: bool) -> Self {
        let mut hours = if to <= from {
            0
        } else {
            Self::ceil_hours(to - from)
        };
        if still_parked {
            hours += Self::IN_PROGRESS_PADDING;
        }
        Self(hours).max(Self::MINIMUM)
    }

    /// Returns the number of billed hours.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Rounds the provided time span up to whole hours.
    fn ceil_hours(span: std::time::Duration) -> u32 {
        u32::try_from(span.as_secs().div_ceil(60 * 60))
            .unwrap_or(u32::MAX)
    }
}

/// Pricing quote of a [`Booking`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Quote {
    /// Hourly rate the quote was calculated with.
    pub rate: Money,

    /// Price of the billed hours before taxes.
    pub subtotal: Money,

    /// Tax part of the quote.
    pub tax: Money,

    /// Total price, taxes included.
    pub total: Money,
}

impl Quote {
    /// Calculates a new [`Quote`] for the provided [`BillableHours`].
    ///
    /// Every amount is rounded to whole cents, with halves rounding up.
    #[must_use]
    pub fn calculate(
        rate: Money,
        hours: BillableHours,
        tax_rate: Percent,
    ) -> Self {
        let subtotal = rate.amount * Decimal::from(hours.get());
        let tax = tax_rate.of(subtotal);
        let total = subtotal + tax;

        let money = |amount: Decimal| {
            Money {
                amount,
                currency: rate.currency,
            }
            .rounded_to_cents()
        };
        Self {
            rate,
            subtotal: money(subtotal),
            tax: money(tax),
            total: money(total),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{money::Currency, DateTime, Money, Percent};
    use rust_decimal::Decimal;

    use super::{BillableHours, Quote};

    fn at(rfc3339: &str) -> DateTime {
        DateTime::from_rfc3339(rfc3339).unwrap()
    }

    fn tnd(amount: &str) -> Money {
        Money {
            amount: amount.parse().unwrap(),
            currency: Currency::Tnd,
        }
    }

    fn vat() -> Percent {
        "19".parse().unwrap()
    }

    #[test]
    fn partial_hours_round_up() {
        let start = at("2025-06-01T10:00:00Z");

        assert_eq!(
            BillableHours::between(start, start + Duration::from_secs(30 * 60))
                .get(),
            1,
        );
        assert_eq!(
            BillableHours::between(start, start + Duration::from_secs(61 * 60))
                .get(),
            2,
        );
        assert_eq!(
            BillableHours::between(
                start,
                start + Duration::from_secs(2 * 60 * 60),
            )
            .get(),
            2,
        );
    }

    #[test]
    fn at_least_one_hour_is_billed() {
        let start = at("2025-06-01T10:00:00Z");

        assert_eq!(BillableHours::between(start, start).get(), 1);
        assert_eq!(
            BillableHours::between(start, start - Duration::from_secs(60))
                .get(),
            1,
        );
        assert_eq!(BillableHours::elapsed(start, start, false).get(), 1);
    }

    #[test]
    fn in_progress_stay_is_padded_before_the_floor() {
        let from = at("2025-06-01T10:00:00Z");
        let to = from + Duration::from_secs(10 * 60);

        assert_eq!(BillableHours::elapsed(from, to, false).get(), 1);
        assert_eq!(BillableHours::elapsed(from, to, true).get(), 3);
        assert_eq!(BillableHours::elapsed(from, from, true).get(), 2);
    }

    #[test]
    fn quote_applies_tax_and_rounds_half_up() {
        let q = Quote::calculate(
            tnd("2.5"),
            BillableHours::between(
                at("2025-06-01T10:00:00Z"),
                at("2025-06-01T13:00:00Z"),
            ),
            vat(),
        );
        assert_eq!(q.subtotal, tnd("7.50"));
        assert_eq!(q.tax, tnd("1.43")); // 1.425 rounds up on the cent
        assert_eq!(q.total, tnd("8.93")); // 8.925 rounds up on the cent

        let q = Quote::calculate(tnd("0"), BillableHours::MINIMUM, vat());
        assert_eq!(q.subtotal, tnd("0.00"));
        assert_eq!(q.total, tnd("0.00"));
    }

    #[test]
    fn total_matches_taxed_subtotal() {
        for (rate, hours) in
            [("1", 1_u32), ("2.5", 3), ("0.333", 7), ("10", 24)]
        {
            let rate = tnd(rate);
            let hours = BillableHours::elapsed(
                at("2025-06-01T10:00:00Z"),
                at("2025-06-01T10:00:00Z")
                    + Duration::from_secs(u64::from(hours) * 60 * 60),
                false,
            );

            let q = Quote::calculate(rate, hours, vat());
            let expected = Money {
                amount: rate.amount
                    * Decimal::from(hours.get())
                    * "1.19".parse::<Decimal>().unwrap(),
                currency: rate.currency,
            }
            .rounded_to_cents();

            assert_eq!(q.total, expected);
            assert!(q.total.amount >= q.subtotal.amount);
        }
    }
}
