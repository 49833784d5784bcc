//! [`Booking`] definitions.

pub mod payment;
pub mod pricing;
pub mod qr;
pub mod rating;

use std::time;

use common::{define_kind, money::Currency, unit, DateTimeOf, Percent};
#[cfg(doc)]
use common::{DateTime, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use uuid::Uuid;

use crate::domain::{parking, user, vehicle};
#[cfg(doc)]
use crate::domain::{Parking, User, Vehicle};

pub use self::{
    payment::Payment,
    pricing::{BillableHours, Quote},
    qr::Qr,
    rating::Rating,
};

/// Reservation of a single [`Parking`] spot for a time interval.
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: Id,

    /// ID of the [`User`] who made this [`Booking`].
    pub user_id: user::Id,

    /// ID of the [`Parking`] lot this [`Booking`] reserves a spot of.
    pub parking_id: parking::Id,

    /// ID of the [`Vehicle`] this [`Booking`] was made for, if any.
    ///
    /// [`None`] for immediate walk-in reservations.
    pub vehicle_id: Option<vehicle::Id>,

    /// [`Kind`] of this [`Booking`].
    pub kind: Kind,

    /// [`DateTime`] when the reserved interval starts.
    pub starts_at: StartDateTime,

    /// [`DateTime`] when the reserved interval ends.
    ///
    /// Always strictly after [`starts_at`].
    ///
    /// [`starts_at`]: Booking::starts_at
    pub ends_at: EndDateTime,

    /// Derived [`Duration`] of this [`Booking`].
    ///
    /// Recomputed whenever the effective interval changes.
    pub duration: Duration,

    /// Pricing [`Quote`] snapshot of this [`Booking`].
    ///
    /// Computed over the requested interval at creation, and over the actual
    /// usage at check-out.
    pub pricing: Quote,

    /// Current [`Status`] of this [`Booking`].
    pub status: Status,

    /// [`Qr`] material of this [`Booking`].
    ///
    /// Immutable once issued.
    pub qr: Qr,

    /// [`DateTime`] when this [`Booking`] was checked in, if it was.
    pub checked_in_at: Option<CheckInDateTime>,

    /// [`DateTime`] when this [`Booking`] was checked out, if it was.
    pub checked_out_at: Option<CheckOutDateTime>,

    /// Administrator validation mark of this [`Booking`], if validated.
    pub validation: Option<Validation>,

    /// [`Payment`] sub-record of this [`Booking`].
    pub payment: Payment,

    /// [`Cancellation`] of this [`Booking`], if it was cancelled.
    pub cancellation: Option<Cancellation>,

    /// [`Rating`] left for this [`Booking`].
    ///
    /// Mutable only after completion.
    pub rating: Rating,

    /// [`DateTime`] when this [`Booking`] was created.
    pub created_at: CreationDateTime,
}

impl Booking {
    /// Indicates whether this [`Booking`] still occupies (or may come to
    /// occupy) a spot.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Indicates whether this [`Booking`] may be resolved by its QR token at
    /// the provided moment.
    ///
    /// Expiry is evaluated lazily here, tokens are never actively swept.
    #[must_use]
    pub fn is_scannable(&self, now: common::DateTime) -> bool {
        matches!(self.status, Status::Confirmed | Status::Active)
            && now < self.qr.expires_at.coerce()
    }

    /// Returns an estimated [`Quote`] of this [`Booking`] while it's still in
    /// progress.
    ///
    /// The estimate bills the elapsed time padded conservatively for the
    /// absence of a check-out. [`None`] is returned for any non-`active`
    /// [`Booking`].
    #[must_use]
    pub fn estimated_quote(
        &self,
        tax: Percent,
        now: common::DateTime,
    ) -> Option<Quote> {
        if self.status != Status::Active || self.checked_out_at.is_some() {
            return None;
        }
        let checked_in_at = self.checked_in_at?;
        let hours = BillableHours::elapsed(
            checked_in_at.coerce(),
            now,
            true,
        );
        Some(Quote::calculate(self.pricing.rate, hours, tax))
    }
}

/// ID of a [`Booking`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Kind of a [`Booking`]."]
    enum Kind {
        #[doc = "[`Booking`] billed by the hour."]
        Hourly = 1,

        #[doc = "[`Booking`] billed by the day."]
        Daily = 2,

        #[doc = "[`Booking`] billed by the month."]
        Monthly = 3,
    }
}

define_kind! {
    #[doc = "Status of a [`Booking`]."]
    enum Status {
        #[doc = "[`Booking`] is created and awaits confirmation."]
        Pending = 1,

        #[doc = "[`Booking`] is confirmed and awaits check-in."]
        Confirmed = 2,

        #[doc = "[`Booking`] is checked in and occupies a spot."]
        Active = 3,

        #[doc = "[`Booking`] is checked out."]
        Completed = 4,

        #[doc = "[`Booking`] is cancelled before check-in."]
        Cancelled = 5,

        #[doc = "[`Booking`] was confirmed, but never checked in."]
        NoShow = 6,
    }
}

impl Status {
    /// Indicates whether a [`Booking`] in this [`Status`] still occupies (or
    /// may come to occupy) a spot.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Active)
    }
}

/// Derived duration of a [`Booking`], in every billing granularity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Duration {
    /// Number of started hours.
    pub hours: u32,

    /// Number of started days.
    pub days: u32,

    /// Number of started months (of 30 days).
    pub months: u32,
}

impl Duration {
    /// Seconds in an hour.
    const HOUR: u64 = 60 * 60;

    /// Seconds in a day.
    const DAY: u64 = 24 * Self::HOUR;

    /// Seconds in a month of 30 days.
    const MONTH: u64 = 30 * Self::DAY;

    /// Derives a [`Duration`] out of the provided time span.
    ///
    /// Every granularity rounds up: any started hour/day/month counts as a
    /// whole one.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn of(span: time::Duration) -> Self {
        let ceil = |unit: u64| {
            u32::try_from(span.as_secs().div_ceil(unit))
                .expect("`Duration` overflow")
        };
        Self {
            hours: ceil(Self::HOUR),
            days: ceil(Self::DAY),
            months: ceil(Self::MONTH),
        }
    }

    /// Replaces the hours of this [`Duration`] with the provided
    /// [`BillableHours`], keeping the coarser granularities derived.
    #[must_use]
    pub fn with_billable_hours(self, hours: BillableHours) -> Self {
        Self {
            hours: hours.get(),
            ..self
        }
    }
}

define_kind! {
    #[doc = "Reason of a [`Booking`] cancellation."]
    enum CancellationReason {
        #[doc = "[`User`] cancelled the [`Booking`] themselves."]
        UserCancelled = 1,

        #[doc = "[`User`] never showed up."]
        NoShow = 2,

        #[doc = "System cancelled the [`Booking`]."]
        SystemCancelled = 3,

        #[doc = "[`Parking`] became unavailable."]
        ParkingUnavailable = 4,
    }
}

/// Cancellation mark of a [`Booking`].
#[derive(Clone, Copy, Debug)]
pub struct Cancellation {
    /// [`DateTime`] when the [`Booking`] was cancelled.
    pub at: CancellationDateTime,

    /// [`CancellationReason`] of the cancellation.
    pub reason: CancellationReason,
}

/// Administrator validation mark of a [`Booking`].
#[derive(Clone, Copy, Debug)]
pub struct Validation {
    /// [`DateTime`] when the [`Booking`] was validated.
    pub at: ValidationDateTime,

    /// ID of the [`User`] who validated the [`Booking`].
    pub by: user::Id,
}

/// Policy applied to [`Booking`] operations.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Policy {
    /// [`Currency`] all [`Quote`]s are made in.
    #[default(Currency::Tnd)]
    pub currency: Currency,

    /// Tax rate applied on top of every [`Quote`] subtotal.
    #[default(_code = "\"19\".parse().expect(\"valid percent\")")]
    pub tax: Percent,

    /// Validity window of a QR token, counted from the [`Booking`] start.
    #[default(time::Duration::from_secs(15 * 60))]
    pub qr_validity: time::Duration,

    /// Minimum lead before the [`Booking`] start for a cancellation to be
    /// accepted.
    #[default(time::Duration::from_secs(2 * 60 * 60))]
    pub cancellation_lead: time::Duration,

    /// How early before the [`Booking`] start a check-in is accepted.
    #[default(time::Duration::from_secs(15 * 60))]
    pub check_in_window: time::Duration,
}

/// Marker type indicating a [`Booking`] interval start.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type indicating a [`Booking`] interval end.
#[derive(Clone, Copy, Debug)]
pub struct End;

/// Marker type indicating a [`Booking`] check-in.
#[derive(Clone, Copy, Debug)]
pub struct CheckIn;

/// Marker type indicating a [`Booking`] check-out.
#[derive(Clone, Copy, Debug)]
pub struct CheckOut;

/// Marker type indicating a [`Booking`] validation.
#[derive(Clone, Copy, Debug)]
pub struct Validated;

/// [`DateTime`] when a [`Booking`] interval starts.
pub type StartDateTime = DateTimeOf<(Booking, Start)>;

/// [`DateTime`] when a [`Booking`] interval ends.
pub type EndDateTime = DateTimeOf<(Booking, End)>;

/// [`DateTime`] when a [`Booking`] was checked in.
pub type CheckInDateTime = DateTimeOf<(Booking, CheckIn)>;

/// [`DateTime`] when a [`Booking`] was checked out.
pub type CheckOutDateTime = DateTimeOf<(Booking, CheckOut)>;

/// [`DateTime`] when a [`Booking`] was created.
pub type CreationDateTime = DateTimeOf<(Booking, unit::Creation)>;

/// [`DateTime`] when a [`Booking`] was cancelled.
pub type CancellationDateTime = DateTimeOf<(Booking, unit::Deletion)>;

/// [`DateTime`] when a [`Booking`] was validated by an administrator.
pub type ValidationDateTime = DateTimeOf<(Booking, Validated)>;

#[cfg(test)]
mod spec {
    use std::time;

    use common::{DateTime, Money, Percent};

    use crate::domain::{parking, user};

    use super::{
        BillableHours, Booking, Duration, Id, Kind, Payment, Qr, Quote,
        Rating, Status,
    };

    fn booking(status: Status, starts_in: time::Duration) -> Booking {
        let now = DateTime::now();
        let starts_at: super::StartDateTime = (now + starts_in).coerce();
        let ends_at: super::EndDateTime =
            (starts_at + time::Duration::from_secs(2 * 60 * 60)).coerce();
        let hours =
            BillableHours::between(starts_at.coerce(), ends_at.coerce());
        let rate = Money {
            amount: "2.5".parse().unwrap(),
            currency: common::money::Currency::Tnd,
        };
        let tax: Percent = "19".parse().unwrap();
        Booking {
            id: Id::new(),
            user_id: user::Id::new(),
            parking_id: parking::Id::new(),
            vehicle_id: None,
            kind: Kind::Hourly,
            starts_at,
            ends_at,
            duration: Duration::of(time::Duration::from_secs(2 * 60 * 60)),
            pricing: Quote::calculate(rate, hours, tax),
            status,
            qr: Qr::issue(starts_at, time::Duration::from_secs(15 * 60)),
            checked_in_at: None,
            checked_out_at: None,
            validation: None,
            payment: Payment::default(),
            cancellation: None,
            rating: Rating::default(),
            created_at: now.coerce(),
        }
    }

    #[test]
    fn scannable_only_while_unexpired_and_in_scannable_status() {
        let now = DateTime::now();

        // Starts in an hour: the token expires in 1h15m.
        let confirmed =
            booking(Status::Confirmed, time::Duration::from_secs(60 * 60));
        assert!(confirmed.is_scannable(now));

        let active =
            booking(Status::Active, time::Duration::from_secs(60 * 60));
        assert!(active.is_scannable(now));

        for status in [
            Status::Pending,
            Status::Completed,
            Status::Cancelled,
            Status::NoShow,
        ] {
            assert!(
                !booking(status, time::Duration::from_secs(60 * 60))
                    .is_scannable(now),
                "`{status}` must not be scannable",
            );
        }

        // An expired token hides even a confirmed booking.
        let stale = booking(Status::Confirmed, time::Duration::ZERO);
        let past_expiry = now + time::Duration::from_secs(16 * 60);
        assert!(!stale.is_scannable(past_expiry));
    }

    #[test]
    fn estimate_covers_active_bookings_only() {
        let now = DateTime::now();
        let tax: Percent = "19".parse().unwrap();

        let mut active =
            booking(Status::Active, time::Duration::from_secs(60));
        active.checked_in_at = Some(now.coerce());

        // 1 elapsed hour padded with 2 in-progress ones: 3h × 2.5 × 1.19.
        let estimate = active
            .estimated_quote(tax, now + time::Duration::from_secs(60 * 60))
            .unwrap();
        assert_eq!(estimate.total.amount, "8.93".parse().unwrap());

        let confirmed =
            booking(Status::Confirmed, time::Duration::from_secs(60));
        assert!(confirmed.estimated_quote(tax, now).is_none());
    }

    #[test]
    fn duration_rounds_every_granularity_up() {
        let d = Duration::of(time::Duration::from_secs(30 * 60));
        assert_eq!(d.hours, 1);
        assert_eq!(d.days, 1);
        assert_eq!(d.months, 1);

        let d = Duration::of(time::Duration::from_secs(61 * 60));
        assert_eq!(d.hours, 2);
        assert_eq!(d.days, 1);

        let d = Duration::of(time::Duration::from_secs(25 * 60 * 60));
        assert_eq!(d.hours, 25);
        assert_eq!(d.days, 2);
        assert_eq!(d.months, 1);

        let d = Duration::of(time::Duration::from_secs(31 * 24 * 60 * 60));
        assert_eq!(d.days, 31);
        assert_eq!(d.months, 2);
    }
}
