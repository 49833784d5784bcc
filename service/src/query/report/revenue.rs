//! [`Revenue`] definition.

use std::ops::Range;

use common::{
    operations::{By, Select},
    DateTime, Money,
};
use rust_decimal::Decimal;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{Booking, Parking};
use crate::{
    domain::booking,
    infra::{database, Database},
    read,
    Query, Service,
};

/// [`Query`] to roll up revenue over completed [`Booking`]s for a given
/// period.
///
/// The period is matched against check-out times, half-open.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Revenue {
    /// Start of the period.
    pub start: DateTime,

    /// End of the period.
    pub end: DateTime,
}

/// Output of the [`Revenue`] [`Query`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Total revenue over the period.
    pub total: Money,

    /// Number of completed [`Booking`]s in the period.
    pub bookings: i64,

    /// Average revenue per completed [`Booking`].
    pub average: Money,

    /// Rollup per [`Parking`], highest revenue first.
    pub by_parking: Vec<read::report::ParkingRevenue>,
}

impl<Db> Query<Revenue> for Service<Db>
where
    Db: Database<
        Select<
            By<
                Vec<read::report::ParkingRevenue>,
                Range<booking::CheckOutDateTime>,
            >,
        >,
        Ok = Vec<read::report::ParkingRevenue>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Revenue { start, end }: Revenue,
    ) -> Result<Self::Ok, Self::Err> {
        let by_parking = self
            .database()
            .execute(Select(By::<Vec<read::report::ParkingRevenue>, _>::new(
                start.coerce()..end.coerce(),
            )))
            .await
            .map_err(tracerr::wrap!())?;

        let currency = self.config().booking.currency;
        let bookings = by_parking.iter().map(|r| r.bookings).sum::<i64>();
        let total = by_parking
            .iter()
            .map(|r| r.total.amount)
            .sum::<Decimal>();
        let average = if bookings > 0 {
            total / Decimal::from(bookings)
        } else {
            Decimal::ZERO
        };

        Ok(Output {
            total: Money {
                amount: total,
                currency,
            },
            bookings,
            average: Money {
                amount: average,
                currency,
            }
            .rounded_to_cents(),
            by_parking,
        })
    }
}
