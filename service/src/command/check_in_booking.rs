//! [`Command`] for checking a [`Booking`] in.

use common::{
    operations::{
        By, Commit, Lock, Perform, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, qr},
        parking, Booking,
    },
    infra::{database, Database},
    read::booking::Scannable,
    Service,
};

use super::Command;

/// [`Command`] for checking a [`Booking`] in by its scanned QR token.
#[derive(Clone, Debug)]
pub struct CheckInBooking {
    /// Scanned QR [`qr::Token`].
    pub token: qr::Token,
}

impl<Db> Command<CheckInBooking> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + for<'t> Database<
            Select<By<Option<Scannable<Booking>>, &'t qr::Token>>,
            Ok = Option<Scannable<Booking>>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Booking, booking::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Err = Traced<database::Error>>
        + Database<
            Perform<parking::AdjustAvailability>,
            Ok = parking::AvailableSpots,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CheckInBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CheckInBooking { token } = cmd;

        let Scannable(booking) = self
            .database()
            .execute(Select(By::<Option<Scannable<Booking>>, _>::new(&token)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::QrNotValid)
            .map_err(tracerr::wrap!())?;

        if booking.status != booking::Status::Confirmed {
            return Err(tracerr::new!(E::NotAwaitingCheckIn(booking.status)));
        }

        let now = DateTime::now();
        let window = self.config.booking.check_in_window;
        if now + window < booking.starts_at.coerce() {
            return Err(tracerr::new!(E::TooEarly));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent transitions of the same `Booking`.
        tx.execute(Lock(By::new(booking.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::QrNotValid)
            .map_err(tracerr::wrap!())?;
        if booking.status != booking::Status::Confirmed {
            return Err(tracerr::new!(E::NotAwaitingCheckIn(booking.status)));
        }

        booking.checked_in_at = Some(DateTime::now().coerce());
        booking.status = booking::Status::Active;

        tx.execute(Update(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Perform(parking::AdjustAvailability {
            id: booking.parking_id,
            delta: -1,
        }))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(booking)
    }
}

/// Error of [`CheckInBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Booking`] is not in a status admitting a check-in.
    #[display("`Booking` in `{_0}` status is not ready for check-in")]
    NotAwaitingCheckIn(#[error(not(source))] booking::Status),

    /// No [`Booking`] matches the scanned token, or its token expired.
    #[display("Invalid or expired QR token")]
    QrNotValid,

    /// Check-in attempted before the allowed time window.
    #[display("Check-in is not available yet")]
    TooEarly,
}
