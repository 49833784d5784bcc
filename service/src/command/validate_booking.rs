//! [`Command`] for validating a [`Booking`] by an administrator.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, Validation},
        user, Booking,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for validating a confirmed [`Booking`] by an administrator.
///
/// Records the validator and the moment; the [`Booking`] status is left
/// untouched.
#[derive(Clone, Copy, Debug)]
pub struct ValidateBooking {
    /// ID of the [`Booking`] to validate.
    pub booking_id: booking::Id,

    /// ID of the validating [`User`].
    ///
    /// [`User`]: crate::domain::User
    pub validator_id: user::Id,
}

impl<Db> Command<ValidateBooking> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Booking, booking::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ValidateBooking,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ValidateBooking {
            booking_id,
            validator_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent validations of the same `Booking`.
        tx.execute(Lock(By::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        if booking.status != booking::Status::Confirmed {
            return Err(tracerr::new!(E::NotConfirmed(booking.status)));
        }
        if booking.validation.is_some() {
            return Err(tracerr::new!(E::AlreadyValidated(booking_id)));
        }

        booking.validation = Some(Validation {
            at: DateTime::now().coerce(),
            by: validator_id,
        });

        tx.execute(Update(booking.clone()))
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

/// Error of [`ValidateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] is already validated.
    #[display("`Booking(id: {_0})` is already validated")]
    AlreadyValidated(#[error(not(source))] booking::Id),

    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Only a confirmed [`Booking`] can be validated.
    #[display("`Booking` in `{_0}` status cannot be validated")]
    NotConfirmed(#[error(not(source))] booking::Status),
}
