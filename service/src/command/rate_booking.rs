//! [`Command`] for rating a completed [`Booking`].

use common::operations::{By, Commit, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, Rating},
        user, Booking,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for rating a completed [`Booking`].
///
/// The provided [`Rating`] is merged into the existing record dimension by
/// dimension, never overwriting it wholesale.
#[derive(Clone, Debug)]
pub struct RateBooking {
    /// ID of the [`Booking`] to rate.
    pub booking_id: booking::Id,

    /// ID of the [`User`] leaving the [`Rating`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,

    /// [`Rating`] to merge in.
    pub rating: Rating,
}

impl<Db> Command<RateBooking> for Service<Db>
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

    async fn execute(&self, cmd: RateBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RateBooking {
            booking_id,
            user_id,
            rating,
        } = cmd;

        if rating.is_empty() {
            return Err(tracerr::new!(E::EmptyRating));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent rating merges of the same `Booking`.
        tx.execute(Lock(By::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|b| b.user_id == user_id)
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        if booking.status != booking::Status::Completed {
            return Err(tracerr::new!(E::NotCompleted(booking.status)));
        }

        booking.rating.merge(rating);

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

/// Error of [`RateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist or belongs to another
    /// [`User`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Provided [`Rating`] has no dimension filled.
    #[display("`Rating` must fill at least one dimension")]
    EmptyRating,

    /// Only a completed [`Booking`] can be rated.
    #[display("`Booking` in `{_0}` status cannot be rated")]
    NotCompleted(#[error(not(source))] booking::Status),
}
