//! [`Command`] for creating a new [`Booking`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, qr, BillableHours, Duration, Qr, Quote},
        parking, user, vehicle, Booking, Parking, Vehicle,
    },
    infra::{database, Database},
    read,
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Booking`].
#[derive(Clone, Copy, Debug)]
pub struct CreateBooking {
    /// ID of the [`User`] making the [`Booking`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,

    /// ID of the [`Parking`] to reserve a spot of.
    pub parking_id: parking::Id,

    /// ID of the [`Vehicle`] the [`Booking`] is made for, if any.
    pub vehicle_id: Option<vehicle::Id>,

    /// [`booking::Kind`] of the new [`Booking`].
    pub kind: booking::Kind,

    /// [`DateTime`] when the reserved interval starts.
    pub starts_at: booking::StartDateTime,

    /// [`DateTime`] when the reserved interval ends.
    pub ends_at: booking::EndDateTime,
}

impl CreateBooking {
    /// Number of attempts to generate a unique QR token before giving up.
    const MAX_QR_GENERATION_ATTEMPTS: u8 = 3;
}

impl<Db> Command<CreateBooking> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Parking, parking::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Parking>, parking::Id>>,
            Ok = Option<Parking>,
            Err = Traced<database::Error>,
        > + Database<
            Select<
                By<read::booking::Conflicting, read::booking::ConflictScan>,
            >,
            Ok = read::booking::Conflicting,
            Err = Traced<database::Error>,
        > + for<'t> Database<
            Select<By<Option<Booking>, &'t qr::Token>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Insert<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateBooking {
            user_id,
            parking_id,
            vehicle_id,
            kind,
            starts_at,
            ends_at,
        } = cmd;

        let now = DateTime::now();
        if starts_at.coerce() <= now {
            return Err(tracerr::new!(E::StartNotInFuture));
        }
        if ends_at.coerce::<()>() <= starts_at.coerce() {
            return Err(tracerr::new!(E::EndNotAfterStart));
        }

        if let Some(vehicle_id) = vehicle_id {
            let vehicle = self
                .database()
                .execute(Select(By::<Option<Vehicle>, _>::new(vehicle_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .filter(|v| v.owner_id == user_id)
                .ok_or(E::VehicleNotExists(vehicle_id))
                .map_err(tracerr::wrap!())?;
            drop(vehicle);
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes concurrent reservations of the same `Parking`, so the
        // conflict scan below observes every committed `Booking`.
        tx.execute(Lock(By::new(parking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let parking = tx
            .execute(Select(By::<Option<Parking>, _>::new(parking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ParkingNotExists(parking_id))
            .map_err(tracerr::wrap!())?;
        if !parking.has_free_spot() {
            return Err(tracerr::new!(E::ParkingUnavailable(parking_id)));
        }

        let read::booking::Conflicting(occupied) = tx
            .execute(Select(By::<read::booking::Conflicting, _>::new(
                read::booking::ConflictScan {
                    parking_id,
                    starts_at,
                    ends_at,
                },
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied {
            return Err(tracerr::new!(E::TimeSlotOccupied(parking_id)));
        }

        let mut qr = Qr::issue(starts_at, self.config.booking.qr_validity);
        let mut attempts = 1;
        loop {
            let collision = tx
                .execute(Select(By::<Option<Booking>, _>::new(&qr.token)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if collision.is_none() {
                break;
            }
            if attempts >= CreateBooking::MAX_QR_GENERATION_ATTEMPTS {
                return Err(tracerr::new!(E::QrTokenCollision));
            }
            attempts += 1;
            qr = qr.regenerated();
        }

        let hours = BillableHours::between(starts_at.coerce(), ends_at.coerce());
        let booking = Booking {
            id: booking::Id::new(),
            user_id,
            parking_id,
            vehicle_id,
            kind,
            starts_at,
            ends_at,
            duration: Duration::of(ends_at.coerce::<()>() - starts_at.coerce())
                .with_billable_hours(hours),
            pricing: Quote::calculate(
                parking.rates.hourly,
                hours,
                self.config.booking.tax,
            ),
            status: booking::Status::Pending,
            qr,
            checked_in_at: None,
            checked_out_at: None,
            validation: None,
            payment: booking::Payment::default(),
            cancellation: None,
            rating: booking::Rating::default(),
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(booking.clone()))
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

/// Error of [`CreateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Requested interval doesn't end after its start.
    #[display("`Booking` must end after its start")]
    EndNotAfterStart,

    /// [`Parking`] with the provided ID does not exist.
    #[display("`Parking(id: {_0})` does not exist")]
    ParkingNotExists(#[error(not(source))] parking::Id),

    /// [`Parking`] is inactive or has no free spots.
    #[display("`Parking(id: {_0})` has no free spots")]
    ParkingUnavailable(#[error(not(source))] parking::Id),

    /// Failed to generate a unique QR token.
    #[display("Cannot generate a unique QR token")]
    QrTokenCollision,

    /// Requested interval starts in the past.
    #[display("`Booking` must start in the future")]
    StartNotInFuture,

    /// Requested interval conflicts with an existing [`Booking`].
    #[display("`Parking(id: {_0})` is already booked for this time period")]
    TimeSlotOccupied(#[error(not(source))] parking::Id),

    /// [`Vehicle`] with the provided ID does not exist or is not owned by
    /// the requesting [`User`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`Vehicle(id: {_0})` does not exist")]
    VehicleNotExists(#[error(not(source))] vehicle::Id),
}
