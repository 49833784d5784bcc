//! [`Command`] for deleting a [`Vehicle`].

use common::{
    operations::{By, Commit, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user, vehicle, Vehicle},
    infra::{database, Database},
    read,
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Vehicle`].
///
/// Rejected while any live [`Booking`] still references the [`Vehicle`]:
/// the booking record keeps only a weak reference, so the deletion is
/// guarded here instead of cascading.
///
/// [`Booking`]: crate::domain::Booking
#[derive(Clone, Copy, Debug)]
pub struct DeleteVehicle {
    /// ID of the [`Vehicle`] to delete.
    pub vehicle_id: vehicle::Id,

    /// ID of the [`User`] requesting the deletion.
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,
}

impl<Db> Command<DeleteVehicle> for Service<Db>
where
    Db: Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::booking::LiveCount, vehicle::Id>>,
            Ok = read::booking::LiveCount,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Update<Vehicle>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteVehicle) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteVehicle {
            vehicle_id,
            owner_id,
        } = cmd;

        let mut vehicle = self
            .database()
            .execute(Select(By::<Option<Vehicle>, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|v| v.owner_id == owner_id)
            .ok_or(E::VehicleNotExists(vehicle_id))
            .map_err(tracerr::wrap!())?;

        let read::booking::LiveCount(live) = self
            .database()
            .execute(Select(By::<read::booking::LiveCount, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if live > 0 {
            return Err(tracerr::new!(E::HasLiveBookings(vehicle_id)));
        }

        vehicle.deleted_at = Some(DateTime::now().coerce());

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Update(vehicle))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(())
    }
}

/// Error of [`DeleteVehicle`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Vehicle`] is still referenced by a live [`Booking`].
    ///
    /// [`Booking`]: crate::domain::Booking
    #[display("`Vehicle(id: {_0})` still has live bookings")]
    HasLiveBookings(#[error(not(source))] vehicle::Id),

    /// [`Vehicle`] with the provided ID does not exist or is not owned by
    /// the requesting [`User`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`Vehicle(id: {_0})` does not exist")]
    VehicleNotExists(#[error(not(source))] vehicle::Id),
}
