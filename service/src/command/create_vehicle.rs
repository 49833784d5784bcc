//! [`Command`] for creating a new [`Vehicle`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::vehicle::{Color, Make, Model, Year};
use crate::{
    domain::{user, vehicle, Vehicle},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Vehicle`].
#[derive(Clone, Debug)]
pub struct CreateVehicle {
    /// ID of the [`User`] owning the new [`Vehicle`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,

    /// [`LicensePlate`] of a new [`Vehicle`].
    ///
    /// [`LicensePlate`]: vehicle::LicensePlate
    pub license_plate: vehicle::LicensePlate,

    /// [`Make`] of a new [`Vehicle`].
    pub make: vehicle::Make,

    /// [`Model`] of a new [`Vehicle`].
    pub model: vehicle::Model,

    /// [`Year`] a new [`Vehicle`] was produced in.
    pub year: vehicle::Year,

    /// [`Color`] of a new [`Vehicle`].
    pub color: vehicle::Color,

    /// [`vehicle::Kind`] of a new [`Vehicle`].
    pub kind: vehicle::Kind,
}

impl<Db> Command<CreateVehicle> for Service<Db>
where
    Db: for<'p> Database<
            Select<
                By<Option<Vehicle>, (user::Id, &'p vehicle::LicensePlate)>,
            >,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Vehicle>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Vehicle;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateVehicle) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateVehicle {
            owner_id,
            license_plate,
            make,
            model,
            year,
            color,
            kind,
        } = cmd;

        let existing = self
            .database()
            .execute(Select(By::new((owner_id, &license_plate))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::PlateOccupied(license_plate)));
        }

        let vehicle = Vehicle {
            id: vehicle::Id::new(),
            owner_id,
            license_plate,
            make,
            model,
            year,
            color,
            kind,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(vehicle.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(vehicle)
    }
}

/// Error of [`CreateVehicle`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Another [`Vehicle`] of the same owner already carries the provided
    /// [`LicensePlate`].
    ///
    /// [`LicensePlate`]: vehicle::LicensePlate
    #[display("`Vehicle` with `{_0}` plate is already registered")]
    PlateOccupied(#[error(not(source))] vehicle::LicensePlate),
}
