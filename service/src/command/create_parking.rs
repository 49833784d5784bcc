//! [`Command`] for creating a new [`Parking`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::parking::{
    City, Country, Description, Name, Street, ZipCode,
};
use crate::{
    domain::{parking, user, Parking},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Parking`].
#[derive(Clone, Debug)]
pub struct CreateParking {
    /// ID of the [`User`] owning the new [`Parking`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,

    /// [`Name`] of a new [`Parking`].
    pub name: parking::Name,

    /// [`Description`] of a new [`Parking`].
    pub description: Option<parking::Description>,

    /// [`Street`] of a new [`Parking`].
    pub street: parking::Street,

    /// [`City`] of a new [`Parking`].
    pub city: parking::City,

    /// [`ZipCode`] of a new [`Parking`].
    pub zip_code: Option<parking::ZipCode>,

    /// [`Country`] of a new [`Parking`].
    pub country: parking::Country,

    /// Total number of spots of a new [`Parking`].
    pub total_spots: parking::TotalSpots,

    /// Hourly rate of a new [`Parking`].
    pub hourly_rate: Money,

    /// Daily rate of a new [`Parking`], if offered.
    pub daily_rate: Option<Money>,

    /// Monthly rate of a new [`Parking`], if offered.
    pub monthly_rate: Option<Money>,
}

impl<Db> Command<CreateParking> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Parking>, parking::Hash>>,
            Ok = Option<Parking>,
            Err = Traced<database::Error>,
        > + Database<Insert<Parking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
        Lock<By<Parking, parking::Hash>>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Parking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateParking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateParking {
            owner_id,
            name,
            description,
            street,
            city,
            zip_code,
            country,
            total_spots,
            hourly_rate,
            daily_rate,
            monthly_rate,
        } = cmd;

        if hourly_rate.is_negative()
            || daily_rate.is_some_and(|r| r.is_negative())
            || monthly_rate.is_some_and(|r| r.is_negative())
        {
            return Err(tracerr::new!(E::NegativeRate));
        }

        let hash = parking::Hash::new(
            &name,
            &street,
            &city,
            zip_code.as_ref(),
            &country,
        );

        let parking = Parking {
            id: parking::Id::new(),
            hash,
            name,
            description,
            street,
            city,
            zip_code,
            country,
            total_spots,
            available_spots: parking::AvailableSpots::all_of(total_spots),
            rates: parking::Rates {
                hourly: hourly_rate,
                daily: daily_rate,
                monthly: monthly_rate,
            },
            is_active: true,
            owner_id,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent creation of the same `Parking`.
        tx.execute(Lock(By::new(hash)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let existing = tx
            .execute(Select(By::new(hash)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(parking) = existing {
            // `Parking` with the same properties already exists.
            return Ok(parking);
        }

        tx.execute(Insert(parking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(parking)
    }
}

/// Error of [`CreateParking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// A provided rate is negative.
    #[display("`Parking` rates cannot be negative")]
    NegativeRate,
}
