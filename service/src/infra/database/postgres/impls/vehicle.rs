//! [`Vehicle`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{user, vehicle, Vehicle},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// List of `vehicles` table columns, matching [`vehicle_from_row()`].
const COLUMNS: &str = "\
    id, owner_id, license_plate, \
    make, model, year, color, kind, \
    created_at, deleted_at";

/// Reconstructs a [`Vehicle`] out of the provided [`Row`] of [`COLUMNS`].
fn vehicle_from_row(row: &Row) -> Vehicle {
    Vehicle {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        license_plate: row.get("license_plate"),
        make: row.get("make"),
        model: row.get("model"),
        year: vehicle::Year::new(
            u16::try_from(row.get::<_, i32>("year")).expect("`Year` overflow"),
        )
        .expect("valid `Year`"),
        color: row.get("color"),
        kind: row.get("kind"),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C> Database<Select<By<Option<Vehicle>, vehicle::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vehicle>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: vehicle::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM vehicles \
             WHERE id = $1::UUID \
                   AND deleted_at IS NULL \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| vehicle_from_row(&row)))
    }
}

impl<'p, C>
    Database<Select<By<Option<Vehicle>, (user::Id, &'p vehicle::LicensePlate)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<Vehicle>, (user::Id, &'p vehicle::LicensePlate)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (owner_id, license_plate) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM vehicles \
             WHERE owner_id = $1::UUID \
                   AND license_plate = $2::VARCHAR \
                   AND deleted_at IS NULL \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&owner_id, &license_plate])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| vehicle_from_row(&row)))
    }
}

impl<C> Database<Select<By<Vec<Vehicle>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Vehicle>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let owner_id: user::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM vehicles \
             WHERE owner_id = $1::UUID \
                   AND deleted_at IS NULL \
             ORDER BY created_at DESC, id ASC",
        );
        Ok(self
            .query(&sql, &[&owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| vehicle_from_row(&row))
            .collect())
    }
}

impl<C> Database<Insert<Vehicle>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Vehicle>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(vehicle): Insert<Vehicle>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(vehicle))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Vehicle>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(vehicle): Update<Vehicle>,
    ) -> Result<Self::Ok, Self::Err> {
        let Vehicle {
            id,
            owner_id,
            license_plate,
            make,
            model,
            year,
            color,
            kind,
            created_at,
            deleted_at,
        } = vehicle;

        let year = i32::from(year.get());

        const SQL: &str = "\
            INSERT INTO vehicles (\
                id, owner_id, license_plate, \
                make, model, year, color, kind, \
                created_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, \
                $4::VARCHAR, $5::VARCHAR, $6::INT4, $7::VARCHAR, $8::INT2, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET license_plate = EXCLUDED.license_plate, \
                make = EXCLUDED.make, \
                model = EXCLUDED.model, \
                year = EXCLUDED.year, \
                color = EXCLUDED.color, \
                kind = EXCLUDED.kind, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &owner_id,
                &license_plate,
                &make,
                &model,
                &year,
                &color,
                &kind,
                &created_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
