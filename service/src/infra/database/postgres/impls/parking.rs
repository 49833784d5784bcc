//! [`Parking`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Lock, Perform, Select, Update},
    Money,
};
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{parking, Parking},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

/// List of `parkings` table columns, matching [`parking_from_row()`].
const COLUMNS: &str = "\
    id, hash, name, description, \
    street, city, zip_code, country, \
    total_spots, available_spots, \
    hourly_rate, daily_rate, monthly_rate, currency, \
    is_active, owner_id, \
    created_at, deleted_at";

/// Reconstructs a [`Parking`] out of the provided [`Row`] of [`COLUMNS`].
fn parking_from_row(row: &Row) -> Parking {
    let currency = row.get("currency");
    let spots = |column: &str| {
        u16::try_from(row.get::<_, i32>(column)).expect("spots overflow")
    };
    let total_spots =
        parking::TotalSpots::new(spots("total_spots")).expect("at least 1");

    Parking {
        id: row.get("id"),
        hash: row.get("hash"),
        name: row.get("name"),
        description: row.get("description"),
        street: row.get("street"),
        city: row.get("city"),
        zip_code: row.get("zip_code"),
        country: row.get("country"),
        total_spots,
        available_spots: parking::AvailableSpots::new(
            spots("available_spots"),
            total_spots,
        )
        .expect("within capacity"),
        rates: parking::Rates {
            hourly: Money {
                amount: row.get("hourly_rate"),
                currency,
            },
            daily: row
                .get::<_, Option<_>>("daily_rate")
                .map(|amount| Money { amount, currency }),
            monthly: row
                .get::<_, Option<_>>("monthly_rate")
                .map(|amount| Money { amount, currency }),
        },
        is_active: row.get("is_active"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<parking::Id, Parking>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[parking::Id]>,
{
    type Ok = HashMap<parking::Id, Parking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<parking::Id, Parking>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[parking::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM parkings \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
                   AND deleted_at IS NULL \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let parking = parking_from_row(&row);
                (parking.id, parking)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Parking>, parking::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<parking::Id, Parking>, [parking::Id; 1]>>,
        Ok = HashMap<parking::Id, Parking>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Parking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Parking>, parking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Option<Parking>, parking::Hash>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Parking>, parking::Id>>,
        Ok = Option<Parking>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Parking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Parking>, parking::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let hash: parking::Hash = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM parkings \
            WHERE hash = $1::UUID \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&hash])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        self.execute(Select(By::new(row.get::<_, parking::Id>("id"))))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Parking>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Parking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(parking): Insert<Parking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(parking))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Parking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(parking): Update<Parking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Parking {
            id,
            hash,
            name,
            description,
            street,
            city,
            zip_code,
            country,
            total_spots,
            available_spots,
            rates,
            is_active,
            owner_id,
            created_at,
            deleted_at,
        } = parking;

        let total_spots = i32::from(total_spots.get());
        let available_spots = i32::from(available_spots.get());
        let currency = rates.hourly.currency;
        let daily_rate = rates.daily.map(|m| m.amount);
        let monthly_rate = rates.monthly.map(|m| m.amount);

        // `available_spots` is deliberately NOT updated here: the counter is
        // mutated only through `Perform<AdjustAvailability>`.
        const SQL: &str = "\
            INSERT INTO parkings (\
                id, hash, name, description, \
                street, city, zip_code, country, \
                total_spots, available_spots, \
                hourly_rate, daily_rate, monthly_rate, currency, \
                is_active, owner_id, \
                created_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::VARCHAR, \
                $5::VARCHAR, $6::VARCHAR, $7::VARCHAR, $8::VARCHAR, \
                $9::INT4, $10::INT4, \
                $11::NUMERIC, $12::NUMERIC, $13::NUMERIC, $14::INT2, \
                $15::BOOL, $16::UUID, \
                $17::TIMESTAMPTZ, $18::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                description = EXCLUDED.description, \
                street = EXCLUDED.street, \
                city = EXCLUDED.city, \
                zip_code = EXCLUDED.zip_code, \
                country = EXCLUDED.country, \
                total_spots = EXCLUDED.total_spots, \
                hourly_rate = EXCLUDED.hourly_rate, \
                daily_rate = EXCLUDED.daily_rate, \
                monthly_rate = EXCLUDED.monthly_rate, \
                currency = EXCLUDED.currency, \
                is_active = EXCLUDED.is_active, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &hash,
                &name,
                &description,
                &street,
                &city,
                &zip_code,
                &country,
                &total_spots,
                &available_spots,
                &rates.hourly.amount,
                &daily_rate,
                &monthly_rate,
                &currency,
                &is_active,
                &owner_id,
                &created_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Perform<parking::AdjustAvailability>> for Postgres<C>
where
    C: Connection,
{
    type Ok = parking::AvailableSpots;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Perform(adjust): Perform<parking::AdjustAvailability>,
    ) -> Result<Self::Ok, Self::Err> {
        let parking::AdjustAvailability { id, delta } = adjust;

        // Single atomic conditional update: the counter never leaves
        // `[0, total_spots]`, whatever the delta is.
        const SQL: &str = "\
            UPDATE parkings \
            SET available_spots = LEAST(\
                GREATEST(available_spots + $2::INT4, 0), \
                total_spots\
            ) \
            WHERE id = $1::UUID \
            RETURNING available_spots, total_spots";
        let row = self
            .query_opt(SQL, &[&id, &delta])
            .await
            .map_err(tracerr::wrap!())?;

        Ok(row
            .map(|row| {
                let total = parking::TotalSpots::new(
                    u16::try_from(row.get::<_, i32>("total_spots"))
                        .expect("spots overflow"),
                )
                .expect("at least 1");
                parking::AvailableSpots::new(
                    u16::try_from(row.get::<_, i32>("available_spots"))
                        .expect("spots overflow"),
                    total,
                )
                .expect("within capacity")
            })
            .unwrap_or_default())
    }
}

impl<C> Database<Lock<By<Parking, parking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Parking, parking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: parking::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO parkings_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Parking, parking::Hash>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Parking, parking::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let hash: parking::Hash = by.into_inner();

        const SQL: &str = "\
            INSERT INTO parkings_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.query(SQL, &[&hash])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::parking::list::Page, read::parking::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::parking::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::parking::list::Page, read::parking::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::parking::list::Selector {
            arguments,
            filter:
                read::parking::list::Filter {
                    city,
                    name,
                    only_active,
                },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap();
        let offset = i64::try_from(arguments.offset()).unwrap();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let city_idx = city.as_ref().map(|c| {
            ps.push(c);
            ps.len()
        });
        let name_pattern = name.as_ref().map(|n| FuzzPattern::new(n.as_ref()));
        let name_pattern_idx = name_pattern.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let filtering = format!(
            "{active}{city}{name}",
            active = if only_active {
                "AND is_active "
            } else {
                ""
            },
            city = city_idx
                .map(|idx| format!("AND city = ${idx}::VARCHAR "))
                .unwrap_or_default(),
            name = name_pattern_idx
                .map(|idx| {
                    format!(
                        "AND LOWER(name) SIMILAR TO LOWER(${idx}::VARCHAR) ",
                    )
                })
                .unwrap_or_default(),
        );

        let sql = format!(
            "SELECT COUNT(*)::INT8 AS total \
             FROM parkings \
             WHERE deleted_at IS NULL \
                   {filtering}",
        );
        let total = self
            .query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| row.get::<_, i64>("total"))
            .unwrap_or_default();
        let total = usize::try_from(total).unwrap_or_default();

        ps.push(&limit);
        let limit_idx = ps.len();
        ps.push(&offset);
        let offset_idx = ps.len();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM parkings \
             WHERE deleted_at IS NULL \
                   {filtering} \
             ORDER BY created_at DESC, id ASC \
             LIMIT ${limit_idx}::INT4 \
             OFFSET ${offset_idx}::INT8",
        );
        let items = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| parking_from_row(&row))
            .collect::<Vec<_>>();

        Ok(read::parking::list::Page::new(arguments, items, total))
    }
}
