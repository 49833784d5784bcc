//! [`Booking`]-related [`Database`] implementations.

use std::{collections::HashMap, ops::Range};

use common::{
    operations::{By, Insert, Lock, Select, Update},
    DateTime, Money,
};
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, qr, rating},
        vehicle, Booking,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{
        self,
        booking::{Conflicting, ConflictScan, LiveCount, Scannable},
    },
};

/// Statuses of a [`Booking`] whose QR token may still be scanned.
const SCANNABLE_STATUSES: [booking::Status; 2] =
    [booking::Status::Confirmed, booking::Status::Active];

/// Statuses of a [`Booking`] that still occupies (or may come to occupy) a
/// spot.
const LIVE_STATUSES: [booking::Status; 3] = [
    booking::Status::Pending,
    booking::Status::Confirmed,
    booking::Status::Active,
];

/// List of `bookings` table columns, matching [`booking_from_row()`].
const COLUMNS: &str = "\
    id, user_id, parking_id, vehicle_id, kind, \
    starts_at, ends_at, \
    duration_hours, duration_days, duration_months, \
    rate, currency, subtotal, tax, total, \
    status, \
    qr_token, qr_issued_at, qr_expires_at, \
    checked_in_at, checked_out_at, \
    validated_at, validated_by, \
    payment_status, payment_method, payment_transaction_id, \
    payment_paid_at, payment_amount, \
    cancelled_at, cancellation_reason, \
    rating_parking, rating_service, rating_overall, feedback, \
    created_at";

/// Reconstructs a [`Booking`] out of the provided [`Row`] of [`COLUMNS`].
fn booking_from_row(row: &Row) -> Booking {
    let currency = row.get("currency");
    let money = |column: &str| Money {
        amount: row.get(column),
        currency,
    };
    let score = |column: &str| {
        row.get::<_, Option<i16>>(column).map(|v| {
            rating::Score::new(
                u8::try_from(v).expect("`Score` overflow"),
            )
            .expect("valid `Score`")
        })
    };
    let duration = |column: &str| {
        u32::try_from(row.get::<_, i32>(column)).expect("`Duration` overflow")
    };

    Booking {
        id: row.get("id"),
        user_id: row.get("user_id"),
        parking_id: row.get("parking_id"),
        vehicle_id: row.get("vehicle_id"),
        kind: row.get("kind"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        duration: booking::Duration {
            hours: duration("duration_hours"),
            days: duration("duration_days"),
            months: duration("duration_months"),
        },
        pricing: booking::Quote {
            rate: money("rate"),
            subtotal: money("subtotal"),
            tax: money("tax"),
            total: money("total"),
        },
        status: row.get("status"),
        qr: qr::Qr {
            token: row.get("qr_token"),
            issued_at: row.get("qr_issued_at"),
            expires_at: row.get("qr_expires_at"),
        },
        checked_in_at: row.get("checked_in_at"),
        checked_out_at: row.get("checked_out_at"),
        validation: row
            .get::<_, Option<booking::ValidationDateTime>>("validated_at")
            .map(|at| booking::Validation {
                at,
                by: row.get("validated_by"),
            }),
        payment: booking::Payment {
            status: row.get("payment_status"),
            method: row.get("payment_method"),
            transaction_id: row.get("payment_transaction_id"),
            paid_at: row.get("payment_paid_at"),
            amount: row
                .get::<_, Option<_>>("payment_amount")
                .map(|amount| Money { amount, currency }),
        },
        cancellation: row
            .get::<_, Option<booking::CancellationDateTime>>("cancelled_at")
            .map(|at| booking::Cancellation {
                at,
                reason: row.get("cancellation_reason"),
            }),
        rating: booking::Rating {
            parking: score("rating_parking"),
            service: score("rating_service"),
            overall: score("rating_overall"),
            feedback: row.get("feedback"),
        },
        created_at: row.get("created_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<booking::Id, Booking>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[booking::Id]>,
{
    type Ok = HashMap<booking::Id, Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<booking::Id, Booking>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[booking::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(&sql, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let booking = booking_from_row(&row);
                (booking.id, booking)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Booking>, booking::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<booking::Id, Booking>, [booking::Id; 1]>>,
        Ok = HashMap<booking::Id, Booking>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<'t, C> Database<Select<By<Option<Booking>, &'t qr::Token>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Booking>, booking::Id>>,
        Ok = Option<Booking>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, &'t qr::Token>>,
    ) -> Result<Self::Ok, Self::Err> {
        let token = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM bookings \
            WHERE qr_token = $1::VARCHAR \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&token])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        self.execute(Select(By::new(row.get::<_, booking::Id>("id"))))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<'t, C> Database<Select<By<Option<Scannable<Booking>>, &'t qr::Token>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Booking>, booking::Id>>,
        Ok = Option<Booking>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Scannable<Booking>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Scannable<Booking>>, &'t qr::Token>>,
    ) -> Result<Self::Ok, Self::Err> {
        let token = by.into_inner();
        let now = DateTime::now();
        let statuses: &[booking::Status] = &SCANNABLE_STATUSES;

        // Expiry is evaluated lazily right here, tokens are never swept.
        const SQL: &str = "\
            SELECT id \
            FROM bookings \
            WHERE qr_token = $1::VARCHAR \
              AND qr_expires_at > $2::TIMESTAMPTZ \
              AND status IN (SELECT unnest($3::INT2[])) \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&token, &now, &statuses])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        Ok(self
            .execute(Select(By::new(row.get::<_, booking::Id>("id"))))
            .await
            .map_err(tracerr::wrap!())?
            .map(Scannable))
    }
}

impl<C> Database<Select<By<Conflicting, ConflictScan>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Conflicting;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Conflicting, ConflictScan>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ConflictScan {
            parking_id,
            starts_at,
            ends_at,
        } = by.into_inner();
        let statuses: &[booking::Status] = &SCANNABLE_STATUSES;

        // Half-open intervals: touching boundaries don't conflict.
        const SQL: &str = "\
            SELECT id \
            FROM bookings \
            WHERE parking_id = $1::UUID \
              AND status IN (SELECT unnest($2::INT2[])) \
              AND starts_at < $4::TIMESTAMPTZ \
              AND ends_at > $3::TIMESTAMPTZ \
            LIMIT 1";
        Ok(Conflicting(
            self.query_opt(
                SQL,
                &[&parking_id, &statuses, &starts_at, &ends_at],
            )
            .await
            .map_err(tracerr::wrap!())?
            .is_some(),
        ))
    }
}

impl<C> Database<Select<By<LiveCount, vehicle::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = LiveCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<LiveCount, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let vehicle_id: vehicle::Id = by.into_inner();
        let statuses: &[booking::Status] = &LIVE_STATUSES;

        const SQL: &str = "\
            SELECT COUNT(*)::INT8 AS count \
            FROM bookings \
            WHERE vehicle_id = $1::UUID \
              AND status IN (SELECT unnest($2::INT2[]))";
        let row = self
            .query_opt(SQL, &[&vehicle_id, &statuses])
            .await
            .map_err(tracerr::wrap!())?;

        Ok(LiveCount(
            row.map(|r| r.get::<_, i64>("count")).unwrap_or_default(),
        ))
    }
}

impl<C> Database<Insert<Booking>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(booking))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            user_id,
            parking_id,
            vehicle_id,
            kind,
            starts_at,
            ends_at,
            duration,
            pricing,
            status,
            qr,
            checked_in_at,
            checked_out_at,
            validation,
            payment,
            cancellation,
            rating,
            created_at,
        } = booking;

        let duration_hours = i32::try_from(duration.hours).unwrap();
        let duration_days = i32::try_from(duration.days).unwrap();
        let duration_months = i32::try_from(duration.months).unwrap();
        let currency = pricing.rate.currency;
        let payment_amount = payment.amount.map(|m| m.amount);
        let validated_at = validation.map(|v| v.at);
        let validated_by = validation.map(|v| v.by);
        let cancelled_at = cancellation.map(|c| c.at);
        let cancellation_reason = cancellation.map(|c| c.reason);
        let rating_parking = rating.parking.map(|s| i16::from(s.get()));
        let rating_service = rating.service.map(|s| i16::from(s.get()));
        let rating_overall = rating.overall.map(|s| i16::from(s.get()));

        const SQL: &str = "\
            INSERT INTO bookings (\
                id, user_id, parking_id, vehicle_id, kind, \
                starts_at, ends_at, \
                duration_hours, duration_days, duration_months, \
                rate, currency, subtotal, tax, total, \
                status, \
                qr_token, qr_issued_at, qr_expires_at, \
                checked_in_at, checked_out_at, \
                validated_at, validated_by, \
                payment_status, payment_method, payment_transaction_id, \
                payment_paid_at, payment_amount, \
                cancelled_at, cancellation_reason, \
                rating_parking, rating_service, rating_overall, feedback, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, $5::INT2, \
                $6::TIMESTAMPTZ, $7::TIMESTAMPTZ, \
                $8::INT4, $9::INT4, $10::INT4, \
                $11::NUMERIC, $12::INT2, $13::NUMERIC, $14::NUMERIC, \
                $15::NUMERIC, \
                $16::INT2, \
                $17::VARCHAR, $18::TIMESTAMPTZ, $19::TIMESTAMPTZ, \
                $20::TIMESTAMPTZ, $21::TIMESTAMPTZ, \
                $22::TIMESTAMPTZ, $23::UUID, \
                $24::INT2, $25::INT2, $26::VARCHAR, \
                $27::TIMESTAMPTZ, $28::NUMERIC, \
                $29::TIMESTAMPTZ, $30::INT2, \
                $31::INT2, $32::INT2, $33::INT2, $34::VARCHAR, \
                $35::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET starts_at = EXCLUDED.starts_at, \
                ends_at = EXCLUDED.ends_at, \
                duration_hours = EXCLUDED.duration_hours, \
                duration_days = EXCLUDED.duration_days, \
                duration_months = EXCLUDED.duration_months, \
                rate = EXCLUDED.rate, \
                currency = EXCLUDED.currency, \
                subtotal = EXCLUDED.subtotal, \
                tax = EXCLUDED.tax, \
                total = EXCLUDED.total, \
                status = EXCLUDED.status, \
                checked_in_at = EXCLUDED.checked_in_at, \
                checked_out_at = EXCLUDED.checked_out_at, \
                validated_at = EXCLUDED.validated_at, \
                validated_by = EXCLUDED.validated_by, \
                payment_status = EXCLUDED.payment_status, \
                payment_method = EXCLUDED.payment_method, \
                payment_transaction_id = EXCLUDED.payment_transaction_id, \
                payment_paid_at = EXCLUDED.payment_paid_at, \
                payment_amount = EXCLUDED.payment_amount, \
                cancelled_at = EXCLUDED.cancelled_at, \
                cancellation_reason = EXCLUDED.cancellation_reason, \
                rating_parking = EXCLUDED.rating_parking, \
                rating_service = EXCLUDED.rating_service, \
                rating_overall = EXCLUDED.rating_overall, \
                feedback = EXCLUDED.feedback";
        let params: &[&(dyn ToSql + Sync)] = &[
            &id,
            &user_id,
            &parking_id,
            &vehicle_id,
            &kind,
            &starts_at,
            &ends_at,
            &duration_hours,
            &duration_days,
            &duration_months,
            &pricing.rate.amount,
            &currency,
            &pricing.subtotal.amount,
            &pricing.tax.amount,
            &pricing.total.amount,
            &status,
            &qr.token,
            &qr.issued_at,
            &qr.expires_at,
            &checked_in_at,
            &checked_out_at,
            &validated_at,
            &validated_by,
            &payment.status,
            &payment.method,
            &payment.transaction_id,
            &payment.paid_at,
            &payment_amount,
            &cancelled_at,
            &cancellation_reason,
            &rating_parking,
            &rating_service,
            &rating_overall,
            &rating.feedback,
            &created_at,
        ];
        self.exec(SQL, params)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Booking, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Booking, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO bookings_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::booking::list::Page, read::booking::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::booking::list::Page, read::booking::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::list::Selector {
            arguments,
            filter: read::booking::list::Filter { user_id, status },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap();
        let offset = i64::try_from(arguments.offset()).unwrap();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&user_id];
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let status_filtering = status_idx
            .map(|idx| format!("AND status = ${idx}::INT2 "))
            .unwrap_or_default();

        let sql = format!(
            "SELECT COUNT(*)::INT8 AS total \
             FROM bookings \
             WHERE user_id = $1::UUID \
                   {status_filtering}",
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
             FROM bookings \
             WHERE user_id = $1::UUID \
                   {status_filtering} \
             ORDER BY created_at DESC, id ASC \
             LIMIT ${limit_idx}::INT4 \
             OFFSET ${offset_idx}::INT8",
        );
        let items = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| booking_from_row(&row))
            .collect::<Vec<_>>();

        Ok(read::booking::list::Page::new(arguments, items, total))
    }
}

impl<C>
    Database<
        Select<
            By<
                Vec<read::report::ParkingRevenue>,
                Range<booking::CheckOutDateTime>,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::report::ParkingRevenue>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                Vec<read::report::ParkingRevenue>,
                Range<booking::CheckOutDateTime>,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let period = by.into_inner();
        let completed = booking::Status::Completed;

        const SQL: &str = "\
            SELECT b.parking_id, p.name, p.currency, \
                   SUM(b.total)::NUMERIC AS total, \
                   COUNT(*)::INT8 AS bookings \
            FROM bookings AS b \
            JOIN parkings AS p ON p.id = b.parking_id \
            WHERE b.status = $1::INT2 \
              AND b.checked_out_at >= $2::TIMESTAMPTZ \
              AND b.checked_out_at < $3::TIMESTAMPTZ \
            GROUP BY b.parking_id, p.name, p.currency \
            ORDER BY total DESC";
        Ok(self
            .query(SQL, &[&completed, &period.start, &period.end])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| read::report::ParkingRevenue {
                parking_id: row.get("parking_id"),
                name: row.get("name"),
                total: Money {
                    amount: row.get("total"),
                    currency: row.get("currency"),
                },
                bookings: row.get("bookings"),
            })
            .collect())
    }
}
