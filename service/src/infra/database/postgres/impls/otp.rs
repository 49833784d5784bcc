//! [`Otp`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::user::{self, otp, Otp},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<'e, C> Database<Select<By<Option<Otp>, &'e user::Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Otp>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Otp>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        let now = DateTime::now();

        // Expired codes are invisible to lookups, whether evicted already or
        // not.
        const SQL: &str = "\
            SELECT email, code_hash, created_at, expires_at \
            FROM otps \
            WHERE email = $1::VARCHAR \
              AND expires_at > $2::TIMESTAMPTZ \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&email, &now])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Otp {
                email: row.get("email"),
                code_hash: row.get("code_hash"),
                created_at: row.get("created_at"),
                expires_at: row.get("expires_at"),
            }))
    }
}

impl<C> Database<Insert<Otp>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(otp): Insert<Otp>,
    ) -> Result<Self::Ok, Self::Err> {
        let Otp {
            email,
            code_hash,
            created_at,
            expires_at,
        } = otp;

        // Reissuing replaces the previous code of the same email.
        const SQL: &str = "\
            INSERT INTO otps (email, code_hash, created_at, expires_at) \
            VALUES (\
                $1::VARCHAR, $2::VARCHAR, \
                $3::TIMESTAMPTZ, $4::TIMESTAMPTZ\
            ) \
            ON CONFLICT (email) DO UPDATE \
            SET code_hash = EXCLUDED.code_hash, \
                created_at = EXCLUDED.created_at, \
                expires_at = EXCLUDED.expires_at";
        self.exec(SQL, &[&email, &code_hash, &created_at, &expires_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<'e, C> Database<Delete<By<Otp, &'e user::Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Otp, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();

        const SQL: &str = "\
            DELETE FROM otps \
            WHERE email = $1::VARCHAR";
        self.exec(SQL, &[&email])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Otp, otp::ExpirationDateTime>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Otp, otp::ExpirationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let deadline: otp::ExpirationDateTime = by.into_inner();

        const SQL: &str = "\
            DELETE FROM otps \
            WHERE expires_at <= $1::TIMESTAMPTZ";
        self.exec(SQL, &[&deadline])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
