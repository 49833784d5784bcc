//! [`Command`] for requesting a password reset.

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, otp, Otp},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for requesting a password reset.
///
/// Issues a fresh [`Otp`] for the [`User`], replacing any previous one, and
/// returns the plain code for the delivery channel. Only the hash of the
/// code is ever persisted.
#[derive(Clone, Debug)]
pub struct RequestPasswordReset {
    /// [`Email`] of the [`User`] to reset the password of.
    ///
    /// [`Email`]: user::Email
    pub email: user::Email,
}

/// Output of [`RequestPasswordReset`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Plain [`otp::Code`] to be delivered to the [`User`].
    ///
    /// [`User`]: crate::domain::User
    pub code: otp::Code,

    /// [`DateTime`] when the issued [`Otp`] expires.
    pub expires_at: otp::ExpirationDateTime,
}

impl<Db> Command<RequestPasswordReset> for Service<Db>
where
    Db: for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Otp>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RequestPasswordReset,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RequestPasswordReset { email } = cmd;

        let user = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::UserNotExists(email.clone()))
            .map_err(tracerr::wrap!())?;

        let code = otp::Code::generate();
        let now = DateTime::now();
        let otp = Otp {
            email: user.email,
            code_hash: otp::CodeHash::new(&code),
            created_at: now.coerce(),
            expires_at: (now + self.config.otp.ttl).coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(otp.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output {
            code,
            expires_at: otp.expires_at,
        })
    }
}

/// Error of [`RequestPasswordReset`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// No [`User`] with the provided [`Email`] exists.
    ///
    /// [`Email`]: user::Email
    /// [`User`]: crate::domain::User
    #[display("`User(email: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Email),
}
