//! [`Command`] for resetting a [`User`] password with an [`Otp`].

use common::{
    operations::{By, Commit, Delete, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
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

/// [`Command`] for resetting a [`User`] password with a previously issued
/// [`Otp`].
#[derive(Clone, Debug)]
pub struct ResetPassword {
    /// [`Email`] of the [`User`] to reset the password of.
    ///
    /// [`Email`]: user::Email
    pub email: user::Email,

    /// Plain [`otp::Code`] received by the [`User`].
    pub code: otp::Code,

    /// New [`Password`] to set.
    ///
    /// [`Password`]: user::Password
    pub password: SecretBox<user::Password>,
}

impl<Db> Command<ResetPassword> for Service<Db>
where
    Db: for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'e> Database<
            Select<By<Option<Otp>, &'e user::Email>>,
            Ok = Option<Otp>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Lock<By<User, user::Id>>, Err = Traced<database::Error>>
        + Database<Update<User>, Err = Traced<database::Error>>
        + for<'e> Database<
            Delete<By<Otp, &'e user::Email>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ResetPassword) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ResetPassword {
            email,
            code,
            password,
        } = cmd;

        let mut user = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::WrongCode)
            .map_err(tracerr::wrap!())?;

        // Expired codes are filtered out by the lookup itself.
        let otp = self
            .database()
            .execute(Select(By::<Option<Otp>, _>::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::WrongCode)
            .map_err(tracerr::wrap!())?;
        if otp.expires_at.coerce() <= DateTime::now()
            || !otp.code_hash.matches(&code)
        {
            return Err(tracerr::new!(E::WrongCode));
        }

        user.password_hash = user::PasswordHash::new(password.expose_secret());

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent updates of the same `User`.
        tx.execute(Lock(By::new(user.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Update(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        // A code is single-use.
        tx.execute(Delete(By::<Otp, _>::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`ResetPassword`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Provided [`otp::Code`] doesn't match, is expired, or was never
    /// issued.
    #[display("Invalid or expired reset code")]
    WrongCode,
}
