//! [`Session`]-extraction definitions.

use axum::{async_trait, extract::FromRequestParts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use common::DateTime;
use service::{
    command::{self, Command as _},
    domain::user::{self, session},
};

use crate::{define_error, AsError, Error, Service};

/// Authenticated user session, extracted from the `Authorization: Bearer`
/// header of a request.
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    ///
    /// [`User`]: service::domain::User
    pub user_id: user::Id,

    /// [`user::Role`] carried by this [`Session`].
    pub role: user::Role,

    /// Authentication token.
    pub token: session::Token,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: DateTime,
}

impl Session {
    /// Checks this [`Session`] carries the administrator capability.
    ///
    /// # Errors
    ///
    /// With `NOT_ADMIN` if it doesn't.
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.role == user::Role::Admin {
            Ok(())
        } else {
            Err(AuthError::NotAdmin.into())
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let service =
            parts.extensions.get::<Service>().cloned().ok_or_else(|| {
                Error::internal(&"missing `Service` extension")
            })?;

        let res = TypedHeader::<Authorization<Bearer>>::from_request_parts(
            parts, state,
        )
        .await;
        let bearer = match res {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(e) => {
                return Err(if e.is_missing() {
                    AuthError::AuthorizationRequired.into()
                } else {
                    e.into_error()
                });
            }
        };

        #[expect(unsafe_code, reason = "specified in correct header")]
        let token =
            unsafe { session::Token::new_unchecked(bearer.token().to_owned()) };
        let session = service
            .execute(command::AuthorizeUserSession {
                token: token.clone(),
            })
            .await
            .map_err(AsError::into_error)?;

        Ok(Self {
            user_id: session.user_id,
            role: session.role,
            token,
            expires_at: session.expires_at.coerce(),
        })
    }
}

/// Authenticated administrator session.
///
/// Same as [`Session`], with the [`user::Role::Admin`] capability checked on
/// extraction.
#[derive(Clone, Debug)]
pub struct AdminSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        session.require_admin()?;
        Ok(Self(session))
    }
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenDecodeError(_) => {
                Some(AuthError::AuthorizationRequired.into())
            }
            Self::UserNotExists(_) => None,
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "NOT_ADMIN"]
        #[status = FORBIDDEN]
        #[message = "Administrator role required"]
        NotAdmin,
    }
}
