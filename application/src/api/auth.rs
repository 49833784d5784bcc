//! Authentication endpoints.

use axum::{http::StatusCode, routing::post, Extension, Json, Router};
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain,
};
use tracing as log;

use crate::{
    api::Input,
    define_error, AsError, Error, Service,
};

/// Builds the [`Router`] of authentication endpoints.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// A user of the system.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier of this user.
    pub id: String,

    /// First name of this user.
    pub first_name: String,

    /// Last name of this user.
    pub last_name: String,

    /// Email of this user.
    pub email: String,

    /// Phone of this user, if any.
    pub phone: Option<String>,

    /// Capability role of this user.
    pub role: domain::user::Role,
}

impl From<&domain::User> for User {
    fn from(user: &domain::User) -> Self {
        Self {
            id: user.id.to_string(),
            first_name: user.first_name.to_string(),
            last_name: user.last_name.to_string(),
            email: user.email.to_string(),
            phone: user.phone.as_ref().map(ToString::to_string),
            role: user.role,
        }
    }
}

/// Body of a [`register()`] request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// First name of the new user.
    pub first_name: String,

    /// Last name of the new user.
    pub last_name: String,

    /// Email of the new user.
    pub email: String,

    /// Password of the new user.
    pub password: String,

    /// Phone of the new user, if any.
    pub phone: Option<String>,
}

/// `POST /api/auth/register` creating a new user.
async fn register(
    Extension(service): Extension<Service>,
    Input(req): Input<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), Error> {
    let RegisterRequest {
        first_name,
        last_name,
        email,
        password,
        phone,
    } = req;

    let user = service
        .execute(command::CreateUser {
            first_name: domain::user::Name::new(first_name).ok_or_else(
                || Error::validation("`firstName` is not valid"),
            )?,
            last_name: domain::user::Name::new(last_name).ok_or_else(
                || Error::validation("`lastName` is not valid"),
            )?,
            email: domain::user::Email::new(email).ok_or_else(|| {
                Error::validation("`email` is not a valid address")
            })?,
            password: SecretBox::new(Box::new(
                domain::user::Password::new(password).ok_or_else(|| {
                    Error::validation(
                        "`password` must be between 2 and 128 characters",
                    )
                })?,
            )),
            phone: phone
                .map(|p| {
                    domain::user::Phone::new(p).ok_or_else(|| {
                        Error::validation("`phone` is not a valid number")
                    })
                })
                .transpose()?,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((StatusCode::CREATED, Json(User::from(&user))))
}

/// Body of a [`login()`] request.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginRequest {
    /// Email of the user.
    pub email: String,

    /// Password of the user.
    pub password: String,
}

/// Response of a successful [`login()`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token of the created session.
    pub token: String,

    /// Moment the session expires, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub expires_at: String,

    /// The authenticated user.
    pub user: User,
}

/// `POST /api/auth/login` creating a new session by credentials.
async fn login(
    Extension(service): Extension<Service>,
    Input(req): Input<LoginRequest>,
) -> Result<Json<LoginResponse>, Error> {
    let LoginRequest { email, password } = req;

    let output = service
        .execute(command::CreateUserSession::ByCredentials {
            email: domain::user::Email::new(email).ok_or_else(|| {
                Error::validation("`email` is not a valid address")
            })?,
            password: SecretBox::new(Box::new(
                domain::user::Password::new(password)
                    .ok_or_else(|| Error::from(AuthError::WrongCredentials))?,
            )),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(LoginResponse {
        token: output.token.to_string(),
        expires_at: output.expires_at.coerce::<()>().to_rfc3339(),
        user: User::from(&output.user),
    }))
}

/// Body of a [`forgot_password()`] request.
#[derive(Clone, Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Email of the user to reset the password of.
    pub email: String,
}

/// Response of a [`forgot_password()`] request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    /// Moment the issued code expires, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub expires_at: String,
}

/// `POST /api/auth/forgot-password` issuing a one-time reset code.
///
/// The code itself leaves through the delivery channel, never through this
/// response.
async fn forgot_password(
    Extension(service): Extension<Service>,
    Input(req): Input<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, Error> {
    let ForgotPasswordRequest { email } = req;

    let output = service
        .execute(command::RequestPasswordReset {
            email: domain::user::Email::new(email).ok_or_else(|| {
                Error::validation("`email` is not a valid address")
            })?,
        })
        .await
        .map_err(AsError::into_error)?;

    // The delivery channel (email sender) is an external collaborator; the
    // code is handed over to it here.
    log::debug!("issued a password reset code: {}", output.code);

    Ok(Json(ForgotPasswordResponse {
        expires_at: output.expires_at.coerce::<()>().to_rfc3339(),
    }))
}

/// Body of a [`reset_password()`] request.
#[derive(Clone, Debug, Deserialize)]
pub struct ResetPasswordRequest {
    /// Email of the user to reset the password of.
    pub email: String,

    /// One-time code received by the user.
    pub code: String,

    /// New password to set.
    pub password: String,
}

/// `POST /api/auth/reset-password` setting a new password with a one-time
/// code.
async fn reset_password(
    Extension(service): Extension<Service>,
    Input(req): Input<ResetPasswordRequest>,
) -> Result<Json<User>, Error> {
    let ResetPasswordRequest {
        email,
        code,
        password,
    } = req;

    let user = service
        .execute(command::ResetPassword {
            email: domain::user::Email::new(email).ok_or_else(|| {
                Error::validation("`email` is not a valid address")
            })?,
            code: domain::user::otp::Code::new(code).ok_or_else(|| {
                Error::validation("`code` must be a 6-digit code")
            })?,
            password: SecretBox::new(Box::new(
                domain::user::Password::new(password).ok_or_else(|| {
                    Error::validation(
                        "`password` must be between 2 and 128 characters",
                    )
                })?,
            )),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(User::from(&user)))
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::create_user::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::EmailOccupied(_) => Some(AuthError::EmailOccupied.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::create_user_session::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::JsonWebTokenEncodeError(_) => None,
            E::UserNotExists(_) | E::WrongCredentials => {
                Some(AuthError::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::request_password_reset::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::request_password_reset::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::UserNotExists(_) => Some(AuthError::UserNotFound.into()),
        }
    }
}

impl AsError for command::reset_password::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::reset_password::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::WrongCode => Some(AuthError::WrongResetCode.into()),
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "EMAIL_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "User with this email already exists"]
        EmailOccupied,

        #[code = "WRONG_CREDENTIALS"]
        #[status = UNAUTHORIZED]
        #[message = "Wrong email or password"]
        WrongCredentials,

        #[code = "USER_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "User not found"]
        UserNotFound,

        #[code = "WRONG_RESET_CODE"]
        #[status = BAD_REQUEST]
        #[message = "Invalid or expired reset code"]
        WrongResetCode,
    }
}
