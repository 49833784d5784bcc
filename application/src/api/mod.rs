//! JSON REST API definitions.

pub mod auth;
pub mod booking;
pub mod parking;
pub mod qr;
pub mod report;
pub mod vehicle;

use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json, Router,
};
use common::{pagination, DateTime, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{define_error, AsError as _, Error};

/// Builds the [`Router`] of the whole API surface.
///
/// Every route lives under the `/api` prefix and expects the [`Service`]
/// to be provided as an [`Extension`].
///
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
#[must_use]
pub fn router() -> Router {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/parkings", parking::router())
        .nest("/api/vehicles", vehicle::router())
        .nest("/api/bookings", booking::router())
        .nest("/api/qr", qr::router())
        .nest("/api/admin", report::router())
}

/// JSON request body, rejected with a structured [`Error`] when malformed.
#[derive(Clone, Copy, Debug)]
pub struct Input<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Input<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|e| e.into_error())
    }
}

/// [`Money`] representation on the wire.
#[derive(Clone, Debug, Serialize)]
pub struct MoneyValue {
    /// Decimal amount.
    pub amount: Decimal,

    /// Three-letter currency code.
    pub currency: String,
}

impl From<Money> for MoneyValue {
    fn from(money: Money) -> Self {
        Self {
            amount: money.amount,
            currency: money.currency.to_string(),
        }
    }
}

/// Pagination query parameters of list endpoints.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based number of the requested page.
    pub page: Option<usize>,

    /// Maximum number of items on the requested page.
    pub limit: Option<usize>,
}

impl PageQuery {
    /// Converts this [`PageQuery`] into pagination [`Arguments`].
    ///
    /// # Errors
    ///
    /// With `INVALID_PAGINATION` if either value is zero.
    ///
    /// [`Arguments`]: pagination::Arguments
    pub fn arguments(self) -> Result<pagination::Arguments, Error> {
        pagination::Arguments::new(self.page, self.limit)
            .ok_or_else(|| PaginationError::Invalid.into())
    }
}

/// Pagination metadata of a list response.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PageInfo {
    /// 1-based number of this page.
    pub page: usize,

    /// Total number of pages.
    pub pages: usize,

    /// Total number of items across all pages.
    pub total: usize,

    /// Maximum number of items on a page.
    pub limit: usize,
}

impl<I> From<&pagination::Page<I>> for PageInfo {
    fn from(page: &pagination::Page<I>) -> Self {
        Self {
            page: page.arguments.page(),
            pages: page.pages(),
            total: page.total,
            limit: page.arguments.limit(),
        }
    }
}

/// Parses the provided [RFC 3339] string into a [`DateTime`], reporting the
/// offending `field` on failure.
///
/// # Errors
///
/// With `VALIDATION_ERROR` if the string is not a valid [RFC 3339] date and
/// time.
///
/// [RFC 3339]: https://tools.ietf.org/html/rfc3339
pub fn parse_datetime(s: &str, field: &str) -> Result<DateTime, Error> {
    DateTime::from_rfc3339(s)
        .map_err(|_| Error::validation(format!("`{field}` must be a valid \
                                                RFC 3339 date and time")))
}

/// Parses the provided string into a `T`, reporting the offending `field` on
/// failure.
///
/// # Errors
///
/// With `VALIDATION_ERROR` if the string is not a valid `T`.
pub fn parse<T: FromStr>(s: &str, field: &str) -> Result<T, Error> {
    s.parse()
        .map_err(|_| Error::validation(format!("`{field}` is not valid")))
}

define_error! {
    enum PaginationError {
        #[code = "INVALID_PAGINATION"]
        #[status = BAD_REQUEST]
        #[message = "Pagination arguments must be positive"]
        Invalid,
    }
}
