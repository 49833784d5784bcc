//! QR-related endpoints.

use axum::{
    extract::Path,
    routing::{get, post},
    Extension, Json, Router,
};
use common::DateTime;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain,
    query::{self, Query as _},
    read::booking::Scannable,
};

use crate::{
    api::{self, booking::Booking, Input},
    define_error, AsError, Error, Service, Session,
};

/// Builds the [`Router`] of QR-related endpoints.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/generate/:id", get(generate))
        .route("/scan", post(scan))
        .route("/validate/:token", get(validate))
}

/// Payload encoded into a QR image by the rendering collaborator.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    /// ID of the booking.
    pub booking_id: String,

    /// Opaque QR token of the booking.
    pub qr_code: String,

    /// ID of the booking user.
    pub user_id: String,

    /// ID of the booked parking lot.
    pub parking_id: String,

    /// ID of the booked vehicle, if any.
    pub vehicle_id: Option<String>,

    /// Start of the reserved interval, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub start_time: String,

    /// End of the reserved interval, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub end_time: String,

    /// Moment the token expires, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub expires: String,
}

/// `GET /api/qr/generate/:id` responding with the QR payload of the
/// requesting user's booking.
///
/// Rendering the payload into an image is the encoder's job, not this
/// backend's.
async fn generate(
    Extension(service): Extension<Service>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<QrPayload>, Error> {
    let id = api::parse::<domain::booking::Id>(&id, "id")?;

    let booking = service
        .execute(query::booking::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| Error::from(QrError::BookingNotFound))?;

    if booking.user_id != session.user_id {
        return Err(QrError::NotOwned.into());
    }
    if !matches!(
        booking.status,
        domain::booking::Status::Confirmed | domain::booking::Status::Active,
    ) {
        return Err(QrError::BookingNotActive.into());
    }
    if !booking.is_scannable(DateTime::now()) {
        return Err(QrError::Expired.into());
    }

    Ok(Json(QrPayload {
        booking_id: booking.id.to_string(),
        qr_code: booking.qr.token.to_string(),
        user_id: booking.user_id.to_string(),
        parking_id: booking.parking_id.to_string(),
        vehicle_id: booking.vehicle_id.map(|id| id.to_string()),
        start_time: booking.starts_at.coerce::<()>().to_rfc3339(),
        end_time: booking.ends_at.coerce::<()>().to_rfc3339(),
        expires: booking.qr.expires_at.coerce::<()>().to_rfc3339(),
    }))
}

/// Action of a [`scan()`] request.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanAction {
    /// Check the booking in.
    Checkin,

    /// Check the booking out.
    Checkout,
}

/// Body of a [`scan()`] request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Scanned QR token.
    pub qr_code: String,

    /// Action to drive the booking with.
    pub action: ScanAction,
}

/// `POST /api/qr/scan` driving a booking through check-in or check-out by
/// its scanned QR token.
///
/// Reachable without a session: the scanner terminal holds no user
/// credentials, the token itself is the credential.
async fn scan(
    Extension(service): Extension<Service>,
    Input(req): Input<ScanRequest>,
) -> Result<Json<Booking>, Error> {
    let ScanRequest { qr_code, action } = req;

    let token = domain::booking::qr::Token::new(qr_code)
        .ok_or_else(|| Error::from(QrError::NotValid))?;

    let booking = match action {
        ScanAction::Checkin => service
            .execute(command::CheckInBooking { token })
            .await
            .map_err(AsError::into_error)?,
        ScanAction::Checkout => service
            .execute(command::CheckOutBooking { token })
            .await
            .map_err(AsError::into_error)?,
    };

    let tax = service.config().booking.tax;
    Ok(Json(Booking::new(&booking, tax)))
}

/// `GET /api/qr/validate/:token` performing a read-only lookup of a booking
/// by its QR token.
///
/// Resolves only while the token is unexpired and the booking is in a
/// scannable status.
async fn validate(
    Extension(service): Extension<Service>,
    Path(token): Path<String>,
) -> Result<Json<Booking>, Error> {
    let token = domain::booking::qr::Token::new(token)
        .ok_or_else(|| Error::from(QrError::NotValid))?;

    let Scannable(booking) = service
        .execute(query::booking::ByQrToken::by(&token))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| Error::from(QrError::NotValid))?;

    let tax = service.config().booking.tax;
    Ok(Json(Booking::new(&booking, tax)))
}

impl AsError for command::check_in_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::check_in_booking::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::QrNotValid => Some(QrError::NotValid.into()),
            E::NotAwaitingCheckIn(domain::booking::Status::Active) => {
                Some(QrError::DoubleCheckIn.into())
            }
            E::NotAwaitingCheckIn(_) => {
                Some(QrError::BookingNotReady.into())
            }
            E::TooEarly => Some(QrError::CheckInTooEarly.into()),
        }
    }
}

impl AsError for command::check_out_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::check_out_booking::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::QrNotValid => Some(QrError::NotValid.into()),
            E::NotActive(_) => Some(QrError::BookingNotActive.into()),
        }
    }
}

define_error! {
    enum QrError {
        #[code = "QR_NOT_VALID"]
        #[status = NOT_FOUND]
        #[message = "Invalid or expired QR code"]
        NotValid,

        #[code = "QR_EXPIRED"]
        #[status = BAD_REQUEST]
        #[message = "QR code has expired"]
        Expired,

        #[code = "BOOKING_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Booking not found"]
        BookingNotFound,

        #[code = "NOT_BOOKING_OWNER"]
        #[status = FORBIDDEN]
        #[message = "Not authorized to access this booking"]
        NotOwned,

        #[code = "BOOKING_NOT_READY"]
        #[status = BAD_REQUEST]
        #[message = "Booking is not ready for check-in"]
        BookingNotReady,

        #[code = "DOUBLE_CHECK_IN"]
        #[status = CONFLICT]
        #[message = "Booking is already checked in"]
        DoubleCheckIn,

        #[code = "CHECK_IN_TOO_EARLY"]
        #[status = BAD_REQUEST]
        #[message = "Check-in is not available yet"]
        CheckInTooEarly,

        #[code = "BOOKING_NOT_ACTIVE"]
        #[status = BAD_REQUEST]
        #[message = "Booking is not active"]
        BookingNotActive,
    }
}
