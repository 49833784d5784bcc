//! [`Booking`]-related endpoints.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use common::{pagination, DateTime, Percent};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain,
    query::{self, Query as _},
    read,
};

use crate::{
    api::{self, Input, PageInfo},
    define_error, AdminSession, AsError, Error, Service, Session,
};

/// Builds the [`Router`] of [`Booking`]-related endpoints.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/", post(create).get(list))
        .route("/:id", get(detail))
        .route("/:id/cancel", put(cancel))
        .route("/:id/rate", put(rate))
        .route("/:id/confirm", put(confirm))
        .route("/:id/validate", put(validate))
        .route("/:id/no-show", put(no_show))
}

/// A [`Booking`] of the system.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Unique identifier of this [`Booking`].
    pub id: String,

    /// ID of the user who made this [`Booking`].
    pub user_id: String,

    /// ID of the booked parking lot.
    pub parking_id: String,

    /// ID of the vehicle this [`Booking`] was made for, if any.
    pub vehicle_id: Option<String>,

    /// Billing granularity of this [`Booking`].
    pub booking_type: domain::booking::Kind,

    /// Start of the reserved interval, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub start_time: String,

    /// End of the reserved interval, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub end_time: String,

    /// Derived duration of this [`Booking`].
    pub duration: Duration,

    /// Pricing snapshot of this [`Booking`].
    pub pricing: Pricing,

    /// Live estimate of the final pricing, present only while the
    /// [`Booking`] is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_pricing: Option<Pricing>,

    /// Current status of this [`Booking`].
    pub status: domain::booking::Status,

    /// QR token of this [`Booking`].
    pub qr_code: String,

    /// When the QR token was issued, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub qr_code_generated: String,

    /// When the QR token expires, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub qr_code_expires: String,

    /// Check-in moment, if checked in.
    pub check_in_time: Option<String>,

    /// Check-out moment, if checked out.
    pub check_out_time: Option<String>,

    /// Indicator whether an administrator validated this [`Booking`].
    pub admin_validated: bool,

    /// Moment of the administrator validation, if validated.
    pub admin_validated_at: Option<String>,

    /// ID of the validating administrator, if validated.
    pub admin_validated_by: Option<String>,

    /// Payment sub-record of this [`Booking`].
    pub payment: Payment,

    /// Cancellation moment, if cancelled.
    pub cancelled_at: Option<String>,

    /// Reason of the cancellation, if cancelled.
    pub cancellation_reason: Option<domain::booking::CancellationReason>,

    /// Rating left for this [`Booking`].
    pub rating: Rating,

    /// Moment this [`Booking`] was created.
    pub created_at: String,
}

impl Booking {
    /// Creates a new [`Booking`] representation of the provided
    /// [`domain::Booking`].
    pub(crate) fn new(booking: &domain::Booking, tax: Percent) -> Self {
        let rfc3339 = |dt: DateTime| dt.to_rfc3339();
        Self {
            id: booking.id.to_string(),
            user_id: booking.user_id.to_string(),
            parking_id: booking.parking_id.to_string(),
            vehicle_id: booking.vehicle_id.map(|id| id.to_string()),
            booking_type: booking.kind,
            start_time: rfc3339(booking.starts_at.coerce()),
            end_time: rfc3339(booking.ends_at.coerce()),
            duration: Duration {
                hours: booking.duration.hours,
                days: booking.duration.days,
                months: booking.duration.months,
            },
            pricing: Pricing::from(booking.pricing),
            estimated_pricing: booking
                .estimated_quote(tax, DateTime::now())
                .map(Pricing::from),
            status: booking.status,
            qr_code: booking.qr.token.to_string(),
            qr_code_generated: rfc3339(booking.qr.issued_at.coerce()),
            qr_code_expires: rfc3339(booking.qr.expires_at.coerce()),
            check_in_time: booking
                .checked_in_at
                .map(|dt| rfc3339(dt.coerce())),
            check_out_time: booking
                .checked_out_at
                .map(|dt| rfc3339(dt.coerce())),
            admin_validated: booking.validation.is_some(),
            admin_validated_at: booking
                .validation
                .map(|v| rfc3339(v.at.coerce())),
            admin_validated_by: booking
                .validation
                .map(|v| v.by.to_string()),
            payment: Payment {
                status: booking.payment.status,
                method: booking.payment.method,
                transaction_id: booking
                    .payment
                    .transaction_id
                    .as_ref()
                    .map(ToString::to_string),
                paid_at: booking
                    .payment
                    .paid_at
                    .map(|dt| rfc3339(dt.coerce())),
                amount: booking.payment.amount.map(|m| m.amount),
            },
            cancelled_at: booking
                .cancellation
                .map(|c| rfc3339(c.at.coerce())),
            cancellation_reason: booking.cancellation.map(|c| c.reason),
            rating: Rating {
                parking: booking.rating.parking.map(|s| s.get()),
                service: booking.rating.service.map(|s| s.get()),
                overall: booking.rating.overall.map(|s| s.get()),
                feedback: booking
                    .rating
                    .feedback
                    .as_ref()
                    .map(ToString::to_string),
            },
            created_at: rfc3339(booking.created_at.coerce()),
        }
    }
}

/// Derived duration of a [`Booking`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Duration {
    /// Number of started hours.
    pub hours: u32,

    /// Number of started days.
    pub days: u32,

    /// Number of started months.
    pub months: u32,
}

/// Pricing snapshot of a [`Booking`].
#[derive(Clone, Debug, Serialize)]
pub struct Pricing {
    /// Hourly rate the quote was calculated with.
    pub rate: Decimal,

    /// Price of the billed hours before taxes.
    pub subtotal: Decimal,

    /// Tax part of the quote.
    pub tax: Decimal,

    /// Total price, taxes included.
    pub total: Decimal,

    /// Three-letter currency code of every amount.
    pub currency: String,
}

impl From<domain::booking::Quote> for Pricing {
    fn from(quote: domain::booking::Quote) -> Self {
        Self {
            rate: quote.rate.amount,
            subtotal: quote.subtotal.amount,
            tax: quote.tax.amount,
            total: quote.total.amount,
            currency: quote.rate.currency.to_string(),
        }
    }
}

/// Payment sub-record of a [`Booking`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Status of the payment.
    pub status: domain::booking::payment::Status,

    /// Method the payment is to be made with.
    pub method: domain::booking::payment::Method,

    /// ID of the settling transaction, if settled.
    pub transaction_id: Option<String>,

    /// Settlement moment, if settled.
    pub paid_at: Option<String>,

    /// Final amount, filled at check-out.
    pub amount: Option<Decimal>,
}

/// Rating left for a [`Booking`].
#[derive(Clone, Debug, Serialize)]
pub struct Rating {
    /// Score of the parking lot itself.
    pub parking: Option<u8>,

    /// Score of the received service.
    pub service: Option<u8>,

    /// Overall score of the experience.
    pub overall: Option<u8>,

    /// Free-text feedback.
    pub feedback: Option<String>,
}

/// Body of a [`create()`] request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// ID of the parking lot to book.
    pub parking_id: String,

    /// ID of the vehicle to book for, if any.
    pub vehicle_id: Option<String>,

    /// Start of the requested interval, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub start_time: String,

    /// End of the requested interval, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub end_time: String,

    /// Billing granularity of the new [`Booking`].
    #[serde(default)]
    pub booking_type: Option<domain::booking::Kind>,
}

/// `POST /api/bookings` responding with the created [`Booking`].
async fn create(
    Extension(service): Extension<Service>,
    session: Session,
    Input(req): Input<CreateRequest>,
) -> Result<(StatusCode, Json<Booking>), Error> {
    let CreateRequest {
        parking_id,
        vehicle_id,
        start_time,
        end_time,
        booking_type,
    } = req;

    let booking = service
        .execute(command::CreateBooking {
            user_id: session.user_id,
            parking_id: api::parse(&parking_id, "parkingId")?,
            vehicle_id: vehicle_id
                .map(|id| api::parse(&id, "vehicleId"))
                .transpose()?,
            kind: booking_type.unwrap_or(domain::booking::Kind::Hourly),
            starts_at: api::parse_datetime(&start_time, "startTime")?.coerce(),
            ends_at: api::parse_datetime(&end_time, "endTime")?.coerce(),
        })
        .await
        .map_err(AsError::into_error)?;

    let tax = service.config().booking.tax;
    Ok((StatusCode::CREATED, Json(Booking::new(&booking, tax))))
}

/// Query parameters of a [`list()`] request.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct ListQuery {
    /// 1-based number of the requested page.
    pub page: Option<usize>,

    /// Maximum number of items on the requested page.
    pub limit: Option<usize>,

    /// Status to narrow the list to.
    pub status: Option<domain::booking::Status>,
}

/// Page of [`Booking`]s.
#[derive(Clone, Debug, Serialize)]
pub struct BookingsPage {
    /// [`Booking`]s on this page.
    pub bookings: Vec<Booking>,

    /// Pagination metadata.
    pub pagination: PageInfo,
}

/// `GET /api/bookings` responding with the requesting user's [`Booking`]s,
/// newest first.
async fn list(
    Extension(service): Extension<Service>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Json<BookingsPage>, Error> {
    let ListQuery {
        page,
        limit,
        status,
    } = query;
    let arguments = api::PageQuery { page, limit }.arguments()?;

    let page = service
        .execute(query::bookings::List::by(pagination::Selector {
            arguments,
            filter: read::booking::list::Filter {
                user_id: session.user_id,
                status,
            },
        }))
        .await
        .map_err(AsError::into_error)?;

    let tax = service.config().booking.tax;
    let pagination = PageInfo::from(&page);
    Ok(Json(BookingsPage {
        bookings: page
            .items
            .iter()
            .map(|b| Booking::new(b, tax))
            .collect(),
        pagination,
    }))
}

/// `GET /api/bookings/:id` responding with a single [`Booking`] of the
/// requesting user.
async fn detail(
    Extension(service): Extension<Service>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Booking>, Error> {
    let id = api::parse::<domain::booking::Id>(&id, "id")?;

    let booking = service
        .execute(query::booking::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .filter(|b| b.user_id == session.user_id)
        .ok_or_else(|| Error::from(BookingError::NotFound))?;

    let tax = service.config().booking.tax;
    Ok(Json(Booking::new(&booking, tax)))
}

/// `PUT /api/bookings/:id/cancel` cancelling a [`Booking`] of the requesting
/// user.
async fn cancel(
    Extension(service): Extension<Service>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Booking>, Error> {
    let booking = service
        .execute(command::CancelBooking {
            booking_id: api::parse(&id, "id")?,
            user_id: session.user_id,
            reason: domain::booking::CancellationReason::UserCancelled,
        })
        .await
        .map_err(AsError::into_error)?;

    let tax = service.config().booking.tax;
    Ok(Json(Booking::new(&booking, tax)))
}

/// Body of a [`rate()`] request.
#[derive(Clone, Debug, Deserialize)]
pub struct RateRequest {
    /// Score of the parking lot itself.
    pub parking: Option<u8>,

    /// Score of the received service.
    pub service: Option<u8>,

    /// Overall score of the experience.
    pub overall: Option<u8>,

    /// Free-text feedback.
    pub feedback: Option<String>,
}

/// `PUT /api/bookings/:id/rate` rating a completed [`Booking`] of the
/// requesting user.
async fn rate(
    Extension(service): Extension<Service>,
    session: Session,
    Path(id): Path<String>,
    Input(req): Input<RateRequest>,
) -> Result<Json<Booking>, Error> {
    let RateRequest {
        parking,
        service: service_score,
        overall,
        feedback,
    } = req;

    let score = |value: Option<u8>, field: &str| {
        value
            .map(|v| {
                domain::booking::rating::Score::new(v).ok_or_else(|| {
                    Error::validation(format!(
                        "`{field}` rating must be between 1 and 5",
                    ))
                })
            })
            .transpose()
    };
    let rating = domain::booking::Rating {
        parking: score(parking, "parking")?,
        service: score(service_score, "service")?,
        overall: score(overall, "overall")?,
        feedback: feedback
            .map(|f| {
                domain::booking::rating::Feedback::new(f).ok_or_else(|| {
                    Error::validation(
                        "`feedback` cannot exceed 500 characters",
                    )
                })
            })
            .transpose()?,
    };

    let booking = service
        .execute(command::RateBooking {
            booking_id: api::parse(&id, "id")?,
            user_id: session.user_id,
            rating,
        })
        .await
        .map_err(AsError::into_error)?;

    let tax = service.config().booking.tax;
    Ok(Json(Booking::new(&booking, tax)))
}

/// `PUT /api/bookings/:id/confirm` confirming a pending [`Booking`].
///
/// Administrator only: confirmation is driven by the external payment flow.
async fn confirm(
    Extension(service): Extension<Service>,
    AdminSession(_): AdminSession,
    Path(id): Path<String>,
) -> Result<Json<Booking>, Error> {
    let booking = service
        .execute(command::ConfirmBooking {
            booking_id: api::parse(&id, "id")?,
        })
        .await
        .map_err(AsError::into_error)?;

    let tax = service.config().booking.tax;
    Ok(Json(Booking::new(&booking, tax)))
}

/// `PUT /api/bookings/:id/validate` marking a confirmed [`Booking`] as
/// validated by the requesting administrator.
async fn validate(
    Extension(service): Extension<Service>,
    AdminSession(session): AdminSession,
    Path(id): Path<String>,
) -> Result<Json<Booking>, Error> {
    let booking = service
        .execute(command::ValidateBooking {
            booking_id: api::parse(&id, "id")?,
            validator_id: session.user_id,
        })
        .await
        .map_err(AsError::into_error)?;

    let tax = service.config().booking.tax;
    Ok(Json(Booking::new(&booking, tax)))
}

/// `PUT /api/bookings/:id/no-show` marking a confirmed [`Booking`] as a
/// no-show.
///
/// Administrator only, and never automated.
async fn no_show(
    Extension(service): Extension<Service>,
    AdminSession(_): AdminSession,
    Path(id): Path<String>,
) -> Result<Json<Booking>, Error> {
    let booking = service
        .execute(command::MarkBookingNoShow {
            booking_id: api::parse(&id, "id")?,
        })
        .await
        .map_err(AsError::into_error)?;

    let tax = service.config().booking.tax;
    Ok(Json(Booking::new(&booking, tax)))
}

impl AsError for command::create_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::create_booking::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::StartNotInFuture | E::EndNotAfterStart => {
                Some(Error::validation(self.to_string()))
            }
            E::ParkingNotExists(_) => Some(BookingError::ParkingNotFound.into()),
            E::ParkingUnavailable(_) => {
                Some(BookingError::ParkingUnavailable.into())
            }
            E::VehicleNotExists(_) => Some(BookingError::VehicleNotFound.into()),
            E::TimeSlotOccupied(_) => Some(BookingError::TimeSlotOccupied.into()),
            E::QrTokenCollision => Some(BookingError::QrTokenCollision.into()),
        }
    }
}

impl AsError for command::cancel_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::cancel_booking::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::BookingNotExists(_) => Some(BookingError::NotFound.into()),
            E::NotCancellable(_) => Some(BookingError::NotCancellable.into()),
            E::TooLate => Some(BookingError::CancellationTooLate.into()),
        }
    }
}

impl AsError for command::rate_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::rate_booking::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::BookingNotExists(_) => Some(BookingError::NotFound.into()),
            E::NotCompleted(_) => Some(BookingError::NotCompleted.into()),
            E::EmptyRating => Some(Error::validation(self.to_string())),
        }
    }
}

impl AsError for command::confirm_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::confirm_booking::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::BookingNotExists(_) => Some(BookingError::NotFound.into()),
            E::NotPending(_) => Some(BookingError::NotPending.into()),
        }
    }
}

impl AsError for command::validate_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::validate_booking::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::BookingNotExists(_) => Some(BookingError::NotFound.into()),
            E::NotConfirmed(_) => Some(BookingError::NotConfirmed.into()),
            E::AlreadyValidated(_) => {
                Some(BookingError::AlreadyValidated.into())
            }
        }
    }
}

impl AsError for command::mark_booking_no_show::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::mark_booking_no_show::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::BookingNotExists(_) => Some(BookingError::NotFound.into()),
            E::NotConfirmed(_) => Some(BookingError::NotConfirmed.into()),
        }
    }
}

define_error! {
    enum BookingError {
        #[code = "BOOKING_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Booking not found"]
        NotFound,

        #[code = "PARKING_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Parking lot not found"]
        ParkingNotFound,

        #[code = "PARKING_UNAVAILABLE"]
        #[status = BAD_REQUEST]
        #[message = "Parking lot is not available"]
        ParkingUnavailable,

        #[code = "VEHICLE_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Vehicle not found"]
        VehicleNotFound,

        #[code = "TIME_SLOT_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Parking lot is already booked for this time period"]
        TimeSlotOccupied,

        #[code = "QR_TOKEN_COLLISION"]
        #[status = CONFLICT]
        #[message = "Cannot issue a unique QR token, try again"]
        QrTokenCollision,

        #[code = "BOOKING_NOT_CANCELLABLE"]
        #[status = BAD_REQUEST]
        #[message = "Booking cannot be cancelled at this stage"]
        NotCancellable,

        #[code = "CANCELLATION_TOO_LATE"]
        #[status = BAD_REQUEST]
        #[message = "Booking cannot be cancelled this close to its start"]
        CancellationTooLate,

        #[code = "BOOKING_NOT_COMPLETED"]
        #[status = BAD_REQUEST]
        #[message = "Only a completed booking can be rated"]
        NotCompleted,

        #[code = "BOOKING_NOT_PENDING"]
        #[status = BAD_REQUEST]
        #[message = "Booking is not awaiting confirmation"]
        NotPending,

        #[code = "BOOKING_NOT_CONFIRMED"]
        #[status = BAD_REQUEST]
        #[message = "Booking is not confirmed"]
        NotConfirmed,

        #[code = "BOOKING_ALREADY_VALIDATED"]
        #[status = CONFLICT]
        #[message = "Booking is already validated"]
        AlreadyValidated,
    }
}
