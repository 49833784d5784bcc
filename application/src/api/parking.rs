//! [`Parking`]-related endpoints.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use common::pagination;
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
    define_error, AdminSession, AsError, Error, Service,
};

/// Builds the [`Router`] of [`Parking`]-related endpoints.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(detail))
}

/// A [`Parking`] lot of the system.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parking {
    /// Unique identifier of this [`Parking`].
    pub id: String,

    /// Name of this [`Parking`].
    pub name: String,

    /// Description of this [`Parking`], if any.
    pub description: Option<String>,

    /// Address of this [`Parking`].
    pub address: Address,

    /// Total number of spots.
    pub total_spots: u16,

    /// Number of currently free spots.
    pub available_spots: u16,

    /// Pricing rates of this [`Parking`].
    pub pricing: Rates,

    /// Indicator whether this [`Parking`] accepts new bookings.
    pub is_active: bool,

    /// Moment this [`Parking`] was created.
    pub created_at: String,
}

impl From<&domain::Parking> for Parking {
    fn from(parking: &domain::Parking) -> Self {
        Self {
            id: parking.id.to_string(),
            name: parking.name.to_string(),
            description: parking
                .description
                .as_ref()
                .map(ToString::to_string),
            address: Address {
                street: parking.street.to_string(),
                city: parking.city.to_string(),
                zip_code: parking.zip_code.as_ref().map(ToString::to_string),
                country: parking.country.to_string(),
            },
            total_spots: parking.total_spots.get(),
            available_spots: parking.available_spots.get(),
            pricing: Rates {
                hourly: parking.rates.hourly.amount,
                daily: parking.rates.daily.map(|m| m.amount),
                monthly: parking.rates.monthly.map(|m| m.amount),
                currency: parking.rates.hourly.currency.to_string(),
            },
            is_active: parking.is_active,
            created_at: parking.created_at.coerce::<()>().to_rfc3339(),
        }
    }
}

/// Address of a [`Parking`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street line.
    pub street: String,

    /// City.
    pub city: String,

    /// Zip code, if any.
    pub zip_code: Option<String>,

    /// Country.
    pub country: String,
}

/// Pricing rates of a [`Parking`].
#[derive(Clone, Debug, Serialize)]
pub struct Rates {
    /// Rate per hour.
    pub hourly: Decimal,

    /// Rate per day, if offered.
    pub daily: Option<Decimal>,

    /// Rate per month, if offered.
    pub monthly: Option<Decimal>,

    /// Three-letter currency code of every rate.
    pub currency: String,
}

/// Query parameters of a [`list()`] request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListQuery {
    /// 1-based number of the requested page.
    pub page: Option<usize>,

    /// Maximum number of items on the requested page.
    pub limit: Option<usize>,

    /// City to narrow the list to.
    pub city: Option<String>,

    /// Name (or its part) to fuzzy search for.
    pub search: Option<String>,
}

/// Page of [`Parking`]s.
#[derive(Clone, Debug, Serialize)]
pub struct ParkingsPage {
    /// [`Parking`]s on this page.
    pub parkings: Vec<Parking>,

    /// Pagination metadata.
    pub pagination: PageInfo,
}

/// `GET /api/parkings` responding with active [`Parking`]s, newest first.
async fn list(
    Extension(service): Extension<Service>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ParkingsPage>, Error> {
    let ListQuery {
        page,
        limit,
        city,
        search,
    } = query;
    let arguments = api::PageQuery { page, limit }.arguments()?;

    let city = city
        .map(|c| {
            domain::parking::City::new(c)
                .ok_or_else(|| Error::validation("`city` is not valid"))
        })
        .transpose()?;
    let name = search
        .map(|s| {
            domain::parking::Name::new(s)
                .ok_or_else(|| Error::validation("`search` is not valid"))
        })
        .transpose()?;

    let page = service
        .execute(query::parkings::List::by(pagination::Selector {
            arguments,
            filter: read::parking::list::Filter {
                city,
                name,
                only_active: true,
            },
        }))
        .await
        .map_err(AsError::into_error)?;

    let pagination = PageInfo::from(&page);
    Ok(Json(ParkingsPage {
        parkings: page.items.iter().map(Parking::from).collect(),
        pagination,
    }))
}

/// `GET /api/parkings/:id` responding with a single [`Parking`].
async fn detail(
    Extension(service): Extension<Service>,
    Path(id): Path<String>,
) -> Result<Json<Parking>, Error> {
    let id = api::parse::<domain::parking::Id>(&id, "id")?;

    let parking = service
        .execute(query::parking::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| Error::from(ParkingError::NotFound))?;

    Ok(Json(Parking::from(&parking)))
}

/// Body of a [`create()`] request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Name of the new [`Parking`].
    pub name: String,

    /// Description of the new [`Parking`].
    pub description: Option<String>,

    /// Street line of the new [`Parking`].
    pub street: String,

    /// City of the new [`Parking`].
    pub city: String,

    /// Zip code of the new [`Parking`].
    pub zip_code: Option<String>,

    /// Country of the new [`Parking`].
    pub country: Option<String>,

    /// Total number of spots of the new [`Parking`].
    pub total_spots: u16,

    /// Rate per hour.
    pub hourly_rate: Decimal,

    /// Rate per day, if offered.
    pub daily_rate: Option<Decimal>,

    /// Rate per month, if offered.
    pub monthly_rate: Option<Decimal>,
}

/// `POST /api/parkings` creating a new [`Parking`].
///
/// Administrator only.
async fn create(
    Extension(service): Extension<Service>,
    AdminSession(session): AdminSession,
    Input(req): Input<CreateRequest>,
) -> Result<(StatusCode, Json<Parking>), Error> {
    let CreateRequest {
        name,
        description,
        street,
        city,
        zip_code,
        country,
        total_spots,
        hourly_rate,
        daily_rate,
        monthly_rate,
    } = req;

    let currency = service.config().booking.currency;
    let money = |amount: Decimal| common::Money { amount, currency };

    let parking = service
        .execute(command::CreateParking {
            owner_id: session.user_id,
            name: domain::parking::Name::new(name)
                .ok_or_else(|| Error::validation("`name` is not valid"))?,
            description: description
                .map(|d| {
                    domain::parking::Description::new(d).ok_or_else(|| {
                        Error::validation("`description` is not valid")
                    })
                })
                .transpose()?,
            street: domain::parking::Street::new(street)
                .ok_or_else(|| Error::validation("`street` is not valid"))?,
            city: domain::parking::City::new(city)
                .ok_or_else(|| Error::validation("`city` is not valid"))?,
            zip_code: zip_code
                .map(|z| {
                    domain::parking::ZipCode::new(z).ok_or_else(|| {
                        Error::validation("`zipCode` is not valid")
                    })
                })
                .transpose()?,
            country: domain::parking::Country::new(
                country.unwrap_or_else(|| "Tunisia".to_owned()),
            )
            .ok_or_else(|| Error::validation("`country` is not valid"))?,
            total_spots: domain::parking::TotalSpots::new(total_spots)
                .ok_or_else(|| {
                    Error::validation("`totalSpots` must be at least 1")
                })?,
            hourly_rate: money(hourly_rate),
            daily_rate: daily_rate.map(money),
            monthly_rate: monthly_rate.map(money),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((StatusCode::CREATED, Json(Parking::from(&parking))))
}

impl AsError for command::create_parking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::create_parking::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::NegativeRate => Some(Error::validation(self.to_string())),
        }
    }
}

define_error! {
    enum ParkingError {
        #[code = "PARKING_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Parking lot not found"]
        NotFound,
    }
}
