//! [`Vehicle`]-related endpoints.

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain,
    query::{self, Query as _},
};

use crate::{
    api::{self, Input},
    define_error, AsError, Error, Service, Session,
};

/// Builds the [`Router`] of [`Vehicle`]-related endpoints.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", delete(remove))
}

/// A [`Vehicle`] registered in the system.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Unique identifier of this [`Vehicle`].
    pub id: String,

    /// License plate of this [`Vehicle`].
    pub license_plate: String,

    /// Make of this [`Vehicle`].
    pub make: String,

    /// Model of this [`Vehicle`].
    pub model: String,

    /// Production year of this [`Vehicle`].
    pub year: u16,

    /// Color of this [`Vehicle`].
    pub color: String,

    /// Kind of this [`Vehicle`].
    pub vehicle_type: domain::vehicle::Kind,

    /// Moment this [`Vehicle`] was registered.
    pub created_at: String,
}

impl From<&domain::Vehicle> for Vehicle {
    fn from(vehicle: &domain::Vehicle) -> Self {
        Self {
            id: vehicle.id.to_string(),
            license_plate: vehicle.license_plate.to_string(),
            make: vehicle.make.to_string(),
            model: vehicle.model.to_string(),
            year: vehicle.year.get(),
            color: vehicle.color.to_string(),
            vehicle_type: vehicle.kind,
            created_at: vehicle.created_at.coerce::<()>().to_rfc3339(),
        }
    }
}

/// `GET /api/vehicles` responding with the requesting user's [`Vehicle`]s,
/// newest first.
async fn list(
    Extension(service): Extension<Service>,
    session: Session,
) -> Result<Json<Vec<Vehicle>>, Error> {
    let vehicles = service
        .execute(query::vehicles::ByOwner::by(session.user_id))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(vehicles.iter().map(Vehicle::from).collect()))
}

/// Body of a [`create()`] request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// License plate of the new [`Vehicle`].
    pub license_plate: String,

    /// Make of the new [`Vehicle`].
    pub make: String,

    /// Model of the new [`Vehicle`].
    pub model: String,

    /// Production year of the new [`Vehicle`].
    pub year: u16,

    /// Color of the new [`Vehicle`].
    pub color: String,

    /// Kind of the new [`Vehicle`].
    #[serde(default)]
    pub vehicle_type: Option<domain::vehicle::Kind>,
}

/// `POST /api/vehicles` registering a new [`Vehicle`] for the requesting
/// user.
async fn create(
    Extension(service): Extension<Service>,
    session: Session,
    Input(req): Input<CreateRequest>,
) -> Result<(StatusCode, Json<Vehicle>), Error> {
    let CreateRequest {
        license_plate,
        make,
        model,
        year,
        color,
        vehicle_type,
    } = req;

    let vehicle = service
        .execute(command::CreateVehicle {
            owner_id: session.user_id,
            license_plate: domain::vehicle::LicensePlate::new(license_plate)
                .ok_or_else(|| {
                    Error::validation("`licensePlate` is not a valid plate")
                })?,
            make: domain::vehicle::Make::new(make)
                .ok_or_else(|| Error::validation("`make` is not valid"))?,
            model: domain::vehicle::Model::new(model)
                .ok_or_else(|| Error::validation("`model` is not valid"))?,
            year: domain::vehicle::Year::new(year)
                .ok_or_else(|| Error::validation("`year` is not valid"))?,
            color: domain::vehicle::Color::new(color)
                .ok_or_else(|| Error::validation("`color` is not valid"))?,
            kind: vehicle_type.unwrap_or(domain::vehicle::Kind::Car),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((StatusCode::CREATED, Json(Vehicle::from(&vehicle))))
}

/// `DELETE /api/vehicles/:id` deleting a [`Vehicle`] of the requesting user.
///
/// Rejected while a live booking still references the [`Vehicle`].
async fn remove(
    Extension(service): Extension<Service>,
    session: Session,
    Path(id): Path<String>,
) -> Result<StatusCode, Error> {
    service
        .execute(command::DeleteVehicle {
            vehicle_id: api::parse(&id, "id")?,
            owner_id: session.user_id,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(StatusCode::NO_CONTENT)
}

impl AsError for command::create_vehicle::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::create_vehicle::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::PlateOccupied(_) => Some(VehicleError::PlateOccupied.into()),
        }
    }
}

impl AsError for command::delete_vehicle::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::delete_vehicle::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::VehicleNotExists(_) => Some(VehicleError::NotFound.into()),
            E::HasLiveBookings(_) => {
                Some(VehicleError::HasLiveBookings.into())
            }
        }
    }
}

define_error! {
    enum VehicleError {
        #[code = "VEHICLE_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Vehicle not found"]
        NotFound,

        #[code = "PLATE_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Vehicle with this license plate is already registered"]
        PlateOccupied,

        #[code = "VEHICLE_HAS_LIVE_BOOKINGS"]
        #[status = CONFLICT]
        #[message = "Vehicle is still referenced by a live booking"]
        HasLiveBookings,
    }
}
