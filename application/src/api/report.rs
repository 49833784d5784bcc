//! Administrator reporting endpoints.

use std::time::Duration;

use axum::{extract::Query, routing::get, Extension, Json, Router};
use common::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{
    query::{report, Query as _},
    read,
};

use crate::{
    api::{self, MoneyValue},
    AdminSession, AsError, Error, Service,
};

/// Builds the [`Router`] of administrator reporting endpoints.
#[must_use]
pub fn router() -> Router {
    Router::new().route("/revenue", get(revenue))
}

/// Query parameters of a [`revenue()`] request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueQuery {
    /// Start of the reported period, as [RFC 3339].
    ///
    /// Defaults to 30 days before the end.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub start_date: Option<String>,

    /// End of the reported period, as [RFC 3339].
    ///
    /// Defaults to now.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub end_date: Option<String>,
}

/// Revenue report over completed bookings.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    /// Summary of the reported period.
    pub summary: Summary,

    /// Rollup per parking lot, highest revenue first.
    pub revenue_by_parking: Vec<ParkingRevenue>,
}

/// Summary of a [`RevenueReport`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Total revenue over the period.
    pub total_revenue: MoneyValue,

    /// Number of completed bookings in the period.
    pub total_bookings: i64,

    /// Average revenue per completed booking.
    pub average_revenue: MoneyValue,

    /// Reported period.
    pub period: Period,
}

/// Reported period of a [`RevenueReport`].
#[derive(Clone, Debug, Serialize)]
pub struct Period {
    /// Start of the period, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub start: String,

    /// End of the period, as [RFC 3339].
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub end: String,
}

/// Revenue rollup of a single parking lot.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingRevenue {
    /// ID of the parking lot.
    pub parking_id: String,

    /// Name of the parking lot.
    pub parking_name: String,

    /// Revenue of the parking lot over the period.
    pub total_revenue: Decimal,

    /// Number of completed bookings on the parking lot.
    pub booking_count: i64,
}

impl From<read::report::ParkingRevenue> for ParkingRevenue {
    fn from(revenue: read::report::ParkingRevenue) -> Self {
        Self {
            parking_id: revenue.parking_id.to_string(),
            parking_name: revenue.name.to_string(),
            total_revenue: revenue.total.amount,
            booking_count: revenue.bookings,
        }
    }
}

/// `GET /api/admin/revenue` responding with the revenue report over the
/// requested period.
///
/// Administrator only.
async fn revenue(
    Extension(service): Extension<Service>,
    AdminSession(_): AdminSession,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<RevenueReport>, Error> {
    let RevenueQuery {
        start_date,
        end_date,
    } = query;

    let end = end_date
        .map(|s| api::parse_datetime(&s, "endDate"))
        .transpose()?
        .unwrap_or_else(DateTime::now);
    let start = start_date
        .map(|s| api::parse_datetime(&s, "startDate"))
        .transpose()?
        .unwrap_or_else(|| end - Duration::from_secs(30 * 24 * 60 * 60));
    if end <= start {
        return Err(Error::validation(
            "`endDate` must be after `startDate`",
        ));
    }

    let output = service
        .execute(report::Revenue { start, end })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(RevenueReport {
        summary: Summary {
            total_revenue: output.total.into(),
            total_bookings: output.bookings,
            average_revenue: output.average.into(),
            period: Period {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            },
        },
        revenue_by_parking: output
            .by_parking
            .into_iter()
            .map(ParkingRevenue::from)
            .collect(),
    }))
}
