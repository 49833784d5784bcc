//! Reporting read model definitions.

use common::Money;

use crate::domain::parking;
#[cfg(doc)]
use crate::domain::{Booking, Parking};

/// Revenue rollup of a single [`Parking`] over completed [`Booking`]s.
#[derive(Clone, Debug)]
pub struct ParkingRevenue {
    /// ID of the [`Parking`].
    pub parking_id: parking::Id,

    /// [`parking::Name`] of the [`Parking`].
    pub name: parking::Name,

    /// Sum of completed [`Booking`] totals on this [`Parking`].
    pub total: Money,

    /// Number of completed [`Booking`]s on this [`Parking`].
    pub bookings: i64,
}
