//! [`Booking`] read model definitions.

use crate::domain::{booking, parking};
#[cfg(doc)]
use crate::domain::Booking;

/// Wrapper around a [`Booking`] indicating that it [`is_scannable()`]: its
/// QR token is not expired yet and its status still admits a scan.
///
/// [`is_scannable()`]: Booking::is_scannable
#[derive(Clone, Copy, Debug)]
pub struct Scannable<T>(pub T);

/// Indicator of a conflicting [`Booking`] existing on a lot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Conflicting(pub bool);

/// Selector of [`Booking`]s conflicting with a requested `[starts_at,
/// ends_at)` interval on a lot.
///
/// Intervals are half-open: a [`Booking`] ending exactly when another one
/// starts doesn't conflict with it.
#[derive(Clone, Copy, Debug)]
pub struct ConflictScan {
    /// ID of the lot to scan.
    pub parking_id: parking::Id,

    /// Start of the requested interval.
    pub starts_at: booking::StartDateTime,

    /// End of the requested interval.
    pub ends_at: booking::EndDateTime,
}

impl ConflictScan {
    /// Checks whether an existing [`Booking`] interval intersects the
    /// scanned one under half-open semantics.
    #[must_use]
    pub fn intersects(
        &self,
        starts_at: booking::StartDateTime,
        ends_at: booking::EndDateTime,
    ) -> bool {
        starts_at < self.ends_at.coerce() && ends_at > self.starts_at.coerce()
    }
}

/// Number of live [`Booking`]s referencing an entity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LiveCount(pub i64);

pub mod list {
    //! [`Booking`]s list definitions.

    use common::pagination;

    use crate::domain::{booking, user, Booking};

    /// Single page of [`Booking`]s.
    pub type Page = pagination::Page<Booking>;

    /// Selector of a [`Page`].
    pub type Selector = pagination::Selector<Filter>;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug)]
    pub struct Filter {
        /// ID of the [`User`] whose [`Booking`]s are listed.
        ///
        /// [`User`]: crate::domain::User
        pub user_id: user::Id,

        /// [`booking::Status`] to narrow the list to, if any.
        pub status: Option<booking::Status>,
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::parking;

    use super::ConflictScan;

    fn at(rfc3339: &str) -> DateTime {
        DateTime::from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn half_open_intersection() {
        let scan = ConflictScan {
            parking_id: parking::Id::new(),
            starts_at: at("2025-06-01T10:00:00Z").coerce(),
            ends_at: at("2025-06-01T12:00:00Z").coerce(),
        };

        // [11:00, 13:00) overlaps [10:00, 12:00).
        assert!(scan.intersects(
            at("2025-06-01T11:00:00Z").coerce(),
            at("2025-06-01T13:00:00Z").coerce(),
        ));

        // [12:00, 14:00) only touches the boundary.
        assert!(!scan.intersects(
            at("2025-06-01T12:00:00Z").coerce(),
            at("2025-06-01T14:00:00Z").coerce(),
        ));

        // [08:00, 10:00) only touches the boundary.
        assert!(!scan.intersects(
            at("2025-06-01T08:00:00Z").coerce(),
            at("2025-06-01T10:00:00Z").coerce(),
        ));

        // [09:00, 13:00) engulfs the scanned interval.
        assert!(scan.intersects(
            at("2025-06-01T09:00:00Z").coerce(),
            at("2025-06-01T13:00:00Z").coerce(),
        ));
    }
}
