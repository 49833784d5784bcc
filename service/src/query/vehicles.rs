//! [`Query`] collection related to [`Vehicle`]s.

use common::operations::By;

use crate::domain::{user, vehicle, Vehicle};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Vehicle`] by its [`vehicle::Id`].
pub type ById = DatabaseQuery<By<Option<Vehicle>, vehicle::Id>>;

/// Queries all non-deleted [`Vehicle`]s of a [`User`], newest first.
///
/// [`User`]: crate::domain::User
pub type ByOwner = DatabaseQuery<By<Vec<Vehicle>, user::Id>>;
