//! [`Query`] collection related to multiple [`Parking`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Parking, Query};

use super::DatabaseQuery;

/// Queries a list of [`Parking`]s.
pub type List = DatabaseQuery<
    By<read::parking::list::Page, read::parking::list::Selector>,
>;
