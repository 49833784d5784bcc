//! [`Query`] collection related to a single [`Booking`].

use common::operations::By;

use crate::{
    domain::{booking, Booking},
    read::booking::Scannable,
};
#[cfg(doc)]
use crate::{domain::booking::qr, Query};

use super::DatabaseQuery;

/// Queries a [`Booking`] by its [`booking::Id`].
pub type ById = DatabaseQuery<By<Option<Booking>, booking::Id>>;

/// Queries a [`Scannable`] [`Booking`] by its [`qr::Token`].
///
/// The lookup is validity-scoped: an expired token, or a [`Booking`] past
/// the scannable statuses, resolves to nothing.
pub type ByQrToken<'t> = DatabaseQuery<
    By<Option<Scannable<Booking>>, &'t booking::qr::Token>,
>;
