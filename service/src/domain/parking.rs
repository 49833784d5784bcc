//! [`Parking`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xxhash_rust::xxh3;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::{Booking, User};

/// Parking lot with a fixed spot capacity.
#[derive(Clone, Debug)]
pub struct Parking {
    /// ID of this [`Parking`].
    pub id: Id,

    /// [`Hash`] of this [`Parking`] used for deduplication.
    ///
    /// [`Hash`]: struct@Hash
    pub hash: Hash,

    /// [`Name`] of this [`Parking`].
    pub name: Name,

    /// [`Description`] of this [`Parking`], if any.
    pub description: Option<Description>,

    /// [`Street`] this [`Parking`] is located at.
    pub street: Street,

    /// [`City`] this [`Parking`] is located in.
    pub city: City,

    /// [`ZipCode`] of this [`Parking`], if any.
    pub zip_code: Option<ZipCode>,

    /// [`Country`] this [`Parking`] is located in.
    pub country: Country,

    /// Total number of spots of this [`Parking`].
    pub total_spots: TotalSpots,

    /// Number of currently free spots of this [`Parking`].
    ///
    /// Mutated exclusively through the [`AdjustAvailability`] operation,
    /// never set directly.
    pub available_spots: AvailableSpots,

    /// [`Rates`] of this [`Parking`].
    pub rates: Rates,

    /// Indicator whether this [`Parking`] accepts new [`Booking`]s.
    pub is_active: bool,

    /// ID of the [`User`] owning this [`Parking`].
    pub owner_id: user::Id,

    /// [`DateTime`] when this [`Parking`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Parking`] was deleted, if it was.
    pub deleted_at: Option<DeletionDateTime>,
}

impl Parking {
    /// Indicates whether this [`Parking`] can accept one more [`Booking`]
    /// right now.
    #[must_use]
    pub fn has_free_spot(&self) -> bool {
        self.is_active && self.available_spots.get() > 0
    }
}

/// ID of a [`Parking`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Hash of a [`Parking`] used for deduplication.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Hash(Uuid);

impl Hash {
    /// Calculates a new [`Hash`] for a [`Parking`].
    ///
    /// [`Hash`]: struct@Hash
    #[must_use]
    pub fn new(
        name: &Name,
        street: &Street,
        city: &City,
        zip_code: Option<&ZipCode>,
        country: &Country,
    ) -> Self {
        use std::hash::Hash as _;

        // WARNING: Avoid changing the order of the fields in the hasher,
        //          because it will be a breaking change requiring to migrate
        //          all existing hashes in the database to the new format.
        let mut hasher = xxh3::Xxh3Builder::new().build();
        name.hash(&mut hasher);
        street.hash(&mut hasher);
        city.hash(&mut hasher);
        zip_code.hash(&mut hasher);
        country.hash(&mut hasher);

        Self(Uuid::from_u128(hasher.digest128()))
    }
}

/// Total number of spots of a [`Parking`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub struct TotalSpots(u16);

impl TotalSpots {
    /// Creates a new [`TotalSpots`] if the given value is at least 1.
    #[must_use]
    pub fn new(value: u16) -> Option<Self> {
        (value >= 1).then_some(Self(value))
    }

    /// Returns the value of this [`TotalSpots`].
    #[must_use]
    pub fn get(self) -> u16 {
        self.0
    }
}

/// Number of currently free spots of a [`Parking`].
///
/// Always kept within `[0, total_spots]`.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub struct AvailableSpots(u16);

impl AvailableSpots {
    /// Creates new [`AvailableSpots`] if the given value doesn't exceed the
    /// provided [`TotalSpots`].
    #[must_use]
    pub fn new(value: u16, total: TotalSpots) -> Option<Self> {
        (value <= total.get()).then_some(Self(value))
    }

    /// Creates new [`AvailableSpots`] matching the provided [`TotalSpots`],
    /// representing a completely free [`Parking`].
    #[must_use]
    pub fn all_of(total: TotalSpots) -> Self {
        Self(total.get())
    }

    /// Returns these [`AvailableSpots`] adjusted by the provided delta.
    ///
    /// The result is clamped into `[0, total]` instead of rejecting an
    /// out-of-range delta: the counter absorbs over-adjustment without ever
    /// breaking its bounds.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn adjusted(self, delta: i32, total: TotalSpots) -> Self {
        let adjusted = i32::from(self.0) + delta;
        Self(
            u16::try_from(adjusted.clamp(0, i32::from(total.get())))
                .expect("clamped into `u16` range"),
        )
    }

    /// Returns the value of these [`AvailableSpots`].
    #[must_use]
    pub fn get(self) -> u16 {
        self.0
    }
}

/// Name of a [`Parking`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 100
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Description of a [`Parking`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `description` is not empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(description: impl Into<String>) -> Self {
        Self(description.into())
    }

    /// Creates a new [`Description`] if the given `description` is valid.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Option<Self> {
        let description = description.into();
        Self::check(&description).then_some(Self(description))
    }

    /// Checks whether the given `description` is a valid [`Description`].
    fn check(description: impl AsRef<str>) -> bool {
        let description = description.as_ref();
        description.trim() == description
            && !description.is_empty()
            && description.len() <= 500
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// Street a [`Parking`] is located at.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(forward)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Street(String);

impl Street {
    /// Creates a new [`Street`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `street` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(street: impl Into<String>) -> Self {
        Self(street.into())
    }

    /// Creates a new [`Street`] if the given `street` is valid.
    #[must_use]
    pub fn new(street: impl Into<String>) -> Option<Self> {
        let street = street.into();
        Self::check(&street).then_some(Self(street))
    }

    /// Checks whether the given `street` is a valid [`Street`].
    fn check(street: impl AsRef<str>) -> bool {
        let street = street.as_ref();
        street.trim() == street && !street.is_empty() && street.len() <= 512
    }
}

impl FromStr for Street {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Street`")
    }
}

/// City a [`Parking`] is located in.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(forward)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct City(String);

impl City {
    /// Creates a new [`City`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `city` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(city: impl Into<String>) -> Self {
        Self(city.into())
    }

    /// Creates a new [`City`] if the given `city` is valid.
    #[must_use]
    pub fn new(city: impl Into<String>) -> Option<Self> {
        let city = city.into();
        Self::check(&city).then_some(Self(city))
    }

    /// Checks whether the given `city` is a valid [`City`].
    fn check(city: impl AsRef<str>) -> bool {
        let city = city.as_ref();
        city.trim() == city && !city.is_empty() && city.len() <= 512
    }
}

impl FromStr for City {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `City`")
    }
}

/// Zip code of a [`Parking`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(forward)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ZipCode(String);

impl ZipCode {
    /// Creates a new [`ZipCode`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `zip_code` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(zip_code: impl Into<String>) -> Self {
        Self(zip_code.into())
    }

    /// Creates a new [`ZipCode`] if the given `zip_code` is valid.
    #[must_use]
    pub fn new(zip_code: impl Into<String>) -> Option<Self> {
        let zip_code = zip_code.into();
        Self::check(&zip_code).then_some(Self(zip_code))
    }

    /// Checks whether the given `zip_code` is a valid [`ZipCode`].
    fn check(zip_code: impl AsRef<str>) -> bool {
        let zip_code = zip_code.as_ref();
        !zip_code.is_empty()
            && zip_code.len() <= 16
            && zip_code
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b' ' || b == b'-')
    }
}

impl FromStr for ZipCode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ZipCode`")
    }
}

/// Country a [`Parking`] is located in.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(forward)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Country(String);

impl Country {
    /// Creates a new [`Country`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `country` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(country: impl Into<String>) -> Self {
        Self(country.into())
    }

    /// Creates a new [`Country`] if the given `country` is valid.
    #[must_use]
    pub fn new(country: impl Into<String>) -> Option<Self> {
        let country = country.into();
        Self::check(&country).then_some(Self(country))
    }

    /// Checks whether the given `country` is a valid [`Country`].
    fn check(country: impl AsRef<str>) -> bool {
        let country = country.as_ref();
        country.trim() == country && !country.is_empty() && country.len() <= 512
    }
}

impl FromStr for Country {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Country`")
    }
}

/// Pricing rates of a [`Parking`], per billing granularity.
#[derive(Clone, Copy, Debug)]
pub struct Rates {
    /// Rate per hour.
    ///
    /// The only rate the pricing engine bills with.
    pub hourly: Money,

    /// Rate per day, if offered.
    pub daily: Option<Money>,

    /// Rate per month, if offered.
    pub monthly: Option<Money>,
}

/// Operation of adjusting the [`AvailableSpots`] counter of a [`Parking`].
///
/// Persisted as a single atomic conditional update, clamping the result into
/// `[0, total_spots]`.
#[derive(Clone, Copy, Debug)]
pub struct AdjustAvailability {
    /// ID of the [`Parking`] to adjust.
    pub id: Id,

    /// Delta to adjust the [`AvailableSpots`] by.
    pub delta: i32,
}

/// [`DateTime`] when a [`Parking`] was created.
pub type CreationDateTime = DateTimeOf<(Parking, unit::Creation)>;

/// [`DateTime`] when a [`Parking`] was deleted.
pub type DeletionDateTime = DateTimeOf<(Parking, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use super::{AvailableSpots, TotalSpots};

    #[test]
    fn total_spots_require_at_least_one() {
        assert!(TotalSpots::new(0).is_none());
        assert!(TotalSpots::new(1).is_some());
    }

    #[test]
    fn adjustment_is_clamped_into_bounds() {
        let total = TotalSpots::new(5).unwrap();
        let mut spots = AvailableSpots::new(0, total).unwrap();

        for _ in 0..3 {
            spots = spots.adjusted(1, total);
        }
        assert_eq!(spots.get(), 3);

        spots = spots.adjusted(-10, total);
        assert_eq!(spots.get(), 0);

        spots = spots.adjusted(100, total);
        assert_eq!(spots.get(), 5);
    }

    #[test]
    fn full_capacity_helper() {
        let total = TotalSpots::new(3).unwrap();
        assert_eq!(AvailableSpots::all_of(total).get(), 3);
        assert!(AvailableSpots::new(4, total).is_none());
    }
}
