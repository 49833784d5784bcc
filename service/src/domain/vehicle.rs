//! [`Vehicle`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Vehicle registered by a [`User`].
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// ID of this [`Vehicle`].
    pub id: Id,

    /// ID of the [`User`] owning this [`Vehicle`].
    pub owner_id: user::Id,

    /// [`LicensePlate`] of this [`Vehicle`].
    ///
    /// Unique among the owner's non-deleted [`Vehicle`]s.
    pub license_plate: LicensePlate,

    /// [`Make`] of this [`Vehicle`].
    pub make: Make,

    /// [`Model`] of this [`Vehicle`].
    pub model: Model,

    /// [`Year`] this [`Vehicle`] was produced in.
    pub year: Year,

    /// [`Color`] of this [`Vehicle`].
    pub color: Color,

    /// [`Kind`] of this [`Vehicle`].
    pub kind: Kind,

    /// [`DateTime`] when this [`Vehicle`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Vehicle`] was deleted, if it was.
    pub deleted_at: Option<DeletionDateTime>,
}

/// ID of a [`Vehicle`].
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

define_kind! {
    #[doc = "Kind of a [`Vehicle`]."]
    enum Kind {
        #[doc = "A car."]
        Car = 1,

        #[doc = "A motorcycle."]
        Motorcycle = 2,

        #[doc = "A truck."]
        Truck = 3,

        #[doc = "A van."]
        Van = 4,

        #[doc = "An electric vehicle."]
        Electric = 5,

        #[doc = "A hybrid vehicle."]
        Hybrid = 6,
    }
}

/// License plate of a [`Vehicle`], in the Tunisian format.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct LicensePlate(String);

impl LicensePlate {
    /// Creates a new [`LicensePlate`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `plate` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(plate: impl Into<String>) -> Self {
        Self(plate.into())
    }

    /// Creates a new [`LicensePlate`] if the given `plate` is valid.
    #[must_use]
    pub fn new(plate: impl Into<String>) -> Option<Self> {
        let plate = plate.into();
        Self::check(&plate).then_some(Self(plate))
    }

    /// Checks whether the given `plate` is a valid [`LicensePlate`].
    fn check(plate: impl AsRef<str>) -> bool {
        /// Regular expression checking [`LicensePlate`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[0-9]{1,3}\s?[A-Z]{1,3}\s?[0-9]{1,4}$")
                .expect("valid regex")
        });

        REGEX.is_match(plate.as_ref())
    }
}

impl FromStr for LicensePlate {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `LicensePlate`")
    }
}

/// Make of a [`Vehicle`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Make(String);

impl Make {
    /// Creates a new [`Make`] if the given `make` is valid.
    #[must_use]
    pub fn new(make: impl Into<String>) -> Option<Self> {
        let make = make.into();
        Self::check(&make).then_some(Self(make))
    }

    /// Checks whether the given `make` is a valid [`Make`].
    fn check(make: impl AsRef<str>) -> bool {
        let make = make.as_ref();
        make.trim() == make && !make.is_empty() && make.len() <= 50
    }
}

impl FromStr for Make {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Make`")
    }
}

/// Model of a [`Vehicle`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Model(String);

impl Model {
    /// Creates a new [`Model`] if the given `model` is valid.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Option<Self> {
        let model = model.into();
        Self::check(&model).then_some(Self(model))
    }

    /// Checks whether the given `model` is a valid [`Model`].
    fn check(model: impl AsRef<str>) -> bool {
        let model = model.as_ref();
        model.trim() == model && !model.is_empty() && model.len() <= 50
    }
}

impl FromStr for Model {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Model`")
    }
}

/// Production year of a [`Vehicle`].
#[derive(Clone, Copy, Debug, Display, Eq, Ord, PartialEq, PartialOrd)]
pub struct Year(u16);

impl Year {
    /// The earliest accepted [`Year`].
    pub const MIN: Self = Self(1900);

    /// Creates a new [`Year`] if the given value is not before [`MIN`].
    ///
    /// [`MIN`]: Year::MIN
    #[must_use]
    pub fn new(value: u16) -> Option<Self> {
        (value >= Self::MIN.0).then_some(Self(value))
    }

    /// Returns the value of this [`Year`].
    #[must_use]
    pub fn get(self) -> u16 {
        self.0
    }
}

/// Color of a [`Vehicle`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Color(String);

impl Color {
    /// Creates a new [`Color`] if the given `color` is valid.
    #[must_use]
    pub fn new(color: impl Into<String>) -> Option<Self> {
        let color = color.into();
        Self::check(&color).then_some(Self(color))
    }

    /// Checks whether the given `color` is a valid [`Color`].
    fn check(color: impl AsRef<str>) -> bool {
        let color = color.as_ref();
        color.trim() == color && !color.is_empty() && color.len() <= 30
    }
}

impl FromStr for Color {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Color`")
    }
}

/// [`DateTime`] when a [`Vehicle`] was created.
pub type CreationDateTime = DateTimeOf<(Vehicle, unit::Creation)>;

/// [`DateTime`] when a [`Vehicle`] was deleted.
pub type DeletionDateTime = DateTimeOf<(Vehicle, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use super::LicensePlate;

    #[test]
    fn license_plate_format() {
        assert!(LicensePlate::new("123 TN 4567").is_some());
        assert!(LicensePlate::new("1TN1").is_some());
        assert!(LicensePlate::new("123TN4567").is_some());
        assert!(LicensePlate::new("TN 4567").is_none());
        assert!(LicensePlate::new("123 tn 4567").is_none());
        assert!(LicensePlate::new("").is_none());
    }
}
