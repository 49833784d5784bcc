//! [`Rating`] left for a completed [`Booking`].

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

#[cfg(doc)]
use super::Booking;

/// Rating left for a completed [`Booking`].
///
/// Every dimension is optional and merged field-by-field: a repeated rating
/// refines the record instead of overwriting it wholesale.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Rating {
    /// [`Score`] of the parking lot itself.
    pub parking: Option<Score>,

    /// [`Score`] of the received service.
    pub service: Option<Score>,

    /// Overall [`Score`] of the experience.
    pub overall: Option<Score>,

    /// Free-text [`Feedback`].
    pub feedback: Option<Feedback>,
}

impl Rating {
    /// Merges the provided [`Rating`] into this one.
    ///
    /// Only the fields present in `new` are replaced.
    pub fn merge(&mut self, new: Self) {
        let Self {
            parking,
            service,
            overall,
            feedback,
        } = new;

        if parking.is_some() {
            self.parking = parking;
        }
        if service.is_some() {
            self.service = service;
        }
        if overall.is_some() {
            self.overall = overall;
        }
        if feedback.is_some() {
            self.feedback = feedback;
        }
    }

    /// Indicates whether no dimension of this [`Rating`] is filled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parking.is_none()
            && self.service.is_none()
            && self.overall.is_none()
            && self.feedback.is_none()
    }
}

/// Single 1 to 5 score of a [`Rating`] dimension.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub struct Score(u8);

impl Score {
    /// Creates a new [`Score`] if the given value is within the 1 to 5
    /// range.
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self(value))
    }

    /// Returns the value of this [`Score`].
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Free-text feedback of a [`Rating`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Feedback(String);

impl Feedback {
    /// Creates a new [`Feedback`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `feedback` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(feedback: impl Into<String>) -> Self {
        Self(feedback.into())
    }

    /// Creates a new [`Feedback`] if the given `feedback` is valid.
    #[must_use]
    pub fn new(feedback: impl Into<String>) -> Option<Self> {
        let feedback = feedback.into();
        Self::check(&feedback).then_some(Self(feedback))
    }

    /// Checks whether the given `feedback` is a valid [`Feedback`].
    fn check(feedback: impl AsRef<str>) -> bool {
        let feedback = feedback.as_ref();
        feedback.trim() == feedback
            && !feedback.is_empty()
            && feedback.len() <= 500
    }
}

impl FromStr for Feedback {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Feedback`")
    }
}

#[cfg(test)]
mod spec {
    use super::{Feedback, Rating, Score};

    #[test]
    fn score_is_bounded() {
        assert!(Score::new(0).is_none());
        assert!(Score::new(1).is_some());
        assert!(Score::new(5).is_some());
        assert!(Score::new(6).is_none());
    }

    #[test]
    fn feedback_is_bounded() {
        assert!(Feedback::new("Spot was easy to find").is_some());
        assert!(Feedback::new("").is_none());
        assert!(Feedback::new(" padded ").is_none());
        assert!(Feedback::new("a".repeat(500)).is_some());
        assert!(Feedback::new("a".repeat(501)).is_none());
    }

    #[test]
    fn merge_keeps_absent_dimensions() {
        let mut rating = Rating {
            parking: Score::new(4),
            service: None,
            overall: Score::new(5),
            feedback: None,
        };

        rating.merge(Rating {
            parking: None,
            service: Score::new(3),
            overall: None,
            feedback: Feedback::new("ok"),
        });

        assert_eq!(rating.parking, Score::new(4));
        assert_eq!(rating.service, Score::new(3));
        assert_eq!(rating.overall, Score::new(5));
        assert_eq!(rating.feedback, Feedback::new("ok"));
    }
}
