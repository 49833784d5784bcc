//! QR material of a [`Booking`].

use std::time;

use common::{unit, DateTimeOf};
#[cfg(doc)]
use common::DateTime;
use derive_more::{AsRef, Display, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use super::Booking;
use super::StartDateTime;

/// QR material of a [`Booking`]: the token with its issue and expiry
/// [`DateTime`]s.
///
/// Immutable once issued for a [`Booking`].
#[derive(Clone, Debug)]
pub struct Qr {
    /// Opaque [`Token`] of this [`Qr`].
    pub token: Token,

    /// [`DateTime`] when this [`Qr`] was issued.
    pub issued_at: IssueDateTime,

    /// [`DateTime`] when this [`Qr`] expires.
    pub expires_at: ExpirationDateTime,
}

impl Qr {
    /// Issues a new [`Qr`] for a [`Booking`] starting at the provided
    /// [`DateTime`], valid for the `validity` window counted from that start.
    #[must_use]
    pub fn issue(starts_at: StartDateTime, validity: time::Duration) -> Self {
        Self {
            token: Token::generate(),
            issued_at: IssueDateTime::now(),
            expires_at: (starts_at + validity).coerce(),
        }
    }

    /// Reissues the [`Token`] of this [`Qr`], keeping its expiry.
    ///
    /// Only for recovering from a generated [`Token`] colliding with an
    /// existing one.
    #[must_use]
    pub fn regenerated(self) -> Self {
        Self {
            token: Token::generate(),
            ..self
        }
    }
}

/// Opaque token of a [`Qr`], proving the holder controls a specific
/// [`Booking`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, Into, PartialEq,
    Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Token(String);

impl Token {
    /// Length of a [`Token`] string representation.
    pub const LENGTH: usize = 32;

    /// Generates a new random [`Token`] out of 128 bits of OS entropy.
    ///
    /// Uniqueness across all [`Booking`]s is enforced by the storage, not
    /// here: a collision must be retried, never overwritten.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{:032x}", rand::random::<u128>()))
    }

    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }

    /// Creates a new [`Token`] if the given string is a valid representation.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        Self::check(&token).then_some(Self(token))
    }

    /// Checks whether the given string is a valid [`Token`] representation.
    fn check(token: impl AsRef<str>) -> bool {
        let token = token.as_ref();
        token.len() == Self::LENGTH
            && token.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

/// [`DateTime`] when a [`Qr`] was issued.
pub type IssueDateTime = DateTimeOf<(Qr, unit::Creation)>;

/// [`DateTime`] when a [`Qr`] expires.
pub type ExpirationDateTime = DateTimeOf<(Qr, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use super::{Qr, Token};

    #[test]
    fn token_is_128_bit_hex() {
        let token = Token::generate();
        let token: &str = token.as_ref();
        assert_eq!(token.len(), Token::LENGTH);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn token_validates_representation() {
        assert!(Token::new("a".repeat(32)).is_some());
        assert!(Token::new("A1B2".repeat(8)).is_some());
        assert!(Token::new("a".repeat(31)).is_none());
        assert!(Token::new("g".repeat(32)).is_none());
        assert!(Token::new("").is_none());
    }

    #[test]
    fn expiry_counts_from_the_booking_start() {
        let starts_at =
            DateTime::from_rfc3339("2030-06-01T10:00:00Z").unwrap();
        let qr = Qr::issue(starts_at.coerce(), Duration::from_secs(15 * 60));

        assert_eq!(
            qr.expires_at.coerce::<()>(),
            DateTime::from_rfc3339("2030-06-01T10:15:00Z").unwrap(),
        );
    }

    #[test]
    fn regeneration_changes_the_token_only() {
        let starts_at =
            DateTime::from_rfc3339("2030-06-01T10:00:00Z").unwrap();
        let qr = Qr::issue(starts_at.coerce(), Duration::from_secs(15 * 60));
        let expires_at = qr.expires_at;

        let reissued = qr.regenerated();
        assert_eq!(reissued.expires_at, expires_at);
    }
}
