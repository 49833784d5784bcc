//! [`Otp`] definitions.

use std::time;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rand::Rng as _;
use smart_default::SmartDefault;
use xxhash_rust::xxh3;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// One-time password-reset code issued to a [`User`].
///
/// Persisted, expiring record: a process-global code map wouldn't survive a
/// multi-instance deployment. Expiry is checked lazily on lookup and stale
/// rows are additionally evicted by a background task.
#[derive(Clone, Debug)]
pub struct Otp {
    /// [`Email`] this [`Otp`] was issued to.
    ///
    /// A single [`Otp`] per [`Email`] exists at a time: reissuing replaces
    /// the previous one.
    ///
    /// [`Email`]: user::Email
    pub email: user::Email,

    /// [`CodeHash`] of this [`Otp`].
    pub code_hash: CodeHash,

    /// [`DateTime`] when this [`Otp`] was issued.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Otp`] expires.
    pub expires_at: ExpirationDateTime,
}

/// [`Otp`] issuing configuration.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Time-to-live of an issued [`Otp`].
    #[default(time::Duration::from_secs(10 * 60))]
    pub ttl: time::Duration,
}

/// Plain one-time code, handed to the delivery channel and never persisted.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct Code(String);

impl Code {
    /// Number of digits in a [`Code`].
    pub const LENGTH: usize = 6;

    /// Generates a new random [`Code`].
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{:06}", rand::thread_rng().gen_range(0..1_000_000)))
    }

    /// Creates a new [`Code`] if the given string is a valid representation.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        (code.len() == Self::LENGTH
            && code.bytes().all(|b| b.is_ascii_digit()))
        .then_some(Self(code))
    }
}

/// Hash of a [`Code`], the only form a [`Code`] is stored in.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct CodeHash(String);

impl CodeHash {
    /// Creates a new [`CodeHash`] of the given [`Code`].
    #[must_use]
    pub fn new(code: &Code) -> Self {
        Self(format!(
            "{:032x}",
            xxh3::xxh3_128(<Code as AsRef<str>>::as_ref(code).as_bytes())
        ))
    }

    /// Checks whether the given [`Code`] matches this [`CodeHash`].
    #[must_use]
    pub fn matches(&self, code: &Code) -> bool {
        *self == Self::new(code)
    }
}

/// [`DateTime`] when an [`Otp`] was issued.
pub type CreationDateTime = DateTimeOf<(Otp, unit::Creation)>;

/// [`DateTime`] when an [`Otp`] expires.
pub type ExpirationDateTime = DateTimeOf<(Otp, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use super::{Code, CodeHash};

    #[test]
    fn code_is_six_digits() {
        let code = Code::generate();
        let code: &str = code.as_ref();
        assert_eq!(code.len(), Code::LENGTH);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));

        assert!(Code::new("042137").is_some());
        assert!(Code::new("42137").is_none());
        assert!(Code::new("42a137").is_none());
    }

    #[test]
    fn hash_matches_its_code_only() {
        let code = Code::new("042137").unwrap();
        let hash = CodeHash::new(&code);

        assert!(hash.matches(&code));
        assert!(!hash.matches(&Code::new("042138").unwrap()));
    }
}
