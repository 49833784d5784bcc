//! [`Payment`] sub-record of a [`Booking`].

use common::{define_kind, unit, DateTimeOf, Money};
#[cfg(doc)]
use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

#[cfg(doc)]
use super::Booking;

/// Payment sub-record of a [`Booking`].
///
/// Settled at the exit terminal, outside of this system: check-out only
/// fills the final [`amount`].
///
/// [`amount`]: Payment::amount
#[derive(Clone, Debug)]
pub struct Payment {
    /// Current [`Status`] of this [`Payment`].
    pub status: Status,

    /// [`Method`] this [`Payment`] is to be made with.
    pub method: Method,

    /// ID of the transaction this [`Payment`] was settled in, if any.
    pub transaction_id: Option<TransactionId>,

    /// [`DateTime`] when this [`Payment`] was settled, if it was.
    pub paid_at: Option<SettlementDateTime>,

    /// Final amount of this [`Payment`], filled at check-out.
    pub amount: Option<Money>,
}

impl Default for Payment {
    fn default() -> Self {
        Self {
            status: Status::Pending,
            method: Method::Card,
            transaction_id: None,
            paid_at: None,
            amount: None,
        }
    }
}

define_kind! {
    #[doc = "Status of a [`Payment`]."]
    enum Status {
        #[doc = "[`Payment`] is not settled yet."]
        Pending = 1,

        #[doc = "[`Payment`] is settled."]
        Paid = 2,

        #[doc = "[`Payment`] failed."]
        Failed = 3,

        #[doc = "[`Payment`] was refunded."]
        Refunded = 4,
    }
}

define_kind! {
    #[doc = "Method of a [`Payment`]."]
    enum Method {
        #[doc = "[`Payment`] by a bank card."]
        Card = 1,

        #[doc = "[`Payment`] in cash."]
        Cash = 2,

        #[doc = "[`Payment`] from an in-app wallet."]
        Wallet = 3,
    }
}

/// ID of a transaction a [`Payment`] was settled in.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct TransactionId(String);

/// [`DateTime`] when a [`Payment`] was settled.
pub type SettlementDateTime = DateTimeOf<(Payment, unit::Completion)>;
