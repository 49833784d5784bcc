//! Background [`Task`]s definitions.

mod background;
pub mod evict_expired_otps;

pub use common::Handler as Task;

pub use self::{
    background::Background, evict_expired_otps::EvictExpiredOtps,
};
