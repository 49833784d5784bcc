//! Domain definitions.

pub mod booking;
pub mod parking;
pub mod user;
pub mod vehicle;

pub use self::{
    booking::Booking, parking::Parking, user::User, vehicle::Vehicle,
};
