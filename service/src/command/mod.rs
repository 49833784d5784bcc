//! [`Command`] definition.

pub mod authorize_user_session;
pub mod cancel_booking;
pub mod check_in_booking;
pub mod check_out_booking;
pub mod confirm_booking;
pub mod create_booking;
pub mod create_parking;
pub mod create_user;
pub mod create_user_session;
pub mod create_vehicle;
pub mod delete_vehicle;
pub mod mark_booking_no_show;
pub mod rate_booking;
pub mod request_password_reset;
pub mod reset_password;
pub mod validate_booking;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    cancel_booking::CancelBooking, check_in_booking::CheckInBooking,
    check_out_booking::CheckOutBooking, confirm_booking::ConfirmBooking,
    create_booking::CreateBooking, create_parking::CreateParking,
    create_user::CreateUser, create_user_session::CreateUserSession,
    create_vehicle::CreateVehicle, delete_vehicle::DeleteVehicle,
    mark_booking_no_show::MarkBookingNoShow, rate_booking::RateBooking,
    request_password_reset::RequestPasswordReset,
    reset_password::ResetPassword, validate_booking::ValidateBooking,
};

#[cfg(test)]
mod spec {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex, MutexGuard},
        time::Duration,
    };

    use common::{
        operations::{
            By, Commit, Insert, Lock, Perform, Select, Transact, Update,
        },
        DateTime, Money,
    };
    use tracerr::Traced;

    use crate::{
        domain::{
            booking::{self, qr, BillableHours, Qr, Quote},
            parking, vehicle, user, Booking, Parking, Vehicle,
        },
        infra::{database, Database},
        read::booking::{Conflicting, ConflictScan, Scannable},
        Config, Service,
    };

    use super::{
        cancel_booking, check_in_booking, check_out_booking, create_booking,
        CancelBooking, CheckInBooking, CheckOutBooking, Command as _,
        CreateBooking,
    };

    /// In-memory [`Database`] good enough for driving the state machine.
    #[derive(Clone, Debug, Default)]
    struct FakeDb(Arc<Mutex<State>>);

    #[derive(Debug, Default)]
    struct State {
        bookings: HashMap<booking::Id, Booking>,
        parkings: HashMap<parking::Id, Parking>,
        vehicles: HashMap<vehicle::Id, Vehicle>,
    }

    impl FakeDb {
        fn state(&self) -> MutexGuard<'_, State> {
            self.0.lock().unwrap()
        }

        fn available_spots(&self, id: parking::Id) -> u16 {
            self.state().parkings[&id].available_spots.get()
        }
    }

    type NoError = Traced<database::Error>;

    impl Database<Transact> for FakeDb {
        type Ok = Self;
        type Err = NoError;

        async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
            Ok(self.clone())
        }
    }

    impl Database<Commit> for FakeDb {
        type Ok = ();
        type Err = NoError;

        async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
            Ok(())
        }
    }

    impl Database<Lock<By<Parking, parking::Id>>> for FakeDb {
        type Ok = ();
        type Err = NoError;

        async fn execute(
            &self,
            _: Lock<By<Parking, parking::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(())
        }
    }

    impl Database<Lock<By<Booking, booking::Id>>> for FakeDb {
        type Ok = ();
        type Err = NoError;

        async fn execute(
            &self,
            _: Lock<By<Booking, booking::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(())
        }
    }

    impl Database<Select<By<Option<Parking>, parking::Id>>> for FakeDb {
        type Ok = Option<Parking>;
        type Err = NoError;

        async fn execute(
            &self,
            Select(by): Select<By<Option<Parking>, parking::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(self.state().parkings.get(&by.into_inner()).cloned())
        }
    }

    impl Database<Select<By<Option<Vehicle>, vehicle::Id>>> for FakeDb {
        type Ok = Option<Vehicle>;
        type Err = NoError;

        async fn execute(
            &self,
            Select(by): Select<By<Option<Vehicle>, vehicle::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(self.state().vehicles.get(&by.into_inner()).cloned())
        }
    }

    impl Database<Select<By<Option<Booking>, booking::Id>>> for FakeDb {
        type Ok = Option<Booking>;
        type Err = NoError;

        async fn execute(
            &self,
            Select(by): Select<By<Option<Booking>, booking::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(self.state().bookings.get(&by.into_inner()).cloned())
        }
    }

    impl<'t> Database<Select<By<Option<Booking>, &'t qr::Token>>> for FakeDb {
        type Ok = Option<Booking>;
        type Err = NoError;

        async fn execute(
            &self,
            Select(by): Select<By<Option<Booking>, &'t qr::Token>>,
        ) -> Result<Self::Ok, Self::Err> {
            let token = by.into_inner();
            Ok(self
                .state()
                .bookings
                .values()
                .find(|b| b.qr.token == *token)
                .cloned())
        }
    }

    impl<'t> Database<Select<By<Option<Scannable<Booking>>, &'t qr::Token>>>
        for FakeDb
    {
        type Ok = Option<Scannable<Booking>>;
        type Err = NoError;

        async fn execute(
            &self,
            Select(by): Select<By<Option<Scannable<Booking>>, &'t qr::Token>>,
        ) -> Result<Self::Ok, Self::Err> {
            let token = by.into_inner();
            let now = DateTime::now();
            Ok(self
                .state()
                .bookings
                .values()
                .find(|b| b.qr.token == *token && b.is_scannable(now))
                .cloned()
                .map(Scannable))
        }
    }

    impl Database<Select<By<Conflicting, ConflictScan>>> for FakeDb {
        type Ok = Conflicting;
        type Err = NoError;

        async fn execute(
            &self,
            Select(by): Select<By<Conflicting, ConflictScan>>,
        ) -> Result<Self::Ok, Self::Err> {
            let scan = by.into_inner();
            Ok(Conflicting(self.state().bookings.values().any(|b| {
                b.parking_id == scan.parking_id
                    && matches!(
                        b.status,
                        booking::Status::Confirmed | booking::Status::Active,
                    )
                    && scan.intersects(b.starts_at, b.ends_at)
            })))
        }
    }

    impl Database<Insert<Booking>> for FakeDb {
        type Ok = ();
        type Err = NoError;

        async fn execute(
            &self,
            Insert(booking): Insert<Booking>,
        ) -> Result<Self::Ok, Self::Err> {
            drop(self.state().bookings.insert(booking.id, booking));
            Ok(())
        }
    }

    impl Database<Update<Booking>> for FakeDb {
        type Ok = ();
        type Err = NoError;

        async fn execute(
            &self,
            Update(booking): Update<Booking>,
        ) -> Result<Self::Ok, Self::Err> {
            drop(self.state().bookings.insert(booking.id, booking));
            Ok(())
        }
    }

    impl Database<Perform<parking::AdjustAvailability>> for FakeDb {
        type Ok = parking::AvailableSpots;
        type Err = NoError;

        async fn execute(
            &self,
            Perform(adjust): Perform<parking::AdjustAvailability>,
        ) -> Result<Self::Ok, Self::Err> {
            let mut state = self.state();
            let parking =
                state.parkings.get_mut(&adjust.id).expect("parking seeded");
            parking.available_spots = parking
                .available_spots
                .adjusted(adjust.delta, parking.total_spots);
            Ok(parking.available_spots)
        }
    }

    fn service(db: FakeDb) -> Service<FakeDb> {
        Service {
            config: Config {
                jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(
                    b"test",
                ),
                jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                    b"test",
                ),
                booking: booking::Policy::default(),
                otp: Default::default(),
                evict_expired_otps: Default::default(),
            },
            database: db,
        }
    }

    fn tnd(amount: &str) -> Money {
        Money {
            amount: amount.parse().unwrap(),
            currency: common::money::Currency::Tnd,
        }
    }

    fn seed_parking(db: &FakeDb, total: u16, available: u16) -> parking::Id {
        let total_spots = parking::TotalSpots::new(total).unwrap();
        let parking = Parking {
            id: parking::Id::new(),
            hash: parking::Hash::new(
                &parking::Name::new("Lac 2 Central").unwrap(),
                &parking::Street::new("Rue du Lac").unwrap(),
                &parking::City::new("Tunis").unwrap(),
                None,
                &parking::Country::new("Tunisia").unwrap(),
            ),
            name: parking::Name::new("Lac 2 Central").unwrap(),
            description: None,
            street: parking::Street::new("Rue du Lac").unwrap(),
            city: parking::City::new("Tunis").unwrap(),
            zip_code: None,
            country: parking::Country::new("Tunisia").unwrap(),
            total_spots,
            available_spots: parking::AvailableSpots::new(
                available,
                total_spots,
            )
            .unwrap(),
            rates: parking::Rates {
                hourly: tnd("2.5"),
                daily: None,
                monthly: None,
            },
            is_active: true,
            owner_id: user::Id::new(),
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };
        let id = parking.id;
        drop(db.state().parkings.insert(id, parking));
        id
    }

    fn seed_booking(
        db: &FakeDb,
        parking_id: parking::Id,
        status: booking::Status,
        starts_in: Duration,
        lasts: Duration,
    ) -> Booking {
        let now = DateTime::now();
        let starts_at: booking::StartDateTime = (now + starts_in).coerce();
        let ends_at: booking::EndDateTime =
            (now + starts_in + lasts).coerce();
        let hours =
            BillableHours::between(starts_at.coerce(), ends_at.coerce());
        let policy = booking::Policy::default();
        let booking = Booking {
            id: booking::Id::new(),
            user_id: user::Id::new(),
            parking_id,
            vehicle_id: None,
            kind: booking::Kind::Hourly,
            starts_at,
            ends_at,
            duration: booking::Duration::of(lasts)
                .with_billable_hours(hours),
            pricing: Quote::calculate(tnd("2.5"), hours, policy.tax),
            status,
            qr: Qr::issue(starts_at, policy.qr_validity),
            checked_in_at: None,
            checked_out_at: None,
            validation: None,
            payment: booking::Payment::default(),
            cancellation: None,
            rating: booking::Rating::default(),
            created_at: now.coerce(),
        };
        drop(db.state().bookings.insert(booking.id, booking.clone()));
        booking
    }

    const HOUR: Duration = Duration::from_secs(60 * 60);

    #[tokio::test]
    async fn create_rejects_overlapping_interval() {
        let db = FakeDb::default();
        let svc = service(db.clone());
        let parking_id = seed_parking(&db, 5, 5);
        let existing = seed_booking(
            &db,
            parking_id,
            booking::Status::Confirmed,
            10 * HOUR,
            2 * HOUR,
        );

        // Overlaps the back half of the existing one.
        let res = svc
            .execute(CreateBooking {
                user_id: user::Id::new(),
                parking_id,
                vehicle_id: None,
                kind: booking::Kind::Hourly,
                starts_at: (existing.starts_at + HOUR).coerce(),
                ends_at: (existing.ends_at + HOUR).coerce(),
            })
            .await;
        assert!(matches!(
            res.unwrap_err().as_ref(),
            create_booking::ExecutionError::TimeSlotOccupied(_),
        ));

        // Starts exactly when the existing one ends: no conflict.
        let res = svc
            .execute(CreateBooking {
                user_id: user::Id::new(),
                parking_id,
                vehicle_id: None,
                kind: booking::Kind::Hourly,
                starts_at: existing.ends_at.coerce(),
                ends_at: (existing.ends_at + 2 * HOUR).coerce(),
            })
            .await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn create_quotes_but_takes_no_spot() {
        let db = FakeDb::default();
        let svc = service(db.clone());
        let parking_id = seed_parking(&db, 1, 1);

        let now = DateTime::now();
        let booking = svc
            .execute(CreateBooking {
                user_id: user::Id::new(),
                parking_id,
                vehicle_id: None,
                kind: booking::Kind::Hourly,
                starts_at: (now + 10 * HOUR).coerce(),
                ends_at: (now + 13 * HOUR).coerce(),
            })
            .await
            .unwrap();

        assert_eq!(booking.status, booking::Status::Pending);
        assert_eq!(booking.duration.hours, 3);
        // 3h × 2.5 × 1.19
        assert_eq!(booking.pricing.total, tnd("8.93"));
        // A spot is taken at check-in, not at creation.
        assert_eq!(db.available_spots(parking_id), 1);
    }

    #[tokio::test]
    async fn create_rejects_a_full_parking() {
        let db = FakeDb::default();
        let svc = service(db.clone());
        let parking_id = seed_parking(&db, 3, 0);

        let now = DateTime::now();
        let res = svc
            .execute(CreateBooking {
                user_id: user::Id::new(),
                parking_id,
                vehicle_id: None,
                kind: booking::Kind::Hourly,
                starts_at: (now + HOUR).coerce(),
                ends_at: (now + 2 * HOUR).coerce(),
            })
            .await;
        assert!(matches!(
            res.unwrap_err().as_ref(),
            create_booking::ExecutionError::ParkingUnavailable(_),
        ));
    }

    #[tokio::test]
    async fn check_in_takes_a_spot_and_check_out_frees_it() {
        let db = FakeDb::default();
        let svc = service(db.clone());
        let parking_id = seed_parking(&db, 1, 1);
        let booking = seed_booking(
            &db,
            parking_id,
            booking::Status::Confirmed,
            Duration::from_secs(5 * 60),
            2 * HOUR,
        );

        let checked_in = svc
            .execute(CheckInBooking {
                token: booking.qr.token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(checked_in.status, booking::Status::Active);
        assert!(checked_in.checked_in_at.is_some());
        assert_eq!(db.available_spots(parking_id), 0);

        let checked_out = svc
            .execute(CheckOutBooking {
                token: booking.qr.token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(checked_out.status, booking::Status::Completed);
        assert!(checked_out.checked_out_at.is_some());
        // Immediate check-out still bills the 1-hour minimum.
        assert_eq!(checked_out.duration.hours, 1);
        assert_eq!(checked_out.pricing.total, tnd("2.98"));
        assert_eq!(
            checked_out.payment.amount,
            Some(checked_out.pricing.total),
        );
        assert_eq!(db.available_spots(parking_id), 1);
    }

    #[tokio::test]
    async fn double_check_in_is_rejected() {
        let db = FakeDb::default();
        let svc = service(db.clone());
        let parking_id = seed_parking(&db, 2, 2);
        let booking = seed_booking(
            &db,
            parking_id,
            booking::Status::Confirmed,
            Duration::from_secs(5 * 60),
            2 * HOUR,
        );

        let token = booking.qr.token.clone();
        svc.execute(CheckInBooking {
            token: token.clone(),
        })
        .await
        .unwrap();

        let res = svc.execute(CheckInBooking { token }).await;
        assert!(matches!(
            res.unwrap_err().as_ref(),
            check_in_booking::ExecutionError::NotAwaitingCheckIn(
                booking::Status::Active,
            ),
        ));
        assert_eq!(db.available_spots(parking_id), 1);
    }

    #[tokio::test]
    async fn check_in_is_gated_by_the_early_window() {
        let db = FakeDb::default();
        let svc = service(db.clone());
        let parking_id = seed_parking(&db, 1, 1);
        let booking = seed_booking(
            &db,
            parking_id,
            booking::Status::Confirmed,
            2 * HOUR,
            2 * HOUR,
        );

        let res = svc
            .execute(CheckInBooking {
                token: booking.qr.token.clone(),
            })
            .await;
        assert!(matches!(
            res.unwrap_err().as_ref(),
            check_in_booking::ExecutionError::TooEarly,
        ));
    }

    #[tokio::test]
    async fn check_out_requires_an_active_booking() {
        let db = FakeDb::default();
        let svc = service(db.clone());
        let parking_id = seed_parking(&db, 1, 1);
        let booking = seed_booking(
            &db,
            parking_id,
            booking::Status::Confirmed,
            Duration::from_secs(5 * 60),
            2 * HOUR,
        );

        let res = svc
            .execute(CheckOutBooking {
                token: booking.qr.token.clone(),
            })
            .await;
        assert!(matches!(
            res.unwrap_err().as_ref(),
            check_out_booking::ExecutionError::NotActive(
                booking::Status::Confirmed,
            ),
        ));
    }

    #[tokio::test]
    async fn pending_booking_is_invisible_to_scans() {
        let db = FakeDb::default();
        let svc = service(db.clone());
        let parking_id = seed_parking(&db, 1, 1);
        let booking = seed_booking(
            &db,
            parking_id,
            booking::Status::Pending,
            Duration::from_secs(5 * 60),
            2 * HOUR,
        );

        let res = svc
            .execute(CheckOutBooking {
                token: booking.qr.token.clone(),
            })
            .await;
        assert!(matches!(
            res.unwrap_err().as_ref(),
            check_out_booking::ExecutionError::QrNotValid,
        ));
    }

    #[tokio::test]
    async fn cancellation_requires_a_two_hour_lead() {
        let db = FakeDb::default();
        let svc = service(db.clone());
        let parking_id = seed_parking(&db, 5, 4);

        // 1 hour before the start: too late.
        let booking =
            seed_booking(&db, parking_id, booking::Status::Confirmed, HOUR, HOUR);
        let res = svc
            .execute(CancelBooking {
                booking_id: booking.id,
                user_id: booking.user_id,
                reason: booking::CancellationReason::UserCancelled,
            })
            .await;
        assert!(matches!(
            res.unwrap_err().as_ref(),
            cancel_booking::ExecutionError::TooLate,
        ));

        // 3 hours before the start: accepted, and the spot is restored.
        let booking = seed_booking(
            &db,
            parking_id,
            booking::Status::Confirmed,
            3 * HOUR,
            HOUR,
        );
        let cancelled = svc
            .execute(CancelBooking {
                booking_id: booking.id,
                user_id: booking.user_id,
                reason: booking::CancellationReason::UserCancelled,
            })
            .await
            .unwrap();
        assert_eq!(cancelled.status, booking::Status::Cancelled);
        assert!(cancelled.cancellation.is_some());
        assert_eq!(db.available_spots(parking_id), 5);
    }

    #[tokio::test]
    async fn completed_booking_cannot_be_cancelled() {
        let db = FakeDb::default();
        let svc = service(db.clone());
        let parking_id = seed_parking(&db, 1, 1);
        let booking = seed_booking(
            &db,
            parking_id,
            booking::Status::Completed,
            10 * HOUR,
            HOUR,
        );

        let res = svc
            .execute(CancelBooking {
                booking_id: booking.id,
                user_id: booking.user_id,
                reason: booking::CancellationReason::UserCancelled,
            })
            .await;
        assert!(matches!(
            res.unwrap_err().as_ref(),
            cancel_booking::ExecutionError::NotCancellable(
                booking::Status::Completed,
            ),
        ));
    }
}

