//! [`EvictExpiredOtps`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Delete, Perform, Start};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::user::{otp, Otp},
    infra::{database, Database},
    Service,
};

use super::Task;

/// Configuration for [`EvictExpiredOtps`] [`Task`].
///
/// Eviction is hygiene only: lookups never return an expired [`Otp`]
/// regardless of when this [`Task`] last ran.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between [`Otp`] eviction runs.
    #[default(time::Duration::from_secs(60 * 60))]
    pub interval: time::Duration,
}

/// [`Task`] for evicting expired [`Otp`]s.
#[derive(Clone, Copy, Debug)]
pub struct EvictExpiredOtps<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<EvictExpiredOtps<Self>, Config>>> for Service<Db>
where
    EvictExpiredOtps<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<EvictExpiredOtps<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = EvictExpiredOtps {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::EvictExpiredOtps` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for EvictExpiredOtps<Service<Db>>
where
    Db: Database<
        Delete<By<Otp, otp::ExpirationDateTime>>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let deadline = otp::ExpirationDateTime::now();
        self.service
            .database()
            .execute(Delete(By::new(deadline)))
            .await
            .map_err(tracerr::map_from_and_wrap!())
    }
}

/// Error of [`EvictExpiredOtps`] execution.
pub type ExecutionError = Traced<database::Error>;
