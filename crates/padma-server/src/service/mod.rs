//! Application state and dependency injection.

mod cleanup;
mod config;
mod downloads;
pub mod lifecycle;
mod zipgen;

use padma_opendal::ObjectStore;
use padma_postgres::PgClient;

pub use crate::service::cleanup::{CleanupFailure, CleanupReport, CleanupService};
pub use crate::service::config::ServiceConfig;
pub use crate::service::downloads::{
    DeliveryOutcome, DownloadService, RequestDisposition, RequestOutcome,
};
pub use crate::service::zipgen::ZipJobService;
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Shared secret the archive worker must echo back on callbacks.
///
/// Carries `None` when no token is configured, which leaves the callback
/// endpoint open.
#[derive(Debug, Clone, Default)]
pub struct CallbackToken(pub Option<String>);

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // External services:
    pub postgres: PgClient,
    pub object_store: ObjectStore,
    pub zip_jobs: ZipJobService,

    // Internal services:
    pub downloads: DownloadService,
    pub cleanup: CleanupService,
    pub callback_token: CallbackToken,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Validates the configuration, then connects to all external services.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let postgres = config.connect_postgres().await?;
        let object_store = config.connect_storage().await?;
        let zip_jobs = config.connect_worker();

        let downloads = DownloadService::new(
            postgres.clone(),
            object_store.clone(),
            zip_jobs.clone(),
            config.callback_url(),
        );
        let cleanup = CleanupService::new(postgres.clone(), object_store.clone());

        let service_state = Self {
            postgres,
            object_store,
            zip_jobs,
            downloads,
            cleanup,
            callback_token: CallbackToken(config.callback_token.clone()),
        };

        Ok(service_state)
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(postgres: PgClient);
impl_di!(object_store: ObjectStore);
impl_di!(zip_jobs: ZipJobService);

// Internal services:
impl_di!(downloads: DownloadService);
impl_di!(cleanup: CleanupService);
impl_di!(callback_token: CallbackToken);
