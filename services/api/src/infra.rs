use metrics_exporter_prometheus::PrometheusHandle;
use skillcheck::auth::Authenticator;
use skillcheck::checklist::{Catalog, SkillCheckService};
use skillcheck::config::AppConfig;
use skillcheck::error::AppError;
use skillcheck::store::JsonDocumentStore;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type FileService = SkillCheckService<JsonDocumentStore>;
pub(crate) type FileAuthenticator = Authenticator<JsonDocumentStore, JsonDocumentStore>;

/// Catalog, answers and sessions wired against the on-disk document store.
pub(crate) struct Backend {
    pub(crate) service: Arc<FileService>,
    pub(crate) auth: Arc<FileAuthenticator>,
}

impl Backend {
    pub(crate) fn open(config: &AppConfig) -> Result<Self, AppError> {
        let catalog = Arc::new(Catalog::from_dir(&config.storage.catalog_dir)?);
        let store = Arc::new(JsonDocumentStore::open(&config.storage.data_dir)?);
        info!(
            items = catalog.len(),
            data_dir = %config.storage.data_dir.display(),
            "document store opened"
        );

        let service = Arc::new(SkillCheckService::new(catalog, Arc::clone(&store)));
        let auth = Arc::new(Authenticator::new(
            Arc::clone(&store),
            store,
            config.auth.session_ttl(),
        ));

        Ok(Self { service, auth })
    }

    /// Store only; `user add` has no use for the catalog.
    pub(crate) fn authenticator(config: &AppConfig) -> Result<FileAuthenticator, AppError> {
        let store = Arc::new(JsonDocumentStore::open(&config.storage.data_dir)?);
        Ok(Authenticator::new(
            Arc::clone(&store),
            store,
            config.auth.session_ttl(),
        ))
    }
}
