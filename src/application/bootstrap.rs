use crate::domain::datetime_codec::DateTimeCodec;
use crate::infrastructure::activity_store::{ActivityStore, InMemoryActivityStore};
use crate::infrastructure::config::{
    ensure_default_configs, load_configs, read_store_settings, read_timezone, StoreKind,
};
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::event_mapper::EventRecordNormalizer;
use crate::infrastructure::rest_activity_store::RestActivityStore;
use crate::infrastructure::sqlite_activity_store::SqliteActivityStore;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "engine.log";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub database_path: PathBuf,
}

pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, InfraError> {
    let config_dir = workspace_root.join("config");
    let state_dir = workspace_root.join("state");
    let logs_dir = workspace_root.join("logs");
    let database_path = state_dir.join("activities.sqlite");

    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&state_dir)?;
    fs::create_dir_all(&logs_dir)?;

    ensure_default_configs(&config_dir)?;
    let _ = load_configs(&config_dir)?;
    SqliteActivityStore::new(&database_path).initialize()?;

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        config_dir,
        logs_dir,
        database_path,
    })
}

/// Installs the global JSON subscriber writing to `logs/engine.log`.
/// Returns false when a subscriber was already installed.
pub fn init_logging(logs_dir: &Path) -> Result<bool, InfraError> {
    fs::create_dir_all(logs_dir)?;
    let log_path = logs_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init()
        .is_ok();

    if installed {
        info!(log_path = %log_path.display(), "logging initialized");
    }
    Ok(installed)
}

/// Normalizer for the configured display time zone.
pub fn calendar_normalizer(config_dir: &Path) -> Result<EventRecordNormalizer, InfraError> {
    Ok(EventRecordNormalizer::new(DateTimeCodec::new(read_timezone(
        config_dir,
    )?)))
}

/// Builds the activity store selected in `store.json`.
pub fn open_store(
    config_dir: &Path,
    database_path: &Path,
    credentials: &dyn CredentialStore,
) -> Result<Arc<dyn ActivityStore>, InfraError> {
    let settings = read_store_settings(config_dir)?;
    let store: Arc<dyn ActivityStore> = match settings.kind {
        StoreKind::Memory => Arc::new(InMemoryActivityStore::default()),
        StoreKind::Sqlite => {
            let store = SqliteActivityStore::new(database_path);
            store.initialize()?;
            Arc::new(store)
        }
        StoreKind::Rest => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                InfraError::InvalidConfig("store endpoint is required for the rest store".to_string())
            })?;
            let access_token = credentials
                .load_credential(&settings.credential_account)?
                .map(|credential| credential.access_token);
            Arc::new(RestActivityStore::new(endpoint, access_token)?)
        }
    };
    info!(kind = ?settings.kind, "opened activity store");
    Ok(store)
}
