use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::{
    api::HttpBackend,
    error::{ProcureError, Result},
    store::{FileSessionStore, InMemorySessionStore, SessionStore},
};

pub const DEFAULT_API_URL: &str = "http://localhost:5001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_STORE_DIR: &str = ".procure";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Where session state is persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    Memory,
    File { dir: PathBuf },
    Postgres { database_url: String },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            dir: PathBuf::from(DEFAULT_STORE_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub store: StoreConfig,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            store: StoreConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ProcureError::Config(format!("invalid config file: {e}")))
    }

    pub async fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            ProcureError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Overlays `PROCURE_API_URL`, `PROCURE_TIMEOUT_SECS`, `PROCURE_STORE_DIR`,
    /// `DATABASE_URL` (postgres builds only) and `LOG_FORMAT`
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PROCURE_API_URL") {
            self.api_base_url = url;
        }

        if let Some(raw) = lookup("PROCURE_TIMEOUT_SECS") {
            self.request_timeout_secs = raw.trim().parse().map_err(|_| {
                ProcureError::Config(format!("PROCURE_TIMEOUT_SECS must be a whole number, got {raw:?}"))
            })?;
        }

        if let Some(dir) = lookup("PROCURE_STORE_DIR") {
            self.store = StoreConfig::File {
                dir: PathBuf::from(dir),
            };
        }

        if cfg!(feature = "postgres")
            && let Some(database_url) = lookup("DATABASE_URL")
        {
            self.store = StoreConfig::Postgres { database_url };
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            self.log_format = match format.to_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                _ => LogFormat::Json,
            };
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(ProcureError::Config(format!(
                "api_base_url must be an http(s) URL, got {:?}",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ProcureError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn http_backend(&self) -> Result<HttpBackend> {
        HttpBackend::new(&self.api_base_url, self.request_timeout())
    }

    pub async fn open_store(&self) -> Result<Arc<dyn SessionStore>> {
        match &self.store {
            StoreConfig::Memory => {
                info!("Using in-memory session store");
                Ok(Arc::new(InMemorySessionStore::new()))
            }
            StoreConfig::File { dir } => {
                info!(dir = %dir.display(), "Using file session store");
                Ok(Arc::new(FileSessionStore::open(dir).await?))
            }
            #[cfg(feature = "postgres")]
            StoreConfig::Postgres { database_url } => {
                info!("Using PostgreSQL session store");
                Ok(Arc::new(
                    crate::store::PostgresSessionStore::connect(database_url).await?,
                ))
            }
            #[cfg(not(feature = "postgres"))]
            StoreConfig::Postgres { .. } => Err(ProcureError::Config(
                "postgres store requested but the `postgres` feature is not enabled".to_string(),
            )),
        }
    }
}
