use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::{
    error::{ProcureError, Result},
    models::{ProcurementReport, UserIdentity},
};

/// Storage key for the serialized report
pub const REPORT_KEY: &str = "procurement_report";
/// Storage key for the serialized user identity
pub const USER_KEY: &str = "user";

/// Durable key/value storage for session state, shaped like browser local storage
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: String) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// Typed access to the values the session persists
#[async_trait]
pub trait SessionStoreExt {
    async fn save_report(&self, report: &ProcurementReport) -> Result<()>;
    async fn load_report(&self) -> Result<Option<ProcurementReport>>;
    async fn save_user(&self, user: &UserIdentity) -> Result<()>;
    async fn load_user(&self) -> Result<Option<UserIdentity>>;
    /// Removes every key the session writes
    async fn clear_session(&self) -> Result<()>;
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStoreExt for S {
    async fn save_report(&self, report: &ProcurementReport) -> Result<()> {
        let value = serde_json::to_string(report)?;
        self.set_item(REPORT_KEY, value).await
    }

    async fn load_report(&self) -> Result<Option<ProcurementReport>> {
        match self.get_item(REPORT_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save_user(&self, user: &UserIdentity) -> Result<()> {
        let value = serde_json::to_string(user)?;
        self.set_item(USER_KEY, value).await
    }

    async fn load_user(&self) -> Result<Option<UserIdentity>> {
        match self.get_item(USER_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn clear_session(&self) -> Result<()> {
        // Every key is attempted; the first failure is reported
        let report = self.remove_item(REPORT_KEY).await;
        let user = self.remove_item(USER_KEY).await;
        report.and(user)
    }
}

/// In-memory implementation of SessionStore
#[derive(Default)]
pub struct InMemorySessionStore {
    items: Arc<DashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            items: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).map(|entry| entry.clone()))
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// File-backed SessionStore: one `<key>.json` file per key inside a directory
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Opened file session store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(ProcureError::Validation(format!("invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key)?;
        // Readers see either the old value or the new one, never a partial write
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        tokio::fs::write(&tmp, value.as_bytes()).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// PostgreSQL-backed SessionStore, one row per key
#[cfg(feature = "postgres")]
pub struct PostgresSessionStore {
    pool: sqlx::PgPool,
}

#[cfg(feature = "postgres")]
impl PostgresSessionStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS session_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[cfg(feature = "postgres")]
#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM session_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        sqlx::query(
            "INSERT INTO session_store (key, value, updated_at) VALUES ($1, $2, NOW())
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM session_store WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
