use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use time::Date;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::config::{AppConfig, DietConfig};
use crate::diet::{Catalog, CatalogRead, CatalogSeed, DietPolicy};
use crate::store::{DietStore, MemoryStore, PgStore};

pub const DEFAULT_CATALOG_PATH: &str = "data/catalog.json";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<RwLock<Catalog>>,
    pub store: Arc<dyn DietStore>,
    pub day_locks: DayLocks,
    pub user_locks: UserLocks,
    /// Set only when running against PostgreSQL.
    pub db: Option<PgPool>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let path = config
            .catalog_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));
        let catalog = load_catalog(&path).await?;
        tracing::info!(path = %path.display(), foods = catalog.foods().len(), "catalog loaded");

        let (store, db) = match &config.database_url {
            Some(url) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                let store = Arc::new(PgStore::new(db.clone())) as Arc<dyn DietStore>;
                (store, Some(db))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store");
                (Arc::new(MemoryStore::new()) as Arc<dyn DietStore>, None)
            }
        };

        Ok(Self {
            config,
            catalog: Arc::new(RwLock::new(catalog)),
            store,
            day_locks: DayLocks::default(),
            user_locks: UserLocks::default(),
            db,
        })
    }

    /// State backed by [`MemoryStore`] with default tunables.
    pub fn in_memory(catalog: Catalog) -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            catalog_path: None,
            diet: DietConfig::default(),
        });
        Self {
            config,
            catalog: Arc::new(RwLock::new(catalog)),
            store: Arc::new(MemoryStore::new()),
            day_locks: DayLocks::default(),
            user_locks: UserLocks::default(),
            db: None,
        }
    }

    pub fn policy(&self) -> DietPolicy {
        self.config.diet.policy()
    }
}

pub async fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read catalog {}", path.display()))?;
    let seed: CatalogSeed = serde_json::from_str(&raw).context("parse catalog seed")?;
    Catalog::from_seed(seed).context("build catalog")
}

/// One async mutex per key, created on demand.
#[derive(Clone)]
pub struct KeyedLocks<K> {
    inner: Arc<Mutex<HashMap<K, Arc<Mutex<()>>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash> KeyedLocks<K> {
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().await;
            // Drop locks nobody holds or waits on.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Every mutation of a day log runs under its (user, date) lock.
pub type DayLocks = KeyedLocks<(Uuid, Date)>;

/// Guards a user's adherence state and blacklist. Taken after the day
/// lock, never before it.
pub type UserLocks = KeyedLocks<Uuid>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use time::macros::date;

    #[tokio::test]
    async fn same_day_is_serialized() {
        let locks = DayLocks::default();
        let user = Uuid::new_v4();
        let guard = locks.acquire((user, date!(2024 - 05 - 01))).await;

        let contended = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire((user, date!(2024 - 05 - 01))),
        )
        .await;
        assert!(contended.is_err());

        let other_day = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire((user, date!(2024 - 05 - 02))),
        )
        .await;
        assert!(other_day.is_ok());

        drop(guard);
        assert!(tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire((user, date!(2024 - 05 - 01)))
        )
        .await
        .is_ok());
    }

    #[tokio::test]
    async fn bundled_catalog_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CATALOG_PATH);
        let catalog = load_catalog(&path).await.unwrap();
        assert!(!catalog.foods().is_empty());
        assert!(catalog.recipes().next().is_some());
    }
}
