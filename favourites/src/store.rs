//! Storage backends for favourites. Every backend rejects a second insert for
//! an id that is already stored, atomically with the write.
use crate::types::{AsteroidId, Favourite};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("favourite {0} already exists")]
    Duplicate(AsteroidId),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait FavouritesStore: Send + Sync {
    async fn exists(&self, id: AsteroidId) -> Result<bool, StoreError>;

    /// Stores a new favourite and returns the stored record.
    ///
    /// Fails with `StoreError::Duplicate` if the id is already present.
    async fn insert(&self, favourite: Favourite) -> Result<Favourite, StoreError>;

    /// Returns every stored favourite ordered by id.
    async fn list(&self) -> Result<Vec<Favourite>, StoreError>;
}

/// Keeps favourites in process memory only.
#[derive(Default)]
pub struct MemoryStore {
    favourites: RwLock<BTreeMap<AsteroidId, Favourite>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavouritesStore for MemoryStore {
    async fn exists(&self, id: AsteroidId) -> Result<bool, StoreError> {
        Ok(self.favourites.read().contains_key(&id))
    }

    async fn insert(&self, favourite: Favourite) -> Result<Favourite, StoreError> {
        let mut favourites = self.favourites.write();
        if favourites.contains_key(&favourite.id) {
            return Err(StoreError::Duplicate(favourite.id));
        }
        favourites.insert(favourite.id, favourite.clone());
        Ok(favourite)
    }

    async fn list(&self) -> Result<Vec<Favourite>, StoreError> {
        Ok(self.favourites.read().values().cloned().collect())
    }
}

/// Keeps favourites in a JSON file.
///
/// The whole file is rewritten on every insert: the new contents go to a
/// sibling temporary file which is then renamed over the original. The
/// in-memory copy only changes after the rename succeeded.
pub struct FilesystemStore {
    path: PathBuf,
    favourites: Mutex<BTreeMap<AsteroidId, Favourite>>,
}

impl FilesystemStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let favourites = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let stored: Vec<Favourite> = serde_json::from_slice(&bytes)?;
                stored.into_iter().map(|f| (f.id, f)).collect()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            count = favourites.len(),
            "Loaded favourites"
        );

        Ok(FilesystemStore {
            path,
            favourites: Mutex::new(favourites),
        })
    }

    async fn persist(&self, favourites: &BTreeMap<AsteroidId, Favourite>) -> Result<(), StoreError> {
        let contents = serde_json::to_vec_pretty(&favourites.values().collect::<Vec<_>>())?;

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");

        tokio::fs::write(&tmp_path, &contents).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        tracing::debug!(
            path = %self.path.display(),
            bytes = contents.len(),
            "Stored favourites"
        );
        Ok(())
    }
}

#[async_trait]
impl FavouritesStore for FilesystemStore {
    async fn exists(&self, id: AsteroidId) -> Result<bool, StoreError> {
        Ok(self.favourites.lock().await.contains_key(&id))
    }

    async fn insert(&self, favourite: Favourite) -> Result<Favourite, StoreError> {
        let mut favourites = self.favourites.lock().await;
        if favourites.contains_key(&favourite.id) {
            return Err(StoreError::Duplicate(favourite.id));
        }

        let mut updated = favourites.clone();
        updated.insert(favourite.id, favourite.clone());
        self.persist(&updated).await?;
        *favourites = updated;

        Ok(favourite)
    }

    async fn list(&self) -> Result<Vec<Favourite>, StoreError> {
        Ok(self.favourites.lock().await.values().cloned().collect())
    }
}
