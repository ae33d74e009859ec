//! Persistence of caller-selected favourite asteroids.
//!
//! The gateway gives create-if-absent semantics on top of a `FavouritesStore`.
//! Stores enforce id uniqueness themselves so that two racing creates for the
//! same id produce one success and one conflict.

pub mod config;
pub mod gateway;
pub mod store;
pub mod types;

use config::FavouritesStoreType;
use std::sync::Arc;
use store::{FavouritesStore, FilesystemStore, MemoryStore, StoreError};

pub use gateway::{FavouritesError, FavouritesGateway};
pub use types::{AsteroidId, Favourite};

/// Opens the store selected by configuration.
pub async fn open_store(
    store_type: &FavouritesStoreType,
) -> Result<Arc<dyn FavouritesStore>, StoreError> {
    match store_type {
        FavouritesStoreType::Memory => {
            tracing::warn!("Favourites are kept in memory and will be lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        FavouritesStoreType::Filesystem { path } => {
            Ok(Arc::new(FilesystemStore::open(path.clone()).await?))
        }
    }
}
