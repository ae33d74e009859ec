use crate::store::{FavouritesStore, StoreError};
use crate::types::{AsteroidId, Favourite};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum FavouritesError {
    #[error("asteroid {0} is already a favourite")]
    Conflict(AsteroidId),

    #[error("favourites store error: {0}")]
    Store(#[from] StoreError),
}

/// Create-if-absent access to the favourites store.
#[derive(Clone)]
pub struct FavouritesGateway {
    store: Arc<dyn FavouritesStore>,
}

impl FavouritesGateway {
    pub fn new(store: Arc<dyn FavouritesStore>) -> Self {
        FavouritesGateway { store }
    }

    /// Stores `favourite` unless its id is already present.
    ///
    /// The existence check is not atomic with the insert, a create racing on
    /// the same id is caught by the store's own uniqueness check instead.
    pub async fn create(&self, favourite: Favourite) -> Result<Favourite, FavouritesError> {
        let id = favourite.id;
        if self.store.exists(id).await? {
            tracing::info!(id, "Asteroid is already a favourite");
            return Err(FavouritesError::Conflict(id));
        }

        match self.store.insert(favourite).await {
            Ok(stored) => {
                tracing::info!(id, "Created favourite");
                Ok(stored)
            }
            Err(StoreError::Duplicate(id)) => {
                tracing::info!(id, "Favourite was created concurrently");
                Err(FavouritesError::Conflict(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, id: AsteroidId) -> Result<bool, FavouritesError> {
        Ok(self.store.exists(id).await?)
    }

    pub async fn all(&self) -> Result<Vec<Favourite>, FavouritesError> {
        Ok(self.store.list().await?)
    }
}
