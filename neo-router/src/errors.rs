use thiserror::Error;

/// Result type alias for neo-router operations
pub type Result<T, E = NeoRouterError> = std::result::Result<T, E>;

/// Errors that stop the service from starting or serving
#[derive(Error, Debug)]
pub enum NeoRouterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ValidationError),

    #[error("Favourites store error: {0}")]
    FavouritesStore(#[from] favourites::store::StoreError),
}
