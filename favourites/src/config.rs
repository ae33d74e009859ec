use serde::Deserialize;
use std::path::PathBuf;

/// Which backend keeps the favourites.
#[derive(Clone, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum FavouritesStoreType {
    #[default]
    Memory,
    Filesystem {
        path: PathBuf,
    },
}
