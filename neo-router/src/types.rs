use crate::upstream::NeoEntry;
use favourites::AsteroidId;
use serde::{Deserialize, Serialize};

/// An asteroid as returned by the search endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsteroidRecord {
    pub name: String,
    pub id: AsteroidId,
}

impl AsteroidRecord {
    pub fn new<N: Into<String>>(name: N, id: AsteroidId) -> Self {
        AsteroidRecord {
            name: name.into(),
            id,
        }
    }
}

impl From<NeoEntry> for AsteroidRecord {
    fn from(entry: NeoEntry) -> Self {
        AsteroidRecord {
            name: entry.name,
            id: entry.id,
        }
    }
}
