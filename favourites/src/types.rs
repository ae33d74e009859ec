use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type AsteroidId = i64;

/// A favourite asteroid together with whatever metadata the caller attached.
///
/// Only `id` is interpreted. All other fields are stored and returned as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Favourite {
    pub id: AsteroidId,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Favourite {
    pub fn new(id: AsteroidId) -> Self {
        Favourite {
            id,
            metadata: Map::new(),
        }
    }

    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_is_flattened() {
        let favourite: Favourite =
            serde_json::from_value(json!({"id": 433, "nickname": "Eros", "rank": 1})).unwrap();
        assert_eq!(favourite.id, 433);
        assert_eq!(favourite.metadata.get("nickname"), Some(&json!("Eros")));

        let value = serde_json::to_value(&favourite).unwrap();
        assert_eq!(value, json!({"id": 433, "nickname": "Eros", "rank": 1}));
    }

    #[test]
    fn test_id_must_be_integer() {
        assert!(serde_json::from_value::<Favourite>(json!({"id": "abc"})).is_err());
        assert!(serde_json::from_value::<Favourite>(json!({"id": 1.5})).is_err());
        assert!(serde_json::from_value::<Favourite>(json!({"nickname": "Eros"})).is_err());
    }
}
