//! Client side of the near-earth object API.
//!
//! `UpstreamClient` is the seam between the lookup logic and the network. The
//! production implementation is `NeoWsClient`; tests substitute fakes.

mod neows;

pub use neows::NeoWsClient;

use async_trait::async_trait;
use chrono::NaiveDate;
use favourites::AsteroidId;
use http::StatusCode;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Transport-level failures. The upstream could not be asked or did not
/// answer, as opposed to answering with an error.
#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream timed out after {0}s")]
    Timeout(u64),

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// One raw near-earth object entry from a feed response.
///
/// The upstream sends ids as decimal strings; plain numbers are accepted too.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NeoEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: AsteroidId,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(AsteroidId),
    Text(String),
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<AsteroidId, D::Error>
where
    D: Deserializer<'de>,
{
    match IdRepr::deserialize(deserializer)? {
        IdRepr::Number(id) => Ok(id),
        IdRepr::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// The error body returned by the upstream for a rejected request.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UpstreamFailure {
    pub code: i64,
    pub http_error: String,
    #[serde(rename = "error_message")]
    pub message: String,
    /// The request as echoed back by the upstream
    pub request: String,
}

/// Outcome of one feed call that reached the upstream.
#[derive(Clone, Debug, PartialEq)]
pub enum UpstreamResult {
    /// Entries grouped by the date (`YYYY-MM-DD`) of their close approach
    Success {
        groups_by_date: BTreeMap<String, Vec<NeoEntry>>,
    },
    Failure(UpstreamFailure),
}

/// Details for one asteroid, passed through from the upstream as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailsResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetches every object with a close approach in `[start, end]`.
    ///
    /// The window must not be wider than the upstream allows.
    async fn search_by_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<UpstreamResult, UpstreamError>;

    async fn details_of(&self, id: AsteroidId) -> Result<DetailsResponse, UpstreamError>;
}
