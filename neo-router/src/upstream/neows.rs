use super::{DetailsResponse, NeoEntry, UpstreamClient, UpstreamError, UpstreamFailure, UpstreamResult};
use crate::config::UpstreamConfig;
use async_trait::async_trait;
use chrono::NaiveDate;
use favourites::AsteroidId;
use http::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

const FEED_PATH: &str = "neo/rest/v1/feed";
const NEO_PATH: &str = "neo/rest/v1/neo";

#[derive(Deserialize)]
struct FeedResponse {
    #[serde(default)]
    near_earth_objects: Option<BTreeMap<String, Vec<NeoEntry>>>,
}

/// HTTP client for a NeoWs compatible API.
///
/// The API key is appended to every request but never appears in errors,
/// logs or echoed requests.
#[derive(Clone)]
pub struct NeoWsClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    timeout_secs: u64,
}

impl NeoWsClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        // Url::join drops the last path segment unless the base ends in a slash
        let mut base_url = config.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        NeoWsClient {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Sends a GET to `url` with the API key attached and reads the whole
    /// body. The timeout covers the complete exchange.
    async fn get(&self, url: &Url) -> Result<(StatusCode, Vec<u8>), UpstreamError> {
        let mut authenticated = url.clone();
        authenticated
            .query_pairs_mut()
            .append_pair("api_key", &self.api_key);

        let exchange = async {
            let response = self.client.get(authenticated).send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body.to_vec()))
        };

        timeout(Duration::from_secs(self.timeout_secs), exchange)
            .await
            // Elapsed deadline
            .map_err(|_| UpstreamError::Timeout(self.timeout_secs))?
            // Connection and protocol errors. The URL carries the key, strip it.
            .map_err(|e| UpstreamError::Request(e.without_url()))
    }
}

/// Builds the failure reported for a response that is not a usable feed.
///
/// Prefers the upstream's own error body and falls back to the HTTP status
/// and raw body text. The echoed request has the API key masked.
fn failure_from(status: StatusCode, body: &[u8], request: &Url) -> UpstreamFailure {
    if let Ok(mut failure) = serde_json::from_slice::<UpstreamFailure>(body) {
        failure.request = mask_api_key(&failure.request);
        return failure;
    }

    UpstreamFailure {
        code: i64::from(status.as_u16()),
        http_error: status
            .canonical_reason()
            .unwrap_or("UNKNOWN")
            .to_uppercase()
            .replace(' ', "_"),
        message: String::from_utf8_lossy(body).into_owned(),
        request: request.to_string(),
    }
}

/// Replaces the value of the `api_key` query parameter of an echoed request.
fn mask_api_key(request: &str) -> String {
    let Ok(mut url) = Url::parse(request) else {
        // Not a URL, mask the first `api_key=` value by hand
        return match request.split_once("api_key=") {
            Some((head, tail)) => {
                let rest = tail.find('&').map_or("", |i| &tail[i..]);
                format!("{head}api_key=***{rest}")
            }
            None => request.to_string(),
        };
    };

    if !url.query_pairs().any(|(key, _)| key == "api_key") {
        return request.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = match key.as_ref() {
                "api_key" => "***".to_string(),
                _ => value.into_owned(),
            };
            (key.into_owned(), value)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);

    url.to_string()
}

#[async_trait]
impl UpstreamClient for NeoWsClient {
    async fn search_by_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<UpstreamResult, UpstreamError> {
        let mut url = self.base_url.join(FEED_PATH)?;
        url.query_pairs_mut()
            .append_pair("start_date", &start.to_string())
            .append_pair("end_date", &end.to_string());

        let (status, body) = self.get(&url).await?;

        if !status.is_success() {
            return Ok(UpstreamResult::Failure(failure_from(status, &body, &url)));
        }

        match serde_json::from_slice::<FeedResponse>(&body) {
            Ok(feed) => Ok(UpstreamResult::Success {
                groups_by_date: feed.near_earth_objects.unwrap_or_default(),
            }),
            Err(e) => Ok(UpstreamResult::Failure(UpstreamFailure {
                code: i64::from(status.as_u16()),
                http_error: "INVALID_RESPONSE".to_string(),
                message: format!("could not decode feed response: {e}"),
                request: url.to_string(),
            })),
        }
    }

    async fn details_of(&self, id: AsteroidId) -> Result<DetailsResponse, UpstreamError> {
        let url = self.base_url.join(&format!("{NEO_PATH}/{id}"))?;
        let (status, body) = self.get(&url).await?;

        let body = serde_json::from_slice(&body)
            .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&body).into_owned()));

        Ok(DetailsResponse { status, body })
    }
}
