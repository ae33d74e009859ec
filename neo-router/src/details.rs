// Detail lookups are passed through to the upstream. Successful answers are
// cached for a short while since asteroid details rarely change.
use crate::config::DetailsCacheConfig;
use crate::metrics_defs::{DETAILS_CACHE_HIT, DETAILS_CACHE_MISS};
use crate::upstream::{DetailsResponse, UpstreamClient, UpstreamError};
use favourites::AsteroidId;
use moka::sync::Cache;
use shared::counter;
use std::sync::Arc;
use std::time::Duration;

pub struct DetailsService {
    upstream: Arc<dyn UpstreamClient>,
    cache: Cache<AsteroidId, DetailsResponse>,
}

impl DetailsService {
    pub fn new(upstream: Arc<dyn UpstreamClient>, config: &DetailsCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();

        DetailsService { upstream, cache }
    }

    pub async fn details_of(&self, id: AsteroidId) -> Result<DetailsResponse, UpstreamError> {
        if let Some(cached) = self.cache.get(&id) {
            counter!(DETAILS_CACHE_HIT).increment(1);
            return Ok(cached);
        }
        counter!(DETAILS_CACHE_MISS).increment(1);

        let response = self.upstream.details_of(id).await?;
        tracing::debug!(id, status = %response.status, "Fetched asteroid details");

        if response.status.is_success() {
            self.cache.insert(id, response.clone());
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::FakeUpstream;
    use http::StatusCode;

    fn service(config: DetailsCacheConfig) -> (Arc<FakeUpstream>, DetailsService) {
        let upstream = Arc::new(FakeUpstream::new());
        let service = DetailsService::new(upstream.clone(), &config);
        (upstream, service)
    }

    #[tokio::test]
    async fn test_success_is_cached() {
        let (upstream, service) = service(DetailsCacheConfig::default());

        let first = service.details_of(433).await.unwrap();
        let second = service.details_of(433).await.unwrap();

        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first, second);
        assert_eq!(upstream.details_calls(), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let (upstream, service) = service(DetailsCacheConfig::default());

        assert_eq!(service.details_of(0).await.unwrap().status, StatusCode::NOT_FOUND);
        assert_eq!(service.details_of(0).await.unwrap().status, StatusCode::NOT_FOUND);
        assert_eq!(upstream.details_calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let (_, service) = service(DetailsCacheConfig::default());
        assert!(matches!(
            service.details_of(-1).await.unwrap_err(),
            UpstreamError::Timeout(_)
        ));
    }
}
