//! Trending topics near a city.
//!
//! A city is mapped to the upstream service's geographic identifier (WOEID) the first
//! time its trends are requested. The identifier is written back to the store and
//! reused for every later request; it is never refreshed.

use std::sync::Arc;

use async_trait::async_trait;
use citytrends_api_types::Trend;
use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::repos::{CitiesRepo, CitiesWriteRepo, RepoError};
use crate::domain::entities::CityRecord;

/// Upstream operation names, used in error messages and logs.
pub const CLOSEST_OPERATION: &str = "closest location";
pub const PLACE_TRENDS_OPERATION: &str = "place trends";

#[derive(Debug, Error)]
pub enum TrendsApiError {
    #[error("{operation} request failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} request returned status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("{operation} response could not be decoded: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} returned an empty result list")]
    EmptyResponse { operation: &'static str },
    #[error("{operation} request could not be built: {message}")]
    InvalidRequest {
        operation: &'static str,
        message: String,
    },
}

impl TrendsApiError {
    pub fn transport(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            operation,
            message: err.to_string(),
        }
    }

    pub fn decode(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            operation,
            message: err.to_string(),
        }
    }

    pub fn invalid_request(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::InvalidRequest {
            operation,
            message: err.to_string(),
        }
    }
}

/// Client for the upstream trends service.
#[async_trait]
pub trait TrendsClient: Send + Sync {
    /// Identifier of the location the upstream service considers closest to the point.
    async fn closest_woeid(&self, latitude: f64, longitude: f64) -> Result<i64, TrendsApiError>;

    /// Current trends for the location, in upstream order.
    async fn place_trends(&self, woeid: i64) -> Result<Vec<Trend>, TrendsApiError>;
}

#[derive(Debug, Error)]
pub enum TrendsError {
    #[error("Invalid City ID")]
    CityNotFound,
    #[error(transparent)]
    Upstream(#[from] TrendsApiError),
    #[error(transparent)]
    Store(#[from] RepoError),
}

#[derive(Clone)]
pub struct TrendService {
    reader: Arc<dyn CitiesRepo>,
    writer: Arc<dyn CitiesWriteRepo>,
    client: Arc<dyn TrendsClient>,
}

impl TrendService {
    pub fn new(
        reader: Arc<dyn CitiesRepo>,
        writer: Arc<dyn CitiesWriteRepo>,
        client: Arc<dyn TrendsClient>,
    ) -> Self {
        Self {
            reader,
            writer,
            client,
        }
    }

    pub async fn trends_for_city(&self, city_id: i64) -> Result<Vec<Trend>, TrendsError> {
        let city = self
            .reader
            .find_city(city_id)
            .await?
            .ok_or(TrendsError::CityNotFound)?;

        let woeid = self.ensure_woeid(&city).await?;

        self.client.place_trends(woeid).await.map_err(|err| {
            counter!("citytrends_trends_upstream_failure_total", "operation" => PLACE_TRENDS_OPERATION)
                .increment(1);
            warn!(
                target = "citytrends::trends",
                city_id,
                woeid,
                error = %err,
                "place trends lookup failed"
            );
            TrendsError::from(err)
        })
    }

    /// Return the cached identifier, resolving and persisting it on first use.
    async fn ensure_woeid(&self, city: &CityRecord) -> Result<i64, TrendsError> {
        if let Some(woeid) = city.woeid {
            return Ok(woeid);
        }

        let woeid = self
            .client
            .closest_woeid(city.latitude, city.longitude)
            .await
            .map_err(|err| {
                counter!("citytrends_trends_upstream_failure_total", "operation" => CLOSEST_OPERATION)
                    .increment(1);
                warn!(
                    target = "citytrends::trends",
                    city_id = city.id,
                    error = %err,
                    "closest location lookup failed"
                );
                TrendsError::from(err)
            })?;

        self.writer.set_city_woeid(city.id, woeid).await?;
        counter!("citytrends_woeid_resolved_total").increment(1);
        info!(
            target = "citytrends::trends",
            city_id = city.id,
            woeid,
            "resolved city woeid"
        );

        Ok(woeid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use crate::domain::entities::{CityFactRecord, CityImageRecord};

    #[derive(Default)]
    struct MemoryCities {
        cities: Mutex<HashMap<i64, CityRecord>>,
        fail_writes: bool,
    }

    impl MemoryCities {
        fn with_city(city: CityRecord) -> Self {
            let repo = Self::default();
            repo.cities.lock().unwrap().insert(city.id, city);
            repo
        }

        fn woeid(&self, id: i64) -> Option<i64> {
            self.cities.lock().unwrap().get(&id).and_then(|c| c.woeid)
        }
    }

    #[async_trait]
    impl CitiesRepo for MemoryCities {
        async fn list_cities(&self) -> Result<Vec<CityRecord>, RepoError> {
            Ok(self.cities.lock().unwrap().values().cloned().collect())
        }

        async fn find_city(&self, id: i64) -> Result<Option<CityRecord>, RepoError> {
            Ok(self.cities.lock().unwrap().get(&id).cloned())
        }

        async fn list_images_for_city(
            &self,
            _city_id: i64,
        ) -> Result<Vec<CityImageRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn list_facts_for_city(
            &self,
            _city_id: i64,
        ) -> Result<Vec<CityFactRecord>, RepoError> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl CitiesWriteRepo for MemoryCities {
        async fn set_city_woeid(&self, city_id: i64, woeid: i64) -> Result<(), RepoError> {
            if self.fail_writes {
                return Err(RepoError::from_persistence("connection reset"));
            }
            let mut cities = self.cities.lock().unwrap();
            let city = cities.get_mut(&city_id).ok_or(RepoError::NotFound)?;
            city.woeid = Some(woeid);
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Closest(f64, f64),
        Place(i64),
    }

    /// Replays scripted upstream responses and records every call.
    #[derive(Default)]
    struct ScriptedClient {
        closest: Mutex<VecDeque<Result<i64, TrendsApiError>>>,
        place: Mutex<VecDeque<Result<Vec<Trend>, TrendsApiError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl ScriptedClient {
        fn closest(self, result: Result<i64, TrendsApiError>) -> Self {
            self.closest.lock().unwrap().push_back(result);
            self
        }

        fn place(self, result: Result<Vec<Trend>, TrendsApiError>) -> Self {
            self.place.lock().unwrap().push_back(result);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TrendsClient for ScriptedClient {
        async fn closest_woeid(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<i64, TrendsApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Closest(latitude, longitude));
            self.closest
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected closest call")
        }

        async fn place_trends(&self, woeid: i64) -> Result<Vec<Trend>, TrendsApiError> {
            self.calls.lock().unwrap().push(Call::Place(woeid));
            self.place
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected place call")
        }
    }

    fn london(woeid: Option<i64>) -> CityRecord {
        CityRecord {
            id: 7,
            name: "London".into(),
            latitude: 51.5,
            longitude: -0.12,
            woeid,
        }
    }

    fn service(repo: &Arc<MemoryCities>, client: &Arc<ScriptedClient>) -> TrendService {
        TrendService::new(repo.clone(), repo.clone(), client.clone())
    }

    fn network_error(operation: &'static str) -> TrendsApiError {
        TrendsApiError::transport(operation, "connection refused")
    }

    #[tokio::test]
    async fn unknown_city_is_not_found_without_upstream_calls() {
        let repo = Arc::new(MemoryCities::default());
        let client = Arc::new(ScriptedClient::default());

        let err = service(&repo, &client)
            .trends_for_city(999)
            .await
            .expect_err("city is absent");

        assert!(matches!(err, TrendsError::CityNotFound));
        assert_eq!(err.to_string(), "Invalid City ID");
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn cached_woeid_skips_closest_lookup() {
        let repo = Arc::new(MemoryCities::with_city(london(Some(44418))));
        let client = Arc::new(ScriptedClient::default().place(Ok(vec![json!({"name": "#Cached"})])));

        let trends = service(&repo, &client)
            .trends_for_city(7)
            .await
            .expect("trends");

        assert_eq!(trends, vec![json!({"name": "#Cached"})]);
        assert_eq!(client.calls(), vec![Call::Place(44418)]);
    }

    #[tokio::test]
    async fn first_lookup_resolves_and_persists_woeid() {
        let repo = Arc::new(MemoryCities::with_city(london(None)));
        let client = Arc::new(
            ScriptedClient::default()
                .closest(Ok(44418))
                .place(Ok(vec![json!({"name": "#Test"})]))
                .place(Ok(vec![json!({"name": "#Again"})])),
        );
        let service = service(&repo, &client);

        let trends = service.trends_for_city(7).await.expect("first lookup");
        assert_eq!(trends, vec![json!({"name": "#Test"})]);
        assert_eq!(
            client.calls(),
            vec![Call::Closest(51.5, -0.12), Call::Place(44418)]
        );
        assert_eq!(repo.woeid(7), Some(44418));

        service.trends_for_city(7).await.expect("second lookup");
        assert_eq!(
            client.calls(),
            vec![
                Call::Closest(51.5, -0.12),
                Call::Place(44418),
                Call::Place(44418)
            ]
        );
        assert_eq!(repo.woeid(7), Some(44418));
    }

    #[tokio::test]
    async fn closest_failure_leaves_woeid_unset() {
        let repo = Arc::new(MemoryCities::with_city(london(None)));
        let client = Arc::new(ScriptedClient::default().closest(Err(network_error(CLOSEST_OPERATION))));

        let err = service(&repo, &client)
            .trends_for_city(7)
            .await
            .expect_err("closest lookup fails");

        assert!(matches!(err, TrendsError::Upstream(TrendsApiError::Transport { .. })));
        assert_eq!(
            err.to_string(),
            "closest location request failed: connection refused"
        );
        assert_eq!(repo.woeid(7), None);
        assert_eq!(client.calls(), vec![Call::Closest(51.5, -0.12)]);
    }

    #[tokio::test]
    async fn place_failure_keeps_freshly_resolved_woeid() {
        let repo = Arc::new(MemoryCities::with_city(london(None)));
        let client = Arc::new(
            ScriptedClient::default()
                .closest(Ok(44418))
                .place(Err(network_error(PLACE_TRENDS_OPERATION))),
        );

        let err = service(&repo, &client)
            .trends_for_city(7)
            .await
            .expect_err("place lookup fails");

        assert!(matches!(err, TrendsError::Upstream(_)));
        assert_eq!(repo.woeid(7), Some(44418));
    }

    #[tokio::test]
    async fn empty_upstream_result_is_an_upstream_failure() {
        let repo = Arc::new(MemoryCities::with_city(london(None)));
        let client = Arc::new(ScriptedClient::default().closest(Err(
            TrendsApiError::EmptyResponse {
                operation: CLOSEST_OPERATION,
            },
        )));

        let err = service(&repo, &client)
            .trends_for_city(7)
            .await
            .expect_err("empty list");

        assert_eq!(
            err.to_string(),
            "closest location returned an empty result list"
        );
        assert_eq!(repo.woeid(7), None);
    }

    #[tokio::test]
    async fn failed_woeid_write_stops_before_place_lookup() {
        let repo = Arc::new(MemoryCities {
            fail_writes: true,
            ..MemoryCities::with_city(london(None))
        });
        let client = Arc::new(ScriptedClient::default().closest(Ok(44418)));

        let err = service(&repo, &client)
            .trends_for_city(7)
            .await
            .expect_err("write fails");

        assert!(matches!(err, TrendsError::Store(RepoError::Persistence(_))));
        assert_eq!(client.calls(), vec![Call::Closest(51.5, -0.12)]);
    }
}
