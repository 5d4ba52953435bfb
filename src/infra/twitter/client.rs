use async_trait::async_trait;
use citytrends_api_types::Trend;
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::application::trends::{
    CLOSEST_OPERATION, PLACE_TRENDS_OPERATION, TrendsApiError, TrendsClient,
};
use crate::config::TwitterSettings;
use crate::infra::error::InfraError;

use super::models::{ClosestLocation, PlaceTrends};
use super::oauth::{OAuth1Signer, TwitterCredentials};

const CLOSEST_PATH: &str = "closest.json";
const PLACE_PATH: &str = "place.json";
/// Upper bound on how much of an error body is carried into error messages.
const ERROR_BODY_LIMIT: usize = 512;

/// OAuth1-signed client for the upstream trends endpoints.
#[derive(Debug, Clone)]
pub struct TwitterClient {
    http: Client,
    base: Url,
    signer: OAuth1Signer,
}

impl TwitterClient {
    pub fn new(settings: &TwitterSettings, credentials: TwitterCredentials) -> Result<Self, InfraError> {
        let http = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            http,
            base: settings.api_url.clone(),
            signer: OAuth1Signer::new(credentials),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("citytrends/", env!("CARGO_PKG_VERSION"))
    }

    fn endpoint(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Url, TrendsApiError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|err| TrendsApiError::invalid_request(operation, err))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Issue a signed GET and decode the response list, returning its first element.
    async fn first_of<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
    ) -> Result<T, TrendsApiError> {
        let authorization = self
            .signer
            .authorization_header("GET", &url)
            .map_err(|err| TrendsApiError::invalid_request(operation, err))?;

        debug!(target = "citytrends::twitter", operation, url = %url, "calling upstream");

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|err| TrendsApiError::transport(operation, err))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| TrendsApiError::transport(operation, err))?;

        if !status.is_success() {
            return Err(status_error(operation, status, &bytes));
        }

        let items: Vec<T> =
            serde_json::from_slice(&bytes).map_err(|err| TrendsApiError::decode(operation, err))?;

        items
            .into_iter()
            .next()
            .ok_or(TrendsApiError::EmptyResponse { operation })
    }
}

fn status_error(operation: &'static str, status: StatusCode, body: &[u8]) -> TrendsApiError {
    let text = String::from_utf8_lossy(body);
    let body = match text.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    };
    TrendsApiError::Status {
        operation,
        status: status.as_u16(),
        body,
    }
}

#[async_trait]
impl TrendsClient for TwitterClient {
    async fn closest_woeid(&self, latitude: f64, longitude: f64) -> Result<i64, TrendsApiError> {
        let url = self.endpoint(
            CLOSEST_OPERATION,
            CLOSEST_PATH,
            &[("lat", latitude.to_string()), ("long", longitude.to_string())],
        )?;
        let location: ClosestLocation = self.first_of(CLOSEST_OPERATION, url).await?;
        Ok(location.woeid)
    }

    async fn place_trends(&self, woeid: i64) -> Result<Vec<Trend>, TrendsApiError> {
        let url = self.endpoint(
            PLACE_TRENDS_OPERATION,
            PLACE_PATH,
            &[("id", woeid.to_string())],
        )?;
        let place: PlaceTrends = self.first_of(PLACE_TRENDS_OPERATION, url).await?;
        Ok(place.trends)
    }
}
