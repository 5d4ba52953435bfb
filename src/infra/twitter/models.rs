//! Response shapes of the upstream trends endpoints.
//!
//! Only the fields this service reads are required; everything else is optional so
//! upstream additions do not break decoding.

use citytrends_api_types::Trend;
use serde::Deserialize;

/// One entry of the `closest.json` response list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosestLocation {
    pub woeid: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// One entry of the `place.json` response list.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceTrends {
    pub trends: Vec<Trend>,
    #[serde(default)]
    pub as_of: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_location_tolerates_extra_fields() {
        let body = r#"[{
            "country": "United Kingdom",
            "countryCode": "GB",
            "name": "London",
            "parentid": 23424975,
            "placeType": {"code": 7, "name": "Town"},
            "url": "http://where.yahooapis.com/v1/place/44418",
            "woeid": 44418
        }]"#;

        let locations: Vec<ClosestLocation> = serde_json::from_str(body).expect("decode");
        assert_eq!(locations[0].woeid, 44418);
        assert_eq!(locations[0].country_code.as_deref(), Some("GB"));
    }

    #[test]
    fn closest_location_requires_woeid() {
        let result: Result<Vec<ClosestLocation>, _> = serde_json::from_str(r#"[{"name": "X"}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn place_trends_keeps_trend_objects_verbatim() {
        let body = r##"[{
            "trends": [{"name": "#Test", "tweet_volume": null, "url": "http://x"}],
            "as_of": "2024-01-01T00:00:00Z",
            "locations": [{"name": "London", "woeid": 44418}]
        }]"##;

        let places: Vec<PlaceTrends> = serde_json::from_str(body).expect("decode");
        assert_eq!(
            places[0].trends[0],
            serde_json::json!({"name": "#Test", "tweet_volume": null, "url": "http://x"})
        );
    }
}
