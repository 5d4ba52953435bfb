//! Wire types served by the citytrends HTTP API.
//!
//! These are the serialized shapes clients see; they are kept apart from the
//! server's persistence records so that either side can evolve independently.

use serde::{Deserialize, Serialize};

/// A trending topic as returned by the upstream service.
///
/// The structure is defined by the upstream service and passed through untouched.
pub type Trend = serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Upstream geographic identifier, `null` until trends were first requested.
    pub woeid: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityImage {
    pub id: i64,
    /// Identifier of the owning city.
    pub city: i64,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityFact {
    pub id: i64,
    /// Identifier of the owning city.
    pub city: i64,
    pub fact: String,
}
