//! Domain entities mirrored from persistent storage.

use citytrends_api_types::{City, CityFact, CityImage};

#[derive(Debug, Clone, PartialEq)]
pub struct CityRecord {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub woeid: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityImageRecord {
    pub id: i64,
    pub city_id: i64,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityFactRecord {
    pub id: i64,
    pub city_id: i64,
    pub fact: String,
}

impl From<CityRecord> for City {
    fn from(record: CityRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            latitude: record.latitude,
            longitude: record.longitude,
            woeid: record.woeid,
        }
    }
}

impl From<CityImageRecord> for CityImage {
    fn from(record: CityImageRecord) -> Self {
        Self {
            id: record.id,
            city: record.city_id,
            image: record.image,
        }
    }
}

impl From<CityFactRecord> for CityFact {
    fn from(record: CityFactRecord) -> Self {
        Self {
            id: record.id,
            city: record.city_id,
            fact: record.fact,
        }
    }
}
