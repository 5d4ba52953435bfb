//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{CityFactRecord, CityImageRecord, CityRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Read access to cities and the rows hanging off them.
///
/// List operations return rows ordered by ascending id. Filtering by an unknown
/// city yields an empty list rather than an error.
#[async_trait]
pub trait CitiesRepo: Send + Sync {
    async fn list_cities(&self) -> Result<Vec<CityRecord>, RepoError>;

    async fn find_city(&self, id: i64) -> Result<Option<CityRecord>, RepoError>;

    async fn list_images_for_city(&self, city_id: i64) -> Result<Vec<CityImageRecord>, RepoError>;

    async fn list_facts_for_city(&self, city_id: i64) -> Result<Vec<CityFactRecord>, RepoError>;
}

#[async_trait]
pub trait CitiesWriteRepo: Send + Sync {
    /// Persist the upstream geographic identifier for a city.
    ///
    /// Returns [`RepoError::NotFound`] when no row matched.
    async fn set_city_woeid(&self, city_id: i64, woeid: i64) -> Result<(), RepoError>;
}
