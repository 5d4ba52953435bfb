use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{CitiesRepo, RepoError};
use crate::domain::entities::{CityFactRecord, CityImageRecord, CityRecord};

#[derive(Debug, Error)]
pub enum CityServiceError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Pass-through lookups over the city store.
#[derive(Clone)]
pub struct CityService {
    reader: Arc<dyn CitiesRepo>,
}

impl CityService {
    pub fn new(reader: Arc<dyn CitiesRepo>) -> Self {
        Self { reader }
    }

    pub async fn list(&self) -> Result<Vec<CityRecord>, CityServiceError> {
        self.reader
            .list_cities()
            .await
            .map_err(CityServiceError::from)
    }

    pub async fn find(&self, id: i64) -> Result<Option<CityRecord>, CityServiceError> {
        self.reader.find_city(id).await.map_err(CityServiceError::from)
    }

    pub async fn images(&self, city_id: i64) -> Result<Vec<CityImageRecord>, CityServiceError> {
        self.reader
            .list_images_for_city(city_id)
            .await
            .map_err(CityServiceError::from)
    }

    pub async fn facts(&self, city_id: i64) -> Result<Vec<CityFactRecord>, CityServiceError> {
        self.reader
            .list_facts_for_city(city_id)
            .await
            .map_err(CityServiceError::from)
    }
}
