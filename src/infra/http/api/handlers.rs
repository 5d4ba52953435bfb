use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use citytrends_api_types::{City, CityFact, CityImage, Trend};

use crate::application::cities::CityServiceError;
use crate::application::repos::RepoError;
use crate::application::trends::TrendsError;

use super::error::{ApiError, codes};
use super::state::ApiState;

pub async fn list_cities(State(state): State<ApiState>) -> Result<Json<Vec<City>>, ApiError> {
    let cities = state.cities.list().await.map_err(city_to_api)?;
    Ok(Json(cities.into_iter().map(City::from).collect()))
}

pub async fn get_city(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<City>, ApiError> {
    let city = state
        .cities
        .find(id)
        .await
        .map_err(city_to_api)?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(city.into()))
}

pub async fn list_city_images(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<CityImage>>, ApiError> {
    let images = state.cities.images(id).await.map_err(city_to_api)?;
    Ok(Json(images.into_iter().map(CityImage::from).collect()))
}

pub async fn list_city_facts(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<CityFact>>, ApiError> {
    let facts = state.cities.facts(id).await.map_err(city_to_api)?;
    Ok(Json(facts.into_iter().map(CityFact::from).collect()))
}

pub async fn get_city_trends(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Trend>>, ApiError> {
    let trends = state
        .trends
        .trends_for_city(id)
        .await
        .map_err(trends_to_api)?;
    Ok(Json(trends))
}

fn city_to_api(err: CityServiceError) -> ApiError {
    match err {
        CityServiceError::Repo(repo) => repo_to_api(repo),
    }
}

fn trends_to_api(err: TrendsError) -> ApiError {
    let message = err.to_string();
    match err {
        TrendsError::CityNotFound => ApiError::message(StatusCode::NOT_FOUND, codes::NOT_FOUND, message),
        TrendsError::Upstream(_) => {
            ApiError::message(StatusCode::SERVICE_UNAVAILABLE, codes::UPSTREAM, message)
        }
        TrendsError::Store(_) => {
            ApiError::message(StatusCode::SERVICE_UNAVAILABLE, codes::REPO, message)
        }
    }
}

fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found(),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}
