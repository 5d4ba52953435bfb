use async_trait::async_trait;

use crate::{
    application::repos::{CitiesRepo, CitiesWriteRepo, RepoError},
    domain::entities::{CityFactRecord, CityImageRecord, CityRecord},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CityRow {
    id: i64,
    name: String,
    latitude: f64,
    longitude: f64,
    woeid: Option<i64>,
}

impl From<CityRow> for CityRecord {
    fn from(row: CityRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            woeid: row.woeid,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CityImageRow {
    id: i64,
    city_id: i64,
    image: String,
}

impl From<CityImageRow> for CityImageRecord {
    fn from(row: CityImageRow) -> Self {
        Self {
            id: row.id,
            city_id: row.city_id,
            image: row.image,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CityFactRow {
    id: i64,
    city_id: i64,
    fact: String,
}

impl From<CityFactRow> for CityFactRecord {
    fn from(row: CityFactRow) -> Self {
        Self {
            id: row.id,
            city_id: row.city_id,
            fact: row.fact,
        }
    }
}

#[async_trait]
impl CitiesRepo for PostgresRepositories {
    async fn list_cities(&self) -> Result<Vec<CityRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CityRow>(
            r#"
            SELECT id, name, latitude, longitude, woeid
            FROM cities
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CityRecord::from).collect())
    }

    async fn find_city(&self, id: i64) -> Result<Option<CityRecord>, RepoError> {
        let row = sqlx::query_as::<_, CityRow>(
            r#"
            SELECT id, name, latitude, longitude, woeid
            FROM cities
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CityRecord::from))
    }

    async fn list_images_for_city(&self, city_id: i64) -> Result<Vec<CityImageRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CityImageRow>(
            r#"
            SELECT id, city_id, image
            FROM city_images
            WHERE city_id = $1
            ORDER BY id
            "#,
        )
        .bind(city_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CityImageRecord::from).collect())
    }

    async fn list_facts_for_city(&self, city_id: i64) -> Result<Vec<CityFactRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CityFactRow>(
            r#"
            SELECT id, city_id, fact
            FROM city_facts
            WHERE city_id = $1
            ORDER BY id
            "#,
        )
        .bind(city_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CityFactRecord::from).collect())
    }
}

#[async_trait]
impl CitiesWriteRepo for PostgresRepositories {
    async fn set_city_woeid(&self, city_id: i64, woeid: i64) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE cities SET woeid = $2 WHERE id = $1")
            .bind(city_id)
            .bind(woeid)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
