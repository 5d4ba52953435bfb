//! Import of city content from a TOML archive.

use std::{collections::HashSet, path::Path};

use serde::Deserialize;
use sqlx::query;

use crate::{
    application::error::AppError,
    domain::error::DomainError,
    infra::{db::PostgresRepositories, error::InfraError},
};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CityArchive {
    pub cities: Vec<ArchivedCity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchivedCity {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub woeid: Option<i64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub facts: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub cities: usize,
    pub images: usize,
    pub facts: usize,
}

impl CityArchive {
    fn normalize(&mut self) {
        for city in &mut self.cities {
            city.name = city.name.trim().to_string();
            city.images = city
                .images
                .iter()
                .map(|image| image.trim().to_string())
                .collect();
            city.facts = city.facts.iter().map(|fact| fact.trim().to_string()).collect();
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for city in &self.cities {
            if city.id <= 0 {
                return Err(DomainError::validation(format!(
                    "city id {} must be positive",
                    city.id
                )));
            }
            if !seen.insert(city.id) {
                return Err(DomainError::validation(format!(
                    "city id {} appears more than once",
                    city.id
                )));
            }
            if city.name.is_empty() {
                return Err(DomainError::validation(format!(
                    "city {} has an empty name",
                    city.id
                )));
            }
            if !(-90.0..=90.0).contains(&city.latitude) {
                return Err(DomainError::validation(format!(
                    "city {} latitude {} is out of range",
                    city.id, city.latitude
                )));
            }
            if !(-180.0..=180.0).contains(&city.longitude) {
                return Err(DomainError::validation(format!(
                    "city {} longitude {} is out of range",
                    city.id, city.longitude
                )));
            }
            if city.images.iter().any(String::is_empty) {
                return Err(DomainError::validation(format!(
                    "city {} has an empty image reference",
                    city.id
                )));
            }
            if city.facts.iter().any(String::is_empty) {
                return Err(DomainError::validation(format!(
                    "city {} has an empty fact",
                    city.id
                )));
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> ImportSummary {
        self.cities
            .iter()
            .fold(ImportSummary::default(), |acc, city| ImportSummary {
                cities: acc.cities + 1,
                images: acc.images + city.images.len(),
                facts: acc.facts + city.facts.len(),
            })
    }
}

/// Parse and validate an archive document.
pub fn parse_archive(data: &str) -> Result<CityArchive, AppError> {
    let mut archive: CityArchive = toml::from_str(data)
        .map_err(|err| AppError::validation(format!("invalid archive: {err}")))?;
    archive.normalize();
    archive.validate()?;
    Ok(archive)
}

/// Replace all stored cities, images and facts with the archive at `path`.
pub async fn import_cities(
    repositories: &PostgresRepositories,
    path: &Path,
) -> Result<ImportSummary, AppError> {
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;
    let archive = parse_archive(&data)?;

    let mut tx = repositories.begin().await.map_err(database_error)?;

    query("TRUNCATE city_images, city_facts, cities RESTART IDENTITY CASCADE")
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

    for city in &archive.cities {
        query(
            r#"
            INSERT INTO cities (id, name, latitude, longitude, woeid)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(city.id)
        .bind(&city.name)
        .bind(city.latitude)
        .bind(city.longitude)
        .bind(city.woeid)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        for image in &city.images {
            query("INSERT INTO city_images (city_id, image) VALUES ($1, $2)")
                .bind(city.id)
                .bind(image)
                .execute(&mut *tx)
                .await
                .map_err(database_error)?;
        }

        for fact in &city.facts {
            query("INSERT INTO city_facts (city_id, fact) VALUES ($1, $2)")
                .bind(city.id)
                .bind(fact)
                .execute(&mut *tx)
                .await
                .map_err(database_error)?;
        }
    }

    // Explicit ids bypass the sequence; move it past the imported rows.
    query(
        r#"
        SELECT setval(
            pg_get_serial_sequence('cities', 'id'),
            COALESCE((SELECT MAX(id) FROM cities), 1),
            (SELECT COUNT(*) > 0 FROM cities)
        )
        "#,
    )
    .execute(&mut *tx)
    .await
    .map_err(database_error)?;

    tx.commit().await.map_err(database_error)?;

    Ok(archive.summary())
}

fn database_error(err: sqlx::Error) -> AppError {
    AppError::from(InfraError::database(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [[cities]]
        id = 7
        name = " London "
        latitude = 51.5
        longitude = -0.12
        images = ["https://example.com/london.jpg"]
        facts = ["Tower Bridge opened in 1894", "Has a river"]

        [[cities]]
        id = 8
        name = "Tokyo"
        latitude = 35.68
        longitude = 139.69
        woeid = 1118370
    "#;

    #[test]
    fn parses_and_normalizes_archive() {
        let archive = parse_archive(SAMPLE).expect("valid archive");

        assert_eq!(archive.cities.len(), 2);
        assert_eq!(archive.cities[0].name, "London");
        assert_eq!(archive.cities[0].woeid, None);
        assert_eq!(archive.cities[1].woeid, Some(1_118_370));
        assert!(archive.cities[1].images.is_empty());
        assert_eq!(
            archive.summary(),
            ImportSummary {
                cities: 2,
                images: 1,
                facts: 2,
            }
        );
    }

    #[test]
    fn empty_document_is_an_empty_archive() {
        let archive = parse_archive("").expect("empty archive");
        assert!(archive.cities.is_empty());
    }

    #[test]
    fn rejects_duplicate_city_ids() {
        let data = r#"
            [[cities]]
            id = 1
            name = "A"
            latitude = 0.0
            longitude = 0.0

            [[cities]]
            id = 1
            name = "B"
            latitude = 0.0
            longitude = 0.0
        "#;

        let err = parse_archive(data).expect_err("duplicate ids");
        assert!(matches!(
            err,
            AppError::Domain(DomainError::Validation { ref message })
                if message.contains("more than once")
        ));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let data = r#"
            [[cities]]
            id = 1
            name = "Nowhere"
            latitude = 91.0
            longitude = 0.0
        "#;

        let err = parse_archive(data).expect_err("latitude out of range");
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = parse_archive("[[cities]]\nid = \"seven\"").expect_err("bad type");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
