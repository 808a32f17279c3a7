use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::tours::repo::DIFFICULTIES;

#[derive(Debug, Deserialize)]
pub struct TourListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub difficulty: Option<String>,
    pub max_price: Option<f64>,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub min_rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTourRequest {
    pub name: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: String,
    pub price: f64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_dates: Vec<OffsetDateTime>,
    pub start_lat: f64,
    pub start_lng: f64,
    #[serde(default)]
    pub start_address: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTourRequest {
    pub name: Option<String>,
    pub duration: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<String>,
    pub price: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start_dates: Option<Vec<OffsetDateTime>>,
    pub start_lat: Option<f64>,
    pub start_lng: Option<f64>,
    pub start_address: Option<String>,
}

pub fn validate_difficulty(difficulty: &str) -> Result<(), ApiError> {
    if DIFFICULTIES.contains(&difficulty) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Difficulty is either: easy, medium, difficult".into(),
        ))
    }
}

pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ApiError> {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Coordinates must be within -90..90 latitude and -180..180 longitude".into(),
        ))
    }
}

impl CreateTourRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("A tour must have a name".into()));
        }
        if self.duration <= 0 {
            return Err(ApiError::Validation("A tour must have a duration".into()));
        }
        if self.max_group_size <= 0 {
            return Err(ApiError::Validation("A tour must have a group size".into()));
        }
        if self.price <= 0.0 {
            return Err(ApiError::Validation("A tour must have a price".into()));
        }
        validate_difficulty(&self.difficulty)?;
        validate_coordinates(self.start_lat, self.start_lng)
    }
}

impl UpdateTourRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ApiError::Validation("A tour must have a name".into()));
            }
        }
        if matches!(self.duration, Some(d) if d <= 0) {
            return Err(ApiError::Validation("A tour must have a duration".into()));
        }
        if matches!(self.max_group_size, Some(s) if s <= 0) {
            return Err(ApiError::Validation("A tour must have a group size".into()));
        }
        if matches!(self.price, Some(p) if p <= 0.0) {
            return Err(ApiError::Validation("A tour must have a price".into()));
        }
        if let Some(difficulty) = &self.difficulty {
            validate_difficulty(difficulty)?;
        }
        if let (Some(lat), Some(lng)) = (self.start_lat, self.start_lng) {
            validate_coordinates(lat, lng)?;
        }
        Ok(())
    }
}
