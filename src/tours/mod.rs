use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod geo;
pub mod handlers;
pub mod reporting;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::router()
}
