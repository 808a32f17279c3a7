use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::{require_role, CurrentUser},
    bookings::repo::Booking,
    error::{ApiError, ApiResult},
    state::AppState,
    tours::repo::Tour,
    users::repo::Role,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/me", get(my_bookings))
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub tour_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[instrument(skip(state, user, payload))]
pub async fn create_booking(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let tour = Tour::find_by_id(&state.db, payload.tour_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No tour found with that ID".into()))?;

    let booking = Booking::create(&state.db, tour.id, user.id, tour.price).await?;

    info!(booking_id = %booking.id, tour_id = %tour.id, user_id = %user.id, "booking created");
    Ok((StatusCode::CREATED, Json(booking)))
}

#[instrument(skip(state, user))]
pub async fn my_bookings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Booking>>> {
    Ok(Json(Booking::list_for_user(&state.db, user.id).await?))
}

#[instrument(skip(state, user))]
pub async fn list_bookings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(p): Query<Pagination>,
) -> ApiResult<Json<Vec<Booking>>> {
    require_role(&user, &[Role::Admin])?;
    Ok(Json(Booking::list_all(&state.db, p.limit, p.offset).await?))
}
