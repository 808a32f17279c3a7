use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::{require_role, CurrentUser},
    error::{ApiError, ApiResult},
    state::AppState,
    tours::{
        dto::{CreateTourRequest, StatsQuery, TourListQuery, UpdateTourRequest},
        geo::{self, TourDistance, Unit},
        reporting::{self, DifficultyStats, MonthlyPlanEntry},
        repo::{Tour, TourFilter},
    },
    users::repo::Role,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tours", get(list_tours).post(create_tour))
        .route("/tours/top-5-cheap", get(top_tours))
        .route("/tours/stats", get(tour_stats))
        .route("/tours/monthly-plan/:year", get(monthly_plan))
        .route(
            "/tours/within/:distance/center/:latlng/unit/:unit",
            get(tours_within),
        )
        .route("/tours/distances/:latlng/unit/:unit", get(tour_distances))
        .route(
            "/tours/:id",
            get(get_tour).patch(update_tour).delete(delete_tour),
        )
}

#[instrument(skip(state))]
pub async fn list_tours(
    State(state): State<AppState>,
    Query(query): Query<TourListQuery>,
) -> ApiResult<Json<Vec<Tour>>> {
    if let Some(difficulty) = &query.difficulty {
        crate::tours::dto::validate_difficulty(difficulty)?;
    }
    let filter = TourFilter {
        difficulty: query.difficulty,
        max_price: query.max_price,
    };
    let tours = Tour::list(&state.db, &filter, query.limit, query.offset).await?;
    Ok(Json(tours))
}

#[instrument(skip(state))]
pub async fn top_tours(State(state): State<AppState>) -> ApiResult<Json<Vec<Tour>>> {
    Ok(Json(Tour::top_five(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Tour>> {
    let tour = Tour::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No tour found with that ID".into()))?;
    Ok(Json(tour))
}

#[instrument(skip(state, user, payload))]
pub async fn create_tour(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTourRequest>,
) -> ApiResult<(StatusCode, Json<Tour>)> {
    require_role(&user, &[Role::Admin, Role::LeadGuide])?;
    payload.validate()?;

    let tour = match Tour::create(
        &state.db,
        payload.name.trim(),
        payload.duration,
        payload.max_group_size,
        &payload.difficulty,
        payload.price,
        &payload.summary,
        &payload.description,
        &payload.start_dates,
        payload.start_lat,
        payload.start_lng,
        &payload.start_address,
    )
    .await
    {
        Ok(tour) => tour,
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return Err(ApiError::Conflict("A tour with that name exists".into()));
                }
            }
            return Err(e.into());
        }
    };

    info!(tour_id = %tour.id, name = %tour.name, "tour created");
    Ok((StatusCode::CREATED, Json(tour)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_tour(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTourRequest>,
) -> ApiResult<Json<Tour>> {
    require_role(&user, &[Role::Admin, Role::LeadGuide])?;
    payload.validate()?;

    let tour = Tour::update(
        &state.db,
        id,
        payload.name.as_deref(),
        payload.duration,
        payload.max_group_size,
        payload.difficulty.as_deref(),
        payload.price,
        payload.summary.as_deref(),
        payload.description.as_deref(),
        payload.start_dates.as_deref(),
        payload.start_lat,
        payload.start_lng,
        payload.start_address.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("No tour found with that ID".into()))?;

    info!(tour_id = %tour.id, "tour updated");
    Ok(Json(tour))
}

#[instrument(skip(state, user))]
pub async fn delete_tour(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&user, &[Role::Admin, Role::LeadGuide])?;
    let deleted = Tour::delete(&state.db, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("No tour found with that ID".into()));
    }
    info!(tour_id = %id, "tour deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn tour_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<Vec<DifficultyStats>>> {
    let min_rating = query.min_rating.unwrap_or(reporting::DEFAULT_MIN_RATING);
    let rows = Tour::stats_source(&state.db, min_rating).await?;
    Ok(Json(reporting::difficulty_stats(&rows)))
}

#[instrument(skip(state))]
pub async fn monthly_plan(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> ApiResult<Json<Vec<MonthlyPlanEntry>>> {
    let rows = Tour::start_dates_source(&state.db).await?;
    Ok(Json(reporting::monthly_plan(&rows, year)))
}

#[instrument(skip(state))]
pub async fn tours_within(
    State(state): State<AppState>,
    Path((distance, latlng, unit)): Path<(f64, String, String)>,
) -> ApiResult<Json<Vec<Tour>>> {
    // Bad coordinates must stop the request here, before any query runs.
    let center = geo::parse_latlng(&latlng)?;
    if distance < 0.0 {
        return Err(ApiError::Validation("Distance must not be negative".into()));
    }

    let unit = Unit::from_param(&unit);
    let radius = unit.angular_radius(distance);

    let locations = Tour::locations(&state.db).await?;
    let ids: Vec<Uuid> = locations
        .iter()
        .filter(|loc| geo::within_radius(center, (loc.start_lat, loc.start_lng), radius))
        .map(|loc| loc.id)
        .collect();

    if ids.is_empty() {
        return Ok(Json(Vec::new()));
    }
    Ok(Json(Tour::find_by_ids(&state.db, &ids).await?))
}

#[instrument(skip(state))]
pub async fn tour_distances(
    State(state): State<AppState>,
    Path((latlng, unit)): Path<(String, String)>,
) -> ApiResult<Json<Vec<TourDistance>>> {
    let center = geo::parse_latlng(&latlng)?;
    let unit = Unit::from_param(&unit);

    let locations = Tour::locations(&state.db).await?;
    Ok(Json(geo::distances_from(center, &locations, unit)))
}
