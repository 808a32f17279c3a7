use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::{require_role, CurrentUser},
    error::{ApiError, ApiResult},
    reviews::repo::Review,
    state::AppState,
    tours::repo::Tour,
    users::repo::Role,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/tours/:id/reviews",
            get(list_reviews).post(create_review),
        )
        .route("/reviews/:id", delete(delete_review))
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub body: String,
}

#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Review>>> {
    if Tour::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("No tour found with that ID".into()));
    }
    Ok(Json(Review::list_for_tour(&state.db, id).await?))
}

#[instrument(skip(state, user, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    require_role(&user, &[Role::User])?;

    if !(1..=5).contains(&payload.rating) {
        return Err(ApiError::Validation("Rating must be between 1 and 5".into()));
    }
    if payload.body.trim().is_empty() {
        return Err(ApiError::Validation("A review must not be empty".into()));
    }
    if Tour::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("No tour found with that ID".into()));
    }

    let review =
        match Review::create(&state.db, id, user.id, payload.rating, payload.body.trim()).await {
            Ok(review) => review,
            Err(e) => {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return Err(ApiError::Conflict(
                            "You have already reviewed this tour".into(),
                        ));
                    }
                }
                return Err(e.into());
            }
        };

    Review::recalc_tour_ratings(&state.db, id).await?;

    info!(review_id = %review.id, tour_id = %id, "review created");
    Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(skip(state, user))]
pub async fn delete_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let review = Review::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No review found with that ID".into()))?;

    if review.user_id != user.id {
        require_role(&user, &[Role::Admin])?;
    }

    Review::delete(&state.db, id).await?;
    Review::recalc_tour_ratings(&state.db, review.tour_id).await?;

    info!(review_id = %id, "review deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_serialization_exposes_rating_and_body() {
        let review = Review {
            id: Uuid::new_v4(),
            tour_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            rating: 5,
            body: "Amazing views".into(),
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&review).unwrap();
        assert!(json.contains("Amazing views"));
        assert!(json.contains("\"rating\":5"));
    }
}
