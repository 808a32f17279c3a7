use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::PublicUser,
        handlers::is_valid_email,
        jwt::{require_role, CurrentUser},
    },
    error::{ApiError, ApiResult},
    state::AppState,
    users::repo::{Role, User},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(get_me).patch(update_me).delete(delete_me))
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

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

#[instrument(skip(state, user))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(p): Query<Pagination>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    require_role(&user, &[Role::Admin])?;
    let users = User::list(&state.db, p.limit, p.offset).await?;
    Ok(Json(users.iter().map(PublicUser::from).collect()))
}

#[instrument(skip(user))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}

#[instrument(skip(state, user, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateMeRequest>,
) -> ApiResult<Json<PublicUser>> {
    if payload.password.is_some() || payload.password_confirm.is_some() {
        return Err(ApiError::Validation(
            "This route is not for password updates, use /api/v1/auth/password".into(),
        ));
    }

    let name = match payload.name {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ApiError::Validation("Name must not be empty".into()));
            }
            name
        }
        None => user.name.clone(),
    };

    let email = match payload.email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            if !is_valid_email(&email) {
                return Err(ApiError::Validation("Please provide a valid email".into()));
            }
            if email != user.email {
                if let Some(existing) = User::find_by_email(&state.db, &email).await? {
                    if existing.id != user.id {
                        warn!(email = %email, "email already taken");
                        return Err(ApiError::Conflict("Email already registered".into()));
                    }
                }
            }
            email
        }
        None => user.email.clone(),
    };

    let updated = User::update_profile(&state.db, user.id, &name, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User no longer exists".into()))?;

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(PublicUser::from(&updated)))
}

#[instrument(skip(state, user))]
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<StatusCode> {
    User::deactivate(&state.db, user.id).await?;
    info!(user_id = %user.id, "account deactivated");
    Ok(StatusCode::NO_CONTENT)
}
