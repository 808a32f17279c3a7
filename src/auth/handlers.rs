use axum::{
    extract::{FromRef, Path, State},
    routing::{patch, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, PublicUser,
            RegisterRequest, ResetPasswordRequest, UpdatePasswordRequest,
        },
        jwt::{CurrentUser, JwtKeys},
        mailer,
        password::{self, ResetToken},
    },
    error::{ApiError, ApiResult},
    state::AppState,
    users::repo::User,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password/:token", patch(reset_password))
        .route("/auth/password", patch(update_password))
}

fn signed_response(state: &AppState, user: &User) -> ApiResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id).map_err(ApiError::Internal)?;
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Please tell us your name".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Please provide a valid email".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = password::prepare_password(&payload.password, &payload.password_confirm)?;

    let user = match User::create(&state.db, payload.name.trim(), &payload.email, &hash).await {
        Ok(user) => user,
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return Err(ApiError::Conflict("Email already registered".into()));
                }
            }
            return Err(e.into());
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    signed_response(&state, &user)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("Please provide a valid email".into()));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthorized("Incorrect email or password".into())
        })?;

    let ok = password::verify_password(&payload.password, &user.password_hash)
        .map_err(ApiError::Internal)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Incorrect email or password".into()));
    }

    info!(user_id = %user.id, "user logged in");
    signed_response(&state, &user)
}

/// Issues a reset token and mails its raw form. The response is the same
/// whether or not the email maps to an account.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    let response = MessageResponse {
        message: "If that email exists, a reset token has been sent",
    };

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        debug!("forgot-password for unknown email");
        return Ok(Json(response));
    };

    let token = ResetToken::issue();
    User::set_reset_token(&state.db, user.id, &token).await?;

    match state.config.smtp.clone() {
        Some(smtp) => {
            let to = user.email.clone();
            let raw = token.raw.clone();
            let sent = tokio::task::spawn_blocking(move || mailer::send_reset_email(&smtp, &to, &raw))
                .await
                .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?;

            if let Err(e) = sent {
                // A token the user never received must not stay pending.
                User::clear_reset_token(&state.db, user.id).await?;
                error!(error = %e, user_id = %user.id, "reset email send failed");
                return Err(ApiError::Internal(anyhow::anyhow!(
                    "There was an error sending the email, try again later"
                )));
            }
            info!(user_id = %user.id, "reset token sent");
        }
        None => {
            debug!(user_id = %user.id, "smtp not configured, reset token issued but not delivered");
        }
    }

    Ok(Json(response))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let hashed = password::hash_reset_token(&token);

    let user = User::find_by_reset_token(&state.db, &hashed)
        .await?
        .ok_or_else(|| ApiError::Validation("Token is invalid or has expired".into()))?;

    let hash = password::prepare_password(&payload.password, &payload.password_confirm)?;
    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password reset");
    signed_response(&state, &user)
}

#[instrument(skip(state, user, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let ok = password::verify_password(&payload.current_password, &user.password_hash)
        .map_err(ApiError::Internal)?;
    if !ok {
        return Err(ApiError::Unauthorized(
            "Your current password is wrong".into(),
        ));
    }

    let hash = password::prepare_password(&payload.password, &payload.password_confirm)?;
    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password updated");
    signed_response(&state, &user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
    }

    #[test]
    fn email_validation_rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
    }
}
