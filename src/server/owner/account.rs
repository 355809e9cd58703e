use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Duration;
use uuid::Uuid;

use crate::auth::{RequireOwner, hash_password, issue_token, verify_password};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{SessionResponse, SignInRequest, SignUpRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{
    non_blank, normalize_email, validate_email, validate_password,
};
use crate::types::Owner;

/// Lifetime of a token handed out by sign-up and sign-in.
const SESSION_TTL_DAYS: i64 = 30;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn start_session(state: &AppState, owner: Owner) -> Result<SessionResponse, ApiError> {
    let now = state.clock.now();
    let expires_at = now + Duration::days(SESSION_TTL_DAYS);
    let (token, raw_token) = issue_token(state.store.as_ref(), Some(&owner.id), now, Some(expires_at))
        .api_err("Failed to create session")?;

    Ok(SessionResponse {
        token: raw_token,
        owner,
        expires_at: token.expires_at,
    })
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> impl IntoResponse {
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let email = normalize_email(&req.email);
    let password_hash = hash_password(&req.password).api_err("Failed to create account")?;

    let owner = Owner {
        id: Uuid::new_v4().to_string(),
        email,
        name: non_blank(req.name),
        phone: non_blank(req.phone),
        password_hash: Some(password_hash),
        created_at: state.clock.now(),
    };

    match state.store.create_owner(&owner) {
        Ok(()) => {}
        Err(Error::AlreadyExists) => {
            return Err(ApiError::conflict(
                "An account with this email already exists",
            ));
        }
        Err(e) => {
            tracing::error!("Failed to create owner: {e}");
            return Err(ApiError::internal("Failed to create account"));
        }
    }

    tracing::info!(owner_id = %owner.id, "owner signed up");

    let session = start_session(&state, owner)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(session))))
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> impl IntoResponse {
    let owner = state
        .store
        .get_owner_by_email(&normalize_email(&req.email))
        .api_err("Failed to sign in")?
        .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    let Some(hash) = owner.password_hash.as_deref() else {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(&req.password, hash).api_err("Failed to sign in")? {
        tracing::warn!(owner_id = %owner.id, "rejected sign-in");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let session = start_session(&state, owner)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(session)))
}

pub async fn sign_out(
    auth: RequireOwner,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    state
        .store
        .delete_token(&auth.token.id)
        .api_err("Failed to sign out")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn me(auth: RequireOwner) -> impl IntoResponse {
    Json(ApiResponse::success(auth.owner))
}
