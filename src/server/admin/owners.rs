use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Duration;
use uuid::Uuid;

use crate::auth::{RequireAdmin, hash_password, issue_token};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{
    CreateOwnerRequest, CreateOwnerTokenRequest, CreateTokenResponse, PaginationParams,
    TokenResponse,
};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation::{non_blank, normalize_email, validate_email, validate_password};
use crate::types::Owner;

pub async fn create_owner(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOwnerRequest>,
) -> impl IntoResponse {
    validate_email(&req.email)?;

    // Owners created without a password can only use issued tokens.
    let password_hash = match req.password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password).api_err("Failed to create owner")?)
        }
        None => None,
    };

    let owner = Owner {
        id: Uuid::new_v4().to_string(),
        email: normalize_email(&req.email),
        name: non_blank(req.name),
        phone: non_blank(req.phone),
        password_hash,
        created_at: state.clock.now(),
    };

    match state.store.create_owner(&owner) {
        Ok(()) => Ok((StatusCode::CREATED, Json(ApiResponse::success(owner)))),
        Err(Error::AlreadyExists) => Err(ApiError::conflict(
            "An account with this email already exists",
        )),
        Err(e) => {
            tracing::error!("Failed to create owner: {e}");
            Err(ApiError::internal("Failed to create owner"))
        }
    }
}

pub async fn list_owners(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let owners = state
        .store
        .list_owners(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list owners")?;

    let (owners, next_cursor, has_more) =
        paginate(owners, DEFAULT_PAGE_SIZE as usize, |o| o.id.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(owners, next_cursor, has_more)))
}

pub async fn get_owner(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let owner = state
        .store
        .get_owner(&id)
        .api_err("Failed to get owner")?
        .or_not_found("Owner not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(owner)))
}

pub async fn delete_owner(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_owner(&id)
        .api_err("Failed to delete owner")?;

    if !deleted {
        return Err(ApiError::not_found("Owner not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_owner_tokens(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let owner = state
        .store
        .get_owner(&id)
        .api_err("Failed to get owner")?
        .or_not_found("Owner not found")?;

    let tokens = state
        .store
        .list_owner_tokens(&owner.id)
        .api_err("Failed to list tokens")?;

    let responses: Vec<TokenResponse> = tokens.into_iter().map(TokenResponse::from).collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(responses)))
}

pub async fn create_owner_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateOwnerTokenRequest>,
) -> impl IntoResponse {
    let owner = state
        .store
        .get_owner(&id)
        .api_err("Failed to get owner")?
        .or_not_found("Owner not found")?;

    if req.expires_in_seconds.is_some_and(|s| s < 0) {
        return Err(ApiError::bad_request(
            "expires_in_seconds cannot be negative",
        ));
    }

    let now = state.clock.now();
    let expires_at = req.expires_in_seconds.map(|s| now + Duration::seconds(s));

    let (token, raw_token) = issue_token(state.store.as_ref(), Some(&owner.id), now, expires_at)
        .api_err("Failed to create token")?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateTokenResponse {
            token: raw_token,
            metadata: TokenResponse::from(token),
        })),
    ))
}
