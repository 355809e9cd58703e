use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::auth::RequireOwner;
use crate::loyalty::{owner_cafe, qr_filename, render_qr_svg};
use crate::server::AppState;
use crate::server::dto::{CreateCafeRequest, SetNfcTagRequest, UpdateCafeRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{
    non_blank, validate_cafe_name, validate_reward_description, validate_stamps_required,
};
use crate::types::Cafe;

const DEFAULT_STAMPS_REQUIRED: i32 = 10;
const DEFAULT_REWARD: &str = "Free coffee";

pub async fn create_cafe(
    auth: RequireOwner,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCafeRequest>,
) -> impl IntoResponse {
    validate_cafe_name(&req.name)?;

    let stamps_required = req.stamps_required.unwrap_or(DEFAULT_STAMPS_REQUIRED);
    validate_stamps_required(stamps_required)?;

    let reward_description =
        non_blank(req.reward_description).unwrap_or_else(|| DEFAULT_REWARD.to_string());
    validate_reward_description(&reward_description)?;

    let existing = state
        .store
        .get_cafe_by_owner(&auth.owner.id)
        .api_err("Failed to check existing cafe")?;
    if existing.is_some() {
        return Err(ApiError::conflict("Your cafe is already set up"));
    }

    let cafe = Cafe {
        id: Uuid::new_v4().to_string(),
        owner_id: auth.owner.id.clone(),
        name: req.name.trim().to_string(),
        address: non_blank(req.address),
        city: non_blank(req.city),
        latitude: None,
        longitude: None,
        logo_url: None,
        nfc_tag_id: None,
        qr_code_url: None,
        stamps_required,
        reward_description,
        is_active: true,
        created_at: state.clock.now(),
    };

    state
        .store
        .create_cafe(&cafe)
        .api_err("Failed to create cafe")?;

    tracing::info!(cafe_id = %cafe.id, owner_id = %cafe.owner_id, "cafe set up");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(cafe))))
}

pub async fn get_cafe(
    auth: RequireOwner,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let cafe = owner_cafe(state.store.as_ref(), &auth.owner.id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(cafe)))
}

pub async fn update_cafe(
    auth: RequireOwner,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateCafeRequest>,
) -> impl IntoResponse {
    let mut cafe = owner_cafe(state.store.as_ref(), &auth.owner.id)?;

    if let Some(name) = req.name {
        validate_cafe_name(&name)?;
        cafe.name = name.trim().to_string();
    }

    if let Some(stamps_required) = req.stamps_required {
        validate_stamps_required(stamps_required)?;
        cafe.stamps_required = stamps_required;
    }

    if let Some(reward) = req.reward_description {
        validate_reward_description(&reward)?;
        cafe.reward_description = reward.trim().to_string();
    }

    // An empty string clears the field, a missing one leaves it untouched.
    if req.address.is_some() {
        cafe.address = non_blank(req.address);
    }
    if req.city.is_some() {
        cafe.city = non_blank(req.city);
    }

    state
        .store
        .update_cafe(&cafe)
        .api_err("Failed to update cafe")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(cafe)))
}

pub async fn set_nfc_tag(
    auth: RequireOwner,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetNfcTagRequest>,
) -> impl IntoResponse {
    let mut cafe = owner_cafe(state.store.as_ref(), &auth.owner.id)?;
    let tag = non_blank(req.nfc_tag_id);

    state
        .store
        .set_cafe_nfc_tag(&cafe.id, tag.as_deref())
        .api_err("Failed to save NFC settings")?;

    cafe.nfc_tag_id = tag;
    Ok::<_, ApiError>(Json(ApiResponse::success(cafe)))
}

pub async fn get_links(
    auth: RequireOwner,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let cafe = owner_cafe(state.store.as_ref(), &auth.owner.id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(state.links_for(&cafe.id))))
}

pub async fn get_qr_code(
    auth: RequireOwner,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let cafe = owner_cafe(state.store.as_ref(), &auth.owner.id)?;
    let links = state.links_for(&cafe.id);
    let svg = render_qr_svg(&links.stamp_url).api_err("Failed to render QR code")?;

    let filename = qr_filename(&cafe.name).replace('"', "");
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"cafe-qr-code.svg\""));

    Ok::<_, ApiError>((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/svg+xml")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        svg,
    ))
}
