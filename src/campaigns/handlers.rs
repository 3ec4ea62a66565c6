use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{AppendUpdateRequest, CampaignView, ListQuery, SaveCampaignRequest};
use super::repo_types::{CampaignFilter, CampaignRecord};
use super::services::{merged_view, merged_views, save_campaign, validate_campaign, with_image_url};
use crate::chain::normalize_wallet;
use crate::extract::JsonBody;
use crate::errors::{bad_request, not_found, repo_error, ApiError};
use crate::state::AppState;

/// Leaves room for a base64 image at the default size limit.
const WRITE_BODY_LIMIT: usize = 16 * 1024 * 1024;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/campaigns", get(list_campaigns))
        .route("/campaigns/:address", get(get_campaign))
        .route("/campaigns/:address/metadata", get(get_metadata))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/campaigns", post(create_campaign_metadata))
        .route("/campaigns/:address/updates", post(append_update))
        .layer(DefaultBodyLimit::max(WRITE_BODY_LIMIT))
}

async fn find_record(state: &AppState, address: &str) -> Result<CampaignRecord, ApiError> {
    state
        .campaigns
        .find_by_address(address)
        .await
        .map_err(|e| repo_error(e, "Campaign"))?
        .ok_or_else(|| not_found("Campaign not found"))
}

/// POST /campaigns, called once the on-chain campaign is confirmed.
#[instrument(skip(state, payload))]
pub async fn create_campaign_metadata(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SaveCampaignRequest>,
) -> Result<(StatusCode, HeaderMap, Json<CampaignRecord>), ApiError> {
    let valid = validate_campaign(payload, state.config.max_image_bytes)?;
    let record = save_campaign(&state, valid).await?;
    let record = with_image_url(&state, record).await;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/campaigns/{}", record.metadata.campaign_address).parse() {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(record)))
}

#[instrument(skip(state))]
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<CampaignView>>, ApiError> {
    let creator_wallet = match q.creator.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(w) => Some(normalize_wallet(w).map_err(|_| bad_request("Invalid creator wallet"))?),
        None => None,
    };
    let filter = CampaignFilter {
        category: q.category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        creator_wallet,
        text: q.q.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        limit: q.limit.clamp(1, 100),
        offset: q.offset.max(0),
    };

    let records = state
        .campaigns
        .list(&filter)
        .await
        .map_err(|e| repo_error(e, "Campaign"))?;
    Ok(Json(merged_views(&state, records).await))
}

#[instrument(skip(state))]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<CampaignView>, ApiError> {
    let record = find_record(&state, &address).await?;
    Ok(Json(merged_view(&state, record).await))
}

#[instrument(skip(state))]
pub async fn get_metadata(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<CampaignRecord>, ApiError> {
    let record = find_record(&state, &address).await?;
    Ok(Json(with_image_url(&state, record).await))
}

#[instrument(skip(state, payload))]
pub async fn append_update(
    State(state): State<AppState>,
    Path(address): Path<String>,
    JsonBody(payload): JsonBody<AppendUpdateRequest>,
) -> Result<(StatusCode, Json<CampaignRecord>), ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(bad_request("message is required"));
    }
    let record = state
        .campaigns
        .append_update(&address, message)
        .await
        .map_err(|e| repo_error(e, "Campaign"))?;
    info!(%address, updates = record.updates.len(), "campaign update appended");
    Ok((StatusCode::CREATED, Json(with_image_url(&state, record).await)))
}
