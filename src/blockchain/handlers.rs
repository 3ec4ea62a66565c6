use alloy::primitives::U256;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::dto::{
    BalanceResponse, CampaignDetailsResponse, ContributeRequest, ContributeResponse,
    CreateCampaignRequest, CreateCampaignResponse, MintRequest, TxResponse,
};
use super::services::{contribute_with_approval, MAX_DURATION_DAYS, SECONDS_PER_DAY};
use crate::chain::{format_token_amount, parse_address, parse_token_amount, ChainResult};
use crate::extract::JsonBody;
use crate::errors::{bad_request, chain_error, ApiError};
use crate::state::AppState;

pub fn blockchain_routes() -> Router<AppState> {
    Router::new()
        .route("/blockchain/balance/:address", get(balance))
        .route("/blockchain/mint", post(mint))
        .route("/blockchain/campaigns", post(create_campaign))
        .route("/blockchain/campaigns/:id", get(campaign_details))
        .route("/blockchain/campaigns/:id/backers", get(campaign_backers))
        .route("/blockchain/campaigns/:id/contribute", post(contribute))
        .route("/blockchain/campaigns/:id/claim", post(claim))
}

fn amount(state: &AppState, raw: &str) -> ChainResult<U256> {
    parse_token_amount(raw, state.config.chain.token_decimals)
}

#[instrument(skip(state))]
pub async fn balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let owner = parse_address(&address).map_err(|e| chain_error(e, "read balance"))?;
    let raw = state
        .chain
        .balance_of(owner)
        .await
        .map_err(|e| chain_error(e, "read balance"))?;
    Ok(Json(BalanceResponse {
        address: format!("{owner:#x}"),
        balance: format_token_amount(raw, state.config.chain.token_decimals),
        raw: raw.to_string(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn mint(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<MintRequest>,
) -> Result<Json<TxResponse>, ApiError> {
    let to = parse_address(&payload.address).map_err(|e| chain_error(e, "mint tokens"))?;
    let requested = payload
        .amount
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(state.config.chain.initial_mint.as_str());
    let value = amount(&state, requested).map_err(|e| chain_error(e, "mint tokens"))?;

    let tx_hash = state
        .chain
        .mint(to, value)
        .await
        .map_err(|e| chain_error(e, "mint tokens"))?;
    info!(to = %to, amount = %requested, %tx_hash, "tokens minted");
    Ok(Json(TxResponse { tx_hash }))
}

#[instrument(skip(state, payload))]
pub async fn create_campaign(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CreateCampaignResponse>), ApiError> {
    if payload.duration_days == 0 || payload.duration_days > MAX_DURATION_DAYS {
        return Err(bad_request(format!(
            "duration_days must be between 1 and {MAX_DURATION_DAYS}"
        )));
    }
    let goal = amount(&state, &payload.goal).map_err(|e| chain_error(e, "create campaign"))?;
    let duration_secs = u64::from(payload.duration_days) * SECONDS_PER_DAY;

    let created = state
        .chain
        .create_campaign(goal, duration_secs)
        .await
        .map_err(|e| chain_error(e, "create campaign"))?;
    info!(campaign_id = created.campaign_id, tx = %created.tx_hash, "campaign created on chain");
    Ok((
        StatusCode::CREATED,
        Json(CreateCampaignResponse {
            campaign_id: created.campaign_id,
            tx_hash: created.tx_hash,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn campaign_details(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<CampaignDetailsResponse>, ApiError> {
    let c = state
        .chain
        .campaign_details(id)
        .await
        .map_err(|e| chain_error(e, "fetch campaign"))?;
    let decimals = state.config.chain.token_decimals;
    let deadline_at = i64::try_from(c.deadline)
        .ok()
        .and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok());
    Ok(Json(CampaignDetailsResponse {
        campaign_id: c.id,
        creator: format!("{:#x}", c.creator),
        goal: format_token_amount(c.goal, decimals),
        amount_raised: format_token_amount(c.amount_raised, decimals),
        deadline: c.deadline,
        deadline_at,
        claimed: c.claimed,
        active: c.active,
    }))
}

#[instrument(skip(state))]
pub async fn campaign_backers(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<String>>, ApiError> {
    let backers = state
        .chain
        .campaign_backers(id)
        .await
        .map_err(|e| chain_error(e, "fetch backers"))?;
    Ok(Json(backers.iter().map(|a| format!("{a:#x}")).collect()))
}

#[instrument(skip(state, payload))]
pub async fn contribute(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    JsonBody(payload): JsonBody<ContributeRequest>,
) -> Result<Json<ContributeResponse>, ApiError> {
    let value = amount(&state, &payload.amount).map_err(|e| chain_error(e, "contribute"))?;
    let resp = contribute_with_approval(state.chain.as_ref(), id, value)
        .await
        .map_err(|e| chain_error(e, "contribute"))?;
    info!(campaign_id = id, amount = %payload.amount, tx = %resp.contribute_tx, "contribution sent");
    Ok(Json(resp))
}

#[instrument(skip(state))]
pub async fn claim(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<TxResponse>, ApiError> {
    let tx_hash = state
        .chain
        .claim_funds(id)
        .await
        .map_err(|e| chain_error(e, "claim funds"))?;
    info!(campaign_id = id, %tx_hash, "funds claimed");
    Ok(Json(TxResponse { tx_hash }))
}
