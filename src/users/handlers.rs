use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CreateUserRequest, Pagination, RegisterResponse, UpdateUserRequest};
use super::repo_types::User;
use super::services::{create_user, mint_initial_tokens, validate_changes, validate_new_user};
use crate::chain::normalize_wallet;
use crate::extract::JsonBody;
use crate::errors::{bad_request, not_found, repo_error, ApiError};
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create).get(list_users))
        .route("/users/register", post(register))
        .route("/users/:wallet", get(get_user).put(update_user))
}

fn wallet_param(raw: &str) -> Result<String, ApiError> {
    normalize_wallet(raw).map_err(|_| bad_request("Invalid wallet address"))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let new_user = validate_new_user(payload)?;
    let user = create_user(&state, new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Off-chain registration followed by a best-effort starter mint.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let new_user = validate_new_user(payload)?;
    let user = create_user(&state, new_user).await?;
    let mint_tx = mint_initial_tokens(&state, &user.wallet_address).await;

    info!(user_id = %user.id, minted = mint_tx.is_some(), "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            minted: mint_tx.is_some(),
            mint_tx,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<User>>, ApiError> {
    let (limit, offset) = p.clamped();
    let users = state
        .users
        .list(limit, offset)
        .await
        .map_err(|e| repo_error(e, "User"))?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<User>, ApiError> {
    let wallet = wallet_param(&wallet)?;
    state
        .users
        .find_by_wallet(&wallet)
        .await
        .map_err(|e| repo_error(e, "User"))?
        .map(Json)
        .ok_or_else(|| not_found("User not found"))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let wallet = wallet_param(&wallet)?;
    let changes = validate_changes(payload)?;
    let user = state
        .users
        .update(&wallet, changes)
        .await
        .map_err(|e| repo_error(e, "User"))?;
    Ok(Json(user))
}
