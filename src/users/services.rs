use axum::http::StatusCode;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::dto::{CreateUserRequest, UpdateUserRequest};
use super::repo_types::{NewUser, User, UserChanges};
use crate::chain::{normalize_wallet, parse_address, parse_token_amount};
use crate::errors::{bad_request, repo_error, ApiError};
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn validate_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(bad_request("Name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(bad_request("Name too long"));
    }
    Ok(name.to_string())
}

fn validate_email(email: Option<String>) -> Result<Option<String>, ApiError> {
    match non_empty(email).map(|e| e.to_lowercase()) {
        Some(e) if !is_valid_email(&e) => Err(bad_request("Invalid email")),
        other => Ok(other),
    }
}

pub fn validate_new_user(req: CreateUserRequest) -> Result<NewUser, ApiError> {
    let wallet_address = normalize_wallet(&req.wallet_address)
        .map_err(|_| bad_request("Invalid wallet address"))?;
    Ok(NewUser {
        name: validate_name(&req.name)?,
        email: validate_email(req.email)?,
        bio: non_empty(req.bio),
        avatar_url: non_empty(req.avatar_url),
        wallet_address,
    })
}

pub fn validate_changes(req: UpdateUserRequest) -> Result<UserChanges, ApiError> {
    Ok(UserChanges {
        name: req.name.as_deref().map(validate_name).transpose()?,
        email: validate_email(req.email)?,
        bio: non_empty(req.bio),
        avatar_url: non_empty(req.avatar_url),
    })
}

/// Inserts a user after checking wallet and email are free.
pub async fn create_user(state: &AppState, user: NewUser) -> Result<User, ApiError> {
    if state
        .users
        .find_by_wallet(&user.wallet_address)
        .await
        .map_err(|e| repo_error(e, "User"))?
        .is_some()
    {
        warn!(wallet = %user.wallet_address, "wallet already registered");
        return Err((
            StatusCode::CONFLICT,
            "Wallet address already registered".into(),
        ));
    }

    if let Some(email) = &user.email {
        if state
            .users
            .find_by_email(email)
            .await
            .map_err(|e| repo_error(e, "User"))?
            .is_some()
        {
            warn!(%email, "email already registered");
            return Err((StatusCode::CONFLICT, "Email already registered".into()));
        }
    }

    let user = state
        .users
        .create(user)
        .await
        .map_err(|e| repo_error(e, "User"))?;
    info!(user_id = %user.id, wallet = %user.wallet_address, "user created");
    Ok(user)
}

/// Mints the configured starter balance. Failures are logged and reported as `None`.
pub async fn mint_initial_tokens(state: &AppState, wallet: &str) -> Option<String> {
    let cfg = &state.config.chain;
    let result = async {
        let to = parse_address(wallet)?;
        let amount = parse_token_amount(&cfg.initial_mint, cfg.token_decimals)?;
        state.chain.mint(to, amount).await
    }
    .await;

    match result {
        Ok(tx) => {
            info!(%wallet, amount = %cfg.initial_mint, %tx, "initial tokens minted");
            Some(tx)
        }
        Err(e) => {
            warn!(error = %e, %wallet, "initial mint failed; registration continues");
            None
        }
    }
}
