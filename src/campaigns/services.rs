use alloy::primitives::U256;
use axum::http::StatusCode;
use futures::future::join_all;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use super::dto::{CampaignView, ChainState, SaveCampaignRequest};
use super::images::{parse_image, resolve_image_url, upload_image, ImageError, ImagePayload};
use super::repo_types::{CampaignRecord, NewCampaign};
use crate::chain::{format_token_amount, normalize_wallet, OnchainCampaign};
use crate::errors::{bad_request, internal, not_found, repo_error, ApiError};
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_ADDRESS_LEN: usize = 128;

/// Checked save request; the image is already decoded and size-guarded.
#[derive(Debug)]
pub struct ValidCampaign {
    pub campaign_address: String,
    pub onchain_id: i64,
    pub creator_wallet: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image: Option<ImagePayload>,
    pub video_url: Option<String>,
}

fn required(value: &str, field: &str) -> Result<String, ApiError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(bad_request(format!("{field} is required")));
    }
    Ok(v.to_string())
}

fn image_error(e: ImageError) -> ApiError {
    match e {
        ImageError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()),
        _ => bad_request(e.to_string()),
    }
}

pub fn validate_campaign(
    req: SaveCampaignRequest,
    max_image_bytes: usize,
) -> Result<ValidCampaign, ApiError> {
    let campaign_address = required(&req.campaign_address, "campaign_address")?;
    if campaign_address.len() > MAX_ADDRESS_LEN {
        return Err(bad_request("campaign_address too long"));
    }
    let onchain_id =
        i64::try_from(req.onchain_id).map_err(|_| bad_request("onchain_id out of range"))?;
    let creator_wallet = normalize_wallet(&req.creator_wallet)
        .map_err(|_| bad_request("Invalid creator wallet"))?;

    let title = required(&req.title, "title")?;
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(bad_request("title too long"));
    }

    let video_url = req
        .video_url
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if let Some(v) = &video_url {
        if !(v.starts_with("https://") || v.starts_with("http://")) {
            return Err(bad_request("video_url must be an http(s) URL"));
        }
    }

    let image = match req.image.as_deref() {
        Some(raw) => parse_image(raw, max_image_bytes).map_err(image_error)?,
        None => None,
    };

    Ok(ValidCampaign {
        campaign_address,
        onchain_id,
        creator_wallet,
        title,
        description: required(&req.description, "description")?,
        category: required(&req.category, "category")?,
        image,
        video_url,
    })
}

/// Stores metadata for a campaign already created on chain.
///
/// An inline image is uploaded first and removed again if the insert fails,
/// so a failed save leaves neither a record nor an orphaned object.
pub async fn save_campaign(state: &AppState, c: ValidCampaign) -> Result<CampaignRecord, ApiError> {
    let creator = state
        .users
        .find_by_wallet(&c.creator_wallet)
        .await
        .map_err(|e| repo_error(e, "User"))?
        .ok_or_else(|| not_found("Creator not registered"))?;

    if state
        .campaigns
        .find_by_address(&c.campaign_address)
        .await
        .map_err(|e| repo_error(e, "Campaign"))?
        .is_some()
    {
        warn!(address = %c.campaign_address, "metadata already saved");
        return Err((
            StatusCode::CONFLICT,
            "Campaign address already has metadata".into(),
        ));
    }

    let (image_url, image_key) = match c.image {
        Some(ImagePayload::Url(url)) => (Some(url), None),
        Some(ImagePayload::Inline { body, content_type }) => {
            let key = upload_image(state.storage.as_ref(), c.onchain_id, body, &content_type)
                .await
                .map_err(|e| {
                    error!(error = %e, "image upload failed");
                    internal(e)
                })?;
            (None, Some(key))
        }
        None => (None, None),
    };

    let new = NewCampaign {
        campaign_address: c.campaign_address,
        onchain_id: c.onchain_id,
        creator_id: creator.id,
        creator_wallet: c.creator_wallet,
        title: c.title,
        description: c.description,
        image_url,
        image_key: image_key.clone(),
        video_url: c.video_url,
        category: c.category,
    };

    match state.campaigns.create(new).await {
        Ok(record) => {
            info!(
                address = %record.metadata.campaign_address,
                onchain_id = record.metadata.onchain_id,
                "campaign metadata saved"
            );
            Ok(record)
        }
        Err(e) => {
            if let Some(key) = image_key {
                if let Err(del) = state.storage.delete_object(&key).await {
                    warn!(error = %del, %key, "could not remove uploaded image");
                }
            }
            Err(repo_error(e, "Campaign"))
        }
    }
}

fn percent_funded(raised: U256, goal: U256) -> f64 {
    if goal.is_zero() {
        return 0.0;
    }
    let bps = raised.saturating_mul(U256::from(10_000u64)) / goal;
    u64::try_from(bps).unwrap_or(u64::MAX) as f64 / 100.0
}

pub fn chain_state(onchain: &OnchainCampaign, now: OffsetDateTime, decimals: u8) -> ChainState {
    let now_secs = u64::try_from(now.unix_timestamp()).unwrap_or(0);
    let deadline = i64::try_from(onchain.deadline)
        .ok()
        .and_then(|d| OffsetDateTime::from_unix_timestamp(d).ok());

    ChainState {
        creator: format!("{:#x}", onchain.creator),
        goal: format_token_amount(onchain.goal, decimals),
        amount_raised: format_token_amount(onchain.amount_raised, decimals),
        deadline,
        claimed: onchain.claimed,
        active: onchain.active,
        percent_funded: percent_funded(onchain.amount_raised, onchain.goal),
        goal_reached: !onchain.goal.is_zero() && onchain.amount_raised >= onchain.goal,
        expired: now_secs >= onchain.deadline,
        seconds_left: onchain.deadline.saturating_sub(now_secs),
    }
}

/// Joins one stored record with its on-chain state.
pub fn merge(
    campaign: CampaignRecord,
    onchain: Option<&OnchainCampaign>,
    now: OffsetDateTime,
    decimals: u8,
) -> CampaignView {
    CampaignView {
        chain: onchain.map(|o| chain_state(o, now, decimals)),
        campaign,
    }
}

/// Image URL resolved for the client.
pub async fn with_image_url(state: &AppState, mut record: CampaignRecord) -> CampaignRecord {
    record.metadata.image_url = resolve_image_url(state.storage.as_ref(), &record.metadata).await;
    record
}

pub async fn merged_view(state: &AppState, record: CampaignRecord) -> CampaignView {
    let record = with_image_url(state, record).await;
    let onchain_id = record.metadata.onchain_id;
    let onchain = match u64::try_from(onchain_id) {
        Ok(id) => match state.chain.campaign_details(id).await {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(error = %e, onchain_id, "on-chain read failed; returning metadata only");
                None
            }
        },
        Err(_) => None,
    };
    merge(
        record,
        onchain.as_ref(),
        OffsetDateTime::now_utc(),
        state.config.chain.token_decimals,
    )
}

/// Reads chain state for every record concurrently, keeping input order.
pub async fn merged_views(state: &AppState, records: Vec<CampaignRecord>) -> Vec<CampaignView> {
    join_all(records.into_iter().map(|r| merged_view(state, r))).await
}
