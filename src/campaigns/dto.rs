use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::CampaignRecord;

#[derive(Debug, Deserialize)]
pub struct SaveCampaignRequest {
    pub campaign_address: String,
    pub onchain_id: u64,
    pub creator_wallet: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// http(s) URL, `data:image/...;base64,` URL or bare base64.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppendUpdateRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub creator: Option<String>,
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            category: None,
            creator: None,
            q: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

fn default_limit() -> i64 {
    20
}

/// Live funding state next to the stored metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainState {
    pub creator: String,
    pub goal: String,
    pub amount_raised: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub claimed: bool,
    pub active: bool,
    pub percent_funded: f64,
    pub goal_reached: bool,
    pub expired: bool,
    pub seconds_left: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignView {
    #[serde(flatten)]
    pub campaign: CampaignRecord,
    /// `None` when the chain read failed.
    pub chain: Option<ChainState>,
}
