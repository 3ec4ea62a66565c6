use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    /// Token units, e.g. `"1000.5"`.
    pub balance: String,
    /// Base units as a decimal string.
    pub raw: String,
}

#[derive(Debug, Deserialize)]
pub struct MintRequest {
    pub address: String,
    #[serde(default)]
    pub amount: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TxResponse {
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub goal: String,
    pub duration_days: u32,
}

#[derive(Debug, Serialize)]
pub struct CreateCampaignResponse {
    pub campaign_id: u64,
    pub tx_hash: String,
}

#[derive(Debug, Serialize)]
pub struct CampaignDetailsResponse {
    pub campaign_id: u64,
    pub creator: String,
    pub goal: String,
    pub amount_raised: String,
    pub deadline: u64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deadline_at: Option<OffsetDateTime>,
    pub claimed: bool,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ContributeRequest {
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct ContributeResponse {
    pub approve_tx: String,
    pub contribute_tx: String,
}
