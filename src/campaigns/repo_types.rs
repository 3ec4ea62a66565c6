use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Off-chain description of a campaign, one per on-chain campaign id.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CampaignMetadata {
    pub id: Uuid,
    pub campaign_address: String,
    pub onchain_id: i64,
    pub creator_id: Uuid,
    pub creator_wallet: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    #[serde(skip_serializing)]
    pub image_key: Option<String>, // object storage key for uploaded images
    pub video_url: Option<String>,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CampaignUpdate {
    #[serde(skip_serializing)]
    pub campaign_id: Uuid,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Metadata plus its update log, oldest entry first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignRecord {
    #[serde(flatten)]
    pub metadata: CampaignMetadata,
    pub updates: Vec<CampaignUpdate>,
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub campaign_address: String,
    pub onchain_id: i64,
    pub creator_id: Uuid,
    pub creator_wallet: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub image_key: Option<String>,
    pub video_url: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, Default)]
pub struct CampaignFilter {
    pub category: Option<String>,
    pub creator_wallet: Option<String>,
    /// Full-text query over title and description.
    pub text: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
