use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{CampaignFilter, CampaignMetadata, CampaignRecord, CampaignUpdate, NewCampaign};
use crate::errors::RepoError;

const CAMPAIGN_CONSTRAINTS: &[(&str, &str)] = &[
    (
        "campaign_metadata_campaign_address_key",
        "Campaign address already has metadata",
    ),
    (
        "campaign_metadata_onchain_id_key",
        "On-chain campaign already has metadata",
    ),
];

#[async_trait]
pub trait CampaignRepo: Send + Sync {
    async fn create(&self, campaign: NewCampaign) -> Result<CampaignRecord, RepoError>;
    async fn find_by_address(&self, address: &str) -> Result<Option<CampaignRecord>, RepoError>;
    async fn list(&self, filter: &CampaignFilter) -> Result<Vec<CampaignRecord>, RepoError>;
    async fn append_update(&self, address: &str, message: &str) -> Result<CampaignRecord, RepoError>;
}

pub struct PgCampaignRepo {
    db: PgPool,
}

impl PgCampaignRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn attach_updates(
        &self,
        rows: Vec<CampaignMetadata>,
    ) -> Result<Vec<CampaignRecord>, RepoError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let updates = sqlx::query_as::<_, CampaignUpdate>(
            r#"
            SELECT campaign_id, message, created_at
              FROM campaign_updates
             WHERE campaign_id = ANY($1)
             ORDER BY created_at ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await
        .context("list campaign updates")?;

        let mut by_campaign: HashMap<Uuid, Vec<CampaignUpdate>> = HashMap::new();
        for u in updates {
            by_campaign.entry(u.campaign_id).or_default().push(u);
        }

        Ok(rows
            .into_iter()
            .map(|metadata| CampaignRecord {
                updates: by_campaign.remove(&metadata.id).unwrap_or_default(),
                metadata,
            })
            .collect())
    }
}

async fn find_id_for_update_tx(
    tx: &mut Transaction<'_, Postgres>,
    address: &str,
) -> Result<Uuid, RepoError> {
    sqlx::query_scalar::<_, Uuid>(
        r#"SELECT id FROM campaign_metadata WHERE campaign_address = $1 FOR UPDATE"#,
    )
    .bind(address)
    .fetch_optional(&mut **tx)
    .await
    .context("lock campaign")?
    .ok_or(RepoError::NotFound)
}

#[async_trait]
impl CampaignRepo for PgCampaignRepo {
    async fn create(&self, c: NewCampaign) -> Result<CampaignRecord, RepoError> {
        let metadata = sqlx::query_as::<_, CampaignMetadata>(
            r#"
            INSERT INTO campaign_metadata
                (campaign_address, onchain_id, creator_id, creator_wallet, title, description,
                 image_url, image_key, video_url, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, campaign_address, onchain_id, creator_id, creator_wallet, title,
                      description, image_url, image_key, video_url, category, created_at, updated_at
            "#,
        )
        .bind(&c.campaign_address)
        .bind(c.onchain_id)
        .bind(c.creator_id)
        .bind(&c.creator_wallet)
        .bind(&c.title)
        .bind(&c.description)
        .bind(&c.image_url)
        .bind(&c.image_key)
        .bind(&c.video_url)
        .bind(&c.category)
        .fetch_one(&self.db)
        .await
        .map_err(|e| RepoError::from_sqlx(e, CAMPAIGN_CONSTRAINTS))?;

        Ok(CampaignRecord {
            metadata,
            updates: Vec::new(),
        })
    }

    async fn find_by_address(&self, address: &str) -> Result<Option<CampaignRecord>, RepoError> {
        let row = sqlx::query_as::<_, CampaignMetadata>(
            r#"
            SELECT id, campaign_address, onchain_id, creator_id, creator_wallet, title,
                   description, image_url, image_key, video_url, category, created_at, updated_at
              FROM campaign_metadata
             WHERE campaign_address = $1
            "#,
        )
        .bind(address)
        .fetch_optional(&self.db)
        .await
        .context("find campaign by address")?;

        match row {
            Some(row) => Ok(self.attach_updates(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, f: &CampaignFilter) -> Result<Vec<CampaignRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CampaignMetadata>(
            r#"
            SELECT id, campaign_address, onchain_id, creator_id, creator_wallet, title,
                   description, image_url, image_key, video_url, category, created_at, updated_at
              FROM campaign_metadata
             WHERE ($1::text IS NULL OR category = $1)
               AND ($2::text IS NULL OR creator_wallet = $2)
               AND ($3::text IS NULL OR
                    to_tsvector('english', title || ' ' || description)
                        @@ plainto_tsquery('english', $3))
             ORDER BY created_at DESC
             LIMIT $4 OFFSET $5
            "#,
        )
        .bind(&f.category)
        .bind(&f.creator_wallet)
        .bind(&f.text)
        .bind(f.limit)
        .bind(f.offset)
        .fetch_all(&self.db)
        .await
        .context("list campaigns")?;

        self.attach_updates(rows).await
    }

    async fn append_update(&self, address: &str, message: &str) -> Result<CampaignRecord, RepoError> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let id = find_id_for_update_tx(&mut tx, address).await?;

        sqlx::query(r#"INSERT INTO campaign_updates (campaign_id, message) VALUES ($1, $2)"#)
            .bind(id)
            .bind(message)
            .execute(&mut *tx)
            .await
            .context("insert campaign update")?;
        sqlx::query(r#"UPDATE campaign_metadata SET updated_at = now() WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("touch campaign")?;
        tx.commit().await.context("commit tx")?;

        self.find_by_address(address)
            .await?
            .ok_or(RepoError::NotFound)
    }
}
