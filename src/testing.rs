//! In-memory stand-ins for the database, object storage and chain.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::header;
use bytes::Bytes;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::campaigns::repo::CampaignRepo;
use crate::campaigns::repo_types::{
    CampaignFilter, CampaignMetadata, CampaignRecord, CampaignUpdate, NewCampaign,
};
use crate::chain::{
    ChainClient, ChainError, ChainResult, CreatedCampaign, LoggedEvent, OnchainCampaign,
    PlatformEvent,
};
use crate::errors::RepoError;
use crate::storage::StorageClient;
use crate::users::repo::UserRepo;
use crate::users::repo_types::{NewUser, User, UserChanges};

/// POST request carrying `body` as JSON.
pub fn json_request(body: &str) -> Request {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, Bytes>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn presign_get(&self, key: &str, _seconds: u64) -> anyhow::Result<String> {
        Ok(format!("https://fake.local/{key}"))
    }
}

#[derive(Default)]
pub struct MemoryUserRepo {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, u: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|x| x.wallet_address == u.wallet_address) {
            return Err(RepoError::Conflict("Wallet address already registered".into()));
        }
        if u.email.is_some() && users.iter().any(|x| x.email == u.email) {
            return Err(RepoError::Conflict("Email already registered".into()));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: u.name,
            email: u.email,
            bio: u.bio,
            avatar_url: u.avatar_url,
            wallet_address: u.wallet_address,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_wallet(&self, wallet: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.wallet_address == wallet).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, RepoError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, wallet: &str, c: UserChanges) -> Result<User, RepoError> {
        let mut users = self.users.lock().unwrap();
        if c.email.is_some()
            && users
                .iter()
                .any(|u| u.email == c.email && u.wallet_address != wallet)
        {
            return Err(RepoError::Conflict("Email already registered".into()));
        }
        let user = users
            .iter_mut()
            .find(|u| u.wallet_address == wallet)
            .ok_or(RepoError::NotFound)?;
        if let Some(v) = c.name {
            user.name = v;
        }
        if c.email.is_some() {
            user.email = c.email;
        }
        if c.bio.is_some() {
            user.bio = c.bio;
        }
        if c.avatar_url.is_some() {
            user.avatar_url = c.avatar_url;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct MemoryCampaignRepo {
    records: Mutex<Vec<CampaignRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryCampaignRepo {
    /// Makes inserts fail as a broken database would; reads keep working.
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }
}

fn matches_text(m: &CampaignMetadata, query: &str) -> bool {
    let haystack = format!("{} {}", m.title, m.description).to_lowercase();
    let words: Vec<&str> = haystack
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    query
        .to_lowercase()
        .split_whitespace()
        .all(|q| words.contains(&q))
}

#[async_trait]
impl CampaignRepo for MemoryCampaignRepo {
    async fn create(&self, c: NewCampaign) -> Result<CampaignRecord, RepoError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::Other(anyhow::anyhow!("connection reset")));
        }
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.metadata.campaign_address == c.campaign_address)
        {
            return Err(RepoError::Conflict("Campaign address already has metadata".into()));
        }
        if records.iter().any(|r| r.metadata.onchain_id == c.onchain_id) {
            return Err(RepoError::Conflict("On-chain campaign already has metadata".into()));
        }
        let now = OffsetDateTime::now_utc();
        let record = CampaignRecord {
            metadata: CampaignMetadata {
                id: Uuid::new_v4(),
                campaign_address: c.campaign_address,
                onchain_id: c.onchain_id,
                creator_id: c.creator_id,
                creator_wallet: c.creator_wallet,
                title: c.title,
                description: c.description,
                image_url: c.image_url,
                image_key: c.image_key,
                video_url: c.video_url,
                category: c.category,
                created_at: now,
                updated_at: now,
            },
            updates: Vec::new(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn find_by_address(&self, address: &str) -> Result<Option<CampaignRecord>, RepoError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|r| r.metadata.campaign_address == address)
            .cloned())
    }

    async fn list(&self, f: &CampaignFilter) -> Result<Vec<CampaignRecord>, RepoError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .rev()
            .filter(|r| f.category.as_ref().map_or(true, |c| &r.metadata.category == c))
            .filter(|r| {
                f.creator_wallet
                    .as_ref()
                    .map_or(true, |w| &r.metadata.creator_wallet == w)
            })
            .filter(|r| f.text.as_deref().map_or(true, |t| matches_text(&r.metadata, t)))
            .skip(f.offset.max(0) as usize)
            .take(if f.limit > 0 { f.limit as usize } else { usize::MAX })
            .cloned()
            .collect())
    }

    async fn append_update(&self, address: &str, message: &str) -> Result<CampaignRecord, RepoError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.metadata.campaign_address == address)
            .ok_or(RepoError::NotFound)?;
        let now = OffsetDateTime::now_utc();
        record.updates.push(CampaignUpdate {
            campaign_id: record.metadata.id,
            message: message.to_string(),
            created_at: now,
        });
        record.metadata.updated_at = now;
        Ok(record.clone())
    }
}

/// Chain double that records every successful write as a short string.
#[derive(Default)]
pub struct FakeChain {
    campaigns: Mutex<HashMap<u64, OnchainCampaign>>,
    balances: Mutex<HashMap<Address, U256>>,
    backers: Mutex<HashMap<u64, Vec<Address>>>,
    events: Mutex<Vec<LoggedEvent>>,
    event_queries: Mutex<Vec<(u64, u64)>>,
    calls: Mutex<Vec<String>>,
    latest_block: AtomicU64,
    next_tx: AtomicU64,
    detail_reads: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FakeChain {
    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn set_latest_block(&self, block: u64) {
        self.latest_block.store(block, Ordering::SeqCst);
    }

    pub fn push_event(&self, block: u64, event: PlatformEvent) {
        self.events.lock().unwrap().push(LoggedEvent {
            block_number: Some(block),
            event,
        });
    }

    pub fn insert_campaign(&self, campaign: OnchainCampaign) {
        self.campaigns.lock().unwrap().insert(campaign.id, campaign);
    }

    pub fn set_balance(&self, owner: Address, amount: U256) {
        self.balances.lock().unwrap().insert(owner, amount);
    }

    pub fn set_backers(&self, campaign_id: u64, backers: Vec<Address>) {
        self.backers.lock().unwrap().insert(campaign_id, backers);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn event_queries(&self) -> Vec<(u64, u64)> {
        self.event_queries.lock().unwrap().clone()
    }

    /// Number of `campaign_details` calls, failed ones included.
    pub fn detail_reads(&self) -> usize {
        self.detail_reads.load(Ordering::SeqCst)
    }

    fn read(&self) -> ChainResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("connection refused".into()));
        }
        Ok(())
    }

    fn write(&self, call: String) -> ChainResult<String> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ChainError::Transaction("nonce too low".into()));
        }
        self.calls.lock().unwrap().push(call);
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("0x{n:064x}"))
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    fn platform_address(&self) -> Address {
        Address::repeat_byte(0xaa)
    }

    async fn mint(&self, to: Address, amount: U256) -> ChainResult<String> {
        let tx = self.write(format!("mint:{to:#x}"))?;
        *self.balances.lock().unwrap().entry(to).or_default() += amount;
        Ok(tx)
    }

    async fn balance_of(&self, owner: Address) -> ChainResult<U256> {
        self.read()?;
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&owner)
            .copied()
            .unwrap_or_default())
    }

    async fn approve(&self, spender: Address, amount: U256) -> ChainResult<String> {
        self.write(format!("approve:{spender:#x}:{amount}"))
    }

    async fn create_campaign(&self, goal: U256, duration_secs: u64) -> ChainResult<CreatedCampaign> {
        let tx_hash = self.write(format!("create:{goal}:{duration_secs}"))?;
        let mut campaigns = self.campaigns.lock().unwrap();
        let campaign_id = campaigns.keys().max().map_or(0, |m| m + 1);
        let now = OffsetDateTime::now_utc().unix_timestamp().max(0) as u64;
        campaigns.insert(
            campaign_id,
            OnchainCampaign {
                id: campaign_id,
                creator: Address::ZERO,
                goal,
                deadline: now + duration_secs,
                amount_raised: U256::ZERO,
                claimed: false,
                active: true,
            },
        );
        Ok(CreatedCampaign {
            campaign_id,
            tx_hash,
        })
    }

    async fn campaign_details(&self, campaign_id: u64) -> ChainResult<OnchainCampaign> {
        self.detail_reads.fetch_add(1, Ordering::SeqCst);
        self.read()?;
        self.campaigns
            .lock()
            .unwrap()
            .get(&campaign_id)
            .cloned()
            .ok_or_else(|| ChainError::ContractCall(format!("campaign {campaign_id} does not exist")))
    }

    async fn campaign_backers(&self, campaign_id: u64) -> ChainResult<Vec<Address>> {
        self.read()?;
        Ok(self
            .backers
            .lock()
            .unwrap()
            .get(&campaign_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn contribute(&self, campaign_id: u64, amount: U256) -> ChainResult<String> {
        let tx = self.write(format!("contribute:{campaign_id}:{amount}"))?;
        if let Some(c) = self.campaigns.lock().unwrap().get_mut(&campaign_id) {
            c.amount_raised += amount;
        }
        Ok(tx)
    }

    async fn claim_funds(&self, campaign_id: u64) -> ChainResult<String> {
        let tx = self.write(format!("claim:{campaign_id}"))?;
        if let Some(c) = self.campaigns.lock().unwrap().get_mut(&campaign_id) {
            c.claimed = true;
        }
        Ok(tx)
    }

    async fn latest_block(&self) -> ChainResult<u64> {
        self.read()?;
        Ok(self.latest_block.load(Ordering::SeqCst))
    }

    async fn platform_events(&self, from_block: u64, to_block: u64) -> ChainResult<Vec<LoggedEvent>> {
        self.read()?;
        self.event_queries.lock().unwrap().push((from_block, to_block));
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.block_number
                    .map_or(false, |b| (from_block..=to_block).contains(&b))
            })
            .cloned()
            .collect())
    }
}
