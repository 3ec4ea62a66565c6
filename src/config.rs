use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub private_key: Option<String>,
    pub token_address: String,
    pub platform_address: String,
    pub token_decimals: u8,
    /// Human-readable MSC amount minted to newly registered wallets.
    pub initial_mint: String,
    pub confirmations: u64,
    pub watch_events: bool,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub chain: ChainConfig,
    pub storage: ObjectStorageConfig,
    pub max_image_bytes: usize,
}

pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;

        let chain = ChainConfig {
            rpc_url: std::env::var("CHAIN_RPC_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8545".into()),
            private_key: std::env::var("CHAIN_PRIVATE_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            token_address: std::env::var("TOKEN_CONTRACT_ADDRESS")
                .context("TOKEN_CONTRACT_ADDRESS")?,
            platform_address: std::env::var("PLATFORM_CONTRACT_ADDRESS")
                .context("PLATFORM_CONTRACT_ADDRESS")?,
            token_decimals: parsed_or("TOKEN_DECIMALS", 18),
            initial_mint: std::env::var("INITIAL_MINT_AMOUNT").unwrap_or_else(|_| "1000".into()),
            confirmations: parsed_or("CHAIN_CONFIRMATIONS", 1),
            watch_events: std::env::var("CHAIN_WATCH_EVENTS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            poll_interval_secs: parsed_or("CHAIN_POLL_INTERVAL_SECS", 12),
        };

        let storage = ObjectStorageConfig {
            endpoint: std::env::var("MINIO_ENDPOINT").context("MINIO_ENDPOINT")?,
            bucket: std::env::var("MINIO_BUCKET").unwrap_or_else(|_| "campaigns".into()),
            access_key: std::env::var("MINIO_ACCESS_KEY").context("MINIO_ACCESS_KEY")?,
            secret_key: std::env::var("MINIO_SECRET_KEY").context("MINIO_SECRET_KEY")?,
            region: std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };

        Ok(Self {
            database_url,
            chain,
            storage,
            max_image_bytes: parsed_or("MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES),
        })
    }
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
