use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{BlockNumberOrTag, Filter, TransactionReceipt};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::bindings::{ICrowdfundingPlatform, IMockStablecoin};
use super::error::{ChainError, ChainResult};
use super::types::{
    parse_address, u256_to_u64, CreatedCampaign, LoggedEvent, OnchainCampaign, PlatformEvent,
};
use crate::config::ChainConfig;

/// Calls against the token and platform contracts.
///
/// Every method performs a single contract call. Writes wait for the
/// configured confirmation depth and return the transaction hash.
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn platform_address(&self) -> Address;

    async fn mint(&self, to: Address, amount: U256) -> ChainResult<String>;
    async fn balance_of(&self, owner: Address) -> ChainResult<U256>;
    async fn approve(&self, spender: Address, amount: U256) -> ChainResult<String>;

    async fn create_campaign(&self, goal: U256, duration_secs: u64) -> ChainResult<CreatedCampaign>;
    async fn campaign_details(&self, campaign_id: u64) -> ChainResult<OnchainCampaign>;
    async fn campaign_backers(&self, campaign_id: u64) -> ChainResult<Vec<Address>>;
    async fn contribute(&self, campaign_id: u64, amount: U256) -> ChainResult<String>;
    async fn claim_funds(&self, campaign_id: u64) -> ChainResult<String>;

    async fn latest_block(&self) -> ChainResult<u64>;
    async fn platform_events(&self, from_block: u64, to_block: u64) -> ChainResult<Vec<LoggedEvent>>;
}

/// JSON-RPC backed client. Providers are built per call; nothing is cached.
pub struct AlloyChain {
    rpc_url: alloy::transports::http::reqwest::Url,
    signer: Option<PrivateKeySigner>,
    token: Address,
    platform: Address,
    confirmations: u64,
}

impl AlloyChain {
    pub fn new(cfg: &ChainConfig) -> ChainResult<Self> {
        let rpc_url = cfg
            .rpc_url
            .parse()
            .map_err(|e| ChainError::Configuration(format!("invalid rpc url '{}': {e}", cfg.rpc_url)))?;

        let signer = cfg
            .private_key
            .as_deref()
            .map(|k| {
                k.parse::<PrivateKeySigner>()
                    .map_err(|e| ChainError::Configuration(format!("invalid private key: {e}")))
            })
            .transpose()?;

        let token = parse_address(&cfg.token_address)
            .map_err(|e| ChainError::Configuration(format!("token contract: {e}")))?;
        let platform = parse_address(&cfg.platform_address)
            .map_err(|e| ChainError::Configuration(format!("platform contract: {e}")))?;

        if let Some(s) = &signer {
            info!(signer = %s.address(), %token, %platform, "chain client configured");
        } else {
            warn!(%token, %platform, "no signing key configured; write calls will fail");
        }

        Ok(Self {
            rpc_url,
            signer,
            token,
            platform,
            confirmations: cfg.confirmations.max(1),
        })
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    fn reader(&self) -> impl Provider {
        ProviderBuilder::new().connect_http(self.rpc_url.clone())
    }

    fn writer(&self) -> ChainResult<impl Provider> {
        let signer = self.signer.clone().ok_or(ChainError::NoSigner)?;
        Ok(ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(self.rpc_url.clone()))
    }
}

fn tx_hash(hash: TxHash) -> String {
    format!("{hash:#x}")
}

fn ensure_success(receipt: &TransactionReceipt) -> ChainResult<String> {
    let hash = tx_hash(receipt.transaction_hash);
    if receipt.status() {
        Ok(hash)
    } else {
        Err(ChainError::Reverted(hash))
    }
}

fn decode_platform_log(log: &alloy::rpc::types::Log) -> Option<PlatformEvent> {
    let topic = *log.topic0()?;
    if topic == ICrowdfundingPlatform::CampaignCreated::SIGNATURE_HASH {
        let ev = log.log_decode::<ICrowdfundingPlatform::CampaignCreated>().ok()?.inner.data;
        Some(PlatformEvent::CampaignCreated {
            campaign_id: ev.campaignId,
            creator: ev.creator,
            goal: ev.goal,
            deadline: ev.deadline,
        })
    } else if topic == ICrowdfundingPlatform::ContributionMade::SIGNATURE_HASH {
        let ev = log.log_decode::<ICrowdfundingPlatform::ContributionMade>().ok()?.inner.data;
        Some(PlatformEvent::ContributionMade {
            campaign_id: ev.campaignId,
            contributor: ev.contributor,
            amount: ev.amount,
        })
    } else if topic == ICrowdfundingPlatform::FundsClaimed::SIGNATURE_HASH {
        let ev = log.log_decode::<ICrowdfundingPlatform::FundsClaimed>().ok()?.inner.data;
        Some(PlatformEvent::FundsClaimed {
            campaign_id: ev.campaignId,
            creator: ev.creator,
            amount: ev.amount,
        })
    } else {
        None
    }
}

#[async_trait]
impl ChainClient for AlloyChain {
    fn platform_address(&self) -> Address {
        self.platform
    }

    async fn mint(&self, to: Address, amount: U256) -> ChainResult<String> {
        let provider = self.writer()?;
        let token = IMockStablecoin::new(self.token, &provider);
        let receipt = token
            .mint(to, amount)
            .send()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?;
        let hash = ensure_success(&receipt)?;
        debug!(%to, %amount, tx = %hash, "minted");
        Ok(hash)
    }

    async fn balance_of(&self, owner: Address) -> ChainResult<U256> {
        let provider = self.reader();
        let token = IMockStablecoin::new(self.token, &provider);
        token
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ChainError::ContractCall(e.to_string()))
    }

    async fn approve(&self, spender: Address, amount: U256) -> ChainResult<String> {
        let provider = self.writer()?;
        let token = IMockStablecoin::new(self.token, &provider);
        let receipt = token
            .approve(spender, amount)
            .send()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?;
        ensure_success(&receipt)
    }

    async fn create_campaign(&self, goal: U256, duration_secs: u64) -> ChainResult<CreatedCampaign> {
        let provider = self.writer()?;
        let platform = ICrowdfundingPlatform::new(self.platform, &provider);
        let receipt = platform
            .createCampaign(goal, U256::from(duration_secs))
            .send()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?;
        let hash = ensure_success(&receipt)?;

        for log in receipt.inner.logs() {
            if let Ok(decoded) = log.log_decode::<ICrowdfundingPlatform::CampaignCreated>() {
                let campaign_id = u256_to_u64(decoded.inner.data.campaignId, "campaign id")?;
                debug!(campaign_id, tx = %hash, "campaign created");
                return Ok(CreatedCampaign {
                    campaign_id,
                    tx_hash: hash,
                });
            }
        }

        Err(ChainError::EventNotFound("CampaignCreated"))
    }

    async fn campaign_details(&self, campaign_id: u64) -> ChainResult<OnchainCampaign> {
        let provider = self.reader();
        let platform = ICrowdfundingPlatform::new(self.platform, &provider);
        let details = platform
            .getCampaignDetails(U256::from(campaign_id))
            .call()
            .await
            .map_err(|e| ChainError::ContractCall(e.to_string()))?;

        Ok(OnchainCampaign {
            id: campaign_id,
            creator: details.creator,
            goal: details.goal,
            deadline: u256_to_u64(details.deadline, "deadline")?,
            amount_raised: details.amountRaised,
            claimed: details.claimed,
            active: details.active,
        })
    }

    async fn campaign_backers(&self, campaign_id: u64) -> ChainResult<Vec<Address>> {
        let provider = self.reader();
        let platform = ICrowdfundingPlatform::new(self.platform, &provider);
        platform
            .getCampaignBackers(U256::from(campaign_id))
            .call()
            .await
            .map_err(|e| ChainError::ContractCall(e.to_string()))
    }

    async fn contribute(&self, campaign_id: u64, amount: U256) -> ChainResult<String> {
        let provider = self.writer()?;
        let platform = ICrowdfundingPlatform::new(self.platform, &provider);
        let receipt = platform
            .contribute(U256::from(campaign_id), amount)
            .send()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?;
        ensure_success(&receipt)
    }

    async fn claim_funds(&self, campaign_id: u64) -> ChainResult<String> {
        let provider = self.writer()?;
        let platform = ICrowdfundingPlatform::new(self.platform, &provider);
        let receipt = platform
            .claimFunds(U256::from(campaign_id))
            .send()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?;
        ensure_success(&receipt)
    }

    async fn latest_block(&self) -> ChainResult<u64> {
        self.reader()
            .get_block_number()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn platform_events(&self, from_block: u64, to_block: u64) -> ChainResult<Vec<LoggedEvent>> {
        let filter = Filter::new()
            .address(self.platform)
            .event_signature(vec![
                ICrowdfundingPlatform::CampaignCreated::SIGNATURE_HASH,
                ICrowdfundingPlatform::ContributionMade::SIGNATURE_HASH,
                ICrowdfundingPlatform::FundsClaimed::SIGNATURE_HASH,
            ])
            .from_block(BlockNumberOrTag::Number(from_block))
            .to_block(BlockNumberOrTag::Number(to_block));

        let logs = self
            .reader()
            .get_logs(&filter)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        Ok(logs
            .iter()
            .filter_map(|log| {
                decode_platform_log(log).map(|event| LoggedEvent {
                    block_number: log.block_number,
                    event,
                })
            })
            .collect())
    }
}
