use alloy::primitives::U256;
use tracing::debug;

use super::dto::ContributeResponse;
use crate::chain::{ChainClient, ChainResult};

pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
pub const MAX_DURATION_DAYS: u32 = 365;

/// Approves the platform for `amount`, then contributes it.
///
/// The approval is sent on every call; the current allowance is not read.
pub async fn contribute_with_approval(
    chain: &dyn ChainClient,
    campaign_id: u64,
    amount: U256,
) -> ChainResult<ContributeResponse> {
    let approve_tx = chain.approve(chain.platform_address(), amount).await?;
    debug!(campaign_id, %amount, tx = %approve_tx, "allowance approved");
    let contribute_tx = chain.contribute(campaign_id, amount).await?;
    Ok(ContributeResponse {
        approve_tx,
        contribute_tx,
    })
}
