use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use super::client::ChainClient;
use super::error::ChainResult;
use super::types::PlatformEvent;

/// Widest block range asked for in one `eth_getLogs` call.
pub const MAX_BLOCK_SPAN: u64 = 2_000;

/// Polls platform logs after `cursor` and returns the new cursor.
///
/// The cursor only moves forward when logs were fetched successfully, and
/// by at most `MAX_BLOCK_SPAN` blocks per call.
pub async fn poll_once(chain: &dyn ChainClient, cursor: u64) -> ChainResult<u64> {
    let latest = chain.latest_block().await?;
    if latest <= cursor {
        return Ok(cursor);
    }

    let to_block = latest.min(cursor.saturating_add(MAX_BLOCK_SPAN));
    let events = chain.platform_events(cursor + 1, to_block).await?;
    for logged in &events {
        let block = logged.block_number.unwrap_or_default();
        match &logged.event {
            PlatformEvent::CampaignCreated {
                campaign_id,
                creator,
                goal,
                deadline,
            } => info!(block, %campaign_id, %creator, %goal, %deadline, "campaign created"),
            PlatformEvent::ContributionMade {
                campaign_id,
                contributor,
                amount,
            } => info!(block, %campaign_id, %contributor, %amount, "contribution made"),
            PlatformEvent::FundsClaimed {
                campaign_id,
                creator,
                amount,
            } => info!(block, %campaign_id, %creator, %amount, "funds claimed"),
        }
    }

    Ok(to_block)
}

pub async fn watch_platform_events(chain: Arc<dyn ChainClient>, interval: Duration) {
    let mut cursor = loop {
        match chain.latest_block().await {
            Ok(b) => break b,
            Err(e) => {
                error!(error = %e, "event watcher could not read the latest block");
                tokio::time::sleep(interval).await;
            }
        }
    };
    info!(from_block = cursor, "watching platform events");

    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match poll_once(chain.as_ref(), cursor).await {
            Ok(next) => cursor = next,
            Err(e) => error!(error = %e, cursor, "event poll failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeChain;
    use alloy::primitives::{Address, U256};

    #[tokio::test]
    async fn cursor_advances_to_latest_block() {
        let chain = FakeChain::default();
        chain.set_latest_block(42);
        chain.push_event(
            40,
            PlatformEvent::ContributionMade {
                campaign_id: U256::from(3u64),
                contributor: Address::ZERO,
                amount: U256::from(10u64),
            },
        );

        let next = poll_once(&chain, 30).await.unwrap();
        assert_eq!(next, 42);
        assert_eq!(chain.event_queries(), vec![(31, 42)]);
    }

    #[tokio::test]
    async fn no_query_when_chain_has_not_moved() {
        let chain = FakeChain::default();
        chain.set_latest_block(10);
        assert_eq!(poll_once(&chain, 10).await.unwrap(), 10);
        assert!(chain.event_queries().is_empty());
    }

    #[tokio::test]
    async fn cursor_stays_put_on_rpc_failure() {
        let chain = FakeChain::default();
        chain.set_latest_block(50);
        chain.fail_reads(true);
        assert!(poll_once(&chain, 20).await.is_err());
    }

    #[tokio::test]
    async fn backlog_is_fetched_in_bounded_chunks() {
        let chain = FakeChain::default();
        chain.set_latest_block(4_500);

        let mut cursor = 0;
        while cursor < 4_500 {
            cursor = poll_once(&chain, cursor).await.unwrap();
        }
        assert_eq!(
            chain.event_queries(),
            vec![(1, 2_000), (2_001, 4_000), (4_001, 4_500)]
        );
    }
}
