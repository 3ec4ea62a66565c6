use std::str::FromStr;

use alloy::primitives::{
    utils::{format_units, parse_units, ParseUnits},
    Address, U256,
};

use super::error::{ChainError, ChainResult};

/// Funding state of a campaign as stored by the platform contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnchainCampaign {
    pub id: u64,
    pub creator: Address,
    pub goal: U256,
    /// Unix seconds.
    pub deadline: u64,
    pub amount_raised: U256,
    pub claimed: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCampaign {
    pub campaign_id: u64,
    pub tx_hash: String,
}

/// Decoded platform contract event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    CampaignCreated {
        campaign_id: U256,
        creator: Address,
        goal: U256,
        deadline: U256,
    },
    ContributionMade {
        campaign_id: U256,
        contributor: Address,
        amount: U256,
    },
    FundsClaimed {
        campaign_id: U256,
        creator: Address,
        amount: U256,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent {
    pub block_number: Option<u64>,
    pub event: PlatformEvent,
}

pub fn parse_address(raw: &str) -> ChainResult<Address> {
    Address::from_str(raw.trim()).map_err(|e| ChainError::InvalidAddress(format!("{raw}: {e}")))
}

/// Lowercase `0x`-prefixed form used as the stored wallet key.
pub fn normalize_wallet(raw: &str) -> ChainResult<String> {
    parse_address(raw).map(|a| format!("{a:#x}"))
}

/// Parses a positive decimal token amount (e.g. `"12.5"`) into base units.
pub fn parse_token_amount(raw: &str, decimals: u8) -> ChainResult<U256> {
    let trimmed = raw.trim();
    match parse_units(trimmed, decimals) {
        Ok(ParseUnits::U256(value)) if !value.is_zero() => Ok(value),
        Ok(_) => Err(ChainError::InvalidAmount(format!(
            "{raw}: amount must be greater than zero"
        ))),
        Err(e) => Err(ChainError::InvalidAmount(format!("{raw}: {e}"))),
    }
}

/// Formats base units as a decimal string without trailing zeros.
pub fn format_token_amount(value: U256, decimals: u8) -> String {
    match format_units(value, decimals) {
        Ok(s) if s.contains('.') => s.trim_end_matches('0').trim_end_matches('.').to_string(),
        Ok(s) => s,
        Err(_) => value.to_string(),
    }
}

pub fn u256_to_u64(value: U256, what: &str) -> ChainResult<u64> {
    u64::try_from(value).map_err(|_| ChainError::Conversion(format!("{what} {value} overflows u64")))
}
