mod bindings;
pub mod client;
pub mod error;
pub mod events;
pub mod types;

pub use client::{AlloyChain, ChainClient};
pub use error::{ChainError, ChainResult};
pub use types::{
    format_token_amount, normalize_wallet, parse_address, parse_token_amount, CreatedCampaign,
    LoggedEvent, OnchainCampaign, PlatformEvent,
};
