use thiserror::Error;

pub type ChainResult<T> = std::result::Result<T, ChainError>;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("no signing key configured")]
    NoSigner,

    /// Read-only call failed.
    #[error("contract call failed: {0}")]
    ContractCall(String),

    /// Submitting or confirming a transaction failed.
    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("transaction {0} reverted")]
    Reverted(String),

    #[error("{0} event not found in transaction logs")]
    EventNotFound(&'static str),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("conversion error: {0}")]
    Conversion(String),
}

impl ChainError {
    /// Errors caused by the caller's input rather than the chain or the node.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidAddress(_) | Self::InvalidAmount(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_input_problems() {
        assert!(ChainError::InvalidAddress("0x12".into()).is_client_error());
        assert!(ChainError::InvalidAmount("-1".into()).is_client_error());
        assert!(!ChainError::NoSigner.is_client_error());
        assert!(!ChainError::Rpc("timeout".into()).is_client_error());
    }

    #[test]
    fn display_names_the_missing_event() {
        let err = ChainError::EventNotFound("CampaignCreated");
        assert_eq!(
            err.to_string(),
            "CampaignCreated event not found in transaction logs"
        );
    }
}
