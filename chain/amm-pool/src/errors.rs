//! Pool-specific error types
//!
//! Error taxonomy for ledger access, intent authorization and settlement.

use thiserror::Error;
use types::ids::{Address, U256};

/// Ledger collaborator errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance for {owner:?} in token {token:?}: required {required}, available {available}")]
    InsufficientBalance {
        owner: Address,
        token: Address,
        required: U256,
        available: U256,
    },

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Pool intent and settlement errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("First join must mint exactly {expected} shares, got {got}")]
    InvalidInitialJoin { expected: U256, got: U256 },

    #[error("Insufficient pool supply: exiting {requested} of {supply}")]
    InsufficientSupply { supply: U256, requested: U256 },

    /// Fatal: a signature did not recover to the intent owner
    #[error("Signature verification failed for owner {owner:?}")]
    SignatureVerificationFailed { owner: Address },

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Invalid signing key")]
    InvalidKey,

    #[error("Expected {expected} amounts, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Invalid pool parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Arithmetic overflow in pool share calculation")]
    Overflow,

    #[error("Malformed pool data: {0}")]
    Decode(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Fatal: a transfer failed and reversing the transfers already applied
    /// failed too; the ledger is partially settled
    #[error("Ledger error {cause}; reversing applied transfers failed: {rollback}")]
    RollbackFailed { cause: LedgerError, rollback: LedgerError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_initial_join_display() {
        let err = PoolError::InvalidInitialJoin {
            expected: U256::from(100u64),
            got: U256::from(5u64),
        };
        assert_eq!(err.to_string(), "First join must mint exactly 100 shares, got 5");
    }

    #[test]
    fn test_insufficient_supply_display() {
        let err = PoolError::InsufficientSupply {
            supply: U256::zero(),
            requested: U256::from(1u64),
        };
        assert!(err.to_string().contains("exiting 1 of 0"));
    }

    #[test]
    fn test_pool_error_from_ledger() {
        let ledger_err = LedgerError::Unavailable("timeout".to_string());
        let pool_err: PoolError = ledger_err.into();
        assert!(matches!(pool_err, PoolError::Ledger(_)));
    }
}
