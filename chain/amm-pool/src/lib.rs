//! AMM Pool Settlement
//!
//! Off-chain accountant for a layer-2 AMM pool: queues join/exit intents,
//! settles them in batches against a layer-2 ledger, and produces the
//! ABI-encoded auxiliary data consumed by the on-chain settlement step.
//!
//! # Modules
//! - `errors`: Pool and ledger error types
//! - `events`: Events recorded for queued intents and committed cycles
//! - `ecdsa`: secp256k1 signing and signer recovery for pool intents
//! - `typed_data`: EIP-712 domain and struct hashes
//! - `codec`: ABI encoding of pool transactions and auxiliary data
//! - `ledger`: Layer-2 balance collaborator trait and in-memory ledger
//! - `intent`: Join/exit intents
//! - `settlement`: Cycle output and pool account reconciliation
//! - `pool`: The pool accountant

pub mod codec;
pub mod ecdsa;
pub mod errors;
pub mod events;
pub mod intent;
pub mod ledger;
pub mod pool;
pub mod settlement;
pub mod typed_data;

pub use errors::{LedgerError, PoolError};
pub use intent::{AuthMethod, PoolExit, PoolIntent, PoolJoin};
pub use ledger::{InMemoryLedger, Ledger};
pub use pool::AmmPool;
pub use settlement::{Reconciliation, ReconciliationKind, Settlement};

/// Auxiliary data ABI version
pub const POOL_ABI_VERSION: &str = "1.0.0";
