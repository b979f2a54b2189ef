//! Types library for the layer-2 exchange client
//!
//! Shared definitions used by the signing layer and the AMM pool crate.
//!
//! # Modules
//! - `ids`: Identifiers (AccountId, TokenId, OrderId, ExchangeId) and layer-1 address types
//! - `numeric`: Decimal to base-unit scaling and bounds checks
//! - `token`: Token metadata and the registry trait
//! - `config`: Exchange and pool configuration
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod token;
pub mod config;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::token::*;
}
