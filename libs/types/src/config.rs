//! Process-wide exchange configuration
//!
//! Loaded once at startup (JSON) and passed read-only into the request
//! builder, the signature engine and every AMM pool.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::errors::ConfigError;
use crate::ids::{ExchangeId, U256};
use crate::numeric::MAX_BIPS;
use crate::token::{StaticTokenRegistry, TokenInfo};

/// Fixed-point unit used by pool share math (10^18)
pub fn default_base() -> U256 {
    U256::exp10(18)
}

/// Share supply minted by the first join into an empty pool (100 * 10^18)
pub fn default_initial_supply() -> U256 {
    U256::from(100u64) * U256::exp10(18)
}

/// AMM pool constants and typed-data domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Typed-data domain name
    pub name: String,
    /// Typed-data domain version
    pub version: String,
    /// Chain id bound into pool intent signatures
    pub chain_id: u64,
    pub base: U256,
    pub initial_supply: U256,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "AMM Pool".to_string(),
            version: "1.0.0".to_string(),
            chain_id: 1,
            base: default_base(),
            initial_supply: default_initial_supply(),
        }
    }
}

/// Exchange client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub exchange_id: ExchangeId,
    /// Label applied to requests that do not carry one
    pub default_label: u16,
    /// Fee cap applied to orders that do not carry one
    pub default_max_fee_bips: u8,
    pub tokens: Vec<TokenInfo>,
    pub pool: PoolConfig,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            exchange_id: ExchangeId::new(1),
            default_label: 0,
            default_max_fee_bips: 20,
            tokens: Vec::new(),
            pool: PoolConfig::default(),
        }
    }
}

impl ExchangeConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ExchangeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_max_fee_bips >= MAX_BIPS {
            return Err(invalid(
                "default_max_fee_bips",
                format!("{} >= {}", self.default_max_fee_bips, MAX_BIPS),
            ));
        }
        if self.pool.base.is_zero() {
            return Err(invalid("pool.base", "must be non-zero"));
        }
        if self.pool.initial_supply.is_zero() {
            return Err(invalid("pool.initial_supply", "must be non-zero"));
        }

        let mut ids = HashSet::new();
        let mut symbols = HashSet::new();
        for token in &self.tokens {
            if !ids.insert(token.id) {
                return Err(invalid("tokens", format!("duplicate token id {}", token.id)));
            }
            if !symbols.insert(token.symbol.as_str()) {
                return Err(invalid("tokens", format!("duplicate symbol {}", token.symbol)));
            }
        }
        Ok(())
    }

    /// Build the in-memory registry for the configured token table.
    pub fn token_registry(&self) -> StaticTokenRegistry {
        StaticTokenRegistry::new(self.tokens.iter().cloned())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}
