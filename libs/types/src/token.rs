//! Token metadata and resolution
//!
//! Tokens are referenced by users either by symbol (`"WETH"`) or by their
//! layer-1 contract address (`"0x..."`). A [`TokenRegistry`] resolves both
//! forms to the exchange's token id and decimals.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::errors::RequestError;
use crate::ids::{Address, TokenId};

/// Resolved token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub id: TokenId,
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

/// A user-supplied token reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRef {
    Symbol(String),
    Address(Address),
}

impl TokenRef {
    /// Parse a reference; strings starting with `0x` are addresses.
    pub fn parse(raw: &str) -> Result<Self, RequestError> {
        let raw = raw.trim();
        if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            let address = Address::from_str(hex).map_err(|_| RequestError::unknown_token(raw))?;
            Ok(TokenRef::Address(address))
        } else {
            Ok(TokenRef::Symbol(raw.to_string()))
        }
    }
}

/// Token lookup collaborator
pub trait TokenRegistry: Send + Sync {
    fn resolve_by_symbol(&self, symbol: &str) -> Result<TokenInfo, RequestError>;

    fn resolve_by_address(&self, address: &Address) -> Result<TokenInfo, RequestError>;

    /// Resolve either reference form.
    fn resolve(&self, raw: &str) -> Result<TokenInfo, RequestError> {
        match TokenRef::parse(raw)? {
            TokenRef::Symbol(symbol) => self.resolve_by_symbol(&symbol),
            TokenRef::Address(address) => self.resolve_by_address(&address),
        }
    }
}

/// In-memory registry built from a fixed token table
#[derive(Debug, Clone, Default)]
pub struct StaticTokenRegistry {
    by_symbol: HashMap<String, TokenInfo>,
    by_address: HashMap<Address, TokenInfo>,
}

impl StaticTokenRegistry {
    pub fn new(tokens: impl IntoIterator<Item = TokenInfo>) -> Self {
        let mut registry = Self::default();
        for token in tokens {
            registry.insert(token);
        }
        registry
    }

    pub fn insert(&mut self, token: TokenInfo) {
        self.by_address.insert(token.address, token.clone());
        self.by_symbol.insert(token.symbol.clone(), token);
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

impl TokenRegistry for StaticTokenRegistry {
    fn resolve_by_symbol(&self, symbol: &str) -> Result<TokenInfo, RequestError> {
        self.by_symbol
            .get(symbol)
            .cloned()
            .ok_or_else(|| RequestError::unknown_token(symbol))
    }

    fn resolve_by_address(&self, address: &Address) -> Result<TokenInfo, RequestError> {
        self.by_address
            .get(address)
            .cloned()
            .ok_or_else(|| RequestError::unknown_token(format!("{:?}", address)))
    }
}
