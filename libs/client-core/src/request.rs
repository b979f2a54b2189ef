//! Request types
//!
//! Raw intents carry user-facing values (token symbols or addresses,
//! decimal amount strings, optional fields). The request builder turns
//! them into a [`CanonicalRequest`] holding resolved token ids and
//! base-unit integers; the signature engine attaches a [`Commitment`].

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use types::ids::{OrderId, TokenId};

use crate::account::Account;
use crate::eddsa::Signature;
use crate::field::FieldElement;
use crate::poseidon::HashParams;

// ---------------------------------------------------------------------------
// Raw intents
// ---------------------------------------------------------------------------

/// Order as submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Token sold, symbol or `0x` address
    pub token_s: String,
    /// Token bought, symbol or `0x` address
    pub token_b: String,
    /// Decimal amount of `token_s`
    pub amount_s: String,
    /// Decimal amount of `token_b`
    pub amount_b: String,
    pub order_id: u32,
    pub valid_since: u32,
    pub valid_until: u32,
    #[serde(default)]
    pub buy: Option<bool>,
    #[serde(default)]
    pub all_or_none: Option<bool>,
    #[serde(default)]
    pub max_fee_bips: Option<u32>,
    #[serde(default)]
    pub fee_bips: Option<u32>,
    #[serde(default)]
    pub rebate_bips: Option<u32>,
    #[serde(default)]
    pub label: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalIntent {
    pub token: String,
    pub amount: String,
    pub fee_token: String,
    pub fee: String,
    #[serde(default)]
    pub label: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelIntent {
    /// Token sold by the order being cancelled
    pub order_token: String,
    pub order_id: u32,
    pub fee_token: String,
    pub fee: String,
    #[serde(default)]
    pub label: Option<u32>,
}

/// Authenticated read request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryIntent {
    ApiKey,
    Nonce,
    OrderId { token_s: String },
    /// `order_hash` is the decimal commitment hash of the order
    OrderDetail { order_hash: String },
    Orders,
    Balance,
    Transactions,
    UserActions,
    Trades,
    FeeRate,
}

// ---------------------------------------------------------------------------
// Canonical records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub order_id: OrderId,
    pub token_s: TokenId,
    pub token_b: TokenId,
    pub amount_s: BigUint,
    pub amount_b: BigUint,
    pub buy: bool,
    pub all_or_none: bool,
    pub max_fee_bips: u8,
    pub fee_bips: u8,
    pub rebate_bips: u8,
    pub valid_since: u32,
    pub valid_until: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub token: TokenId,
    pub amount: BigUint,
    pub fee_token: TokenId,
    pub fee: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancel {
    pub order_token: TokenId,
    pub order_id: OrderId,
    pub fee_token: TokenId,
    pub fee: BigUint,
}

/// One variant per request kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Order(Order),
    Withdrawal(Withdrawal),
    Cancel(Cancel),
    ApiKeyQuery,
    NonceQuery,
    OrderIdQuery { token_s: TokenId },
    OrderDetailQuery { order_hash: FieldElement },
    OrdersQuery,
    BalanceQuery,
    TransactionsQuery,
    UserActionsQuery,
    TradesQuery,
    FeeRateQuery,
}

impl RequestKind {
    /// Poseidon parameters of the commitment for this kind.
    pub fn hash_params(&self) -> HashParams {
        match self {
            RequestKind::Order(_) => HashParams::new(14, 6, 53),
            RequestKind::Withdrawal(_) | RequestKind::Cancel(_) => HashParams::new(9, 6, 53),
            RequestKind::ApiKeyQuery => HashParams::new(4, 6, 53),
            RequestKind::OrderIdQuery { .. } | RequestKind::OrderDetailQuery { .. } => {
                HashParams::new(3, 6, 53)
            }
            RequestKind::NonceQuery
            | RequestKind::OrdersQuery
            | RequestKind::BalanceQuery
            | RequestKind::TransactionsQuery
            | RequestKind::UserActionsQuery
            | RequestKind::TradesQuery
            | RequestKind::FeeRateQuery => HashParams::new(2, 6, 53),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RequestKind::Order(_) => "order",
            RequestKind::Withdrawal(_) => "withdrawal",
            RequestKind::Cancel(_) => "cancel",
            RequestKind::ApiKeyQuery => "api_key_query",
            RequestKind::NonceQuery => "nonce_query",
            RequestKind::OrderIdQuery { .. } => "order_id_query",
            RequestKind::OrderDetailQuery { .. } => "order_detail_query",
            RequestKind::OrdersQuery => "orders_query",
            RequestKind::BalanceQuery => "balance_query",
            RequestKind::TransactionsQuery => "transactions_query",
            RequestKind::UserActionsQuery => "user_actions_query",
            RequestKind::TradesQuery => "trades_query",
            RequestKind::FeeRateQuery => "fee_rate_query",
        }
    }
}

/// Commitment hash and the signature over it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment {
    pub hash: FieldElement,
    pub signature: Signature,
}

/// A request ready for signing, or already signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub account: Account,
    pub label: u16,
    pub kind: RequestKind,
    commitment: Option<Commitment>,
}

impl CanonicalRequest {
    pub fn new(account: Account, label: u16, kind: RequestKind) -> Self {
        Self {
            account,
            label,
            kind,
            commitment: None,
        }
    }

    pub fn commitment(&self) -> Option<&Commitment> {
        self.commitment.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.commitment.is_some()
    }

    pub fn hash(&self) -> Option<&FieldElement> {
        self.commitment.as_ref().map(|c| &c.hash)
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.commitment.as_ref().map(|c| &c.signature)
    }

    /// Attach a commitment. A request that already carries one is returned
    /// untouched.
    pub(crate) fn with_commitment(mut self, commitment: Commitment) -> Self {
        if self.commitment.is_none() {
            self.commitment = Some(commitment);
        }
        self
    }
}
