//! Request builder
//!
//! Normalises raw intents into canonical requests:
//! - resolves token symbols / `0x` addresses through the token registry
//! - scales decimal amounts into base units (half-up rounding)
//! - fills defaults (label, fee caps, flags)
//! - validates bips and label bounds
//!
//! `build_*` stops at the canonical record; `submit_*` also signs it.

use std::sync::Arc;

use tracing::debug;

use types::config::ExchangeConfig;
use types::errors::RequestError;
use types::ids::OrderId;
use types::numeric::{check_bips, check_label, to_base_units};
use types::token::{TokenInfo, TokenRegistry};

use crate::account::Account;
use crate::request::{
    CanonicalRequest, Cancel, CancelIntent, Order, OrderIntent, QueryIntent, RequestKind, Withdrawal,
    WithdrawalIntent,
};
use crate::signing::{SignatureEngine, SigningError};

pub struct RequestBuilder {
    registry: Arc<dyn TokenRegistry>,
    engine: SignatureEngine,
    default_label: u16,
    default_max_fee_bips: u8,
}

impl RequestBuilder {
    pub fn new(config: &ExchangeConfig, registry: Arc<dyn TokenRegistry>) -> Self {
        Self {
            registry,
            engine: SignatureEngine::new(config),
            default_label: config.default_label,
            default_max_fee_bips: config.default_max_fee_bips,
        }
    }

    /// Builder backed by the configured token table.
    pub fn from_config(config: &ExchangeConfig) -> Self {
        Self::new(config, Arc::new(config.token_registry()))
    }

    pub fn engine(&self) -> &SignatureEngine {
        &self.engine
    }

    fn resolve(&self, raw: &str) -> Result<TokenInfo, RequestError> {
        self.registry.resolve(raw)
    }

    fn label(&self, label: Option<u32>) -> Result<u16, RequestError> {
        match label {
            Some(l) => check_label(l),
            None => Ok(self.default_label),
        }
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    pub fn build_order(&self, account: &Account, intent: &OrderIntent) -> Result<CanonicalRequest, RequestError> {
        let token_s = self.resolve(&intent.token_s)?;
        let token_b = self.resolve(&intent.token_b)?;

        let amount_s = to_base_units("amount_s", &intent.amount_s, token_s.decimals)?;
        let amount_b = to_base_units("amount_b", &intent.amount_b, token_b.decimals)?;

        let max_fee_bips = match intent.max_fee_bips {
            Some(v) => bips("max_fee_bips", v)?,
            None => self.default_max_fee_bips,
        };
        check_bips("max_fee_bips", max_fee_bips)?;
        let fee_bips = match intent.fee_bips {
            Some(v) => bips("fee_bips", v)?,
            None => max_fee_bips,
        };
        let rebate_bips = bips("rebate_bips", intent.rebate_bips.unwrap_or(0))?;
        let label = self.label(intent.label)?;

        let order = Order {
            order_id: OrderId::new(intent.order_id),
            token_s: token_s.id,
            token_b: token_b.id,
            amount_s,
            amount_b,
            buy: intent.buy.unwrap_or(false),
            all_or_none: intent.all_or_none.unwrap_or(false),
            max_fee_bips,
            fee_bips,
            rebate_bips,
            valid_since: intent.valid_since,
            valid_until: intent.valid_until,
        };
        debug!(
            account_id = %account.account_id,
            order_id = intent.order_id,
            token_s = %order.token_s,
            token_b = %order.token_b,
            "Order canonicalised"
        );
        Ok(CanonicalRequest::new(account.clone(), label, RequestKind::Order(order)))
    }

    pub fn submit_order(&self, account: &Account, intent: &OrderIntent) -> Result<CanonicalRequest, SigningError> {
        let request = self.build_order(account, intent)?;
        self.engine.sign(request)
    }

    // -----------------------------------------------------------------------
    // Withdrawals and cancellations
    // -----------------------------------------------------------------------

    pub fn build_withdrawal(
        &self,
        account: &Account,
        intent: &WithdrawalIntent,
    ) -> Result<CanonicalRequest, RequestError> {
        let token = self.resolve(&intent.token)?;
        let fee_token = self.resolve(&intent.fee_token)?;

        let withdrawal = Withdrawal {
            token: token.id,
            amount: to_base_units("amount", &intent.amount, token.decimals)?,
            fee_token: fee_token.id,
            fee: to_base_units("fee", &intent.fee, fee_token.decimals)?,
        };
        let label = self.label(intent.label)?;
        Ok(CanonicalRequest::new(account.clone(), label, RequestKind::Withdrawal(withdrawal)))
    }

    pub fn submit_withdrawal(
        &self,
        account: &Account,
        intent: &WithdrawalIntent,
    ) -> Result<CanonicalRequest, SigningError> {
        let request = self.build_withdrawal(account, intent)?;
        self.engine.sign(request)
    }

    pub fn build_cancel(&self, account: &Account, intent: &CancelIntent) -> Result<CanonicalRequest, RequestError> {
        let order_token = self.resolve(&intent.order_token)?;
        let fee_token = self.resolve(&intent.fee_token)?;

        let cancel = Cancel {
            order_token: order_token.id,
            order_id: OrderId::new(intent.order_id),
            fee_token: fee_token.id,
            fee: to_base_units("fee", &intent.fee, fee_token.decimals)?,
        };
        let label = self.label(intent.label)?;
        Ok(CanonicalRequest::new(account.clone(), label, RequestKind::Cancel(cancel)))
    }

    pub fn submit_cancel(&self, account: &Account, intent: &CancelIntent) -> Result<CanonicalRequest, SigningError> {
        let request = self.build_cancel(account, intent)?;
        self.engine.sign(request)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn build_query(&self, account: &Account, intent: &QueryIntent) -> Result<CanonicalRequest, RequestError> {
        let kind = match intent {
            QueryIntent::ApiKey => RequestKind::ApiKeyQuery,
            QueryIntent::Nonce => RequestKind::NonceQuery,
            QueryIntent::OrderId { token_s } => RequestKind::OrderIdQuery {
                token_s: self.resolve(token_s)?.id,
            },
            QueryIntent::OrderDetail { order_hash } => RequestKind::OrderDetailQuery {
                order_hash: order_hash
                    .parse()
                    .map_err(|e| RequestError::invalid("order_hash", format!("{}", e)))?,
            },
            QueryIntent::Orders => RequestKind::OrdersQuery,
            QueryIntent::Balance => RequestKind::BalanceQuery,
            QueryIntent::Transactions => RequestKind::TransactionsQuery,
            QueryIntent::UserActions => RequestKind::UserActionsQuery,
            QueryIntent::Trades => RequestKind::TradesQuery,
            QueryIntent::FeeRate => RequestKind::FeeRateQuery,
        };
        Ok(CanonicalRequest::new(account.clone(), self.default_label, kind))
    }

    pub fn submit_query(&self, account: &Account, intent: &QueryIntent) -> Result<CanonicalRequest, SigningError> {
        let request = self.build_query(account, intent)?;
        self.engine.sign(request)
    }
}

fn bips(field: &str, value: u32) -> Result<u8, RequestError> {
    let narrowed = u8::try_from(value).map_err(|_| RequestError::invalid(field, format!("{} >= 64", value)))?;
    check_bips(field, narrowed)?;
    Ok(narrowed)
}
