//! Ledger — layer-2 balance collaborator
//!
//! The pool never owns balances; it reads and moves them through the
//! [`Ledger`] trait. Each call is atomic: it either fully applies or fails
//! without effect.
//!
//! [`InMemoryLedger`] keeps balances by `(owner, token)` with checked
//! credit/debit and records AMM weight updates. It backs tests and
//! single-process simulations.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use types::ids::{Address, U256};

use crate::errors::LedgerError;

/// Options of a layer-2 transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Receiver may not have an account yet
    pub transfer_to_new: bool,
}

/// Options of a layer-2 withdrawal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawOptions {
    pub min_gas: u64,
}

/// AMM parameters registered for one pool token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmSettings {
    pub fee_bips: u8,
    pub weight: U256,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    async fn get_balance(&self, owner: Address, token: Address) -> Result<U256, LedgerError>;

    /// Layer-1 → layer-2 deposit.
    async fn deposit(&self, owner: Address, token: Address, amount: U256) -> Result<(), LedgerError>;

    /// Layer-2 → layer-1 withdrawal; `fee` is charged in `fee_token`.
    async fn withdraw(
        &self,
        owner: Address,
        token: Address,
        amount: U256,
        fee_token: Address,
        fee: U256,
        options: WithdrawOptions,
    ) -> Result<(), LedgerError>;

    /// Layer-2 transfer; `fee` is charged to `from` in `fee_token`.
    #[allow(clippy::too_many_arguments)]
    async fn transfer(
        &self,
        from: Address,
        to: Address,
        token: Address,
        amount: U256,
        fee_token: Address,
        fee: U256,
        options: TransferOptions,
    ) -> Result<(), LedgerError>;

    /// Set the AMM fee and weight of `owner`'s `token` slot.
    async fn update_amm(&self, owner: Address, token: Address, fee_bips: u8, weight: U256) -> Result<(), LedgerError>;
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Address, HashMap<Address, U256>>,
    amm: HashMap<(Address, Address), AmmSettings>,
}

impl LedgerState {
    fn balance(&self, owner: &Address, token: &Address) -> U256 {
        self.balances
            .get(owner)
            .and_then(|tokens| tokens.get(token))
            .copied()
            .unwrap_or_default()
    }

    /// Check that `owner` can pay every `(token, amount)` debit at once.
    fn check_debits(&self, owner: Address, debits: &[(Address, U256)]) -> Result<(), LedgerError> {
        let mut required: HashMap<Address, U256> = HashMap::new();
        for (token, amount) in debits {
            let entry = required.entry(*token).or_default();
            *entry = entry.checked_add(*amount).ok_or(LedgerError::Overflow)?;
        }
        for (token, amount) in required {
            let available = self.balance(&owner, &token);
            if available < amount {
                return Err(LedgerError::InsufficientBalance {
                    owner,
                    token,
                    required: amount,
                    available,
                });
            }
        }
        Ok(())
    }

    fn safe_credit(&mut self, owner: Address, token: Address, amount: U256) -> Result<(), LedgerError> {
        let current = self.balances.entry(owner).or_default().entry(token).or_default();
        *current = current.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    fn safe_debit(&mut self, owner: Address, token: Address, amount: U256) -> Result<(), LedgerError> {
        let available = self.balance(&owner, &token);
        let remaining = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                owner,
                token,
                required: amount,
                available,
            })?;
        self.balances.entry(owner).or_default().insert(token, remaining);
        Ok(())
    }
}

/// Process-local ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous balance read.
    pub fn balance(&self, owner: Address, token: Address) -> U256 {
        self.state.read().balance(&owner, &token)
    }

    /// Seed a layer-2 balance directly.
    pub fn credit(&self, owner: Address, token: Address, amount: U256) -> Result<(), LedgerError> {
        self.state.write().safe_credit(owner, token, amount)
    }

    pub fn amm_settings(&self, owner: Address, token: Address) -> Option<AmmSettings> {
        self.state.read().amm.get(&(owner, token)).copied()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn get_balance(&self, owner: Address, token: Address) -> Result<U256, LedgerError> {
        Ok(self.balance(owner, token))
    }

    async fn deposit(&self, owner: Address, token: Address, amount: U256) -> Result<(), LedgerError> {
        self.credit(owner, token, amount)
    }

    async fn withdraw(
        &self,
        owner: Address,
        token: Address,
        amount: U256,
        fee_token: Address,
        fee: U256,
        _options: WithdrawOptions,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.check_debits(owner, &[(token, amount), (fee_token, fee)])?;
        state.safe_debit(owner, token, amount)?;
        state.safe_debit(owner, fee_token, fee)
    }

    async fn transfer(
        &self,
        from: Address,
        to: Address,
        token: Address,
        amount: U256,
        fee_token: Address,
        fee: U256,
        _options: TransferOptions,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.check_debits(from, &[(token, amount), (fee_token, fee)])?;
        // receiver credit must not overflow before anything moves
        if from != to {
            state.balance(&to, &token).checked_add(amount).ok_or(LedgerError::Overflow)?;
        }
        state.safe_debit(from, token, amount)?;
        state.safe_debit(from, fee_token, fee)?;
        state.safe_credit(to, token, amount)
    }

    async fn update_amm(&self, owner: Address, token: Address, fee_bips: u8, weight: U256) -> Result<(), LedgerError> {
        self.state
            .write()
            .amm
            .insert((owner, token), AmmSettings { fee_bips, weight });
        Ok(())
    }
}
