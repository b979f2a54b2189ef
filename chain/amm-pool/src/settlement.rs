//! Settlement output
//!
//! Result of one `process()` cycle: the auxiliary data batch for the
//! settlement dispatcher plus the deposit/withdraw operations that align
//! the pool's on-ledger account with its accounting balances.

use serde::{Deserialize, Serialize};
use tracing::info;
use types::ids::{Address, U256};

use crate::codec::AuxiliaryData;
use crate::errors::LedgerError;
use crate::ledger::{Ledger, WithdrawOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationKind {
    /// Accounting balance exceeds the ledger balance
    Deposit,
    /// Ledger balance exceeds the accounting balance
    Withdraw,
}

/// One per-token delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub token: Address,
    pub kind: ReconciliationKind,
    pub amount: U256,
}

impl Reconciliation {
    /// Compare the two balances of one token; `None` when they agree.
    pub fn between(token: Address, accounting: U256, in_account: U256) -> Option<Self> {
        if accounting > in_account {
            Some(Self {
                token,
                kind: ReconciliationKind::Deposit,
                amount: accounting - in_account,
            })
        } else if accounting < in_account {
            Some(Self {
                token,
                kind: ReconciliationKind::Withdraw,
                amount: in_account - accounting,
            })
        } else {
            None
        }
    }

    /// Apply this delta to `pool`'s ledger account.
    pub async fn submit<L: Ledger + ?Sized>(&self, pool: Address, ledger: &L) -> Result<(), LedgerError> {
        match self.kind {
            ReconciliationKind::Deposit => ledger.deposit(pool, self.token, self.amount).await?,
            ReconciliationKind::Withdraw => {
                ledger
                    .withdraw(
                        pool,
                        self.token,
                        self.amount,
                        self.token,
                        U256::zero(),
                        WithdrawOptions::default(),
                    )
                    .await?
            }
        }
        info!(pool = ?pool, token = ?self.token, kind = ?self.kind, amount = %self.amount, "Reconciliation submitted");
        Ok(())
    }
}

/// Output of a successful settlement cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub pool: Address,
    pub auxiliary_data: AuxiliaryData,
    /// ABI encoding of `auxiliary_data`
    pub encoded: Vec<u8>,
    /// In pool token order
    pub reconciliations: Vec<Reconciliation>,
    pub total_supply: U256,
}

impl Settlement {
    /// Submit every reconciliation in token order.
    pub async fn submit_reconciliations<L: Ledger + ?Sized>(&self, ledger: &L) -> Result<(), LedgerError> {
        for reconciliation in &self.reconciliations {
            reconciliation.submit(self.pool, ledger).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;

    fn token() -> Address {
        Address::repeat_byte(0x01)
    }

    #[test]
    fn test_between() {
        assert_eq!(Reconciliation::between(token(), U256::from(5u64), U256::from(5u64)), None);
        assert_eq!(
            Reconciliation::between(token(), U256::from(8u64), U256::from(5u64)),
            Some(Reconciliation {
                token: token(),
                kind: ReconciliationKind::Deposit,
                amount: U256::from(3u64),
            })
        );
        assert_eq!(
            Reconciliation::between(token(), U256::from(1u64), U256::from(5u64)).map(|r| r.kind),
            Some(ReconciliationKind::Withdraw)
        );
    }

    #[tokio::test]
    async fn test_submit_applies_deltas() {
        let pool = Address::repeat_byte(0xee);
        let ledger = InMemoryLedger::new();
        ledger.credit(pool, token(), U256::from(10u64)).unwrap();

        let withdraw = Reconciliation::between(token(), U256::from(4u64), U256::from(10u64)).unwrap();
        withdraw.submit(pool, &ledger).await.unwrap();
        assert_eq!(ledger.balance(pool, token()), U256::from(4u64));

        let deposit = Reconciliation::between(token(), U256::from(9u64), U256::from(4u64)).unwrap();
        deposit.submit(pool, &ledger).await.unwrap();
        assert_eq!(ledger.balance(pool, token()), U256::from(9u64));
    }
}
