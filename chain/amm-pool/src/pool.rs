//! AMM Pool — join/exit queue and proportional settlement
//!
//! Lifecycle: `join`/`exit` → queue → `process` → settled batch.
//!
//! - Intents are queued in arrival order; settlement follows that order.
//! - Share math is floor division throughout:
//!   `ratio = shares * BASE / totalSupply`, `amount = balance * ratio / BASE`.
//! - The first join into an empty pool must mint exactly `INITIAL_SUPPLY`
//!   and deposits `maxAmountsIn` as the initial reserve.
//! - A cycle either settles the whole queue or fails without committing
//!   pool state; the queue is left intact for the caller.

use std::collections::{HashMap, VecDeque};

use futures::future::try_join_all;
use tracing::{debug, error, info, warn};
use types::config::PoolConfig;
use types::ids::{Address, U256};
use types::numeric::MAX_BIPS;

use crate::codec::{AuxiliaryData, PoolTransaction};
use crate::ecdsa;
use crate::errors::{LedgerError, PoolError};
use crate::events::{
    CycleSettled, ExitQueued, IntentSettled, JoinQueued, PoolEvent, ReconciliationRequired, WeightRestoreFailed,
};
use crate::intent::{AuthMethod, PoolExit, PoolIntent, PoolJoin};
use crate::ledger::{Ledger, TransferOptions};
use crate::settlement::{Reconciliation, Settlement};
use crate::typed_data::PoolDomain;

/// One layer-2 token movement between an intent owner and the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Leg {
    owner: Address,
    token: Address,
    amount: U256,
    /// owner → pool when true, pool → owner otherwise
    inbound: bool,
}

/// Outcome of settling the queue against a balance snapshot, before any
/// ledger call.
#[derive(Debug, Clone, Default)]
struct CyclePlan {
    legs: Vec<Leg>,
    in_account: Vec<U256>,
    accounting: Vec<U256>,
    total_supply: U256,
    transactions: Vec<PoolTransaction>,
    settled: Vec<IntentSettled>,
    joins: usize,
    exits: usize,
}

/// Accountant for one AMM pool.
#[derive(Debug)]
pub struct AmmPool {
    /// Pool's own layer-2 account and typed-data verifying contract
    address: Address,
    tokens: Vec<Address>,
    weights: Vec<U256>,
    fee_bips: u8,
    total_supply: U256,
    base: U256,
    initial_supply: U256,
    domain: PoolDomain,
    queue: VecDeque<PoolIntent>,
    events: Vec<PoolEvent>,
}

impl AmmPool {
    pub fn new(
        config: &PoolConfig,
        address: Address,
        tokens: Vec<Address>,
        weights: Vec<U256>,
        fee_bips: u8,
    ) -> Result<Self, PoolError> {
        if tokens.is_empty() {
            return Err(invalid("tokens", "pool needs at least one token"));
        }
        if weights.len() != tokens.len() {
            return Err(PoolError::LengthMismatch {
                expected: tokens.len(),
                got: weights.len(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        if !tokens.iter().all(|t| seen.insert(*t)) {
            return Err(invalid("tokens", "duplicate token"));
        }
        if fee_bips >= MAX_BIPS {
            return Err(invalid("fee_bips", format!("{} >= {}", fee_bips, MAX_BIPS)));
        }
        if config.base.is_zero() {
            return Err(invalid("base", "must be non-zero"));
        }

        Ok(Self {
            address,
            tokens,
            weights,
            fee_bips,
            total_supply: U256::zero(),
            base: config.base,
            initial_supply: config.initial_supply,
            domain: PoolDomain::new(config, address),
            queue: VecDeque::new(),
            events: Vec::new(),
        })
    }

    // ───────────────────────── Accessors ─────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn tokens(&self) -> &[Address] {
        &self.tokens
    }

    pub fn weights(&self) -> &[U256] {
        &self.weights
    }

    pub fn fee_bips(&self) -> u8 {
        self.fee_bips
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn domain(&self) -> &PoolDomain {
        &self.domain
    }

    /// Queued intents in settlement order.
    pub fn pending(&self) -> impl Iterator<Item = &PoolIntent> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }

    /// Register the pool's fee and weights on the ledger.
    pub async fn setup<L: Ledger + ?Sized>(&self, ledger: &L) -> Result<(), PoolError> {
        self.apply_weights(ledger, &self.weights).await?;
        info!(pool = ?self.address, tokens = self.tokens.len(), fee_bips = self.fee_bips, "Pool registered");
        Ok(())
    }

    // ───────────────────────── Intake ─────────────────────────

    /// Queue a join minting `pool_amount_out` shares.
    pub fn join(
        &mut self,
        owner: Address,
        pool_amount_out: U256,
        max_amounts_in: Vec<U256>,
        from_layer2: bool,
        auth: AuthMethod<'_>,
    ) -> Result<(), PoolError> {
        let intent = PoolIntent::Join(PoolJoin {
            owner,
            from_layer2,
            pool_amount_out,
            max_amounts_in,
            signature: None,
        });
        let intent = self.authorize(intent, auth)?;
        self.submit(intent)
    }

    /// Queue an exit burning `pool_amount_in` shares.
    pub fn exit(
        &mut self,
        owner: Address,
        pool_amount_in: U256,
        min_amounts_out: Vec<U256>,
        to_layer2: bool,
        auth: AuthMethod<'_>,
    ) -> Result<(), PoolError> {
        let intent = PoolIntent::Exit(PoolExit {
            owner,
            to_layer2,
            pool_amount_in,
            min_amounts_out,
            signature: None,
        });
        let intent = self.authorize(intent, auth)?;
        self.submit(intent)
    }

    fn authorize(&self, mut intent: PoolIntent, auth: AuthMethod<'_>) -> Result<PoolIntent, PoolError> {
        if let AuthMethod::Ecdsa(signer) = auth {
            let digest = intent.digest(&self.domain);
            intent.set_signature(signer.sign_digest(&digest)?);
        }
        Ok(intent)
    }

    /// Validate and enqueue an intent built elsewhere. A present signature
    /// must recover to the intent owner.
    pub fn submit(&mut self, intent: PoolIntent) -> Result<(), PoolError> {
        if intent.amounts().len() != self.tokens.len() {
            return Err(PoolError::LengthMismatch {
                expected: self.tokens.len(),
                got: intent.amounts().len(),
            });
        }

        if let Some(signature) = intent.signature() {
            let digest = intent.digest(&self.domain);
            if !ecdsa::verify(&digest, signature, intent.owner()) {
                error!(pool = ?self.address, owner = ?intent.owner(), "Pool intent signature does not recover to owner");
                return Err(PoolError::SignatureVerificationFailed { owner: intent.owner() });
            }
        }

        let signed = intent.signature().is_some();
        let event = match &intent {
            PoolIntent::Join(j) => {
                if j.pool_amount_out.is_zero() {
                    return Err(invalid("pool_amount_out", "must be non-zero"));
                }
                PoolEvent::JoinQueued(JoinQueued {
                    owner: j.owner,
                    from_layer2: j.from_layer2,
                    pool_amount_out: j.pool_amount_out,
                    signed,
                })
            }
            PoolIntent::Exit(e) => {
                if e.pool_amount_in.is_zero() {
                    return Err(invalid("pool_amount_in", "must be non-zero"));
                }
                PoolEvent::ExitQueued(ExitQueued {
                    owner: e.owner,
                    to_layer2: e.to_layer2,
                    pool_amount_in: e.pool_amount_in,
                    signed,
                })
            }
        };

        debug!(pool = ?self.address, event = event.event_type(), owner = ?intent.owner(), "Intent queued");
        self.queue.push_back(intent);
        self.events.push(event);
        Ok(())
    }

    // ───────────────────────── Settlement ─────────────────────────

    /// Settle the whole queue against `ledger`.
    ///
    /// Weights are disabled while the cycle runs and restored afterwards,
    /// on failure as well. On error no pool state is committed, transfers
    /// already issued are reversed and the queue is kept. A failed weight
    /// restore after the transfers is recorded as an event and does not
    /// undo the cycle.
    pub async fn process<L: Ledger + ?Sized>(&mut self, ledger: &L) -> Result<Settlement, PoolError> {
        info!(pool = ?self.address, queued = self.queue.len(), total_supply = %self.total_supply, "Starting settlement cycle");

        let disabled = vec![U256::zero(); self.tokens.len()];
        let settled = match self.apply_weights(ledger, &disabled).await {
            Ok(()) => self.settle(ledger).await,
            Err(err) => Err(err),
        };
        let plan = match settled {
            Ok(plan) => plan,
            Err(err) => {
                error!(pool = ?self.address, error = %err, "Settlement cycle aborted");
                if let Err(restore_err) = self.apply_weights(ledger, &self.weights).await {
                    warn!(pool = ?self.address, error = %restore_err, "Failed to restore weights after aborted cycle");
                }
                return Err(err);
            }
        };

        let reconciliations: Vec<Reconciliation> = self
            .tokens
            .iter()
            .zip(plan.accounting.iter().zip(&plan.in_account))
            .filter_map(|(token, (accounting, in_account))| Reconciliation::between(*token, *accounting, *in_account))
            .collect();
        for r in &reconciliations {
            warn!(pool = ?self.address, token = ?r.token, kind = ?r.kind, amount = %r.amount, "Pool account needs reconciliation");
        }

        // commit; funds have moved, so nothing below may fail the cycle
        self.total_supply = plan.total_supply;
        self.queue.clear();
        for settled in plan.settled {
            self.events.push(PoolEvent::IntentSettled(settled));
        }
        for r in &reconciliations {
            self.events.push(PoolEvent::ReconciliationRequired(ReconciliationRequired {
                token: r.token,
                kind: r.kind,
                amount: r.amount,
            }));
        }
        self.events.push(PoolEvent::CycleSettled(CycleSettled {
            joins: plan.joins,
            exits: plan.exits,
            total_supply: plan.total_supply,
        }));

        if let Err(err) = self.apply_weights(ledger, &self.weights).await {
            warn!(pool = ?self.address, error = %err, "Failed to restore weights after committed cycle");
            self.events.push(PoolEvent::WeightRestoreFailed(WeightRestoreFailed {
                reason: err.to_string(),
            }));
        }

        let auxiliary_data = AuxiliaryData::new(plan.transactions);
        let encoded = auxiliary_data.encode();
        info!(
            pool = ?self.address,
            joins = plan.joins,
            exits = plan.exits,
            total_supply = %self.total_supply,
            reconciliations = reconciliations.len(),
            "Settlement cycle committed"
        );

        Ok(Settlement {
            pool: self.address,
            auxiliary_data,
            encoded,
            reconciliations,
            total_supply: self.total_supply,
        })
    }

    async fn settle<L: Ledger + ?Sized>(&self, ledger: &L) -> Result<CyclePlan, PoolError> {
        let balances = try_join_all(self.tokens.iter().map(|token| ledger.get_balance(self.address, *token))).await?;

        let plan = self.plan(&balances)?;
        self.preflight(ledger, &plan.legs).await?;

        self.execute(ledger, &plan.legs).await?;
        Ok(plan)
    }

    /// Issue every leg in queue order. When a transfer fails, the legs
    /// already applied are reversed newest first.
    async fn execute<L: Ledger + ?Sized>(&self, ledger: &L, legs: &[Leg]) -> Result<(), PoolError> {
        for (applied, leg) in legs.iter().enumerate() {
            let Err(cause) = self.transfer_leg(ledger, leg, false).await else {
                continue;
            };
            error!(pool = ?self.address, leg = applied, error = %cause, "Transfer failed, reversing applied legs");
            for done in legs[..applied].iter().rev() {
                if let Err(rollback) = self.transfer_leg(ledger, done, true).await {
                    error!(pool = ?self.address, error = %rollback, "Reversal failed, ledger left partially settled");
                    return Err(PoolError::RollbackFailed { cause, rollback });
                }
            }
            return Err(cause.into());
        }
        Ok(())
    }

    async fn transfer_leg<L: Ledger + ?Sized>(&self, ledger: &L, leg: &Leg, reverse: bool) -> Result<(), LedgerError> {
        let to_pool = leg.inbound != reverse;
        let (from, to) = if to_pool {
            (leg.owner, self.address)
        } else {
            (self.address, leg.owner)
        };
        let options = TransferOptions {
            transfer_to_new: !to_pool,
        };
        ledger
            .transfer(from, to, leg.token, leg.amount, leg.token, U256::zero(), options)
            .await
    }

    /// Pure settlement of the queue against a balance snapshot.
    fn plan(&self, balances: &[U256]) -> Result<CyclePlan, PoolError> {
        let mut plan = CyclePlan {
            in_account: balances.to_vec(),
            accounting: balances.to_vec(),
            total_supply: self.total_supply,
            ..CyclePlan::default()
        };

        for intent in &self.queue {
            match intent {
                PoolIntent::Join(join) => {
                    let amounts = if plan.total_supply.is_zero() {
                        if join.pool_amount_out != self.initial_supply {
                            return Err(PoolError::InvalidInitialJoin {
                                expected: self.initial_supply,
                                got: join.pool_amount_out,
                            });
                        }
                        join.max_amounts_in.clone()
                    } else {
                        let ratio = self.ratio(join.pool_amount_out, plan.total_supply)?;
                        plan.accounting
                            .iter()
                            .map(|balance| self.share_of(*balance, ratio))
                            .collect::<Result<Vec<_>, _>>()?
                    };

                    for (i, amount) in amounts.iter().enumerate() {
                        if join.from_layer2 {
                            plan.legs.push(Leg {
                                owner: join.owner,
                                token: self.tokens[i],
                                amount: *amount,
                                inbound: true,
                            });
                            plan.in_account[i] = plan.in_account[i].checked_add(*amount).ok_or(PoolError::Overflow)?;
                        }
                        plan.accounting[i] = plan.accounting[i].checked_add(*amount).ok_or(PoolError::Overflow)?;
                        debug!(token = ?self.tokens[i], amount = %amount, layer2 = join.from_layer2, "Pool join amount");
                    }

                    plan.total_supply = plan
                        .total_supply
                        .checked_add(join.pool_amount_out)
                        .ok_or(PoolError::Overflow)?;
                    plan.joins += 1;
                    plan.settled.push(IntentSettled {
                        owner: join.owner,
                        join: true,
                        shares: join.pool_amount_out,
                        amounts,
                    });
                }
                PoolIntent::Exit(exit) => {
                    if plan.total_supply.is_zero() || exit.pool_amount_in > plan.total_supply {
                        return Err(PoolError::InsufficientSupply {
                            supply: plan.total_supply,
                            requested: exit.pool_amount_in,
                        });
                    }
                    let ratio = self.ratio(exit.pool_amount_in, plan.total_supply)?;
                    let amounts = plan
                        .accounting
                        .iter()
                        .map(|balance| self.share_of(*balance, ratio))
                        .collect::<Result<Vec<_>, _>>()?;

                    for (i, amount) in amounts.iter().enumerate() {
                        plan.accounting[i] = plan.accounting[i].checked_sub(*amount).ok_or(PoolError::Overflow)?;
                        if exit.to_layer2 {
                            plan.in_account[i] = plan.in_account[i].checked_sub(*amount).ok_or(
                                LedgerError::InsufficientBalance {
                                    owner: self.address,
                                    token: self.tokens[i],
                                    required: *amount,
                                    available: plan.in_account[i],
                                },
                            )?;
                            plan.legs.push(Leg {
                                owner: exit.owner,
                                token: self.tokens[i],
                                amount: *amount,
                                inbound: false,
                            });
                        }
                        debug!(token = ?self.tokens[i], amount = %amount, layer2 = exit.to_layer2, "Pool exit amount");
                    }

                    plan.total_supply -= exit.pool_amount_in;
                    plan.exits += 1;
                    plan.settled.push(IntentSettled {
                        owner: exit.owner,
                        join: false,
                        shares: exit.pool_amount_in,
                        amounts,
                    });
                }
            }
            plan.transactions.push(intent.to_transaction());
        }
        Ok(plan)
    }

    /// Check that every participant can fund its inbound legs, in queue
    /// order, before any transfer is issued.
    async fn preflight<L: Ledger + ?Sized>(&self, ledger: &L, legs: &[Leg]) -> Result<(), PoolError> {
        let mut running: HashMap<(Address, Address), U256> = HashMap::new();
        for leg in legs {
            let key = (leg.owner, leg.token);
            let available = match running.get(&key) {
                Some(balance) => *balance,
                None => ledger.get_balance(leg.owner, leg.token).await?,
            };
            let next = if leg.inbound {
                available.checked_sub(leg.amount).ok_or(LedgerError::InsufficientBalance {
                    owner: leg.owner,
                    token: leg.token,
                    required: leg.amount,
                    available,
                })?
            } else {
                available.checked_add(leg.amount).ok_or(LedgerError::Overflow)?
            };
            running.insert(key, next);
        }
        Ok(())
    }

    async fn apply_weights<L: Ledger + ?Sized>(&self, ledger: &L, weights: &[U256]) -> Result<(), PoolError> {
        try_join_all(
            self.tokens
                .iter()
                .zip(weights)
                .map(|(token, weight)| ledger.update_amm(self.address, *token, self.fee_bips, *weight)),
        )
        .await?;
        Ok(())
    }

    fn ratio(&self, shares: U256, supply: U256) -> Result<U256, PoolError> {
        Ok(shares.checked_mul(self.base).ok_or(PoolError::Overflow)? / supply)
    }

    fn share_of(&self, balance: U256, ratio: U256) -> Result<U256, PoolError> {
        Ok(balance.checked_mul(ratio).ok_or(PoolError::Overflow)? / self.base)
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> PoolError {
    PoolError::InvalidParameter {
        name: name.to_string(),
        reason: reason.into(),
    }
}
