//! Pool events
//!
//! Immutable records appended by the pool for each queued intent and each
//! committed settlement cycle. Events of a failed cycle are never recorded.

use serde::{Deserialize, Serialize};
use types::ids::{Address, U256};

use crate::settlement::ReconciliationKind;

/// Join intent accepted into the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinQueued {
    pub owner: Address,
    pub from_layer2: bool,
    pub pool_amount_out: U256,
    pub signed: bool,
}

/// Exit intent accepted into the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitQueued {
    pub owner: Address,
    pub to_layer2: bool,
    pub pool_amount_in: U256,
    pub signed: bool,
}

/// One settled intent with the per-token amounts it moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSettled {
    pub owner: Address,
    pub join: bool,
    pub shares: U256,
    pub amounts: Vec<U256>,
}

/// Deposit/withdraw delta required to align the pool account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRequired {
    pub token: Address,
    pub kind: ReconciliationKind,
    pub amount: U256,
}

/// Settlement cycle committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSettled {
    pub joins: usize,
    pub exits: usize,
    pub total_supply: U256,
}

/// Weights could not be restored after a committed cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightRestoreFailed {
    pub reason: String,
}

/// Enum wrapper for all pool events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PoolEvent {
    JoinQueued(JoinQueued),
    ExitQueued(ExitQueued),
    IntentSettled(IntentSettled),
    ReconciliationRequired(ReconciliationRequired),
    CycleSettled(CycleSettled),
    WeightRestoreFailed(WeightRestoreFailed),
}

impl PoolEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            PoolEvent::JoinQueued(_) => "JoinQueued",
            PoolEvent::ExitQueued(_) => "ExitQueued",
            PoolEvent::IntentSettled(_) => "IntentSettled",
            PoolEvent::ReconciliationRequired(_) => "ReconciliationRequired",
            PoolEvent::CycleSettled(_) => "CycleSettled",
            PoolEvent::WeightRestoreFailed(_) => "WeightRestoreFailed",
        }
    }
}
