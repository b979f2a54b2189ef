//! Pool intents
//!
//! A join mints `pool_amount_out` shares against proportional deposits of
//! every pool token; an exit burns `pool_amount_in` shares for proportional
//! withdrawals. Signed intents carry an EIP-712 signature by the owner;
//! pre-approved intents carry none and are authorized on the ledger.

use serde::{Deserialize, Serialize};
use types::ids::{Address, U256};

use crate::codec::{PoolData, PoolTransaction, PoolTransactionKind};
use crate::ecdsa::EcdsaSigner;
use crate::typed_data::{pool_exit_hash, pool_join_hash, PoolDomain};

/// How an intent is authorized before it is queued.
#[derive(Debug, Clone, Copy)]
pub enum AuthMethod<'a> {
    /// Sign the typed-data digest with the owner's key
    Ecdsa(&'a EcdsaSigner),
    /// Authorization already granted on the ledger
    Approved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolJoin {
    pub owner: Address,
    pub from_layer2: bool,
    pub pool_amount_out: U256,
    pub max_amounts_in: Vec<U256>,
    pub signature: Option<Vec<u8>>,
}

impl PoolJoin {
    pub fn struct_hash(&self) -> [u8; 32] {
        pool_join_hash(self.owner, self.from_layer2, self.pool_amount_out, &self.max_amounts_in)
    }

    pub fn data(&self) -> PoolData {
        PoolData {
            owner: self.owner,
            layer2: self.from_layer2,
            shares: self.pool_amount_out,
            amounts: self.max_amounts_in.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolExit {
    pub owner: Address,
    pub to_layer2: bool,
    pub pool_amount_in: U256,
    pub min_amounts_out: Vec<U256>,
    pub signature: Option<Vec<u8>>,
}

impl PoolExit {
    pub fn struct_hash(&self) -> [u8; 32] {
        pool_exit_hash(self.owner, self.to_layer2, self.pool_amount_in, &self.min_amounts_out)
    }

    pub fn data(&self) -> PoolData {
        PoolData {
            owner: self.owner,
            layer2: self.to_layer2,
            shares: self.pool_amount_in,
            amounts: self.min_amounts_out.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolIntent {
    Join(PoolJoin),
    Exit(PoolExit),
}

impl PoolIntent {
    pub fn owner(&self) -> Address {
        match self {
            PoolIntent::Join(j) => j.owner,
            PoolIntent::Exit(e) => e.owner,
        }
    }

    pub fn signature(&self) -> Option<&[u8]> {
        match self {
            PoolIntent::Join(j) => j.signature.as_deref(),
            PoolIntent::Exit(e) => e.signature.as_deref(),
        }
    }

    pub(crate) fn set_signature(&mut self, signature: Vec<u8>) {
        match self {
            PoolIntent::Join(j) => j.signature = Some(signature),
            PoolIntent::Exit(e) => e.signature = Some(signature),
        }
    }

    /// `maxAmountsIn` or `minAmountsOut`
    pub fn amounts(&self) -> &[U256] {
        match self {
            PoolIntent::Join(j) => &j.max_amounts_in,
            PoolIntent::Exit(e) => &e.min_amounts_out,
        }
    }

    pub fn kind(&self) -> PoolTransactionKind {
        match self {
            PoolIntent::Join(_) => PoolTransactionKind::Join,
            PoolIntent::Exit(_) => PoolTransactionKind::Exit,
        }
    }

    /// Typed-data digest the owner signs.
    pub fn digest(&self, domain: &PoolDomain) -> [u8; 32] {
        let struct_hash = match self {
            PoolIntent::Join(j) => j.struct_hash(),
            PoolIntent::Exit(e) => e.struct_hash(),
        };
        domain.digest(&struct_hash)
    }

    /// Wire form emitted when the intent settles.
    pub fn to_transaction(&self) -> PoolTransaction {
        let data = match self {
            PoolIntent::Join(j) => j.data(),
            PoolIntent::Exit(e) => e.data(),
        };
        PoolTransaction {
            kind: self.kind(),
            data: data.encode(),
            signature: self.signature().map(<[u8]>::to_vec).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PoolData;

    fn join() -> PoolJoin {
        PoolJoin {
            owner: Address::repeat_byte(3),
            from_layer2: true,
            pool_amount_out: U256::from(10u64),
            max_amounts_in: vec![U256::from(1u64), U256::from(2u64)],
            signature: None,
        }
    }

    #[test]
    fn test_unsigned_transaction_has_empty_signature() {
        let tx = PoolIntent::Join(join()).to_transaction();
        assert_eq!(tx.kind, PoolTransactionKind::Join);
        assert!(tx.signature.is_empty());
        assert_eq!(PoolData::decode(&tx.data).unwrap(), join().data());
    }

    #[test]
    fn test_signature_does_not_change_digest() {
        let domain = PoolDomain::new(&types::config::PoolConfig::default(), Address::repeat_byte(9));
        let mut intent = PoolIntent::Join(join());
        let before = intent.digest(&domain);
        intent.set_signature(vec![1, 2, 3]);
        assert_eq!(intent.digest(&domain), before);
        assert_eq!(intent.signature(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_exit_accessors() {
        let exit = PoolIntent::Exit(PoolExit {
            owner: Address::repeat_byte(4),
            to_layer2: false,
            pool_amount_in: U256::from(3u64),
            min_amounts_out: vec![U256::zero(); 2],
            signature: None,
        });
        assert_eq!(exit.owner(), Address::repeat_byte(4));
        assert_eq!(exit.kind(), PoolTransactionKind::Exit);
        assert_eq!(exit.amounts().len(), 2);
    }
}
