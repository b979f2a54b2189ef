//! ABI codec for settled pool transactions
//!
//! - Per-intent data: `tuple(address,bool,uint256,uint256[])`
//! - Batch: `tuple(uint256,bytes,bytes)[]` of `(kind, data, signature)`

use ethabi::{ParamType, Token};
use serde::{Deserialize, Serialize};
use types::ids::{Address, U256};

use crate::errors::PoolError;

/// Transaction kind tag carried in auxiliary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PoolTransactionKind {
    Noop = 0,
    Join = 1,
    Exit = 2,
}

impl PoolTransactionKind {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Noop),
            1 => Some(Self::Join),
            2 => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Decoded intent payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolData {
    pub owner: Address,
    /// `fromLayer2` for joins, `toLayer2` for exits
    pub layer2: bool,
    pub shares: U256,
    pub amounts: Vec<U256>,
}

fn pool_data_type() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::Address,
        ParamType::Bool,
        ParamType::Uint(256),
        ParamType::Array(Box::new(ParamType::Uint(256))),
    ])
}

fn auxiliary_data_type() -> ParamType {
    ParamType::Array(Box::new(ParamType::Tuple(vec![
        ParamType::Uint(256),
        ParamType::Bytes,
        ParamType::Bytes,
    ])))
}

impl PoolData {
    pub fn encode(&self) -> Vec<u8> {
        ethabi::encode(&[Token::Tuple(vec![
            Token::Address(self.owner),
            Token::Bool(self.layer2),
            Token::Uint(self.shares),
            Token::Array(self.amounts.iter().copied().map(Token::Uint).collect()),
        ])])
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PoolError> {
        let mut tokens = ethabi::decode(&[pool_data_type()], bytes).map_err(|e| PoolError::Decode(e.to_string()))?;
        match tokens.pop() {
            Some(Token::Tuple(fields)) => match fields.as_slice() {
                [Token::Address(owner), Token::Bool(layer2), Token::Uint(shares), Token::Array(amounts)] => {
                    let amounts = amounts
                        .iter()
                        .map(|t| t.clone().into_uint().ok_or_else(|| PoolError::Decode("amount".to_string())))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(PoolData {
                        owner: *owner,
                        layer2: *layer2,
                        shares: *shares,
                        amounts,
                    })
                }
                _ => Err(PoolError::Decode("unexpected tuple layout".to_string())),
            },
            _ => Err(PoolError::Decode("expected tuple".to_string())),
        }
    }
}

/// Settled, wire-ready pool transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTransaction {
    pub kind: PoolTransactionKind,
    pub data: Vec<u8>,
    /// Empty for pre-approved intents
    pub signature: Vec<u8>,
}

/// Ordered batch handed to the settlement dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryData {
    pub transactions: Vec<PoolTransaction>,
}

impl AuxiliaryData {
    pub fn new(transactions: Vec<PoolTransaction>) -> Self {
        Self { transactions }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn encode(&self) -> Vec<u8> {
        let entries = self
            .transactions
            .iter()
            .map(|tx| {
                Token::Tuple(vec![
                    Token::Uint(U256::from(tx.kind.tag())),
                    Token::Bytes(tx.data.clone()),
                    Token::Bytes(tx.signature.clone()),
                ])
            })
            .collect();
        ethabi::encode(&[Token::Array(entries)])
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PoolError> {
        let mut tokens =
            ethabi::decode(&[auxiliary_data_type()], bytes).map_err(|e| PoolError::Decode(e.to_string()))?;
        let entries = match tokens.pop() {
            Some(Token::Array(entries)) => entries,
            _ => return Err(PoolError::Decode("expected array".to_string())),
        };

        let mut transactions = Vec::with_capacity(entries.len());
        for entry in entries {
            let fields = entry
                .into_tuple()
                .ok_or_else(|| PoolError::Decode("expected tuple".to_string()))?;
            match fields.as_slice() {
                [Token::Uint(kind), Token::Bytes(data), Token::Bytes(signature)] => {
                    let tag = if *kind <= U256::from(u8::MAX) {
                        PoolTransactionKind::from_tag(kind.low_u32() as u8)
                    } else {
                        None
                    };
                    let kind = tag.ok_or_else(|| PoolError::Decode(format!("unknown kind {}", kind)))?;
                    transactions.push(PoolTransaction {
                        kind,
                        data: data.clone(),
                        signature: signature.clone(),
                    });
                }
                _ => return Err(PoolError::Decode("unexpected tuple layout".to_string())),
            }
        }
        Ok(Self { transactions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PoolData {
        PoolData {
            owner: Address::repeat_byte(0x42),
            layer2: true,
            shares: U256::from(100u64) * U256::exp10(18),
            amounts: vec![U256::from(10_000u64) * U256::exp10(18), U256::from(20_000u64) * U256::exp10(18)],
        }
    }

    #[test]
    fn test_pool_data_layout() {
        let bytes = sample().encode();
        // offset, owner, flag, shares, array offset, length, two amounts
        assert_eq!(bytes.len(), 32 * 8);
        assert_eq!(U256::from_big_endian(&bytes[..32]), U256::from(32u64));
        assert_eq!(&bytes[32 + 12..64], Address::repeat_byte(0x42).as_bytes());
        assert_eq!(bytes[95], 1);
        assert_eq!(U256::from_big_endian(&bytes[96..128]), sample().shares);
        assert_eq!(U256::from_big_endian(&bytes[160..192]), U256::from(2u64));
    }

    #[test]
    fn test_pool_data_decodes() {
        assert_eq!(PoolData::decode(&sample().encode()).unwrap(), sample());
        assert!(PoolData::decode(&[0u8; 7]).is_err());
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(PoolTransactionKind::Noop.tag(), 0);
        assert_eq!(PoolTransactionKind::Join.tag(), 1);
        assert_eq!(PoolTransactionKind::Exit.tag(), 2);
        assert_eq!(PoolTransactionKind::from_tag(3), None);
    }

    #[test]
    fn test_auxiliary_data_preserves_order_and_empty_signatures() {
        let batch = AuxiliaryData::new(vec![
            PoolTransaction {
                kind: PoolTransactionKind::Join,
                data: sample().encode(),
                signature: vec![1, 2, 3],
            },
            PoolTransaction {
                kind: PoolTransactionKind::Exit,
                data: sample().encode(),
                signature: Vec::new(),
            },
        ]);
        let decoded = AuxiliaryData::decode(&batch.encode()).unwrap();
        assert_eq!(decoded, batch);
        assert_eq!(decoded.transactions[1].signature, Vec::<u8>::new());
    }

    #[test]
    fn test_empty_batch() {
        let bytes = AuxiliaryData::default().encode();
        // offset word + zero length
        assert_eq!(bytes.len(), 64);
        assert!(AuxiliaryData::decode(&bytes).unwrap().is_empty());
    }
}
