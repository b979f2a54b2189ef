//! EIP-712 typed data for pool intents
//!
//! Digest = `keccak256(0x19 0x01 ‖ domainSeparator ‖ structHash)`.
//! Dynamic `uint256[]` members are hashed as the keccak of their
//! concatenated 32-byte words.

use ethabi::Token;
use sha3::{Digest, Keccak256};
use types::config::PoolConfig;
use types::ids::{Address, U256};

const DOMAIN_TYPE: &str = "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
const POOL_JOIN_TYPE: &str = "PoolJoin(address owner,bool fromLayer2,uint256 poolAmountOut,uint256[] maxAmountsIn)";
const POOL_EXIT_TYPE: &str = "PoolExit(address owner,bool toLayer2,uint256 poolAmountIn,uint256[] minAmountsOut)";

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Signing domain of one pool contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl PoolDomain {
    pub fn new(config: &PoolConfig, verifying_contract: Address) -> Self {
        Self {
            name: config.name.clone(),
            version: config.version.clone(),
            chain_id: config.chain_id,
            verifying_contract,
        }
    }

    pub fn separator(&self) -> [u8; 32] {
        let encoded = ethabi::encode(&[
            Token::FixedBytes(keccak256(DOMAIN_TYPE.as_bytes()).to_vec()),
            Token::FixedBytes(keccak256(self.name.as_bytes()).to_vec()),
            Token::FixedBytes(keccak256(self.version.as_bytes()).to_vec()),
            Token::Uint(U256::from(self.chain_id)),
            Token::Address(self.verifying_contract),
        ]);
        keccak256(&encoded)
    }

    /// Final digest for a struct hash under this domain.
    pub fn digest(&self, struct_hash: &[u8; 32]) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update([0x19, 0x01]);
        hasher.update(self.separator());
        hasher.update(struct_hash);
        hasher.finalize().into()
    }
}

fn hash_amounts(amounts: &[U256]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for amount in amounts {
        let mut word = [0u8; 32];
        amount.to_big_endian(&mut word);
        hasher.update(word);
    }
    hasher.finalize().into()
}

fn struct_hash(type_string: &str, owner: Address, flag: bool, shares: U256, amounts: &[U256]) -> [u8; 32] {
    let encoded = ethabi::encode(&[
        Token::FixedBytes(keccak256(type_string.as_bytes()).to_vec()),
        Token::Address(owner),
        Token::Bool(flag),
        Token::Uint(shares),
        Token::FixedBytes(hash_amounts(amounts).to_vec()),
    ]);
    keccak256(&encoded)
}

pub fn pool_join_hash(owner: Address, from_layer2: bool, pool_amount_out: U256, max_amounts_in: &[U256]) -> [u8; 32] {
    struct_hash(POOL_JOIN_TYPE, owner, from_layer2, pool_amount_out, max_amounts_in)
}

pub fn pool_exit_hash(owner: Address, to_layer2: bool, pool_amount_in: U256, min_amounts_out: &[U256]) -> [u8; 32] {
    struct_hash(POOL_EXIT_TYPE, owner, to_layer2, pool_amount_in, min_amounts_out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> PoolDomain {
        PoolDomain::new(&PoolConfig::default(), Address::repeat_byte(0xaa))
    }

    #[test]
    fn test_empty_keccak() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_empty_array_hash_is_empty_keccak() {
        assert_eq!(hash_amounts(&[]), keccak256(b""));
    }

    #[test]
    fn test_domain_binds_contract_and_chain() {
        let base = domain();
        let other_contract = PoolDomain {
            verifying_contract: Address::repeat_byte(0xbb),
            ..base.clone()
        };
        let other_chain = PoolDomain {
            chain_id: 5,
            ..base.clone()
        };
        assert_ne!(base.separator(), other_contract.separator());
        assert_ne!(base.separator(), other_chain.separator());
    }

    #[test]
    fn test_join_and_exit_types_differ() {
        let owner = Address::repeat_byte(1);
        let amounts = [U256::from(1u64), U256::from(2u64)];
        assert_ne!(
            pool_join_hash(owner, true, U256::from(10u64), &amounts),
            pool_exit_hash(owner, true, U256::from(10u64), &amounts)
        );
    }

    #[test]
    fn test_amount_order_matters() {
        let owner = Address::repeat_byte(1);
        let a = pool_join_hash(owner, false, U256::one(), &[U256::from(1u64), U256::from(2u64)]);
        let b = pool_join_hash(owner, false, U256::one(), &[U256::from(2u64), U256::from(1u64)]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_prefix() {
        let d = domain();
        let sh = [7u8; 32];
        let mut manual = vec![0x19, 0x01];
        manual.extend_from_slice(&d.separator());
        manual.extend_from_slice(&sh);
        assert_eq!(d.digest(&sh), keccak256(&manual));
    }
}
