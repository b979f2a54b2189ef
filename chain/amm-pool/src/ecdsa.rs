//! ECDSA (secp256k1) signing for pool intents
//!
//! Signatures are serialized as `r ‖ s ‖ v ‖ type`, where `v ∈ {27, 28}`
//! and `type` is the signature-type byte (`EIP_712 = 2`). The signer of a
//! digest is the address `keccak256(uncompressed_pubkey[1..])[12..]`.

use std::fmt;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use types::ids::Address;

use crate::errors::PoolError;

/// Signature type byte for typed-data signatures.
pub const SIGNATURE_TYPE_EIP_712: u8 = 2;

/// `r ‖ s ‖ v ‖ type`
pub const SIGNATURE_LENGTH: usize = 66;

/// Layer-1 key held by a pool participant.
#[derive(Clone)]
pub struct EcdsaSigner {
    key: SigningKey,
    address: Address,
}

impl EcdsaSigner {
    pub fn from_bytes(secret: &[u8]) -> Result<Self, PoolError> {
        let key = SigningKey::from_slice(secret).map_err(|_| PoolError::InvalidKey)?;
        let address = address_of(key.verifying_key());
        Ok(Self { key, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte typed-data digest.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<Vec<u8>, PoolError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest)
            .map_err(|e| PoolError::MalformedSignature(e.to_string()))?;

        let mut out = Vec::with_capacity(SIGNATURE_LENGTH);
        out.extend_from_slice(&signature.to_bytes());
        out.push(27 + recovery_id.to_byte());
        out.push(SIGNATURE_TYPE_EIP_712);
        Ok(out)
    }
}

impl fmt::Debug for EcdsaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Recover the signing address of a typed-data signature.
pub fn recover_signer(digest: &[u8; 32], signature: &[u8]) -> Result<Address, PoolError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(PoolError::MalformedSignature(format!(
            "expected {} bytes, got {}",
            SIGNATURE_LENGTH,
            signature.len()
        )));
    }
    if signature[65] != SIGNATURE_TYPE_EIP_712 {
        return Err(PoolError::MalformedSignature(format!(
            "unsupported signature type {}",
            signature[65]
        )));
    }

    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| PoolError::MalformedSignature(e.to_string()))?;
    let recovery_id = signature[64]
        .checked_sub(27)
        .and_then(RecoveryId::from_byte)
        .ok_or_else(|| PoolError::MalformedSignature(format!("bad v {}", signature[64])))?;

    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|e| PoolError::MalformedSignature(e.to_string()))?;
    Ok(address_of(&key))
}

/// `true` iff `signature` over `digest` recovers to `owner`.
pub fn verify(digest: &[u8; 32], signature: &[u8], owner: Address) -> bool {
    matches!(recover_signer(digest, signature), Ok(signer) if signer == owner)
}

fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(byte: u8) -> EcdsaSigner {
        EcdsaSigner::from_bytes(&[byte; 32]).unwrap()
    }

    #[test]
    fn test_known_address() {
        // private key 0x...01 controls the well-known generator address
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let s = EcdsaSigner::from_bytes(&secret).unwrap();
        assert_eq!(
            format!("{:?}", s.address()),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_sign_and_recover() {
        let s = signer(7);
        let digest = [0xabu8; 32];
        let sig = s.sign_digest(&digest).unwrap();
        assert_eq!(sig.len(), SIGNATURE_LENGTH);
        assert_eq!(sig[65], SIGNATURE_TYPE_EIP_712);
        assert!(sig[64] == 27 || sig[64] == 28);
        assert_eq!(recover_signer(&digest, &sig).unwrap(), s.address());
        assert!(verify(&digest, &sig, s.address()));
    }

    #[test]
    fn test_wrong_owner_rejected() {
        let digest = [1u8; 32];
        let sig = signer(7).sign_digest(&digest).unwrap();
        assert!(!verify(&digest, &sig, signer(8).address()));
    }

    #[test]
    fn test_wrong_digest_rejected() {
        let s = signer(7);
        let sig = s.sign_digest(&[1u8; 32]).unwrap();
        assert!(!verify(&[2u8; 32], &sig, s.address()));
    }

    #[test]
    fn test_malformed_signatures() {
        let s = signer(7);
        let digest = [1u8; 32];
        let mut sig = s.sign_digest(&digest).unwrap();
        assert!(recover_signer(&digest, &sig[..65]).is_err());

        sig[65] = 0;
        assert!(matches!(
            recover_signer(&digest, &sig),
            Err(PoolError::MalformedSignature(_))
        ));

        sig[65] = SIGNATURE_TYPE_EIP_712;
        sig[64] = 3;
        assert!(recover_signer(&digest, &sig).is_err());
    }

    #[test]
    fn test_zero_key_rejected() {
        assert!(matches!(
            EcdsaSigner::from_bytes(&[0u8; 32]),
            Err(PoolError::InvalidKey)
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", signer(7));
        assert!(rendered.starts_with("EcdsaSigner"));
        assert!(!rendered.contains("key"));
    }
}
