//! EdDSA over Baby Jubjub with a Poseidon challenge
//!
//! - Public key: `A = sk · B8`
//! - Nonce: `r = SHA-512(sk_le ‖ msg_le) mod l`, `R = r · B8`
//! - Challenge: `h = Poseidon(6, 6, 52)(R.x, R.y, A.x, A.y, msg)`
//! - Response: `S = r + h · sk mod l`
//!
//! Verification accepts iff `R` and `A` are on the curve, `S < l` and
//! `S · B8 == R + h · A`.

use std::fmt;

use num_bigint::BigUint;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::sync::Arc;

use crate::babyjub::{base8, sub_order, Point};
use crate::field::FieldElement;
use crate::poseidon::{HashParams, Poseidon, PoseidonError};

/// Challenge hash parameters.
pub const CHALLENGE_PARAMS: HashParams = HashParams::new(6, 6, 52);

static CHALLENGE_HASHER: Lazy<Result<Arc<Poseidon>, PoseidonError>> =
    Lazy::new(|| crate::poseidon::hasher(CHALLENGE_PARAMS));

fn challenge(r: &Point, a: &Point, msg: &FieldElement) -> Result<FieldElement, PoseidonError> {
    let hasher = CHALLENGE_HASHER.as_ref().map_err(Clone::clone)?;
    hasher.hash(&[r.x.clone(), r.y.clone(), a.x.clone(), a.y.clone(), msg.clone()])
}

/// `(R, S)` signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub rx: FieldElement,
    pub ry: FieldElement,
    pub s: FieldElement,
}

impl Signature {
    pub fn r(&self) -> Point {
        Point::new(self.rx.clone(), self.ry.clone())
    }

    /// `Rx ‖ Ry ‖ S`, each 32 bytes big-endian.
    pub fn to_bytes(&self) -> [u8; 96] {
        let mut out = [0u8; 96];
        out[..32].copy_from_slice(&self.rx.to_be_bytes());
        out[32..64].copy_from_slice(&self.ry.to_be_bytes());
        out[64..].copy_from_slice(&self.s.to_be_bytes());
        out
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

/// Secret scalar and its public point.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    secret: FieldElement,
    public: Point,
}

impl KeyPair {
    /// Derive from a secret scalar; the scalar is reduced modulo the
    /// subgroup order.
    pub fn from_secret(secret: &BigUint) -> Self {
        let scalar = secret % sub_order();
        let public = base8().mul_scalar(&scalar);
        Self {
            secret: FieldElement::reduce(&scalar),
            public,
        }
    }

    /// Deterministic key pair from arbitrary seed material (for example a
    /// wallet address concatenated with a password).
    pub fn from_seed(seed: &[u8]) -> Self {
        let digest = Sha256::digest(seed);
        Self::from_secret(&BigUint::from_bytes_be(&digest))
    }

    pub fn public_key(&self) -> &Point {
        &self.public
    }

    pub fn secret_key(&self) -> &FieldElement {
        &self.secret
    }

    pub fn sign(&self, msg: &FieldElement) -> Result<Signature, PoseidonError> {
        sign(&self.secret, &self.public, msg)
    }

    pub fn verify(&self, msg: &FieldElement, signature: &Signature) -> bool {
        verify(msg, signature, &self.public)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("secret", &"<redacted>")
            .finish()
    }
}

fn sign(secret: &FieldElement, public: &Point, msg: &FieldElement) -> Result<Signature, PoseidonError> {
    let l = sub_order();
    let sk = secret.as_biguint();

    let mut hasher = Sha512::new();
    hasher.update(secret.to_le_bytes());
    hasher.update(msg.to_le_bytes());
    let r = BigUint::from_bytes_le(&hasher.finalize()) % l;

    let r_point = base8().mul_scalar(&r);
    let h = challenge(&r_point, public, msg)?;
    let s = (r + h.as_biguint() * sk) % l;

    Ok(Signature {
        rx: r_point.x,
        ry: r_point.y,
        s: FieldElement::reduce(&s),
    })
}

/// Check `signature` over `msg` against `public`.
pub fn verify(msg: &FieldElement, signature: &Signature, public: &Point) -> bool {
    let r = signature.r();
    if !r.is_on_curve() || !public.is_on_curve() {
        return false;
    }
    if signature.s.as_biguint() >= sub_order() {
        return false;
    }
    let h = match challenge(&r, public, msg) {
        Ok(h) => h,
        Err(_) => return false,
    };

    let lhs = base8().checked_mul_scalar(signature.s.as_biguint());
    let rhs = public
        .checked_mul_scalar(h.as_biguint())
        .and_then(|ha| r.checked_add(&ha));
    matches!((lhs, rhs), (Some(lhs), Some(rhs)) if lhs == rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> KeyPair {
        KeyPair::from_seed(b"0x7d1f1c6e1f8bd6d9ed4e0aef0de83f1f3d86b845secret")
    }

    #[test]
    fn test_public_key_on_curve() {
        assert!(key().public_key().is_on_curve());
    }

    #[test]
    fn test_from_seed_deterministic() {
        assert_eq!(key(), key());
        assert_ne!(key(), KeyPair::from_seed(b"other"));
    }

    #[test]
    fn test_sign_verify() {
        let kp = key();
        let msg = FieldElement::from_u64(1_234_567);
        let sig = kp.sign(&msg).unwrap();
        assert!(kp.verify(&msg, &sig));
    }

    fn dec(s: &str) -> FieldElement {
        s.parse().unwrap()
    }

    #[test]
    fn test_known_answer_signature() {
        let kp = KeyPair::from_seed(b"kat-seed");
        assert_eq!(
            kp.secret_key(),
            &dec("699757529315631794646819001093152536845117340131403077531081547377125910119")
        );
        assert_eq!(
            kp.public_key(),
            &Point::new(
                dec("13442056364078955956681119832807922364719233710830039999223437056852158120715"),
                dec("12151218237883988570762576822880467063300075205554899832129977946886975523675"),
            )
        );

        let msg = dec("18034868597434240293665220970421168445584131937984445797953356852217236273181");
        let sig = kp.sign(&msg).unwrap();
        assert_eq!(
            sig,
            Signature {
                rx: dec("21698905425402034901299649559825497164014300078139103674600424350743260351508"),
                ry: dec("4742575363241586869512333007069732725691538590051296953446174094442780190481"),
                s: dec("300716379165062691455619544528290950176216083812990707171140298502941221345"),
            }
        );
        assert!(kp.verify(&msg, &sig));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let kp = key();
        let msg = FieldElement::from_u64(42);
        assert_eq!(kp.sign(&msg).unwrap(), kp.sign(&msg).unwrap());
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = key();
        let sig = kp.sign(&FieldElement::from_u64(1)).unwrap();
        assert!(!kp.verify(&FieldElement::from_u64(2), &sig));
    }

    #[test]
    fn test_wrong_key_fails() {
        let msg = FieldElement::from_u64(9);
        let sig = key().sign(&msg).unwrap();
        let other = KeyPair::from_seed(b"other");
        assert!(!verify(&msg, &sig, other.public_key()));
    }

    #[test]
    fn test_tampered_s_fails() {
        let kp = key();
        let msg = FieldElement::from_u64(9);
        let mut sig = kp.sign(&msg).unwrap();
        sig.s = &sig.s + &FieldElement::one();
        assert!(!kp.verify(&msg, &sig));
    }

    #[test]
    fn test_non_canonical_s_rejected() {
        let kp = key();
        let msg = FieldElement::from_u64(9);
        let mut sig = kp.sign(&msg).unwrap();
        // S + l signs the same point but must be refused
        sig.s = FieldElement::reduce(&(sig.s.as_biguint() + sub_order()));
        assert!(!kp.verify(&msg, &sig));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let kp = key();
        let rendered = format!("{:?}", kp);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&kp.secret_key().to_string()));
    }

    #[test]
    fn test_signature_bytes_layout() {
        let kp = key();
        let sig = kp.sign(&FieldElement::from_u64(5)).unwrap();
        let bytes = sig.to_bytes();
        assert_eq!(&bytes[64..], &sig.s.to_be_bytes());
        assert_eq!(sig.to_hex().len(), 2 + 192);
    }
}
