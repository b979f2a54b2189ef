//! Client Core — request signing layer
//!
//! Turns user intents into signed layer-2 requests:
//! - `field`, `poseidon`: BN254 scalar field and the Poseidon commitment hash
//! - `babyjub`, `eddsa`: Baby Jubjub curve and EdDSA with Poseidon challenges
//! - `account`: account key material (secret redacted, never serialized)
//! - `request`: raw intents and canonical request records
//! - `builder`: intent normalisation (token resolution, scaling, defaults)
//! - `signing`: commitment construction, signing and verification
//!
//! # Determinism
//! Hashing and signing are pure functions of their inputs: no system time,
//! no RNG. The signature nonce is derived from the key and message.

pub mod field;
pub mod poseidon;
pub mod babyjub;
pub mod eddsa;
pub mod account;
pub mod request;
pub mod builder;
pub mod signing;

pub use account::Account;
pub use builder::RequestBuilder;
pub use eddsa::{KeyPair, Signature};
pub use field::FieldElement;
pub use request::{CanonicalRequest, Commitment, RequestKind};
pub use signing::{SignatureEngine, SigningError};

/// Crate version constant
pub const CLIENT_CORE_VERSION: &str = "1.0.0";
