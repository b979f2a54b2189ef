//! Signing Module — request commitments and EdDSA signatures
//!
//! Every canonical request is committed to by a Poseidon hash over a fixed,
//! kind-specific vector of integers. The hash is signed with the account's
//! Baby Jubjub key and the signature is verified again before the request
//! is handed back. Signing a request that already carries a commitment
//! returns it unchanged.

use tracing::{debug, error};

use num_bigint::BigUint;
use types::config::ExchangeConfig;
use types::errors::RequestError;
use types::ids::ExchangeId;

use crate::eddsa::{self, KeyPair, Signature};
use crate::field::{FieldElement, FieldError};
use crate::poseidon::{self, PoseidonError};
use crate::request::{CanonicalRequest, Commitment, RequestKind};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Commitment input out of range: {0}")]
    Field(#[from] FieldError),

    #[error("Commitment hash failed: {0}")]
    Hash(#[from] PoseidonError),

    /// Fatal: a freshly produced signature did not verify. Never retried.
    #[error("Signature verification failed for {kind} request")]
    SignatureVerificationFailed { kind: &'static str },
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateless signer bound to one exchange deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureEngine {
    exchange_id: ExchangeId,
}

impl SignatureEngine {
    pub fn new(config: &ExchangeConfig) -> Self {
        Self::with_exchange_id(config.exchange_id)
    }

    pub fn with_exchange_id(exchange_id: ExchangeId) -> Self {
        Self { exchange_id }
    }

    pub fn exchange_id(&self) -> ExchangeId {
        self.exchange_id
    }

    /// Ordered commitment inputs for a request.
    pub fn commitment_inputs(&self, request: &CanonicalRequest) -> Result<Vec<FieldElement>, SigningError> {
        let exchange = FieldElement::from_u64(u64::from(self.exchange_id.value()));
        let account = &request.account;
        let account_id = FieldElement::from_u64(u64::from(account.account_id.value()));
        let label = FieldElement::from_u64(u64::from(request.label));
        let nonce = FieldElement::from_u64(u64::from(account.nonce));

        let inputs = match &request.kind {
            RequestKind::Withdrawal(w) => vec![
                exchange,
                account_id,
                token(w.token.value()),
                amount(&w.amount)?,
                token(w.fee_token.value()),
                amount(&w.fee)?,
                label,
                nonce,
            ],
            RequestKind::Order(o) => vec![
                exchange,
                FieldElement::from_u64(u64::from(o.order_id.value())),
                account_id,
                token(o.token_s.value()),
                token(o.token_b.value()),
                amount(&o.amount_s)?,
                amount(&o.amount_b)?,
                FieldElement::from(o.all_or_none),
                FieldElement::from_u64(u64::from(o.valid_since)),
                FieldElement::from_u64(u64::from(o.valid_until)),
                FieldElement::from_u64(u64::from(o.max_fee_bips)),
                FieldElement::from(o.buy),
                label,
            ],
            RequestKind::Cancel(c) => vec![
                exchange,
                account_id,
                token(c.order_token.value()),
                FieldElement::from_u64(u64::from(c.order_id.value())),
                token(c.fee_token.value()),
                amount(&c.fee)?,
                label,
                nonce,
            ],
            RequestKind::ApiKeyQuery => vec![
                account_id,
                account.public_key_x().clone(),
                account.public_key_y().clone(),
            ],
            RequestKind::OrderIdQuery { token_s } => vec![account_id, token(token_s.value())],
            RequestKind::OrderDetailQuery { order_hash } => vec![account_id, order_hash.clone()],
            RequestKind::NonceQuery
            | RequestKind::OrdersQuery
            | RequestKind::BalanceQuery
            | RequestKind::TransactionsQuery
            | RequestKind::UserActionsQuery
            | RequestKind::TradesQuery
            | RequestKind::FeeRateQuery => vec![account_id],
        };
        Ok(inputs)
    }

    /// Poseidon commitment of a request.
    pub fn commitment_hash(&self, request: &CanonicalRequest) -> Result<FieldElement, SigningError> {
        let inputs = self.commitment_inputs(request)?;
        let hasher = poseidon::hasher(request.kind.hash_params())?;
        Ok(hasher.hash(&inputs)?)
    }

    /// Attach a verified commitment. Already-signed requests pass through.
    pub fn sign(&self, request: CanonicalRequest) -> Result<CanonicalRequest, SigningError> {
        self.sign_with(request, |key, hash| key.sign(hash))
    }

    fn sign_with<F>(&self, request: CanonicalRequest, signer: F) -> Result<CanonicalRequest, SigningError>
    where
        F: Fn(&KeyPair, &FieldElement) -> Result<Signature, PoseidonError>,
    {
        if request.is_signed() {
            debug!(kind = request.kind.name(), "Request already signed, skipping");
            return Ok(request);
        }

        let kind = request.kind.name();
        let hash = self.commitment_hash(&request)?;
        let signature = signer(request.account.key_pair(), &hash)?;

        if !eddsa::verify(&hash, &signature, request.account.public_key()) {
            error!(
                kind,
                account_id = %request.account.account_id,
                hash = %hash,
                "Freshly produced signature failed verification"
            );
            return Err(SigningError::SignatureVerificationFailed { kind });
        }

        debug!(kind, account_id = %request.account.account_id, hash = %hash, "Request signed");
        Ok(request.with_commitment(Commitment { hash, signature }))
    }

    /// Recompute the commitment and check the attached signature.
    /// Unsigned requests do not verify.
    pub fn verify(&self, request: &CanonicalRequest) -> Result<bool, SigningError> {
        let Some(commitment) = request.commitment() else {
            return Ok(false);
        };
        let hash = self.commitment_hash(request)?;
        Ok(hash == commitment.hash
            && eddsa::verify(&hash, &commitment.signature, request.account.public_key()))
    }
}

fn token(id: u16) -> FieldElement {
    FieldElement::from_u64(u64::from(id))
}

fn amount(value: &BigUint) -> Result<FieldElement, FieldError> {
    FieldElement::new(value.clone())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::request::{Cancel, Order, Withdrawal};
    use types::ids::{AccountId, OrderId, TokenId};

    fn account() -> Account {
        Account::new(AccountId::new(5), KeyPair::from_seed(b"signing-tests"), 2)
    }

    fn engine() -> SignatureEngine {
        SignatureEngine::with_exchange_id(ExchangeId::new(1))
    }

    fn order() -> Order {
        Order {
            order_id: OrderId::new(7),
            token_s: TokenId::new(2),
            token_b: TokenId::new(3),
            amount_s: BigUint::from(1_000_000_000_000_000_000u64),
            amount_b: BigUint::from(3_000_000_000_000_000_000u64),
            buy: true,
            all_or_none: false,
            max_fee_bips: 20,
            fee_bips: 20,
            rebate_bips: 0,
            valid_since: 100,
            valid_until: 200,
        }
    }

    fn all_kinds() -> Vec<RequestKind> {
        vec![
            RequestKind::Order(order()),
            RequestKind::Withdrawal(Withdrawal {
                token: TokenId::new(2),
                amount: BigUint::from(10u32),
                fee_token: TokenId::new(1),
                fee: BigUint::from(1u32),
            }),
            RequestKind::Cancel(Cancel {
                order_token: TokenId::new(2),
                order_id: OrderId::new(7),
                fee_token: TokenId::new(1),
                fee: BigUint::from(1u32),
            }),
            RequestKind::ApiKeyQuery,
            RequestKind::NonceQuery,
            RequestKind::OrderIdQuery { token_s: TokenId::new(2) },
            RequestKind::OrderDetailQuery { order_hash: FieldElement::from_u64(99) },
            RequestKind::OrdersQuery,
            RequestKind::BalanceQuery,
            RequestKind::TransactionsQuery,
            RequestKind::UserActionsQuery,
            RequestKind::TradesQuery,
            RequestKind::FeeRateQuery,
        ]
    }

    #[test]
    fn test_every_kind_signs_and_verifies() {
        let engine = engine();
        for kind in all_kinds() {
            let signed = engine.sign(CanonicalRequest::new(account(), 0, kind)).unwrap();
            let commitment = signed.commitment().unwrap();
            assert!(eddsa::verify(&commitment.hash, &commitment.signature, account().public_key()));
            assert!(engine.verify(&signed).unwrap());
        }
    }

    #[test]
    fn test_input_vector_lengths_fit_width() {
        let engine = engine();
        for kind in all_kinds() {
            let t = kind.hash_params().t;
            let request = CanonicalRequest::new(account(), 0, kind);
            assert_eq!(engine.commitment_inputs(&request).unwrap().len(), t - 1);
        }
    }

    #[test]
    fn test_order_input_order() {
        let request = CanonicalRequest::new(account(), 9, RequestKind::Order(order()));
        let inputs = engine().commitment_inputs(&request).unwrap();
        let expected: Vec<FieldElement> = vec![
            FieldElement::from_u64(1),
            FieldElement::from_u64(7),
            FieldElement::from_u64(5),
            FieldElement::from_u64(2),
            FieldElement::from_u64(3),
            FieldElement::from_u64(1_000_000_000_000_000_000),
            FieldElement::from_u64(3_000_000_000_000_000_000),
            FieldElement::from_u64(0),
            FieldElement::from_u64(100),
            FieldElement::from_u64(200),
            FieldElement::from_u64(20),
            FieldElement::from_u64(1),
            FieldElement::from_u64(9),
        ];
        assert_eq!(inputs, expected);
    }

    #[test]
    fn test_commitment_known_answers() {
        let order = CanonicalRequest::new(account(), 9, RequestKind::Order(order()));
        assert_eq!(
            engine().commitment_hash(&order).unwrap().to_string(),
            "16529348780468775390225898763748779179851718676428116463136890172264247321714"
        );
        let nonce = CanonicalRequest::new(account(), 0, RequestKind::NonceQuery);
        assert_eq!(
            engine().commitment_hash(&nonce).unwrap().to_string(),
            "16591111067374623838189071107723335579340291238336525245082631395675014874169"
        );
    }

    #[test]
    fn test_withdrawal_binds_nonce() {
        let kind = RequestKind::Withdrawal(Withdrawal {
            token: TokenId::new(2),
            amount: BigUint::from(10u32),
            fee_token: TokenId::new(1),
            fee: BigUint::from(1u32),
        });
        let inputs = engine()
            .commitment_inputs(&CanonicalRequest::new(account(), 0, kind))
            .unwrap();
        assert_eq!(inputs.last(), Some(&FieldElement::from_u64(2)));
        assert_eq!(inputs[4], FieldElement::from_u64(1));
    }

    #[test]
    fn test_sign_is_idempotent() {
        let engine = engine();
        let once = engine
            .sign(CanonicalRequest::new(account(), 0, RequestKind::Order(order())))
            .unwrap();
        let twice = engine.sign(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_presigned_request_not_recomputed() {
        // a different engine would hash differently; the existing commitment must survive
        let signed = engine()
            .sign(CanonicalRequest::new(account(), 0, RequestKind::BalanceQuery))
            .unwrap();
        let other = SignatureEngine::with_exchange_id(ExchangeId::new(2));
        let again = other.sign(signed.clone()).unwrap();
        assert_eq!(again.commitment(), signed.commitment());
    }

    #[test]
    fn test_exchange_id_changes_commitment() {
        let request = CanonicalRequest::new(account(), 0, RequestKind::Order(order()));
        let a = engine().commitment_hash(&request).unwrap();
        let b = SignatureEngine::with_exchange_id(ExchangeId::new(2))
            .commitment_hash(&request)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_bad_signature_is_fatal() {
        let engine = engine();
        let request = CanonicalRequest::new(account(), 0, RequestKind::NonceQuery);
        let result = engine.sign_with(request, |key, hash| {
            let mut sig = key.sign(hash)?;
            sig.s = &sig.s + &FieldElement::one();
            Ok(sig)
        });
        assert_eq!(
            result,
            Err(SigningError::SignatureVerificationFailed { kind: "nonce_query" })
        );
    }

    #[test]
    fn test_unsigned_request_does_not_verify() {
        let request = CanonicalRequest::new(account(), 0, RequestKind::NonceQuery);
        assert!(!engine().verify(&request).unwrap());
    }

    #[test]
    fn test_out_of_field_amount_rejected() {
        let mut o = order();
        o.amount_s = crate::field::modulus().clone();
        let request = CanonicalRequest::new(account(), 0, RequestKind::Order(o));
        assert!(matches!(engine().sign(request), Err(SigningError::Field(_))));
    }
}
