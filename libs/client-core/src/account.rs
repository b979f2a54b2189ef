//! Layer-2 account key material
//!
//! An `Account` is loaded by the caller and borrowed read-only for each
//! signing call. It deliberately has no `Serialize` impl and its `Debug`
//! output redacts the secret key.

use std::fmt;

use types::ids::AccountId;

use crate::babyjub::Point;
use crate::eddsa::KeyPair;
use crate::field::FieldElement;

#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: AccountId,
    key_pair: KeyPair,
    /// Exchange-side nonce, bound into withdrawal and cancel commitments
    pub nonce: u32,
}

impl Account {
    pub fn new(account_id: AccountId, key_pair: KeyPair, nonce: u32) -> Self {
        Self {
            account_id,
            key_pair,
            nonce,
        }
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn public_key(&self) -> &Point {
        self.key_pair.public_key()
    }

    pub fn public_key_x(&self) -> &FieldElement {
        &self.key_pair.public_key().x
    }

    pub fn public_key_y(&self) -> &FieldElement {
        &self.key_pair.public_key().y
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("account_id", &self.account_id)
            .field("public_key_x", self.public_key_x())
            .field("public_key_y", self.public_key_y())
            .field("secret_key", &"<redacted>")
            .field("nonce", &self.nonce)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let kp = KeyPair::from_seed(b"account");
        let secret = kp.secret_key().to_string();
        let account = Account::new(AccountId::new(11), kp, 3);
        let rendered = format!("{:?}", account);
        assert!(rendered.contains("secret_key: \"<redacted>\""));
        assert!(!rendered.contains(&secret));
        assert!(rendered.contains("nonce: 3"));
    }

    #[test]
    fn test_public_key_accessors() {
        let kp = KeyPair::from_seed(b"account");
        let account = Account::new(AccountId::new(11), kp.clone(), 0);
        assert_eq!(account.public_key_x(), &kp.public_key().x);
        assert_eq!(account.public_key_y(), &kp.public_key().y);
    }
}
