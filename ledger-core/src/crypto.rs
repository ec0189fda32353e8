//! Cryptographic operations for the ledger
//!
//! This module provides:
//! - The signature oracle used by transaction validation
//! - Ed25519 key pair generation and input signing

use crate::types::{Address, Signature, Transaction};
use crate::{Error, Result};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

/// Verifies that `signature` over `message` was produced by the owner of `address`.
///
/// Implementations must be pure. Malformed keys or signatures are a failed
/// verification, never an error.
pub trait SignatureVerifier {
    /// Returns true only for an authentic signature
    fn verify(&self, address: &Address, message: &[u8], signature: &Signature) -> bool;
}

impl<V: SignatureVerifier + ?Sized> SignatureVerifier for &V {
    fn verify(&self, address: &Address, message: &[u8], signature: &Signature) -> bool {
        (**self).verify(address, message, signature)
    }
}

/// Ed25519 signature oracle
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, address: &Address, message: &[u8], signature: &Signature) -> bool {
        verify_signature(message, signature, address)
    }
}

/// Ed25519 key pair for signing
#[derive(Debug)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_seed(&rand::random::<[u8; 32]>())
    }

    /// Create from seed (32 bytes) - deterministic generation
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Address that outputs owned by this key are locked to
    pub fn address(&self) -> Address {
        Address::new(self.verifying_key.to_bytes())
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_bytes(self.signing_key.sign(message).to_bytes().to_vec())
    }

    /// Sign the payload of input `index` of `tx`
    pub fn sign_input(&self, tx: &Transaction, index: usize) -> Result<Signature> {
        let payload = tx.signing_payload(index).ok_or(Error::InputIndex(index))?;
        Ok(self.sign(&payload))
    }
}

/// Verify a signature with an owner address
pub fn verify_signature(message: &[u8], signature: &Signature, address: &Address) -> bool {
    let signature = match signature.to_ed25519() {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    let verifying_key = match VerifyingKey::from_bytes(address.as_bytes()) {
        Ok(key) => key,
        Err(_) => return false,
    };

    verifying_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxHash;
    use rust_decimal::Decimal;

    #[test]
    fn test_keypair_from_seed() {
        let seed = [42u8; 32];
        let keypair1 = KeyPair::from_seed(&seed);
        let keypair2 = KeyPair::from_seed(&seed);

        // Same seed should produce same keys
        assert_eq!(keypair1.address(), keypair2.address());
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate();
        let message = b"test message";

        let signature = keypair.sign(message);
        assert!(Ed25519Verifier.verify(&keypair.address(), message, &signature));

        // Wrong message should fail
        assert!(!Ed25519Verifier.verify(&keypair.address(), b"wrong message", &signature));
    }

    #[test]
    fn test_wrong_address_fails() {
        let keypair = KeyPair::from_seed(&[1u8; 32]);
        let other = KeyPair::from_seed(&[2u8; 32]);
        let signature = keypair.sign(b"payload");

        assert!(!verify_signature(b"payload", &signature, &other.address()));
    }

    #[test]
    fn test_malformed_signature_fails() {
        let keypair = KeyPair::from_seed(&[1u8; 32]);
        let short = Signature::from_bytes(vec![0u8; 10]);

        assert!(!verify_signature(b"payload", &short, &keypair.address()));
    }

    #[test]
    fn test_sign_input() {
        let keypair = KeyPair::from_seed(&[3u8; 32]);
        let mut tx = Transaction::new();
        tx.add_input(TxHash::new([1u8; 32]), 0)
            .add_output(keypair.address(), Decimal::from(4));

        let signature = keypair.sign_input(&tx, 0).unwrap();
        let payload = tx.signing_payload(0).unwrap();
        assert!(Ed25519Verifier.verify(&keypair.address(), &payload, &signature));

        assert!(matches!(keypair.sign_input(&tx, 1), Err(Error::InputIndex(1))));
    }

    #[test]
    fn test_known_signature_vector() {
        // RFC 8032 test vector 1
        let seed = [
            0x9d, 0x61, 0xb1, 0x9d, 0xef, 0xfd, 0x5a, 0x60,
            0xba, 0x84, 0x4a, 0xf4, 0x92, 0xec, 0x2c, 0xc4,
            0x44, 0x49, 0xc5, 0x69, 0x7b, 0x32, 0x69, 0x19,
            0x70, 0x3b, 0xac, 0x03, 0x1c, 0xae, 0x7f, 0x60,
        ];

        let keypair = KeyPair::from_seed(&seed);
        assert_eq!(
            hex::encode(keypair.address().as_bytes()),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );

        let signature = keypair.sign(b"");
        assert!(verify_signature(b"", &signature, &keypair.address()));
    }
}
