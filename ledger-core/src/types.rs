//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic hashing (fields fed to SHA-256 in a fixed order)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for money)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Monetary value of an output.
///
/// Signed on purpose: a declared negative value must be representable so the
/// validator can reject it.
pub type Amount = Decimal;

/// SHA-256 content identifier of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Create from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Owner of an output: the Ed25519 public key that must sign to spend it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Address {
    /// Create from public key bytes
    pub const fn new(public_key: [u8; 32]) -> Self {
        Self(public_key)
    }

    /// Get public key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Reference to a specific output of a transaction (the UTXO key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    /// Hash of the transaction that created the output
    pub tx_hash: TxHash,
    /// Position of the output in that transaction, first one is 0
    pub output_index: u32,
}

impl OutPoint {
    /// Create a new OutPoint
    pub const fn new(tx_hash: TxHash, output_index: u32) -> Self {
        Self {
            tx_hash,
            output_index,
        }
    }

    fn hash_into(&self, hasher: &mut Sha256) {
        hasher.update(self.tx_hash.as_bytes());
        hasher.update(self.output_index.to_be_bytes());
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.output_index)
    }
}

/// A claimable amount locked to an owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Owner public key
    pub address: Address,
    /// Value held by the output
    pub value: Amount,
}

impl Output {
    /// Create a new output
    pub fn new(address: Address, value: Amount) -> Self {
        Self { address, value }
    }

    fn hash_into(&self, hasher: &mut Sha256) {
        // Normalized so that 1.0 and 1.00 hash identically
        hasher.update(self.value.normalize().serialize());
        hasher.update(self.address.as_bytes());
    }
}

/// Digital signature bytes (64 bytes for Ed25519)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
}

impl Signature {
    /// Create from bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Convert into an Ed25519 signature, failing on a wrong length
    pub fn to_ed25519(&self) -> crate::Result<ed25519_dalek::Signature> {
        ed25519_dalek::Signature::from_slice(&self.bytes)
            .map_err(|e| crate::Error::SignatureError(e.to_string()))
    }
}

/// Claim on an existing output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    /// Hash of the transaction holding the claimed output
    pub prev_tx_hash: TxHash,
    /// Index of the claimed output in that transaction
    pub output_index: u32,
    /// Signature over this input's signing payload
    #[serde(default)]
    pub signature: Option<Signature>,
}

impl Input {
    /// Create an unsigned input
    pub fn new(prev_tx_hash: TxHash, output_index: u32) -> Self {
        Self {
            prev_tx_hash,
            output_index,
            signature: None,
        }
    }

    /// Outpoint claimed by this input
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.prev_tx_hash, self.output_index)
    }
}

/// Value transfer: ordered claims in, ordered outputs out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Claimed outputs, in order
    pub inputs: Vec<Input>,
    /// Created outputs, in order
    pub outputs: Vec<Output>,
}

impl Transaction {
    /// Create an empty transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unsigned input claiming `(prev_tx_hash, output_index)`
    pub fn add_input(&mut self, prev_tx_hash: TxHash, output_index: u32) -> &mut Self {
        self.inputs.push(Input::new(prev_tx_hash, output_index));
        self
    }

    /// Append an output paying `value` to `address`
    pub fn add_output(&mut self, address: Address, value: Amount) -> &mut Self {
        self.outputs.push(Output::new(address, value));
        self
    }

    /// Remove the input at `index`, returning it
    pub fn remove_input(&mut self, index: usize) -> crate::Result<Input> {
        if index >= self.inputs.len() {
            return Err(crate::Error::InputIndex(index));
        }
        Ok(self.inputs.remove(index))
    }

    /// Attach a signature to the input at `index`
    pub fn add_signature(&mut self, index: usize, signature: Signature) -> crate::Result<()> {
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(crate::Error::InputIndex(index))?;
        input.signature = Some(signature);
        Ok(())
    }

    /// Canonical message the owner of input `index` signs.
    ///
    /// Covers the claimed outpoint of that input and every output, so a
    /// signature cannot be replayed onto another input or onto different
    /// outputs. Signatures themselves are excluded.
    pub fn signing_payload(&self, index: usize) -> Option<Vec<u8>> {
        let input = self.inputs.get(index)?;

        let mut payload = Vec::with_capacity(36 + self.outputs.len() * 48);
        payload.extend_from_slice(input.prev_tx_hash.as_bytes());
        payload.extend_from_slice(&input.output_index.to_be_bytes());
        for output in &self.outputs {
            payload.extend_from_slice(&output.value.normalize().serialize());
            payload.extend_from_slice(output.address.as_bytes());
        }
        Some(payload)
    }

    /// Compute the transaction hash over all inputs (with signatures) and outputs
    pub fn hash(&self) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update((self.inputs.len() as u64).to_be_bytes());
        for input in &self.inputs {
            input.outpoint().hash_into(&mut hasher);
            match &input.signature {
                Some(signature) => {
                    hasher.update([1u8]);
                    hasher.update((signature.as_bytes().len() as u64).to_be_bytes());
                    hasher.update(signature.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        hasher.update((self.outputs.len() as u64).to_be_bytes());
        for output in &self.outputs {
            output.hash_into(&mut hasher);
        }
        TxHash(hasher.finalize().into())
    }

    /// Sum of declared output values, `None` on overflow
    pub fn total_output_value(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .try_fold(Decimal::ZERO, |acc, output| acc.checked_add(output.value))
    }
}
