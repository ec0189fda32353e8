//! Transaction validity predicate
//!
//! Decides whether a single transaction may be accepted against the pool as
//! it is right now. Read-only: nothing here mutates the pool, and other
//! candidates of the same batch are never consulted.
//!
//! # Rules
//!
//! 1. **Existence**: every claimed outpoint is in the pool
//! 2. **Authenticity**: every input carries a signature over its own signing
//!    payload that verifies against the claimed output's owner
//! 3. **No internal double-spend**: no outpoint is claimed twice
//! 4. **Non-negative outputs**: every declared value is >= 0
//! 5. **Conservation**: sum(claimed values) >= sum(declared values)
//!
//! Rules 1 and 2 are checked together input by input, then 3, 4 and 5. The
//! first failing rule is reported. Any surplus of inputs over outputs is an
//! implicit fee and is not re-created anywhere.
//!
//! Sums that leave the `Decimal` range never reject a transaction on their
//! own. Conservation is decided on a running balance that stays in range,
//! and the reported totals and fee saturate.

use ledger_core::{Amount, OutPoint, SignatureVerifier, Transaction, TxHash, UtxoPool};
use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;

/// Reason a transaction was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Claimed outpoint is absent from the pool (spent or never existed)
    #[error("input {input_index} claims unknown output {outpoint}")]
    MissingOutput {
        /// Position of the offending input
        input_index: usize,
        /// Outpoint that was claimed
        outpoint: OutPoint,
    },

    /// Input carries no signature
    #[error("input {input_index} is not signed")]
    MissingSignature {
        /// Position of the offending input
        input_index: usize,
    },

    /// Signature does not verify against the claimed output's owner
    #[error("input {input_index} has an invalid signature")]
    InvalidSignature {
        /// Position of the offending input
        input_index: usize,
    },

    /// Same outpoint claimed by more than one input of the transaction
    #[error("output {outpoint} is claimed more than once")]
    DuplicateClaim {
        /// Outpoint claimed twice
        outpoint: OutPoint,
    },

    /// Declared output value is negative
    #[error("output {output_index} has negative value {value}")]
    NegativeOutput {
        /// Position of the offending output
        output_index: usize,
        /// Declared value
        value: Amount,
    },

    /// Outputs are worth more than the claimed inputs
    #[error("outputs worth {outputs} exceed inputs worth {inputs}")]
    InsufficientFunds {
        /// Sum of claimed input values
        inputs: Amount,
        /// Sum of declared output values
        outputs: Amount,
    },
}

impl Rejection {
    /// Short stable label, used as a metrics dimension
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::MissingOutput { .. } => "missing_output",
            Rejection::MissingSignature { .. } => "missing_signature",
            Rejection::InvalidSignature { .. } => "invalid_signature",
            Rejection::DuplicateClaim { .. } => "duplicate_claim",
            Rejection::NegativeOutput { .. } => "negative_output",
            Rejection::InsufficientFunds { .. } => "insufficient_funds",
        }
    }
}

/// Summary of a transaction that passed every rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransaction {
    /// Transaction hash, the origin of its new outpoints
    pub hash: TxHash,
    /// Total value of the claimed outputs, saturating
    pub total_input: Amount,
    /// Total value of the declared outputs, saturating
    pub total_output: Amount,
    /// Implicit fee (`total_input - total_output`), saturating at `Decimal::MAX`
    pub fee: Amount,
}

/// Check `tx` against the current state of `pool`
pub fn check_transaction<V>(
    pool: &UtxoPool,
    verifier: &V,
    tx: &Transaction,
) -> Result<ValidatedTransaction, Rejection>
where
    V: SignatureVerifier + ?Sized,
{
    let mut claimed: HashSet<OutPoint> = HashSet::with_capacity(tx.inputs.len());
    let mut duplicate: Option<OutPoint> = None;
    let mut input_values = Vec::with_capacity(tx.inputs.len());

    for (input_index, input) in tx.inputs.iter().enumerate() {
        let outpoint = input.outpoint();

        let output = pool.get(&outpoint).ok_or(Rejection::MissingOutput {
            input_index,
            outpoint,
        })?;

        let signature = input
            .signature
            .as_ref()
            .ok_or(Rejection::MissingSignature { input_index })?;

        let authentic = tx
            .signing_payload(input_index)
            .map(|payload| verifier.verify(&output.address, &payload, signature))
            .unwrap_or(false);
        if !authentic {
            return Err(Rejection::InvalidSignature { input_index });
        }

        if !claimed.insert(outpoint) && duplicate.is_none() {
            duplicate = Some(outpoint);
        }

        input_values.push(output.value);
    }

    if let Some(outpoint) = duplicate {
        return Err(Rejection::DuplicateClaim { outpoint });
    }

    for (output_index, output) in tx.outputs.iter().enumerate() {
        if output.value < Decimal::ZERO {
            return Err(Rejection::NegativeOutput {
                output_index,
                value: output.value,
            });
        }
    }

    let output_values: Vec<Amount> = tx.outputs.iter().map(|output| output.value).collect();
    let total_input = saturating_sum(&input_values);
    let total_output = saturating_sum(&output_values);

    match surplus(&input_values, &output_values) {
        Some(fee) => Ok(ValidatedTransaction {
            hash: tx.hash(),
            total_input,
            total_output,
            fee,
        }),
        None => Err(Rejection::InsufficientFunds {
            inputs: total_input,
            outputs: total_output,
        }),
    }
}

fn saturating_sum(values: &[Amount]) -> Amount {
    values
        .iter()
        .fold(Decimal::ZERO, |total, value| total.saturating_add(*value))
}

/// `sum(inputs) - sum(outputs)` if it is non-negative, saturating at `Decimal::MAX`
///
/// Outputs are non-negative. Credits are added only while the balance is not
/// positive and debits taken only while it is, so every step stays in range.
/// An add that still overflows means the surplus exceeds `Decimal::MAX`, and a
/// subtract that overflows means the deficit can no longer be covered.
fn surplus(inputs: &[Amount], outputs: &[Amount]) -> Option<Amount> {
    let mut credits = inputs.iter().copied().filter(|value| *value > Decimal::ZERO);
    let mut debits = outputs
        .iter()
        .copied()
        .chain(inputs.iter().filter(|value| **value < Decimal::ZERO).map(|value| -*value));
    let mut balance = Decimal::ZERO;

    loop {
        if balance <= Decimal::ZERO {
            if let Some(credit) = credits.next() {
                balance = balance.checked_add(credit)?;
                continue;
            }
        }
        if let Some(debit) = debits.next() {
            balance = balance.checked_sub(debit)?;
            continue;
        }
        match credits.next() {
            Some(credit) => match balance.checked_add(credit) {
                Some(next) => balance = next,
                None => return Some(Decimal::MAX),
            },
            None => break,
        }
    }

    (balance >= Decimal::ZERO).then_some(balance)
}

/// Boolean form of [`check_transaction`]
pub fn is_valid_transaction<V>(pool: &UtxoPool, verifier: &V, tx: &Transaction) -> bool
where
    V: SignatureVerifier + ?Sized,
{
    check_transaction(pool, verifier, tx).is_ok()
}

#[cfg(test)]
pub(crate) mod test_support {
    use ledger_core::{Address, KeyPair, OutPoint, Output, Signature, Transaction, TxHash, UtxoPool};
    use rust_decimal::Decimal;

    /// Accepts every signature
    pub struct AcceptAll;

    impl ledger_core::SignatureVerifier for AcceptAll {
        fn verify(&self, _: &Address, _: &[u8], _: &Signature) -> bool {
            true
        }
    }

    /// Rejects every signature
    pub struct RejectAll;

    impl ledger_core::SignatureVerifier for RejectAll {
        fn verify(&self, _: &Address, _: &[u8], _: &Signature) -> bool {
            false
        }
    }

    pub fn keypair(seed: u8) -> KeyPair {
        KeyPair::from_seed(&[seed; 32])
    }

    pub fn genesis_hash(byte: u8) -> TxHash {
        TxHash::new([byte; 32])
    }

    /// Pool holding one output of `value` per owner at `(genesis_hash(0xee), i)`
    pub fn funded_pool(owners: &[(&KeyPair, i64)]) -> UtxoPool {
        owners
            .iter()
            .enumerate()
            .map(|(i, (owner, value))| {
                (
                    OutPoint::new(genesis_hash(0xee), i as u32),
                    Output::new(owner.address(), Decimal::from(*value)),
                )
            })
            .collect()
    }

    /// Build a transaction spending `inputs` (each signed by its owner) into `outputs`
    pub fn signed_tx(inputs: &[(OutPoint, &KeyPair)], outputs: &[(Address, Decimal)]) -> Transaction {
        let mut tx = Transaction::new();
        for (outpoint, _) in inputs {
            tx.add_input(outpoint.tx_hash, outpoint.output_index);
        }
        for (address, value) in outputs {
            tx.add_output(*address, *value);
        }
        for (index, (_, owner)) in inputs.iter().enumerate() {
            let signature = owner.sign_input(&tx, index).unwrap();
            tx.add_signature(index, signature).unwrap();
        }
        tx
    }
}
