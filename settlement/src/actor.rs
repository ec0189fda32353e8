//! Actor-based serialization of epochs
//!
//! Settlement reads and mutates the pool incrementally, so two epochs must
//! never interleave. The pool lives inside one task that handles messages one
//! at a time; every caller talks to it through a cloneable handle.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            SettlementHandle (Clone)                   │
//! │         Sends messages to actor mailbox               │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │            SettlementActor (Single Task)              │
//! │   TxHandler: owns the pool, settles epochs in         │
//! │   mailbox order, each one to completion               │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::{handler::TxHandler, types::EpochReport, validation::Rejection, Error, Result};
use crate::validation::ValidatedTransaction;
use ledger_core::{OutPoint, Output, SignatureVerifier, Transaction, UtxoPool};
use tokio::sync::{mpsc, oneshot};

/// Message sent to the settlement actor
#[derive(Debug)]
pub enum SettlementMessage {
    /// Settle one batch of candidates
    SettleEpoch {
        candidates: Vec<Transaction>,
        response: oneshot::Sender<EpochReport>,
    },

    /// Check one transaction against the current pool without applying it
    CheckTransaction {
        transaction: Transaction,
        response: oneshot::Sender<std::result::Result<ValidatedTransaction, Rejection>>,
    },

    /// Look up an unspent output
    GetOutput {
        outpoint: OutPoint,
        response: oneshot::Sender<Option<Output>>,
    },

    /// Copy of the current pool
    PoolSnapshot {
        response: oneshot::Sender<UtxoPool>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the handler and its pool
#[derive(Debug)]
pub struct SettlementActor<V> {
    /// Handler holding the pool
    handler: TxHandler<V>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<SettlementMessage>,
}

impl<V: SignatureVerifier> SettlementActor<V> {
    /// Create new actor
    pub fn new(handler: TxHandler<V>, mailbox: mpsc::Receiver<SettlementMessage>) -> Self {
        Self { handler, mailbox }
    }

    /// Run the actor event loop until shutdown or until every handle is dropped
    pub async fn run(mut self) -> TxHandler<V> {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                SettlementMessage::Shutdown => break,
                msg => self.handle_message(msg),
            }
        }

        tracing::debug!(epochs = self.handler.epoch(), "Settlement actor stopped");
        self.handler
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: SettlementMessage) {
        // A dropped receiver means the caller gave up waiting; the work is done regardless
        let delivered = match msg {
            SettlementMessage::SettleEpoch {
                candidates,
                response,
            } => response.send(self.handler.settle_epoch(&candidates)).is_ok(),

            SettlementMessage::CheckTransaction {
                transaction,
                response,
            } => response.send(self.handler.check_tx(&transaction)).is_ok(),

            SettlementMessage::GetOutput { outpoint, response } => response
                .send(self.handler.pool().get(&outpoint).cloned())
                .is_ok(),

            SettlementMessage::PoolSnapshot { response } => {
                response.send(self.handler.pool().clone()).is_ok()
            }

            SettlementMessage::Shutdown => true,
        };

        if !delivered {
            tracing::warn!("Response channel closed before reply was sent");
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct SettlementHandle {
    sender: mpsc::Sender<SettlementMessage>,
}

impl SettlementHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<SettlementMessage>) -> Self {
        Self { sender }
    }

    /// Settle a batch; batches from concurrent callers are settled one after another
    pub async fn settle_epoch(&self, candidates: Vec<Transaction>) -> Result<EpochReport> {
        let (tx, rx) = oneshot::channel();
        self.send(SettlementMessage::SettleEpoch {
            candidates,
            response: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Check a transaction against the current pool
    pub async fn check_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<std::result::Result<ValidatedTransaction, Rejection>> {
        let (tx, rx) = oneshot::channel();
        self.send(SettlementMessage::CheckTransaction {
            transaction,
            response: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Look up an unspent output
    pub async fn get_output(&self, outpoint: OutPoint) -> Result<Option<Output>> {
        let (tx, rx) = oneshot::channel();
        self.send(SettlementMessage::GetOutput {
            outpoint,
            response: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Copy of the current pool
    pub async fn pool_snapshot(&self) -> Result<UtxoPool> {
        let (tx, rx) = oneshot::channel();
        self.send(SettlementMessage::PoolSnapshot { response: tx })
            .await?;
        Self::receive(rx).await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.send(SettlementMessage::Shutdown).await
    }

    async fn send(&self, msg: SettlementMessage) -> Result<()> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))
    }

    async fn receive<T>(rx: oneshot::Receiver<T>) -> Result<T> {
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }
}

/// Spawn the settlement actor.
///
/// The returned join handle yields the handler (and so the final pool) once
/// the actor stops.
pub fn spawn_settlement_actor<V>(
    handler: TxHandler<V>,
    mailbox_capacity: usize,
) -> (SettlementHandle, tokio::task::JoinHandle<TxHandler<V>>)
where
    V: SignatureVerifier + Send + 'static,
{
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = SettlementActor::new(handler, rx);

    let join = tokio::spawn(actor.run());

    (SettlementHandle::new(tx), join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::test_support::*;
    use ledger_core::{Ed25519Verifier, KeyPair};
    use rust_decimal::Decimal;

    fn coin(index: u32) -> OutPoint {
        OutPoint::new(genesis_hash(0xee), index)
    }

    fn pay(from: (OutPoint, &KeyPair), to: &KeyPair, value: i64) -> Transaction {
        signed_tx(&[from], &[(to.address(), Decimal::from(value))])
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let handler = TxHandler::new(&UtxoPool::new(), Ed25519Verifier);
        let (handle, join) = spawn_settlement_actor(handler, 8);

        handle.shutdown().await.unwrap();
        let handler = join.await.unwrap();
        assert_eq!(handler.epoch(), 0);
    }

    #[tokio::test]
    async fn test_actor_settle_epoch() {
        let alice = keypair(1);
        let bob = keypair(2);
        let handler = TxHandler::new(&funded_pool(&[(&alice, 10)]), Ed25519Verifier);
        let (handle, join) = spawn_settlement_actor(handler, 8);

        let tx = pay((coin(0), &alice), &bob, 10);
        let report = handle.settle_epoch(vec![tx.clone()]).await.unwrap();
        assert_eq!(report.accepted, vec![tx.clone()]);

        let output = handle
            .get_output(OutPoint::new(tx.hash(), 0))
            .await
            .unwrap();
        assert_eq!(output.map(|o| o.address), Some(bob.address()));
        assert!(handle.get_output(coin(0)).await.unwrap().is_none());

        handle.shutdown().await.unwrap();
        let pool = join.await.unwrap().into_pool();
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn test_actor_check_does_not_apply() {
        let alice = keypair(1);
        let bob = keypair(2);
        let handler = TxHandler::new(&funded_pool(&[(&alice, 10)]), Ed25519Verifier);
        let (handle, _join) = spawn_settlement_actor(handler, 8);

        let tx = pay((coin(0), &alice), &bob, 4);
        let validated = handle.check_transaction(tx).await.unwrap().unwrap();
        assert_eq!(validated.fee, Decimal::from(6));

        let snapshot = handle.pool_snapshot().await.unwrap();
        assert!(snapshot.contains(&coin(0)));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_epochs_are_serialized() {
        let alice = keypair(1);
        let bob = keypair(2);
        let carol = keypair(3);
        let handler = TxHandler::new(&funded_pool(&[(&alice, 10)]), Ed25519Verifier);
        let (handle, join) = spawn_settlement_actor(handler, 8);

        // Two callers race to spend the same output; exactly one wins
        let first = {
            let handle = handle.clone();
            let tx = pay((coin(0), &alice), &bob, 10);
            tokio::spawn(async move { handle.settle_epoch(vec![tx]).await })
        };
        let second = {
            let handle = handle.clone();
            let tx = pay((coin(0), &alice), &carol, 10);
            tokio::spawn(async move { handle.settle_epoch(vec![tx]).await })
        };

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(first.accepted_count() + second.accepted_count(), 1);
        assert_ne!(first.epoch, second.epoch);

        handle.shutdown().await.unwrap();
        let handler = join.await.unwrap();
        assert_eq!(handler.epoch(), 2);
        assert_eq!(handler.pool().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_mailbox_is_concurrency_error() {
        let handler = TxHandler::new(&UtxoPool::new(), Ed25519Verifier);
        let (handle, join) = spawn_settlement_actor(handler, 8);

        handle.shutdown().await.unwrap();
        join.await.unwrap();

        let result = handle.pool_snapshot().await;
        assert!(matches!(result, Err(Error::Concurrency(_))));
    }
}
