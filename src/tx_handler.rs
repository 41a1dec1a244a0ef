use crate::{
    BatchCommitter, CommitError, CommitterConfig, SignatureVerifier, Transaction, UtxoPool,
};

/// A public ledger that processes one batch of proposed transactions per epoch.
///
/// The handler owns a copy of the pool it was created from, so commits never leak into the
/// caller's pool. Each epoch builds on the pool left by the previous one.
pub struct TxHandler<V> {
    committer: BatchCommitter<V>,
    pool: UtxoPool,
}

impl<V: SignatureVerifier> TxHandler<V> {
    pub fn new(pool: &UtxoPool, verifier: V, config: CommitterConfig) -> Self {
        Self {
            committer: BatchCommitter::new(verifier, config),
            pool: pool.snapshot(),
        }
    }

    /// Returns whether the transaction is valid against the current pool.
    pub fn is_valid_tx(&self, transaction: &Transaction) -> bool {
        self.committer.is_valid(&self.pool, transaction)
    }

    /// Commits a mutually valid subset of the proposed transactions, updates the pool and
    /// returns the accepted transactions in the order they were applied.
    /// On error the pool is left as it was.
    pub fn handle_txs(
        &mut self,
        possible_txs: &[Transaction],
    ) -> Result<Vec<Transaction>, CommitError> {
        let outcome = self.committer.commit(&self.pool, possible_txs)?;
        self.pool = outcome.ledger;
        Ok(outcome.accepted)
    }

    pub fn pool(&self) -> &UtxoPool {
        &self.pool
    }
}
