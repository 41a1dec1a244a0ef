use crate::{Amount, TransactionId, UtxoRef};
use thiserror::Error;

/// Why a candidate transaction was not accepted.
/// Rejections are local to the candidate, they never abort the rest of the batch.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum RejectReason {
    /// The referenced output is neither in the ledger nor produced by an accepted transaction
    /// of the same batch.
    #[error("input {index} references missing output {utxo}")]
    MissingInput { index: usize, utxo: UtxoRef },

    #[error("signature of input {index} does not verify against the owner of {utxo}")]
    InvalidSignature { index: usize, utxo: UtxoRef },

    /// The same output is claimed more than once by one transaction.
    #[error("output {utxo} is claimed more than once")]
    InternalDoubleSpend { utxo: UtxoRef },

    #[error("output {index} has negative value {value}")]
    NegativeOutput { index: usize, value: Amount },

    #[error("inputs sum to {inputs} which is less than outputs sum {outputs}")]
    InsufficientInput { inputs: Amount, outputs: Amount },

    #[error("input or output values overflow")]
    ValueOverflow,

    /// The transaction is valid but pays no fee, so it is never committed.
    #[error("transaction pays no fee")]
    ZeroFee,

    /// A conflicting transaction spending the same output was chosen instead.
    #[error("output {utxo} is spent by accepted transaction {winner}")]
    BatchConflict {
        utxo: UtxoRef,
        winner: TransactionId,
    },

    /// The transaction consumes outputs of a dependency cycle within the batch.
    #[error("dependency cycle within the batch")]
    CyclicDependency,

    /// The same transaction was submitted earlier in the batch. Only the first copy is
    /// considered.
    #[error("transaction already appears at position {first} of the batch")]
    DuplicateCandidate { first: usize },
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum LedgerError {
    #[error("output {0} already exists with a different value")]
    ConflictingOutput(UtxoRef),
}

/// Errors that reject the whole batch. The ledger passed to the commit is never modified.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum CommitError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("failed to encode transaction: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("input index {index} is out of range for {len} inputs")]
    InputOutOfRange { index: usize, len: usize },
}
