use crate::{
    Amount, BatchGraph, CommitError, CommitterConfig, RejectReason, SelectionProblem,
    SelectionStrategy, SignatureVerifier, Transaction, TransactionId, TransactionValidator,
    UtxoPool,
};
use std::convert::TryFrom;
use tracing::{debug, info, trace, warn};

/// A candidate that was not accepted, and why.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Rejection {
    pub id: TransactionId,
    pub reason: RejectReason,
}

/// The result of committing one batch.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// Accepted transactions in the order they were applied.
    pub accepted: Vec<Transaction>,
    /// Rejected candidates in the order they were submitted.
    pub rejected: Vec<Rejection>,
    /// The ledger after applying the accepted transactions.
    pub ledger: UtxoPool,
    /// Saturates at `i64::MAX`.
    pub total_fee: Amount,
    pub strategy: SelectionStrategy,
}

/// Validates batches of transactions and commits the most profitable consistent subset.
///
/// The subset satisfies:
///   - every accepted transaction is valid against the ledger as it evolves, in acceptance
///     order, and pays a strictly positive fee,
///   - no two accepted transactions spend the same output,
///   - a transaction spending the output of another candidate is only accepted after it,
///   - the total fee is maximal when the batch is small enough to be solved exactly.
pub struct BatchCommitter<V> {
    verifier: V,
    config: CommitterConfig,
}

impl<V: SignatureVerifier> BatchCommitter<V> {
    pub fn new(verifier: V, config: CommitterConfig) -> Self {
        Self { verifier, config }
    }

    pub fn config(&self) -> &CommitterConfig {
        &self.config
    }

    /// Validates a single transaction against the ledger and returns its fee.
    pub fn validate(
        &self,
        ledger: &UtxoPool,
        transaction: &Transaction,
    ) -> Result<Amount, RejectReason> {
        TransactionValidator::validate(ledger, transaction, &self.verifier)
    }

    pub fn is_valid(&self, ledger: &UtxoPool, transaction: &Transaction) -> bool {
        self.validate(ledger, transaction).is_ok()
    }

    /// Commits the batch against a copy of the ledger.
    /// The given ledger is never modified, the new ledger is part of the outcome.
    pub fn commit(
        &self,
        ledger: &UtxoPool,
        candidates: &[Transaction],
    ) -> Result<CommitOutcome, CommitError> {
        let graph = BatchGraph::new(ledger, candidates);
        let (mut verdicts, fees) = self.classify(&graph);

        let eligible = verdicts.iter().map(Option::is_none).collect::<Vec<bool>>();
        let order = graph.priority_order(&eligible, &fees);
        let selection = Self::selection_problem(&graph, &order, &fees).solve(&self.config);
        if matches!(selection.strategy, SelectionStrategy::Exact { complete: false }) {
            warn!(
                candidates = order.len(),
                budget = self.config.search_budget,
                "Exact search ran out of budget, using the best subset found"
            );
        }

        // Chosen candidates are accepted. Every other eligible candidate is accepted too if
        // it still fits, otherwise it gets the reason why it doesn't.
        let mut accepted = vec![false; graph.len()];
        for (&position, &chosen) in order.iter().zip(&selection.chosen) {
            accepted[position] = chosen;
        }
        for &position in &order {
            if accepted[position] {
                continue;
            }
            match Self::blocker(&graph, &accepted, position) {
                Some(reason) => verdicts[position] = Some(reason),
                None => accepted[position] = true,
            }
        }

        let mut working = ledger.snapshot();
        let mut applied = vec![];
        let mut total_fee: i128 = 0;
        for &position in order.iter().filter(|&&position| accepted[position]) {
            let transaction = graph.transaction(position);
            // Re-validate against the evolving ledger before touching it.
            match TransactionValidator::validate(&working, transaction, &self.verifier) {
                Ok(fee) if fee.is_positive() => {
                    Self::apply(&mut working, transaction)?;
                    trace!(id = %transaction.id(), fee = %fee, "Applied transaction");
                    total_fee += fee.value() as i128;
                    applied.push(transaction.clone());
                }
                Ok(_) => verdicts[position] = Some(RejectReason::ZeroFee),
                Err(reason) => verdicts[position] = Some(reason),
            }
        }

        let rejected = verdicts
            .into_iter()
            .enumerate()
            .filter_map(|(position, verdict)| {
                verdict.map(|reason| Rejection {
                    id: *graph.transaction(position).id(),
                    reason,
                })
            })
            .collect::<Vec<Rejection>>();
        for rejection in &rejected {
            debug!(id = %rejection.id, reason = %rejection.reason, "Rejected transaction");
        }

        let total_fee = Amount::new(i64::try_from(total_fee).unwrap_or(i64::MAX));
        info!(
            candidates = candidates.len(),
            accepted = applied.len(),
            rejected = rejected.len(),
            total_fee = %total_fee,
            strategy = %selection.strategy,
            "Committed batch"
        );
        Ok(CommitOutcome {
            accepted: applied,
            rejected,
            ledger: working,
            total_fee,
            strategy: selection.strategy,
        })
    }

    // Decides which candidates are eligible for selection: first copy of their id, valid as if
    // all of their producers were accepted, paying a fee, not part of a dependency cycle, and
    // with all producers eligible. Returns the rejection reason of the others and the fee of
    // each candidate.
    fn classify(&self, graph: &BatchGraph) -> (Vec<Option<RejectReason>>, Vec<Amount>) {
        let mut verdicts = vec![None; graph.len()];
        let mut fees = vec![Amount::zero(); graph.len()];
        let cyclic = graph.cyclic();
        for position in 0..graph.len() {
            if let Some(first) = graph.duplicate_of(position) {
                verdicts[position] = Some(RejectReason::DuplicateCandidate { first });
                continue;
            }
            let transaction = graph.transaction(position);
            let validation = TransactionValidator::validate(graph, transaction, &self.verifier);
            verdicts[position] = match validation {
                Err(reason) => Some(reason),
                Ok(_) if cyclic[position] => Some(RejectReason::CyclicDependency),
                Ok(fee) if !fee.is_positive() => Some(RejectReason::ZeroFee),
                Ok(fee) => {
                    fees[position] = fee;
                    None
                }
            };
        }

        // Producers come first in this order, so rejections propagate down the chains.
        let acyclic = cyclic.iter().map(|cyclic| !cyclic).collect::<Vec<bool>>();
        for position in graph.priority_order(&acyclic, &fees) {
            if verdicts[position].is_some() {
                continue;
            }
            let rejected_producer = graph
                .producers(position)
                .iter()
                .copied()
                .find(|&producer| verdicts[producer].is_some());
            if let Some(producer) = rejected_producer {
                verdicts[position] = graph
                    .input_from(position, producer)
                    .map(|(index, utxo)| RejectReason::MissingInput { index, utxo });
            }
        }
        (verdicts, fees)
    }

    fn selection_problem(graph: &BatchGraph, order: &[usize], fees: &[Amount]) -> SelectionProblem {
        let mut rank = vec![None; graph.len()];
        for (index, &position) in order.iter().enumerate() {
            rank[position] = Some(index);
        }
        let ranked = |positions: &[usize]| {
            positions
                .iter()
                .filter_map(|&position| rank[position])
                .collect::<Vec<usize>>()
        };
        SelectionProblem::new(
            order.iter().map(|&position| fees[position]).collect(),
            order
                .iter()
                .map(|&position| ranked(graph.producers(position)))
                .collect(),
            order
                .iter()
                .map(|&position| ranked(&graph.conflicts(position)))
                .collect(),
        )
    }

    // Why an eligible candidate can't join the accepted ones, if it can't.
    fn blocker(graph: &BatchGraph, accepted: &[bool], position: usize) -> Option<RejectReason> {
        if let Some(&producer) = graph
            .producers(position)
            .iter()
            .find(|&&producer| !accepted[producer])
        {
            return graph
                .input_from(position, producer)
                .map(|(index, utxo)| RejectReason::MissingInput { index, utxo });
        }
        graph
            .conflicts(position)
            .into_iter()
            .find(|&other| accepted[other])
            .and_then(|winner| {
                graph
                    .shared_input(position, winner)
                    .map(|utxo| RejectReason::BatchConflict {
                        utxo,
                        winner: *graph.transaction(winner).id(),
                    })
            })
    }

    // Consumes the inputs and creates the outputs of a validated transaction.
    fn apply(ledger: &mut UtxoPool, transaction: &Transaction) -> Result<(), CommitError> {
        for input in transaction.inputs() {
            ledger.remove(input.utxo());
        }
        for (utxo, output) in transaction.output_utxos() {
            ledger.put(utxo, output.clone())?;
        }
        Ok(())
    }
}
