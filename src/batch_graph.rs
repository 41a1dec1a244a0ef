use crate::{
    Amount, Transaction, TransactionId, TransactionOutput, UtxoContext, UtxoPool, UtxoRef,
};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Relations between the candidate transactions of one batch.
///
/// A candidate depends on another candidate (its producer) when it spends an output of the
/// producer that isn't in the ledger yet. Two candidates conflict when they claim the same
/// output, regardless of whether the output is in the ledger or produced within the batch.
/// Candidates are identified by their position in the batch. Later copies of a candidate that
/// appears more than once take no part in the graph.
pub struct BatchGraph<'a> {
    ledger: &'a UtxoPool,
    transactions: &'a [Transaction],
    // First position of each id.
    by_id: HashMap<TransactionId, usize>,
    // For a repeated candidate, the position of its first copy.
    duplicate_of: Vec<Option<usize>>,
    // Producers of each candidate, sorted and without duplicates.
    producers: Vec<Vec<usize>>,
    consumers: Vec<Vec<usize>>,
    // Candidates claiming each output, in batch order.
    spenders: HashMap<UtxoRef, Vec<usize>>,
}

impl<'a> BatchGraph<'a> {
    pub fn new(ledger: &'a UtxoPool, transactions: &'a [Transaction]) -> Self {
        let mut by_id: HashMap<TransactionId, usize> = HashMap::new();
        let mut duplicate_of = vec![None; transactions.len()];
        for (position, transaction) in transactions.iter().enumerate() {
            match by_id.get(transaction.id()) {
                Some(&first) => duplicate_of[position] = Some(first),
                None => {
                    by_id.insert(*transaction.id(), position);
                }
            }
        }

        let mut producers = vec![vec![]; transactions.len()];
        let mut consumers = vec![vec![]; transactions.len()];
        let mut spenders: HashMap<UtxoRef, Vec<usize>> = HashMap::new();
        for (consumer, transaction) in transactions.iter().enumerate() {
            if duplicate_of[consumer].is_some() {
                continue;
            }
            for input in transaction.inputs() {
                let utxo = input.utxo();
                let claimants = spenders.entry(*utxo).or_insert_with(Vec::new);
                // A transaction claiming the same output twice is rejected on its own.
                if claimants.last() != Some(&consumer) {
                    claimants.push(consumer);
                }
                if ledger.contains(utxo) {
                    continue;
                }
                if let Some(&producer) = by_id.get(utxo.transaction_id()) {
                    let index = utxo.output_index().value() as usize;
                    if index < transactions[producer].outputs().len() {
                        producers[consumer].push(producer);
                        consumers[producer].push(consumer);
                    }
                }
            }
        }
        for edges in producers.iter_mut().chain(consumers.iter_mut()) {
            edges.sort_unstable();
            edges.dedup();
        }

        Self {
            ledger,
            transactions,
            by_id,
            duplicate_of,
            producers,
            consumers,
            spenders,
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transaction(&self, position: usize) -> &'a Transaction {
        &self.transactions[position]
    }

    /// Returns the position of the first copy if the candidate appeared earlier in the batch.
    pub fn duplicate_of(&self, position: usize) -> Option<usize> {
        self.duplicate_of[position]
    }

    pub fn producers(&self, position: usize) -> &[usize] {
        &self.producers[position]
    }

    /// Returns the candidates that claim at least one output also claimed by the candidate.
    pub fn conflicts(&self, position: usize) -> Vec<usize> {
        let mut conflicts = self.transactions[position]
            .inputs()
            .iter()
            .filter_map(|input| self.spenders.get(input.utxo()))
            .flatten()
            .copied()
            .filter(|&other| other != position)
            .collect::<Vec<usize>>();
        conflicts.sort_unstable();
        conflicts.dedup();
        conflicts
    }

    /// Returns an output claimed by both candidates, if any.
    pub fn shared_input(&self, lhs: usize, rhs: usize) -> Option<UtxoRef> {
        self.transactions[lhs]
            .inputs()
            .iter()
            .map(|input| *input.utxo())
            .find(|utxo| {
                self.spenders
                    .get(utxo)
                    .map_or(false, |claimants| claimants.contains(&rhs))
            })
    }

    /// Returns the first input of the consumer that spends an output of the producer.
    pub fn input_from(&self, consumer: usize, producer: usize) -> Option<(usize, UtxoRef)> {
        let producer_id = self.transactions[producer].id();
        self.transactions[consumer]
            .inputs()
            .iter()
            .enumerate()
            .map(|(index, input)| (index, *input.utxo()))
            .find(|(_, utxo)| utxo.transaction_id() == producer_id && !self.ledger.contains(utxo))
    }

    /// Marks the candidates that can never be ordered after all of their producers, i.e. the
    /// members of a dependency cycle and everything that depends on one.
    pub fn cyclic(&self) -> Vec<bool> {
        unresolved(&self.producers, &self.consumers)
    }

    /// Orders the members so that every producer comes before its consumers, preferring the
    /// higher fee and then the smaller id among the candidates that are ready.
    /// The order only depends on the content of the batch, not on the order of the candidates.
    ///
    /// Preconditions:
    ///   - The members are acyclic and every producer of a member is a member.
    pub fn priority_order(&self, members: &[bool], fees: &[Amount]) -> Vec<usize> {
        let mut in_degree = (0..self.len())
            .map(|position| {
                self.producers[position]
                    .iter()
                    .filter(|&&producer| members[producer])
                    .count()
            })
            .collect::<Vec<usize>>();
        let key = |position: usize| {
            (
                fees[position],
                Reverse(*self.transactions[position].id()),
                position,
            )
        };
        let mut ready = (0..self.len())
            .filter(|&position| members[position] && in_degree[position] == 0)
            .map(key)
            .collect::<BinaryHeap<_>>();
        let mut order = Vec::with_capacity(ready.len());
        while let Some((_, _, position)) = ready.pop() {
            order.push(position);
            for &consumer in &self.consumers[position] {
                if !members[consumer] {
                    continue;
                }
                in_degree[consumer] -= 1;
                if in_degree[consumer] == 0 {
                    ready.push(key(consumer));
                }
            }
        }
        order
    }
}

// Kahn's algorithm: whatever is never released is unresolvable.
fn unresolved(producers: &[Vec<usize>], consumers: &[Vec<usize>]) -> Vec<bool> {
    let mut in_degree = producers.iter().map(Vec::len).collect::<Vec<usize>>();
    let mut ready = (0..producers.len())
        .filter(|&position| in_degree[position] == 0)
        .collect::<Vec<usize>>();
    let mut unresolved = vec![true; producers.len()];
    while let Some(position) = ready.pop() {
        unresolved[position] = false;
        for &consumer in &consumers[position] {
            in_degree[consumer] -= 1;
            if in_degree[consumer] == 0 {
                ready.push(consumer);
            }
        }
    }
    unresolved
}

/// Resolves outputs from the ledger first and then from the outputs of the batch, as if every
/// candidate had been accepted.
impl UtxoContext for BatchGraph<'_> {
    fn lookup(&self, utxo: &UtxoRef) -> Option<&TransactionOutput> {
        self.ledger.get(utxo).or_else(|| {
            self.by_id
                .get(utxo.transaction_id())
                .and_then(|&producer| {
                    self.transactions[producer]
                        .outputs()
                        .get(utxo.output_index().value() as usize)
                })
        })
    }
}
