use crate::{Amount, LedgerError, TransactionOutput, UtxoRef};
use std::collections::HashMap;
use std::iter::FromIterator;

/// A pool of confirmed and unspent transaction outputs.
/// Every key denotes an output that no accepted transaction has consumed yet.
///
/// Cloning the pool is a deep value copy, which is how snapshots are taken.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UtxoPool {
    utxos: HashMap<UtxoRef, TransactionOutput>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self {
            utxos: HashMap::new(),
        }
    }

    pub fn get(&self, utxo: &UtxoRef) -> Option<&TransactionOutput> {
        self.utxos.get(utxo)
    }

    /// Inserts the output.
    /// Re-inserting an identical output is a no-op, while replacing an existing output with a
    /// different one is an error and leaves the pool unchanged.
    pub fn put(&mut self, utxo: UtxoRef, output: TransactionOutput) -> Result<(), LedgerError> {
        match self.utxos.get(&utxo) {
            Some(existing) if *existing != output => Err(LedgerError::ConflictingOutput(utxo)),
            Some(_) => Ok(()),
            None => {
                self.utxos.insert(utxo, output);
                Ok(())
            }
        }
    }

    pub fn remove(&mut self, utxo: &UtxoRef) -> Option<TransactionOutput> {
        self.utxos.remove(utxo)
    }

    pub fn contains(&self, utxo: &UtxoRef) -> bool {
        self.utxos.contains_key(utxo)
    }

    /// Returns an independent copy of the pool.
    pub fn snapshot(&self) -> UtxoPool {
        self.clone()
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Iterates over the outputs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&UtxoRef, &TransactionOutput)> {
        self.utxos.iter()
    }

    /// Returns all references, sorted.
    pub fn all_utxos(&self) -> Vec<UtxoRef> {
        let mut utxos = self.utxos.keys().copied().collect::<Vec<UtxoRef>>();
        utxos.sort();
        utxos
    }

    /// Returns the sum of all unspent values, or None on overflow.
    pub fn total_value(&self) -> Option<Amount> {
        Amount::checked_sum(self.utxos.values().map(TransactionOutput::amount))
    }
}

impl FromIterator<(UtxoRef, TransactionOutput)> for UtxoPool {
    fn from_iter<I: IntoIterator<Item = (UtxoRef, TransactionOutput)>>(iter: I) -> Self {
        Self {
            utxos: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OutputIndex, PublicKey, Sha256, TransactionId};

    fn utxo(seed: u8) -> UtxoRef {
        UtxoRef::new(
            TransactionId::new(Sha256::digest(&[seed])),
            OutputIndex::new(0),
        )
    }

    fn output(amount: i64) -> TransactionOutput {
        TransactionOutput::new(PublicKey::new(vec![1; 32]), Amount::new(amount))
    }

    #[test]
    fn put_get_remove() {
        let mut pool = UtxoPool::new();
        assert!(pool.is_empty());
        pool.put(utxo(1), output(5)).unwrap();
        assert!(pool.contains(&utxo(1)));
        assert_eq!(pool.get(&utxo(1)), Some(&output(5)));
        assert_eq!(pool.remove(&utxo(1)), Some(output(5)));
        assert!(!pool.contains(&utxo(1)));
        assert_eq!(pool.remove(&utxo(1)), None);
    }

    #[test]
    fn put_never_overwrites_with_a_different_output() {
        let mut pool = UtxoPool::new();
        pool.put(utxo(1), output(5)).unwrap();
        pool.put(utxo(1), output(5)).unwrap();
        assert_eq!(
            pool.put(utxo(1), output(6)),
            Err(LedgerError::ConflictingOutput(utxo(1)))
        );
        assert_eq!(pool.get(&utxo(1)), Some(&output(5)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn snapshot_does_not_alias() {
        let mut pool = UtxoPool::new();
        pool.put(utxo(1), output(5)).unwrap();
        let mut snapshot = pool.snapshot();
        snapshot.remove(&utxo(1));
        snapshot.put(utxo(2), output(3)).unwrap();
        assert!(pool.contains(&utxo(1)));
        assert!(!pool.contains(&utxo(2)));
    }

    #[test]
    fn totals_and_sorted_refs() {
        let pool = vec![(utxo(2), output(3)), (utxo(1), output(4))]
            .into_iter()
            .collect::<UtxoPool>();
        assert_eq!(pool.total_value(), Some(Amount::new(7)));
        let mut entries = pool
            .iter()
            .map(|(utxo, output)| (*utxo, output.amount()))
            .collect::<Vec<_>>();
        entries.sort();
        let mut expected_entries = vec![(utxo(1), Amount::new(4)), (utxo(2), Amount::new(3))];
        expected_entries.sort();
        assert_eq!(entries, expected_entries);
        let mut expected = vec![utxo(1), utxo(2)];
        expected.sort();
        assert_eq!(pool.all_utxos(), expected);
    }
}
