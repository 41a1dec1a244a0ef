#![allow(dead_code)]

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;
use utxo_ledger::{
    Amount, OutputIndex, PublicKey, Sha256, Transaction, TransactionId, TransactionInput,
    TransactionOutput, UtxoPool, UtxoRef,
};

/// Installs a subscriber once so that `RUST_LOG=debug` shows the commit decisions.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

pub fn public_key(key: &SigningKey) -> PublicKey {
    PublicKey::from(key.verifying_key().to_bytes())
}

pub fn genesis_utxo(seed: u64) -> UtxoRef {
    UtxoRef::new(
        TransactionId::new(Sha256::digest(&seed.to_le_bytes())),
        OutputIndex::new(0),
    )
}

pub fn output_of(transaction: &Transaction, index: u32) -> UtxoRef {
    UtxoRef::new(*transaction.id(), OutputIndex::new(index))
}

/// Builds a transaction and signs input `i` with `keys[i]`.
pub fn signed(
    utxos: Vec<UtxoRef>,
    outputs: Vec<TransactionOutput>,
    keys: &[&SigningKey],
) -> Transaction {
    let mut transaction = Transaction::new(
        utxos.into_iter().map(TransactionInput::new).collect(),
        outputs,
    )
    .unwrap();
    for (index, key) in keys.iter().enumerate() {
        let message = transaction.raw_data_to_sign(index).unwrap();
        let signature = key.sign(&message).to_bytes().to_vec();
        transaction.sign_input(index, signature).unwrap();
    }
    transaction
}

pub fn pay(key: &SigningKey, amount: i64) -> TransactionOutput {
    TransactionOutput::new(public_key(key), Amount::new(amount))
}

/// A pool of outputs owned by a fixed set of people, and a generator of random batches
/// spending them.
pub struct UtxoTestSet {
    pub pool: UtxoPool,
    pub people: Vec<SigningKey>,
    owners: HashMap<PublicKey, usize>,
}

impl UtxoTestSet {
    pub fn generate(rng: &mut StdRng, people_size: usize, utxo_count: u64, max_value: i64) -> Self {
        let people = (1..=people_size as u8).map(signing_key).collect::<Vec<_>>();
        let owners = people
            .iter()
            .enumerate()
            .map(|(index, key)| (public_key(key), index))
            .collect();
        let pool = (0..utxo_count)
            .map(|seed| {
                let owner = people.choose(rng).unwrap();
                (genesis_utxo(seed), pay(owner, rng.gen_range(1..=max_value)))
            })
            .collect();
        Self {
            pool,
            people,
            owners,
        }
    }

    pub fn owner_key(&self, utxo: &UtxoRef) -> &SigningKey {
        let owner = self.pool.get(utxo).unwrap().owner();
        &self.people[self.owners[owner]]
    }

    /// Generates transactions spending random pool outputs. Different transactions may spend
    /// the same output. A `corrupted_percentage` share of them is invalid.
    pub fn random_batch(
        &self,
        rng: &mut StdRng,
        size: usize,
        max_inputs: usize,
        corrupted_percentage: f64,
    ) -> Vec<Transaction> {
        let utxos = self.pool.all_utxos();
        (0..size)
            .map(|_| {
                let count = rng.gen_range(1..=max_inputs.min(utxos.len()));
                let spent = utxos
                    .choose_multiple(rng, count)
                    .copied()
                    .collect::<Vec<UtxoRef>>();
                let input_sum = spent
                    .iter()
                    .map(|utxo| self.pool.get(utxo).unwrap().amount().value())
                    .sum::<i64>();
                let fee = rng.gen_range(0..=input_sum / 2);
                let outputs = self.split(rng, input_sum - fee);
                let keys = spent.iter().map(|utxo| self.owner_key(utxo)).collect::<Vec<_>>();
                if rng.gen_bool(corrupted_percentage) {
                    self.corrupt(rng, spent, outputs, keys, input_sum)
                } else {
                    signed(spent, outputs, &keys)
                }
            })
            .collect()
    }

    fn split(&self, rng: &mut StdRng, total: i64) -> Vec<TransactionOutput> {
        let count = rng.gen_range(1..=3);
        let mut remaining = total;
        (0..count)
            .map(|index| {
                let amount = if index == count - 1 {
                    remaining
                } else {
                    rng.gen_range(0..=remaining)
                };
                remaining -= amount;
                pay(self.people.choose(rng).unwrap(), amount)
            })
            .collect()
    }

    fn corrupt<'a>(
        &'a self,
        rng: &mut StdRng,
        mut spent: Vec<UtxoRef>,
        mut outputs: Vec<TransactionOutput>,
        mut keys: Vec<&'a SigningKey>,
        input_sum: i64,
    ) -> Transaction {
        match rng.gen_range(0..3) {
            0 => {
                // Signed by someone who doesn't own the output.
                let stranger = self
                    .people
                    .iter()
                    .find(|key| public_key(key) != public_key(keys[0]))
                    .unwrap();
                keys[0] = stranger;
            }
            1 => {
                // Spends more than it has.
                outputs = vec![pay(&self.people[0], input_sum + 1)];
            }
            _ => {
                // Claims an output that doesn't exist.
                spent[0] = genesis_utxo(u64::MAX - rng.gen_range(0..1_000));
            }
        }
        signed(spent, outputs, &keys)
    }
}
