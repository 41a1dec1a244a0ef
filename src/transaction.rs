use crate::{Amount, PublicKey, Sha256, TransactionError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A double SHA-256 hash of the transaction data.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct TransactionId(Sha256);

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TransactionId {
    pub fn new(data: Sha256) -> Self {
        Self(data)
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

/// The index of the transaction output, the first one is 0.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct OutputIndex(u32);

impl Display for OutputIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OutputIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Identifies a single output of a single transaction.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct UtxoRef {
    transaction_id: TransactionId,
    output_index: OutputIndex,
}

impl UtxoRef {
    pub fn new(transaction_id: TransactionId, output_index: OutputIndex) -> Self {
        Self {
            transaction_id,
            output_index,
        }
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    pub fn output_index(&self) -> OutputIndex {
        self.output_index
    }
}

impl Display for UtxoRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.transaction_id, self.output_index)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    // A pointer to the output to be spent.
    utxo: UtxoRef,
    // Signature by the owner of the spent output over `Transaction::raw_data_to_sign`.
    signature: Vec<u8>,
}

impl TransactionInput {
    /// Creates an unsigned input.
    pub fn new(utxo: UtxoRef) -> Self {
        Self {
            utxo,
            signature: vec![],
        }
    }

    pub fn utxo(&self) -> &UtxoRef {
        &self.utxo
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

impl Display for TransactionInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.utxo)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutput {
    owner: PublicKey,
    amount: Amount,
}

impl TransactionOutput {
    pub fn new(owner: PublicKey, amount: Amount) -> Self {
        Self { owner, amount }
    }

    pub fn owner(&self) -> &PublicKey {
        &self.owner
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

impl Display for TransactionOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.amount, self.owner)
    }
}

// The hashed content of the transaction.
#[derive(Serialize)]
struct TransactionContent<'a> {
    inputs: &'a [TransactionInput],
    outputs: &'a [TransactionOutput],
}

// The signed content for one input. Signatures are left out entirely, so that the inputs
// can be signed in any order without invalidating each other.
#[derive(Serialize)]
struct SigningPayload<'a> {
    index: u32,
    utxos: Vec<&'a UtxoRef>,
    outputs: &'a [TransactionOutput],
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Transaction {
    // Always equal to the hash of `inputs` and `outputs`.
    id: TransactionId,
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
}

impl Transaction {
    pub fn new(
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
    ) -> Result<Self, TransactionError> {
        let id = Self::hash_transaction_data(&inputs, &outputs)?;
        Ok(Self {
            id,
            inputs,
            outputs,
        })
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn inputs(&self) -> &Vec<TransactionInput> {
        &self.inputs
    }

    pub fn outputs(&self) -> &Vec<TransactionOutput> {
        &self.outputs
    }

    /// Returns the references under which the outputs of this transaction are stored once it
    /// is accepted.
    pub fn output_utxos(&self) -> impl Iterator<Item = (UtxoRef, &TransactionOutput)> {
        let id = self.id;
        self.outputs
            .iter()
            .enumerate()
            .map(move |(index, output)| (UtxoRef::new(id, OutputIndex::new(index as u32)), output))
    }

    /// Returns the bytes that the owner of the output spent by the input at `index` signs:
    /// the index, every spent output reference and every output, without any signature.
    pub fn raw_data_to_sign(&self, index: usize) -> Result<Vec<u8>, TransactionError> {
        if index >= self.inputs.len() {
            return Err(TransactionError::InputOutOfRange {
                index,
                len: self.inputs.len(),
            });
        }
        let payload = SigningPayload {
            index: index as u32,
            utxos: self.inputs.iter().map(TransactionInput::utxo).collect(),
            outputs: &self.outputs,
        };
        Ok(bincode::serialize(&payload)?)
    }

    /// Attaches the signature to the input at `index` and recomputes the transaction id.
    pub fn sign_input(&mut self, index: usize, signature: Vec<u8>) -> Result<(), TransactionError> {
        let len = self.inputs.len();
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(TransactionError::InputOutOfRange { index, len })?;
        input.signature = signature;
        self.id = Self::hash_transaction_data(&self.inputs, &self.outputs)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn with_forged_id(mut self, id: TransactionId) -> Self {
        self.id = id;
        self
    }

    fn hash_transaction_data(
        inputs: &[TransactionInput],
        outputs: &[TransactionOutput],
    ) -> Result<TransactionId, TransactionError> {
        let data = bincode::serialize(&TransactionContent { inputs, outputs })?;
        Ok(TransactionId(Sha256::double_digest(&data)))
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
