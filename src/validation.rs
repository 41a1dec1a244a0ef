use crate::{
    Amount, RejectReason, SignatureVerifier, Transaction, TransactionOutput, UtxoPool, UtxoRef,
};
use std::collections::HashSet;

/// Resolves the outputs that a transaction spends.
pub trait UtxoContext {
    fn lookup(&self, utxo: &UtxoRef) -> Option<&TransactionOutput>;
}

impl UtxoContext for UtxoPool {
    fn lookup(&self, utxo: &UtxoRef) -> Option<&TransactionOutput> {
        self.get(utxo)
    }
}

// Responsible for performing validation checks on a single transaction.
// The checks only read from the context, so validating never changes the ledger.
pub struct TransactionValidator {}

impl TransactionValidator {
    /// Validates the transaction against the context and returns its fee, i.e. the sum of the
    /// input values minus the sum of the output values.
    ///
    /// A transaction is valid if:
    ///   - no output is claimed more than once by its inputs,
    ///   - every output claimed by its inputs exists in the context,
    ///   - all of its output values are non-negative,
    ///   - the sum of its input values is at least the sum of its output values,
    ///   - every input is signed by the owner of the claimed output.
    /// Cheap checks run first, signatures are verified last.
    pub fn validate<C, V>(
        context: &C,
        transaction: &Transaction,
        verifier: &V,
    ) -> Result<Amount, RejectReason>
    where
        C: UtxoContext + ?Sized,
        V: SignatureVerifier + ?Sized,
    {
        Self::validate_no_internal_double_spend(transaction)?;
        let spent = Self::validate_inputs_exist(context, transaction)?;
        Self::validate_outputs_non_negative(transaction)?;
        let fee = Self::validate_value_conserved(&spent, transaction)?;
        Self::validate_signatures(&spent, transaction, verifier)?;
        Ok(fee)
    }

    pub fn is_valid<C, V>(context: &C, transaction: &Transaction, verifier: &V) -> bool
    where
        C: UtxoContext + ?Sized,
        V: SignatureVerifier + ?Sized,
    {
        Self::validate(context, transaction, verifier).is_ok()
    }

    pub(crate) fn validate_no_internal_double_spend(
        transaction: &Transaction,
    ) -> Result<(), RejectReason> {
        let mut claimed = HashSet::new();
        for input in transaction.inputs() {
            if !claimed.insert(input.utxo()) {
                return Err(RejectReason::InternalDoubleSpend {
                    utxo: *input.utxo(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn validate_outputs_non_negative(
        transaction: &Transaction,
    ) -> Result<(), RejectReason> {
        match transaction
            .outputs()
            .iter()
            .enumerate()
            .find(|(_, output)| output.amount().is_negative())
        {
            Some((index, output)) => Err(RejectReason::NegativeOutput {
                index,
                value: output.amount(),
            }),
            None => Ok(()),
        }
    }

    fn validate_inputs_exist<'a, C>(
        context: &'a C,
        transaction: &Transaction,
    ) -> Result<Vec<&'a TransactionOutput>, RejectReason>
    where
        C: UtxoContext + ?Sized,
    {
        transaction
            .inputs()
            .iter()
            .enumerate()
            .map(|(index, input)| {
                context
                    .lookup(input.utxo())
                    .ok_or(RejectReason::MissingInput {
                        index,
                        utxo: *input.utxo(),
                    })
            })
            .collect()
    }

    fn validate_value_conserved(
        spent: &[&TransactionOutput],
        transaction: &Transaction,
    ) -> Result<Amount, RejectReason> {
        let inputs = Amount::checked_sum(spent.iter().map(|output| output.amount()))
            .ok_or(RejectReason::ValueOverflow)?;
        let outputs =
            Amount::checked_sum(transaction.outputs().iter().map(TransactionOutput::amount))
                .ok_or(RejectReason::ValueOverflow)?;
        if inputs < outputs {
            return Err(RejectReason::InsufficientInput { inputs, outputs });
        }
        inputs
            .checked_sub(outputs)
            .ok_or(RejectReason::ValueOverflow)
    }

    fn validate_signatures<V>(
        spent: &[&TransactionOutput],
        transaction: &Transaction,
        verifier: &V,
    ) -> Result<(), RejectReason>
    where
        V: SignatureVerifier + ?Sized,
    {
        for (index, (input, output)) in transaction.inputs().iter().zip(spent).enumerate() {
            let verified = match transaction.raw_data_to_sign(index) {
                Ok(message) => verifier.verify(output.owner(), &message, input.signature()),
                Err(_) => false,
            };
            if !verified {
                return Err(RejectReason::InvalidSignature {
                    index,
                    utxo: *input.utxo(),
                });
            }
        }
        Ok(())
    }
}
