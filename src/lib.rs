pub mod amount;
pub mod batch_graph;
pub mod committer;
pub mod config;
pub mod error;
pub mod hash;
pub mod public_key;
pub mod selection;
pub mod signature;
pub mod transaction;
pub mod tx_handler;
pub mod utxo_pool;
pub mod validation;

pub use self::{
    amount::*, batch_graph::*, committer::*, config::*, error::*, hash::*, public_key::*,
    selection::*, signature::*, transaction::*, tx_handler::*, utxo_pool::*, validation::*,
};
