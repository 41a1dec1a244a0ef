use serde::{Deserialize, Serialize};

/// Batches with at most this many eligible candidates are solved exactly.
pub const DEFAULT_EXACT_THRESHOLD: usize = 20;

/// Nodes the exact search may visit before it settles for the best subset found so far.
pub const DEFAULT_SEARCH_BUDGET: u64 = 1_000_000;

/// Tuning for `BatchCommitter`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitterConfig {
    pub exact_threshold: usize,
    pub search_budget: u64,
}

impl CommitterConfig {
    pub fn new(exact_threshold: usize, search_budget: u64) -> Self {
        Self {
            exact_threshold,
            search_budget,
        }
    }

    /// Always selects greedily.
    pub fn greedy() -> Self {
        Self::new(0, 0)
    }
}

impl Default for CommitterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_EXACT_THRESHOLD, DEFAULT_SEARCH_BUDGET)
    }
}
