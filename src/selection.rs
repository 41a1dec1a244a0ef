use crate::{Amount, CommitterConfig};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How the accepted subset of a batch was chosen.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// Branch-and-bound search. The subset is optimal if the search completed within its
    /// budget, otherwise it is the best subset found before the budget ran out.
    Exact { complete: bool },
    /// Highest fee first, not guaranteed to be optimal.
    Greedy,
}

impl Display for SelectionStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionStrategy::Exact { complete: true } => write!(f, "exact"),
            SelectionStrategy::Exact { complete: false } => write!(f, "exact (budget exhausted)"),
            SelectionStrategy::Greedy => write!(f, "greedy"),
        }
    }
}

/// Picks the subset of candidates with the maximum total fee such that no two chosen
/// candidates conflict and every chosen candidate has all of its producers chosen.
///
/// This is a maximum-weight independent set with dependency constraints, which is NP-hard, so
/// only small problems are solved exactly.
///
/// Candidates are identified by their position in the priority order, and every producer of a
/// candidate must come before it in that order.
pub struct SelectionProblem {
    fees: Vec<i128>,
    producers: Vec<Vec<usize>>,
    conflicts: Vec<Vec<usize>>,
}

/// The chosen candidates, by position.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Selection {
    pub chosen: Vec<bool>,
    pub strategy: SelectionStrategy,
}

impl SelectionProblem {
    /// Preconditions:
    ///   - All vectors have the same length.
    ///   - Producers of a candidate come before it.
    ///   - Conflicts are symmetric.
    pub fn new(
        fees: Vec<Amount>,
        producers: Vec<Vec<usize>>,
        conflicts: Vec<Vec<usize>>,
    ) -> Self {
        debug_assert_eq!(fees.len(), producers.len());
        debug_assert_eq!(fees.len(), conflicts.len());
        debug_assert!(producers
            .iter()
            .enumerate()
            .all(|(position, producers)| producers.iter().all(|&p| p < position)));
        Self {
            fees: fees.into_iter().map(|fee| fee.value() as i128).collect(),
            producers,
            conflicts,
        }
    }

    pub fn len(&self) -> usize {
        self.fees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fees.is_empty()
    }

    /// Solves the problem exactly when it is small enough, greedily otherwise.
    pub fn solve(&self, config: &CommitterConfig) -> Selection {
        if self.len() <= config.exact_threshold {
            let (chosen, complete) = self.exact(config.search_budget);
            Selection {
                chosen,
                strategy: SelectionStrategy::Exact { complete },
            }
        } else {
            Selection {
                chosen: self.greedy(),
                strategy: SelectionStrategy::Greedy,
            }
        }
    }

    /// Returns the total fee of the chosen candidates.
    pub fn total_fee(&self, chosen: &[bool]) -> i128 {
        self.fees
            .iter()
            .zip(chosen)
            .filter(|(_, chosen)| **chosen)
            .map(|(fee, _)| fee)
            .sum()
    }

    /// Walks the candidates in priority order and takes each one that fits.
    pub fn greedy(&self) -> Vec<bool> {
        let mut chosen = vec![false; self.len()];
        for position in 0..self.len() {
            if self.fits(&chosen, position) {
                chosen[position] = true;
            }
        }
        chosen
    }

    /// Branch-and-bound over include/exclude decisions in priority order.
    /// Returns the best subset and whether the search completed within `budget` visited nodes.
    /// The greedy subset is the starting point, so an interrupted search is never worse than it.
    pub fn exact(&self, budget: u64) -> (Vec<bool>, bool) {
        let best = self.greedy();
        let mut search = Search {
            problem: self,
            best_fee: self.total_fee(&best),
            best,
            chosen: vec![false; self.len()],
            fee: 0,
            visited: 0,
            budget,
        };
        let complete = search.run();
        (search.best, complete)
    }

    // Whether the candidate can join the chosen ones: all of its producers are chosen and it
    // doesn't conflict with any of them.
    fn fits(&self, chosen: &[bool], position: usize) -> bool {
        self.producers[position].iter().all(|&p| chosen[p])
            && !self.conflicts[position].iter().any(|&c| chosen[c])
    }
}

// One pending action of the depth-first search.
enum Step {
    // Decide the candidate at this position.
    Visit(usize),
    // Take back the inclusion of the candidate at this position.
    Retract(usize),
}

struct Search<'a> {
    problem: &'a SelectionProblem,
    best: Vec<bool>,
    best_fee: i128,
    chosen: Vec<bool>,
    fee: i128,
    visited: u64,
    budget: u64,
}

impl Search<'_> {
    // Depth-first over an explicit stack, so the depth is bounded by memory and not by the
    // thread's stack. Returns false if the budget ran out first.
    fn run(&mut self) -> bool {
        let mut steps = vec![Step::Visit(0)];
        while let Some(step) = steps.pop() {
            let position = match step {
                Step::Visit(position) => position,
                Step::Retract(position) => {
                    self.chosen[position] = false;
                    self.fee -= self.problem.fees[position];
                    continue;
                }
            };
            if self.visited >= self.budget {
                return false;
            }
            self.visited += 1;

            if position == self.problem.len() {
                // Strictly better only, so the first subset found wins ties.
                if self.fee > self.best_fee {
                    self.best_fee = self.fee;
                    self.best.copy_from_slice(&self.chosen);
                }
                continue;
            }
            if self.fee + self.upper_bound(position) <= self.best_fee {
                continue;
            }

            // Popped in reverse: the branch including the candidate runs first.
            steps.push(Step::Visit(position + 1));
            if self.problem.fits(&self.chosen, position) {
                self.chosen[position] = true;
                self.fee += self.problem.fees[position];
                steps.push(Step::Retract(position));
                steps.push(Step::Visit(position + 1));
            }
        }
        true
    }

    // The total fee of the undecided candidates that may still join.
    fn upper_bound(&self, position: usize) -> i128 {
        (position..self.problem.len())
            .filter(|&candidate| {
                let producers_possible = self.problem.producers[candidate]
                    .iter()
                    .all(|&p| p >= position || self.chosen[p]);
                let conflict_free = !self.problem.conflicts[candidate]
                    .iter()
                    .any(|&c| self.chosen[c]);
                producers_possible && conflict_free
            })
            .map(|candidate| self.problem.fees[candidate])
            .sum()
    }
}
