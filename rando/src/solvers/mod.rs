//! Permutation-with-constraints solvers.
//!
//! A problem assigns each of N unique keys one of N (possibly duplicated)
//! values, bijectively.  Internally everything is done in value indices so
//! duplicate values stay unambiguous: `forbid` hits every occurrence of a
//! value, `require` pins a key to any one occurrence.
//!
//! All three implementations are interchangeable behind [`Solver`]; they
//! differ only in performance and in how tight a constraint set they can
//! satisfy.  The rejection sampler is the expected default, the domain
//! solver is the fallback for very tight constraint sets, and the
//! backtracking solver sits in between.

mod backtracking;
mod domain;
mod problem;
mod rejection;

pub use backtracking::BacktrackingSolver;
pub use domain::DomainSolver;
pub use rejection::RejectionSolver;

use std::fmt::Debug;
use std::time::Duration;

use failure::Error;

pub trait Solver<K, V>
where
    K: Clone + PartialEq + Debug,
    V: Clone + PartialEq + Debug,
{
    /// Defines the problem.  `keys` must be unique; `values` may repeat.
    /// When `shuffle_seed` is set, keys and values are deterministically
    /// pre-shuffled before solving.
    fn add_permutation_problem(&mut self, keys: Vec<K>, values: Vec<V>, shuffle_seed: Option<u64>);

    /// Pins `key` to (any one occurrence of) `value`.
    fn require(&mut self, key: &K, value: &V) -> Result<(), Error>;

    /// Forbids `key` from every occurrence of `value`.
    fn forbid(&mut self, key: &K, value: &V) -> Result<(), Error>;

    fn forbid_all(&mut self, keys: &[K], values: &[V]) -> Result<(), Error> {
        for key in keys {
            for value in values {
                self.forbid(key, value)?;
            }
        }
        Ok(())
    }

    /// At least one of `keys` must receive one of `values`.
    fn at_least_one_of(&mut self, keys: &[K], values: &[V]) -> Result<(), Error>;

    /// Rejects one specific whole assignment from future solves.
    fn add_forbidden_solution(&mut self, solution: &[(K, V)]);

    /// Returns a full assignment in key order, or None if no solution was
    /// found.  Same seed + same constraints + same problem always yields the
    /// same solution.  The time limit is advisory.
    fn solve(&mut self, seed: Option<u64>, time_limit: Duration) -> Option<Vec<(K, V)>>;

    fn last_solution(&self) -> Option<&[(K, V)]>;

    /// The last solution as indices into the (pre-shuffled) value list.
    fn last_solution_indices(&self) -> Option<&[usize]>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Domain,
    Backtracking,
    RejectionSampling,
}

pub fn create_solver<K, V>(kind: SolverKind) -> Box<dyn Solver<K, V>>
where
    K: 'static + Clone + PartialEq + Debug,
    V: 'static + Clone + PartialEq + Debug,
{
    match kind {
        SolverKind::Domain => Box::new(DomainSolver::new()),
        SolverKind::Backtracking => Box::new(BacktrackingSolver::new()),
        SolverKind::RejectionSampling => Box::new(RejectionSolver::new()),
    }
}
