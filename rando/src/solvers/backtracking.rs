use std::collections::BTreeSet;
use std::fmt::Debug;
use std::time::Duration;

use failure::Error;
use log::debug;
use rand::prelude::*;
use rand_pcg::Pcg32;

use super::problem::Problem;
use super::Solver;

const MAX_ITERATIONS: usize = 100;
const MAX_BACKTRACK_DEPTH: usize = 10;

/// Greedy most-constrained-first placement with bounded-depth randomized
/// backtracking.  A middle ground: more robust than rejection sampling on
/// tight problems, cheaper than the full domain search, no completeness
/// guarantee.
pub struct BacktrackingSolver<K, V> {
    problem: Option<Problem<K, V>>,
    last_solution: Option<Vec<(K, V)>>,
    last_indices: Option<Vec<usize>>,
}

impl<K, V> BacktrackingSolver<K, V>
where
    K: Clone + PartialEq + Debug,
    V: Clone + PartialEq + Debug,
{
    pub fn new() -> BacktrackingSolver<K, V> {
        BacktrackingSolver {
            problem: None,
            last_solution: None,
            last_indices: None,
        }
    }

    fn problem_mut(&mut self) -> Result<&mut Problem<K, V>, Error> {
        self.problem
            .as_mut()
            .ok_or_else(|| failure::format_err!("no permutation problem has been defined"))
    }

    fn candidates(
        problem: &Problem<K, V>,
        key_idx: usize,
        used: &BTreeSet<usize>,
    ) -> Vec<usize> {
        (0..problem.len())
            .filter(|value_idx| !used.contains(value_idx))
            .filter(|&value_idx| problem.pair_allowed(key_idx, value_idx))
            .collect()
    }

    fn attempt(problem: &Problem<K, V>, rng: &mut Pcg32) -> Option<Vec<usize>> {
        let num_keys = problem.len();
        let mut key_order: Vec<usize> = (0..num_keys).collect();
        key_order.shuffle(rng);

        let mut assignment = vec![usize::max_value(); num_keys];
        let mut used = BTreeSet::new();

        // Required keys are placed first; a collision between two required
        // keys wanting the same sole occurrence fails the attempt outright.
        for (&key_idx, occurrences) in &problem.required {
            let mut options: Vec<usize> = occurrences
                .iter()
                .cloned()
                .filter(|value_idx| !used.contains(value_idx))
                .filter(|&value_idx| problem.pair_allowed(key_idx, value_idx))
                .collect();
            if options.is_empty() {
                return None;
            }
            options.shuffle(rng);
            assignment[key_idx] = options[0];
            used.insert(options[0]);
        }

        for &key_idx in &key_order {
            if assignment[key_idx] != usize::max_value() {
                continue;
            }
            let candidates = Self::candidates(problem, key_idx, &used);
            if candidates.is_empty() {
                // Greedy dead end; hand the remainder to bounded search.
                if !Self::backtrack(problem, &mut assignment, &mut used, 0, rng) {
                    return None;
                }
                break;
            }
            let choice = candidates[rng.gen_range(0, candidates.len())];
            assignment[key_idx] = choice;
            used.insert(choice);
        }

        if assignment.iter().any(|&v| v == usize::max_value()) {
            return None;
        }
        Some(assignment)
    }

    fn backtrack(
        problem: &Problem<K, V>,
        assignment: &mut Vec<usize>,
        used: &mut BTreeSet<usize>,
        depth: usize,
        rng: &mut Pcg32,
    ) -> bool {
        if depth > MAX_BACKTRACK_DEPTH {
            return false;
        }

        // Most-constrained key first.
        let mut next_key = None;
        let mut fewest = usize::max_value();
        for key_idx in 0..assignment.len() {
            if assignment[key_idx] != usize::max_value() {
                continue;
            }
            let count = Self::candidates(problem, key_idx, used).len();
            if count < fewest {
                fewest = count;
                next_key = Some(key_idx);
            }
        }

        let key_idx = match next_key {
            Some(key_idx) => key_idx,
            None => return true,
        };

        let mut candidates = Self::candidates(problem, key_idx, used);
        candidates.shuffle(rng);
        for value_idx in candidates {
            assignment[key_idx] = value_idx;
            used.insert(value_idx);
            if Self::backtrack(problem, assignment, used, depth + 1, rng) {
                return true;
            }
            assignment[key_idx] = usize::max_value();
            used.remove(&value_idx);
        }
        false
    }
}

impl<K, V> Solver<K, V> for BacktrackingSolver<K, V>
where
    K: Clone + PartialEq + Debug,
    V: Clone + PartialEq + Debug,
{
    fn add_permutation_problem(&mut self, keys: Vec<K>, values: Vec<V>, shuffle_seed: Option<u64>) {
        self.problem = Some(Problem::new(keys, values, shuffle_seed));
    }

    fn require(&mut self, key: &K, value: &V) -> Result<(), Error> {
        self.problem_mut()?.require(key, value)
    }

    fn forbid(&mut self, key: &K, value: &V) -> Result<(), Error> {
        self.problem_mut()?.forbid(key, value)
    }

    fn at_least_one_of(&mut self, keys: &[K], values: &[V]) -> Result<(), Error> {
        self.problem_mut()?.at_least_one_of(keys, values)
    }

    fn add_forbidden_solution(&mut self, solution: &[(K, V)]) {
        if let Some(problem) = self.problem.as_mut() {
            problem.add_forbidden_solution(solution);
        }
    }

    fn solve(&mut self, seed: Option<u64>, _time_limit: Duration) -> Option<Vec<(K, V)>> {
        let problem = self.problem.as_ref()?;
        let mut rng = Pcg32::seed_from_u64(seed.unwrap_or(0));

        for attempt in 0..MAX_ITERATIONS {
            if let Some(assignment) = Self::attempt(problem, &mut rng) {
                if problem.check_global_constraints(&assignment) {
                    debug!("backtracking solver succeeded on attempt {}", attempt + 1);
                    self.last_solution = Some(problem.solution_from(&assignment));
                    self.last_indices = Some(assignment);
                    return self.last_solution.clone();
                }
            }
        }

        debug!(
            "backtracking solver found no solution in {} attempts",
            MAX_ITERATIONS
        );
        None
    }

    fn last_solution(&self) -> Option<&[(K, V)]> {
        self.last_solution.as_deref()
    }

    fn last_solution_indices(&self) -> Option<&[usize]> {
        self.last_indices.as_deref()
    }
}
