use std::fmt::Debug;
use std::time::Duration;

use failure::Error;
use log::debug;
use rand::prelude::*;
use rand_pcg::Pcg32;

use super::problem::Problem;
use super::Solver;

const MAX_ATTEMPTS: usize = 100_000;

/// Shuffle-and-check rejection sampling.  Fastest when constraints are
/// loose; may miss solutions that exist when they are very tight.
pub struct RejectionSolver<K, V> {
    problem: Option<Problem<K, V>>,
    last_solution: Option<Vec<(K, V)>>,
    last_indices: Option<Vec<usize>>,
}

impl<K, V> RejectionSolver<K, V> {
    pub fn new() -> RejectionSolver<K, V> {
        RejectionSolver {
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
}

impl<K, V> Solver<K, V> for RejectionSolver<K, V>
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
        let num_keys = problem.len();
        let mut rng = Pcg32::seed_from_u64(seed.unwrap_or(0));

        // Shuffle which key positions are filled first so ties break
        // differently per seed, then keep re-shuffling the value order until
        // a draw satisfies every constraint.
        let mut key_order: Vec<usize> = (0..num_keys).collect();
        let mut value_order: Vec<usize> = (0..num_keys).collect();
        key_order.shuffle(&mut rng);
        value_order.shuffle(&mut rng);

        let mut assignment = vec![0usize; num_keys];
        for attempt in 0..MAX_ATTEMPTS {
            value_order.shuffle(&mut rng);
            for (slot, &key_idx) in key_order.iter().enumerate() {
                assignment[key_idx] = value_order[slot];
            }
            if problem.check_assignment(&assignment) {
                debug!("rejection sampler found a solution in {} attempts", attempt + 1);
                self.last_solution = Some(problem.solution_from(&assignment));
                self.last_indices = Some(assignment);
                return self.last_solution.clone();
            }
        }

        debug!("rejection sampler gave up after {} attempts", MAX_ATTEMPTS);
        None
    }

    fn last_solution(&self) -> Option<&[(K, V)]> {
        self.last_solution.as_deref()
    }

    fn last_solution_indices(&self) -> Option<&[usize]> {
        self.last_indices.as_deref()
    }
}
