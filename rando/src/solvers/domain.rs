use std::fmt::Debug;
use std::time::{Duration, Instant};

use failure::Error;
use log::debug;
use rand::prelude::*;
use rand_pcg::Pcg32;

use super::problem::Problem;
use super::Solver;

/// All-different domain propagation with complete randomized backtracking.
/// The robust backend: slower than the samplers, but it will find a solution
/// whenever one exists (within the time limit), so it is the one to use under
/// heavy constraint pressure.  Single-threaded; the search order is fully
/// determined by the caller's seed.
pub struct DomainSolver<K, V> {
    problem: Option<Problem<K, V>>,
    last_solution: Option<Vec<(K, V)>>,
    last_indices: Option<Vec<usize>>,
}

struct Search<'a, K, V> {
    problem: &'a Problem<K, V>,
    rng: Pcg32,
    deadline: Instant,
    timed_out: bool,
}

impl<'a, K, V> Search<'a, K, V>
where
    K: Clone + PartialEq + Debug,
    V: Clone + PartialEq + Debug,
{
    fn initial_domains(&self) -> Vec<Vec<bool>> {
        let num = self.problem.len();
        let mut domains = vec![vec![true; num]; num];
        for key_idx in 0..num {
            for value_idx in 0..num {
                if !self.problem.pair_allowed(key_idx, value_idx) {
                    domains[key_idx][value_idx] = false;
                }
            }
        }
        domains
    }

    /// Assigned (singleton) domains knock their value out of every other
    /// domain until a fixed point; a wiped-out domain fails the branch.
    fn propagate(domains: &mut Vec<Vec<bool>>) -> bool {
        loop {
            let mut changed = false;
            for key_idx in 0..domains.len() {
                let mut single = None;
                let mut count = 0;
                for (value_idx, &open) in domains[key_idx].iter().enumerate() {
                    if open {
                        count += 1;
                        single = Some(value_idx);
                    }
                }
                if count == 0 {
                    return false;
                }
                if count == 1 {
                    let value_idx = single.unwrap_or(0);
                    for other in 0..domains.len() {
                        if other != key_idx && domains[other][value_idx] {
                            domains[other][value_idx] = false;
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                return true;
            }
        }
    }

    fn run(&mut self, domains: Vec<Vec<bool>>) -> Option<Vec<usize>> {
        if Instant::now() > self.deadline {
            self.timed_out = true;
            return None;
        }

        // Pick the unassigned key with the smallest domain.
        let mut next_key = None;
        let mut fewest = usize::max_value();
        for (key_idx, domain) in domains.iter().enumerate() {
            let count = domain.iter().filter(|&&open| open).count();
            if count > 1 && count < fewest {
                fewest = count;
                next_key = Some(key_idx);
            }
        }

        let key_idx = match next_key {
            Some(key_idx) => key_idx,
            None => {
                // Every domain is a singleton: a complete assignment.
                let assignment: Vec<usize> = domains
                    .iter()
                    .map(|domain| domain.iter().position(|&open| open).unwrap_or(0))
                    .collect();
                if self.problem.check_global_constraints(&assignment) {
                    return Some(assignment);
                }
                return None;
            }
        };

        let mut candidates: Vec<usize> = domains[key_idx]
            .iter()
            .enumerate()
            .filter(|(_, &open)| open)
            .map(|(value_idx, _)| value_idx)
            .collect();
        candidates.shuffle(&mut self.rng);

        for value_idx in candidates {
            let mut branch = domains.clone();
            for (other_idx, open) in branch[key_idx].iter_mut().enumerate() {
                *open = other_idx == value_idx;
            }
            if !Self::propagate(&mut branch) {
                continue;
            }
            if let Some(assignment) = self.run(branch) {
                return Some(assignment);
            }
            if self.timed_out {
                return None;
            }
        }
        None
    }
}

impl<K, V> DomainSolver<K, V> {
    pub fn new() -> DomainSolver<K, V> {
        DomainSolver {
            problem: None,
            last_solution: None,
            last_indices: None,
        }
    }

    fn problem_mut(&mut self) -> Result<&mut Problem<K, V>, Error>
    where
        K: Clone + PartialEq + Debug,
        V: Clone + PartialEq + Debug,
    {
        self.problem
            .as_mut()
            .ok_or_else(|| failure::format_err!("no permutation problem has been defined"))
    }
}

impl<K, V> Solver<K, V> for DomainSolver<K, V>
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

    fn solve(&mut self, seed: Option<u64>, time_limit: Duration) -> Option<Vec<(K, V)>> {
        let problem = self.problem.as_ref()?;
        let mut search = Search {
            problem,
            rng: Pcg32::seed_from_u64(seed.unwrap_or(0)),
            deadline: Instant::now() + time_limit,
            timed_out: false,
        };

        let mut domains = search.initial_domains();
        if !Search::<K, V>::propagate(&mut domains) {
            debug!("domain solver: constraints are infeasible before search");
            return None;
        }

        match search.run(domains) {
            Some(assignment) => {
                self.last_solution = Some(problem.solution_from(&assignment));
                self.last_indices = Some(assignment);
                self.last_solution.clone()
            }
            None => {
                if search.timed_out {
                    debug!("domain solver timed out");
                }
                None
            }
        }
    }

    fn last_solution(&self) -> Option<&[(K, V)]> {
        self.last_solution.as_deref()
    }

    fn last_solution_indices(&self) -> Option<&[usize]> {
        self.last_indices.as_deref()
    }
}
