use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use failure::{format_err, Error};
use rand::prelude::*;
use rand_pcg::Pcg32;

/// Shared index-space bookkeeping for all solver backends.  Keys and values
/// are held in (optionally pre-shuffled) order; constraints are stored as
/// index sets so duplicated values stay unambiguous.
pub struct Problem<K, V> {
    pub keys: Vec<K>,
    pub values: Vec<V>,
    /// (key index, value index) pairs that may not be assigned.
    pub forbidden: BTreeSet<(usize, usize)>,
    /// key index -> allowed occurrence indices (any one of them).
    pub required: BTreeMap<usize, Vec<usize>>,
    /// (key indices, value indices): at least one key takes one value.
    pub at_least_one: Vec<(Vec<usize>, Vec<usize>)>,
    /// Whole assignments to reject, as (key index, expected value) pairs.
    pub forbidden_solutions: Vec<Vec<(usize, V)>>,
}

impl<K, V> Problem<K, V>
where
    K: Clone + PartialEq + Debug,
    V: Clone + PartialEq + Debug,
{
    pub fn new(mut keys: Vec<K>, mut values: Vec<V>, shuffle_seed: Option<u64>) -> Problem<K, V> {
        debug_assert_eq!(keys.len(), values.len());
        if let Some(seed) = shuffle_seed {
            let mut rng = Pcg32::seed_from_u64(seed);
            keys.shuffle(&mut rng);
            values.shuffle(&mut rng);
        }
        Problem {
            keys,
            values,
            forbidden: BTreeSet::new(),
            required: BTreeMap::new(),
            at_least_one: Vec::new(),
            forbidden_solutions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn key_index(&self, key: &K) -> Result<usize, Error> {
        self.keys
            .iter()
            .position(|k| k == key)
            .ok_or_else(|| format_err!("key {:?} is not in the problem", key))
    }

    pub fn value_occurrences(&self, value: &V) -> Result<Vec<usize>, Error> {
        let occurrences: Vec<usize> = self
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| *v == value)
            .map(|(i, _)| i)
            .collect();
        if occurrences.is_empty() {
            return Err(format_err!("value {:?} is not in the problem", value));
        }
        Ok(occurrences)
    }

    pub fn require(&mut self, key: &K, value: &V) -> Result<(), Error> {
        let key_idx = self.key_index(key)?;
        let occurrences = self.value_occurrences(value)?;
        self.required.insert(key_idx, occurrences);
        Ok(())
    }

    pub fn forbid(&mut self, key: &K, value: &V) -> Result<(), Error> {
        let key_idx = self.key_index(key)?;
        for value_idx in self.value_occurrences(value)? {
            self.forbidden.insert((key_idx, value_idx));
        }
        Ok(())
    }

    pub fn at_least_one_of(&mut self, keys: &[K], values: &[V]) -> Result<(), Error> {
        if keys.is_empty() || values.is_empty() {
            return Err(format_err!("at_least_one_of requires keys and values"));
        }
        let mut key_indices = Vec::new();
        for key in keys {
            let idx = self.key_index(key)?;
            if !key_indices.contains(&idx) {
                key_indices.push(idx);
            }
        }
        let mut value_indices = Vec::new();
        for value in values {
            for idx in self.value_occurrences(value)? {
                if !value_indices.contains(&idx) {
                    value_indices.push(idx);
                }
            }
        }
        self.at_least_one.push((key_indices, value_indices));
        Ok(())
    }

    pub fn add_forbidden_solution(&mut self, solution: &[(K, V)]) {
        let mut by_index = Vec::new();
        for (key, value) in solution {
            if let Ok(key_idx) = self.key_index(key) {
                by_index.push((key_idx, value.clone()));
            }
        }
        self.forbidden_solutions.push(by_index);
    }

    /// Whether assigning `value_idx` to `key_idx` is locally allowed.
    pub fn pair_allowed(&self, key_idx: usize, value_idx: usize) -> bool {
        if self.forbidden.contains(&(key_idx, value_idx)) {
            return false;
        }
        match self.required.get(&key_idx) {
            Some(occurrences) => occurrences.contains(&value_idx),
            None => true,
        }
    }

    /// Full-assignment check: pair constraints, at-least-one constraints and
    /// forbidden whole solutions.  `assignment[key_idx] == value_idx`.
    pub fn check_assignment(&self, assignment: &[usize]) -> bool {
        for (key_idx, &value_idx) in assignment.iter().enumerate() {
            if !self.pair_allowed(key_idx, value_idx) {
                return false;
            }
        }
        for (key_indices, value_indices) in &self.at_least_one {
            let hit = key_indices
                .iter()
                .any(|&key_idx| value_indices.contains(&assignment[key_idx]));
            if !hit {
                return false;
            }
        }
        for forbidden in &self.forbidden_solutions {
            let matches = forbidden
                .iter()
                .all(|(key_idx, value)| &self.values[assignment[*key_idx]] == value);
            if matches && !forbidden.is_empty() {
                return false;
            }
        }
        true
    }

    /// The at-least-one check alone, for backends that enforce pair
    /// constraints during search.
    pub fn check_global_constraints(&self, assignment: &[usize]) -> bool {
        for (key_indices, value_indices) in &self.at_least_one {
            let hit = key_indices
                .iter()
                .any(|&key_idx| value_indices.contains(&assignment[key_idx]));
            if !hit {
                return false;
            }
        }
        for forbidden in &self.forbidden_solutions {
            let matches = forbidden
                .iter()
                .all(|(key_idx, value)| &self.values[assignment[*key_idx]] == value);
            if matches && !forbidden.is_empty() {
                return false;
            }
        }
        true
    }

    pub fn solution_from(&self, assignment: &[usize]) -> Vec<(K, V)> {
        assignment
            .iter()
            .enumerate()
            .map(|(key_idx, &value_idx)| {
                (
                    self.keys[key_idx].clone(),
                    self.values[value_idx].clone(),
                )
            })
            .collect()
    }
}
