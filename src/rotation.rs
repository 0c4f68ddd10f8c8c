use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    content::{ContentRecord, Dataset},
    foundation::error::{ReelError, ReelResult},
};

/// Shuffled, non-repeating rotation over the dataset keys.
///
/// Every key is shown once per pass; the stack is refilled with a fresh Fisher–Yates
/// shuffle only when it runs empty.
#[derive(Debug)]
pub struct RotationController {
    stack: Vec<String>,
    rng: StdRng,
}

impl RotationController {
    pub fn new(dataset: &Dataset, rng: StdRng) -> Self {
        let mut r = Self {
            stack: Vec::with_capacity(dataset.len()),
            rng,
        };
        r.refill(dataset);
        r
    }

    pub fn seeded(dataset: &Dataset, seed: u64) -> Self {
        Self::new(dataset, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(dataset: &Dataset) -> Self {
        Self::new(dataset, StdRng::from_entropy())
    }

    /// Keys still to be shown in this pass, next one last.
    pub fn remaining(&self) -> &[String] {
        &self.stack
    }

    /// Debug mode always yields the first record in file order and leaves the stack alone.
    pub fn next<'d>(&mut self, dataset: &'d Dataset, debug: bool) -> ReelResult<&'d ContentRecord> {
        if debug {
            return dataset
                .first()
                .ok_or_else(|| ReelError::validation("dataset is empty"));
        }
        if self.stack.is_empty() {
            self.refill(dataset);
            tracing::debug!(keys = self.stack.len(), "reshuffled rotation");
        }
        let key = self
            .stack
            .pop()
            .ok_or_else(|| ReelError::validation("dataset is empty"))?;
        dataset
            .get(&key)
            .ok_or_else(|| ReelError::validation(format!("rumor '{key}' is not in the dataset")))
    }

    fn refill(&mut self, dataset: &Dataset) {
        self.stack.clear();
        self.stack.extend(dataset.keys().map(str::to_string));
        self.stack.shuffle(&mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn dataset(keys: &[&str]) -> Dataset {
        let body = keys
            .iter()
            .map(|k| format!("\"{k}\": {{ \"content\": \"{k} body\" }}"))
            .collect::<Vec<_>>()
            .join(",");
        Dataset::from_json_str(&format!("{{{body}}}")).unwrap()
    }

    #[test]
    fn one_pass_is_a_permutation() {
        let ds = dataset(&["a", "b", "c", "d", "e"]);
        let mut rot = RotationController::seeded(&ds, 7);
        let seen: BTreeSet<String> = (0..ds.len())
            .map(|_| rot.next(&ds, false).unwrap().key.clone())
            .collect();
        assert_eq!(seen.len(), ds.len());
        assert!(rot.remaining().is_empty());
    }

    #[test]
    fn debug_mode_pins_the_first_record() {
        let ds = dataset(&["Rumor A", "Rumor B"]);
        let mut rot = RotationController::seeded(&ds, 1);
        for _ in 0..4 {
            assert_eq!(rot.next(&ds, true).unwrap().key, "Rumor A");
        }
        assert_eq!(rot.remaining().len(), 2);
    }

    #[test]
    fn refill_order_is_deterministic_per_seed() {
        let keys: Vec<String> = (0..20).map(|i| format!("k{i}")).collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let ds = dataset(&refs);
        let a = RotationController::seeded(&ds, 42);
        let b = RotationController::seeded(&ds, 42);
        assert_eq!(a.remaining(), b.remaining());
        let mut sorted = a.remaining().to_vec();
        sorted.sort_unstable();
        let mut expected = keys.clone();
        expected.sort_unstable();
        assert_eq!(sorted, expected);
    }
}
