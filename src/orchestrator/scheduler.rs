//! Bucket scheduling.
//!
//! This module turns effective method counts into buckets, the groups of
//! classes a single CI runner executes together.
//!
//! # Scheduling Strategies
//!
//! | Function | Description | Used when |
//! |----------|-------------|-----------|
//! | [`one_bucket_per_class`] | Every class alone | Classes fit within the runner budget |
//! | [`group_classes`] | First-fit decreasing by method count | More classes than runners |
//!
//! [`Scheduler::schedule`] picks between the two.
//!
//! # Example
//!
//! ```
//! use test_allocator::framework::MethodCounts;
//! use test_allocator::orchestrator::scheduler::group_classes;
//!
//! let counts: MethodCounts = [("Class1", 12), ("Class2", 10), ("Class3", 5)]
//!     .into_iter()
//!     .map(|(name, count)| (name.to_string(), count))
//!     .collect();
//!
//! let buckets = group_classes(&counts, 15);
//! assert_eq!(buckets.len(), 2);
//! assert_eq!(buckets[0].class_names(), ["Class1"]);
//! assert_eq!(buckets[1].class_names(), ["Class2", "Class3"]);
//! assert_eq!(buckets[1].total_methods(), 15);
//! ```

use serde::Serialize;

use crate::framework::MethodCounts;

/// A group of classes assigned to one runner.
///
/// The total always equals the sum of the member counts; buckets are only
/// built through [`TestBucket::from_classes`] or the schedulers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestBucket {
    class_names: Vec<String>,
    total_methods: usize,
}

impl TestBucket {
    /// Builds a bucket from `(class, count)` pairs, in order.
    pub fn from_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut bucket = Self::default();
        for (name, count) in classes {
            bucket.push(name.into(), count);
        }
        bucket
    }

    fn push(&mut self, class_name: String, count: usize) {
        self.class_names.push(class_name);
        self.total_methods += count;
    }

    /// Class identifiers, in insertion order.
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Sum of the member classes' effective method counts.
    pub fn total_methods(&self) -> usize {
        self.total_methods
    }

    pub fn len(&self) -> usize {
        self.class_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_names.is_empty()
    }
}

/// Packs classes into buckets of at most `max_per_bucket` methods.
///
/// Classes are taken largest first (ties keep map order) and appended to a
/// single open bucket while they fit; a class that does not fit closes the
/// bucket and opens the next one. A class larger than `max_per_bucket`
/// ends up alone in its bucket. Zero-count classes are placed like any
/// other. With `max_per_bucket == 0` every class with a positive count is
/// isolated.
pub fn group_classes(counts: &MethodCounts, max_per_bucket: usize) -> Vec<TestBucket> {
    let mut entries: Vec<(&String, usize)> = counts.iter().map(|(k, v)| (k, *v)).collect();
    // Stable, so equal counts keep their relative order.
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    let mut buckets = Vec::new();
    let mut current = TestBucket::default();

    for (class_name, count) in entries {
        if current.total_methods + count <= max_per_bucket {
            current.push(class_name.clone(), count);
        } else {
            if !current.is_empty() {
                buckets.push(std::mem::take(&mut current));
            }
            current.push(class_name.clone(), count);
        }
    }

    if !current.is_empty() {
        buckets.push(current);
    }

    buckets
}

/// One bucket per class, in map order.
pub fn one_bucket_per_class(counts: &MethodCounts) -> Vec<TestBucket> {
    counts
        .iter()
        .map(|(name, count)| TestBucket::from_classes([(name.clone(), *count)]))
        .collect()
}

/// Chooses the allocation policy for a set of method counts.
///
/// The scheduler doesn't know about runners themselves; it only decides
/// how many buckets to cut and what goes in each.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    max_parallel_runners: usize,
    max_methods_per_bucket: usize,
}

impl Scheduler {
    /// Creates a scheduler for the given runner budget and bucket capacity.
    pub fn new(max_parallel_runners: usize, max_methods_per_bucket: usize) -> Self {
        Self {
            max_parallel_runners,
            max_methods_per_bucket,
        }
    }

    /// Returns true when every class can have a runner of its own.
    pub fn fits_runner_budget(&self, counts: &MethodCounts) -> bool {
        counts.len() <= self.max_parallel_runners
    }

    /// Allocates buckets.
    ///
    /// When the number of classes does not exceed the runner budget each
    /// class gets its own bucket and the bucket capacity is ignored.
    /// Otherwise classes are packed with [`group_classes`].
    pub fn schedule(&self, counts: &MethodCounts) -> Vec<TestBucket> {
        if self.fits_runner_budget(counts) {
            one_bucket_per_class(counts)
        } else {
            group_classes(counts, self.max_methods_per_bucket)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn counts(entries: &[(&str, usize)]) -> MethodCounts {
        entries
            .iter()
            .map(|(name, count)| (name.to_string(), *count))
            .collect()
    }

    fn shape(buckets: &[TestBucket]) -> Vec<(Vec<&str>, usize)> {
        buckets
            .iter()
            .map(|b| {
                (
                    b.class_names().iter().map(String::as_str).collect(),
                    b.total_methods(),
                )
            })
            .collect()
    }

    fn assert_invariants(input: &MethodCounts, buckets: &[TestBucket], max: usize) {
        let total: usize = buckets.iter().map(TestBucket::total_methods).sum();
        assert_eq!(total, input.values().sum::<usize>());

        let mut seen = HashSet::new();
        for bucket in buckets {
            assert!(!bucket.is_empty());
            assert!(bucket.total_methods() <= max || bucket.len() == 1);
            let member_sum: usize = bucket.class_names().iter().map(|c| input[c]).sum();
            assert_eq!(member_sum, bucket.total_methods());
            for class in bucket.class_names() {
                assert!(seen.insert(class.clone()), "{} placed twice", class);
            }
        }
        assert_eq!(seen.len(), input.len());
    }

    #[test]
    fn test_single_bucket_when_all_fit() {
        let input = counts(&[("A", 5), ("B", 3), ("C", 2)]);
        let buckets = group_classes(&input, 20);
        assert_eq!(shape(&buckets), vec![(vec!["A", "B", "C"], 10)]);
    }

    #[test]
    fn test_descending_first_fit() {
        let input = counts(&[("A", 10), ("B", 15), ("C", 12)]);
        let buckets = group_classes(&input, 20);
        assert_eq!(
            shape(&buckets),
            vec![(vec!["B"], 15), (vec!["C"], 12), (vec!["A"], 10)]
        );
        assert_invariants(&input, &buckets, 20);
    }

    #[test]
    fn test_small_class_joins_open_bucket() {
        let input = counts(&[("Class1", 12), ("Class2", 10), ("Class3", 5)]);
        let buckets = group_classes(&input, 15);
        assert_eq!(
            shape(&buckets),
            vec![(vec!["Class1"], 12), (vec!["Class2", "Class3"], 15)]
        );
    }

    #[test]
    fn test_oversized_class_gets_own_bucket() {
        let input = counts(&[("Huge", 50), ("Small", 3), ("Tiny", 1)]);
        let buckets = group_classes(&input, 10);
        assert_eq!(
            shape(&buckets),
            vec![(vec!["Huge"], 50), (vec!["Small", "Tiny"], 4)]
        );
        assert_invariants(&input, &buckets, 10);
    }

    #[test]
    fn test_multiple_large_classes() {
        let input = counts(&[("A", 30), ("B", 25), ("C", 40)]);
        let buckets = group_classes(&input, 20);
        assert_eq!(
            shape(&buckets),
            vec![(vec!["C"], 40), (vec!["A"], 30), (vec!["B"], 25)]
        );
    }

    #[test]
    fn test_exact_fit() {
        let input = counts(&[("A", 10), ("B", 10), ("C", 10), ("D", 10)]);
        let buckets = group_classes(&input, 20);
        assert_eq!(
            shape(&buckets),
            vec![(vec!["A", "B"], 20), (vec!["C", "D"], 20)]
        );
    }

    #[test]
    fn test_ties_keep_map_order() {
        let input = counts(&[("b", 4), ("a", 4), ("c", 4)]);
        let buckets = group_classes(&input, 8);
        assert_eq!(shape(&buckets), vec![(vec!["a", "b"], 8), (vec!["c"], 4)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_classes(&MethodCounts::new(), 10).is_empty());
        assert!(one_bucket_per_class(&MethodCounts::new()).is_empty());
    }

    #[test]
    fn test_single_class() {
        let input = counts(&[("Only", 7)]);
        assert_eq!(shape(&group_classes(&input, 5)), vec![(vec!["Only"], 7)]);
    }

    #[test]
    fn test_zero_count_classes_are_kept() {
        let input = counts(&[("Empty", 0), ("Full", 20)]);
        let buckets = group_classes(&input, 20);
        assert_eq!(shape(&buckets), vec![(vec!["Full", "Empty"], 20)]);

        let buckets = group_classes(&input, 10);
        assert_eq!(shape(&buckets), vec![(vec!["Full"], 20), (vec!["Empty"], 0)]);
        assert_invariants(&input, &buckets, 10);
    }

    #[test]
    fn test_zero_capacity_isolates_positive_classes() {
        let input = counts(&[("A", 1), ("B", 2), ("C", 0)]);
        let buckets = group_classes(&input, 0);
        assert_eq!(
            shape(&buckets),
            vec![(vec!["B"], 2), (vec!["A"], 1), (vec!["C"], 0)]
        );
        assert_invariants(&input, &buckets, 0);
    }

    #[test]
    fn test_deterministic() {
        let input = counts(&[("A", 3), ("B", 9), ("C", 3), ("D", 7), ("E", 1)]);
        assert_eq!(group_classes(&input, 10), group_classes(&input, 10));
    }

    #[test]
    fn test_invariants_on_random_inputs() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let size = rng.gen_range(1..40);
            let input: MethodCounts = (0..size)
                .map(|i| (format!("com.acme.Test{i}"), rng.gen_range(0..30)))
                .collect();
            let max = rng.gen_range(0..25);
            let buckets = group_classes(&input, max);
            assert_invariants(&input, &buckets, max);
        }
    }

    #[test]
    fn test_from_classes_sums_counts() {
        let bucket = TestBucket::from_classes([("com.acme.A", 3), ("com.acme.B$Inner", 4)]);
        assert_eq!(bucket.class_names(), ["com.acme.A", "com.acme.B$Inner"]);
        assert_eq!(bucket.total_methods(), 7);
        assert_eq!(TestBucket::from_classes(Vec::<(String, usize)>::new()).len(), 0);
    }

    #[test]
    fn test_scheduler_bypasses_packing_within_runner_budget() {
        let input = counts(&[("TestClass1", 5), ("TestClass2", 8), ("TestClass3", 3)]);
        let buckets = Scheduler::new(10, 1).schedule(&input);
        assert_eq!(buckets.len(), 3);
        assert!(buckets.iter().all(|b| b.len() == 1));
    }

    #[test]
    fn test_scheduler_packs_over_runner_budget() {
        let input = counts(&[
            ("TestClass1", 5),
            ("TestClass2", 8),
            ("TestClass3", 3),
            ("TestClass4", 6),
            ("TestClass5", 4),
        ]);
        let buckets = Scheduler::new(2, 10).schedule(&input);
        assert_eq!(
            shape(&buckets),
            vec![
                (vec!["TestClass2"], 8),
                (vec!["TestClass4"], 6),
                (vec!["TestClass1", "TestClass5"], 9),
                (vec!["TestClass3"], 3),
            ]
        );
    }

    #[test]
    fn test_scheduler_boundary() {
        let input = counts(&[("A", 1), ("B", 1)]);
        assert!(Scheduler::new(2, 10).fits_runner_budget(&input));
        assert!(!Scheduler::new(1, 10).fits_runner_budget(&input));
        assert_eq!(Scheduler::new(1, 10).schedule(&input).len(), 1);
    }
}
