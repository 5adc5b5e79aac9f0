//! Tag-filtered method counting for annotation-driven engines.
//!
//! Every discovered class is loaded and its test methods are matched
//! against a [`TagFilter`]. Classes that fail to load, and classes with no
//! matching methods, are left out of the result.

use tracing::debug;

use super::{ClassLoader, MethodCounts, TagFilter, class_weight};

/// Computes effective method counts for the discovered classes.
///
/// With `parallel_methods` a class weighs as many units as it has matching
/// test methods; without it, a class with at least one match weighs 1.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use test_allocator::framework::{junit, TagFilter, TestClass, TestDescriptor};
///
/// let mut loader = HashMap::new();
/// loader.insert(
///     "a.LoginTest".to_string(),
///     TestClass::new("a.LoginTest")
///         .with_method(TestDescriptor::test("ok").with_tag("smoke"))
///         .with_method(TestDescriptor::test("slow").with_tag("smoke").with_tag("slow")),
/// );
///
/// let filter = TagFilter::new(
///     ["smoke".to_string()].into(),
///     ["slow".to_string()].into(),
/// );
/// let counts = junit::count_methods(&["a.LoginTest".to_string()], &loader, &filter, true);
/// assert_eq!(counts["a.LoginTest"], 1);
/// ```
pub fn count_methods<L: ClassLoader>(
    class_names: &[String],
    loader: &L,
    filter: &TagFilter,
    parallel_methods: bool,
) -> MethodCounts {
    let mut counts = MethodCounts::new();

    for class_name in class_names {
        let Some(class) = loader.load(class_name) else {
            debug!("Skipping {}: class could not be loaded", class_name);
            continue;
        };

        let matching = class
            .test_methods()
            .filter(|m| filter.matches(&m.tags))
            .count();

        if matching == 0 {
            debug!("Skipping {}: no matching test methods", class_name);
            continue;
        }

        let weight = class_weight(matching, parallel_methods);
        debug!(
            "{}: {} matching test methods, weight {}",
            class_name, matching, weight
        );
        // Discovery can report the same identifier twice; the class is one unit.
        counts.insert(class_name.clone(), weight);
    }

    counts
}
