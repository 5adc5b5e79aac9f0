//! Suite-membership method counting for suite-file-driven engines.
//!
//! Classes are taken from the suite files under the project root rather
//! than from class discovery. Only suites whose name is configured
//! contribute. A class referenced several times (several tests, several
//! suites, several files) accumulates the sum of its contributions.

use tracing::{debug, info, warn};

use super::suite::{self, ClassRef, SuiteResult};
use super::{ClassLoader, MethodCounts, SuiteSelection, TestClass, class_weight};

/// Computes effective method counts from the configured suites.
///
/// # Errors
///
/// Fails when the project tree cannot be searched or any suite file is
/// not well-formed. A class that cannot be loaded is skipped silently.
pub fn count_methods<L: ClassLoader>(
    selection: &SuiteSelection,
    loader: &L,
    parallel_methods: bool,
) -> SuiteResult<MethodCounts> {
    if selection.suites.is_empty() {
        warn!("No suites configured; no classes will be allocated");
    }

    let files = suite::find_suite_files(&selection.project_root)?;
    info!(
        "Found {} suite files under {}",
        files.len(),
        selection.project_root.display()
    );

    let mut counts = MethodCounts::new();
    for file in &files {
        // Every file is parsed, so a broken file fails the run even when
        // it holds no selected suite.
        let suites = suite::parse_suite_file(file)?;
        for suite in suites
            .iter()
            .filter(|s| selection.suites.contains(&s.name))
        {
            debug!("Processing suite '{}' from {}", suite.name, file.display());
            for test in &suite.tests {
                for class_ref in &test.classes {
                    accumulate(class_ref, loader, parallel_methods, &mut counts);
                }
            }
        }
    }

    Ok(counts)
}

fn accumulate<L: ClassLoader>(
    class_ref: &ClassRef,
    loader: &L,
    parallel_methods: bool,
    counts: &mut MethodCounts,
) {
    let Some(class) = loader.load(&class_ref.name) else {
        debug!("Skipping {}: class could not be loaded", class_ref.name);
        return;
    };

    let contribution = match &class_ref.included_methods {
        Some(includes) => count_included_methods(&class, includes),
        None => class_weight(class.test_methods().count(), parallel_methods),
    };

    *counts.entry(class_ref.name.clone()).or_insert(0) += contribution;
}

/// Counts declared test methods named by the include list.
///
/// Names match exactly. Each include entry counts every declared test
/// method with that name; a name with no such method counts nothing.
fn count_included_methods(class: &TestClass, includes: &[String]) -> usize {
    includes
        .iter()
        .map(|name| class.test_methods().filter(|m| &m.name == name).count())
        .sum()
}
