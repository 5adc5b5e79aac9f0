//! Allocation reporting and output generation.
//!
//! - [`manifest`]: the JSON manifest handed to CI
//! - [`ConsoleReporter`]: a human-readable summary of an allocation

pub mod manifest;

use std::fmt::Write as _;

pub use manifest::{AllocationManifest, ManifestEntry, ManifestError};

use crate::orchestrator::AllocationOutcome;

/// Console reporter that summarizes an allocation in the terminal.
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter.
    ///
    /// In verbose mode every class of every bucket is listed.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Renders the summary as text.
    pub fn render(&self, outcome: &AllocationOutcome) -> String {
        let mut out = String::new();
        let manifest = &outcome.manifest;

        let _ = writeln!(out, "Test Allocation ({}):", outcome.engine);
        let _ = writeln!(out, "  Class files: {}", outcome.class_files);
        let _ = writeln!(out, "  Allocated:   {}", outcome.counts.len());
        let _ = writeln!(out, "  Methods:     {}", manifest.total_methods());
        let policy = if outcome.packed {
            console::style("packed").yellow()
        } else {
            console::style("one per class").green()
        };
        let _ = writeln!(out, "  Buckets:     {} ({})", manifest.len(), policy);

        if manifest.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{}",
                console::style("No test classes to allocate.").yellow().bold()
            );
            return out;
        }

        let _ = writeln!(out);
        for entry in &manifest.entries {
            let _ = writeln!(
                out,
                "  job {:>3}  {:>5} methods  {} classes",
                console::style(entry.job_index).cyan(),
                entry.total_methods,
                entry.classes.len()
            );
            if self.verbose {
                for class in &entry.classes {
                    let count = outcome.counts.get(class).copied().unwrap_or_default();
                    let _ = writeln!(out, "      {} {}", class, console::style(count).dim());
                }
            }
        }

        if let Some(path) = &outcome.manifest_path {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{} {}",
                console::style("Wrote").green().bold(),
                path.display()
            );
        }

        out
    }

    /// Prints the summary to stdout.
    pub fn report(&self, outcome: &AllocationOutcome) {
        print!("{}", self.render(outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineKind;
    use crate::framework::MethodCounts;
    use crate::orchestrator::TestBucket;

    fn outcome() -> AllocationOutcome {
        let counts: MethodCounts = [("com.acme.A".to_string(), 4), ("com.acme.B".to_string(), 2)]
            .into_iter()
            .collect();
        let buckets = vec![TestBucket::from_classes([("com.acme.A", 4), ("com.acme.B", 2)])];
        AllocationOutcome {
            engine: EngineKind::Junit,
            class_files: 3,
            counts,
            packed: true,
            manifest: AllocationManifest::from_buckets(&buckets),
            manifest_path: Some("build/allocation.json".into()),
        }
    }

    #[test]
    fn test_render_summary() {
        console::set_colors_enabled(false);
        let text = ConsoleReporter::new(false).render(&outcome());
        assert!(text.contains("Test Allocation (junit)"));
        assert!(text.contains("Class files: 3"));
        assert!(text.contains("Buckets:     1 (packed)"));
        assert!(text.contains("build/allocation.json"));
        assert!(!text.contains("com.acme.A"));
    }

    #[test]
    fn test_render_verbose_lists_classes() {
        console::set_colors_enabled(false);
        let text = ConsoleReporter::new(true).render(&outcome());
        assert!(text.contains("com.acme.A 4"));
        assert!(text.contains("com.acme.B 2"));
    }

    #[test]
    fn test_render_empty() {
        console::set_colors_enabled(false);
        let mut empty = outcome();
        empty.counts.clear();
        empty.manifest = AllocationManifest::default();
        let text = ConsoleReporter::new(false).render(&empty);
        assert!(text.contains("No test classes to allocate."));
    }
}
