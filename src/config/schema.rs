//! Configuration schema definitions for test-allocator.
//!
//! This module defines all configuration types that can be deserialized from
//! TOML configuration files. Engine-specific filters live in their own
//! sections and only the section matching `allocator.engine` is consulted.
//!
//! # Schema Overview
//!
//! ```text
//! Config (root)
//! ├── AllocatorConfig        - Core settings (engine, bucket size, runners, paths)
//! ├── JunitConfig            - Tag filters for annotation-driven engines
//! └── TestngConfig           - Suite names for suite-file-driven engines
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration structure for test-allocator.
///
/// # TOML Structure
///
/// ```toml
/// [allocator]
/// engine = "junit"
/// max_methods_per_bucket = 20
/// max_parallel_runners = 5
///
/// [junit]
/// include_tags = ["smoke"]
/// exclude_tags = ["slow"]
///
/// [testng]
/// suites = ["regression"]
/// ```
///
/// # Example
///
/// ```
/// use test_allocator::config::Config;
///
/// let config: Config = toml::from_str(r#"
///     [allocator]
///     engine = "testng"
///
///     [testng]
///     suites = ["smoke-suite"]
/// "#).unwrap();
/// assert_eq!(config.allocator.engine, "testng");
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Core allocation settings.
    #[serde(default)]
    pub allocator: AllocatorConfig,

    /// Tag filters used when the engine is `junit`.
    #[serde(default)]
    pub junit: JunitConfig,

    /// Suite selection used when the engine is `testng`.
    #[serde(default)]
    pub testng: TestngConfig,
}

/// Core allocation settings.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `enabled` | true |
/// | `engine` | `"junit"` |
/// | `max_methods_per_bucket` | 20 |
/// | `max_parallel_runners` | 10 |
/// | `parallel_methods` | true |
/// | `test_output_dir` | `target/test-classes` |
/// | `classpath` | `["target/test-classes"]` |
/// | `project_root` | `.` |
/// | `output` | `target/test-allocation` |
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllocatorConfig {
    /// When false the allocation run is skipped entirely.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Test engine name, `junit` or `testng` (case-insensitive).
    ///
    /// Kept as a string so that an unsupported value is rejected by the
    /// orchestrator with a typed error rather than by the TOML parser.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Upper bound on the effective method count of a packed bucket.
    ///
    /// A single class larger than this still gets its own bucket.
    #[serde(default = "default_max_methods")]
    pub max_methods_per_bucket: usize,

    /// Number of parallel CI runners available.
    ///
    /// When the number of classes does not exceed this, every class gets
    /// its own bucket and `max_methods_per_bucket` is not consulted.
    #[serde(default = "default_max_runners")]
    pub max_parallel_runners: usize,

    /// Weight classes by their matching test methods (true) or count each
    /// class as a single unit (false).
    #[serde(default = "default_parallel_methods")]
    pub parallel_methods: bool,

    /// Directory holding compiled test classes, scanned for `.class` files.
    #[serde(default = "default_test_output_dir")]
    pub test_output_dir: PathBuf,

    /// Classpath elements holding test-index metadata.
    ///
    /// Each element is either a `test-index.json` file or a directory that
    /// may contain one.
    #[serde(default = "default_classpath")]
    pub classpath: Vec<PathBuf>,

    /// Root searched recursively for suite XML files (testng engine).
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Manifest destination. `.json` is appended when missing.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            engine: default_engine(),
            max_methods_per_bucket: default_max_methods(),
            max_parallel_runners: default_max_runners(),
            parallel_methods: default_parallel_methods(),
            test_output_dir: default_test_output_dir(),
            classpath: default_classpath(),
            project_root: default_project_root(),
            output: default_output(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_engine() -> String {
    "junit".to_string()
}

fn default_max_methods() -> usize {
    20
}

fn default_max_runners() -> usize {
    10
}

fn default_parallel_methods() -> bool {
    true
}

fn default_test_output_dir() -> PathBuf {
    PathBuf::from("target/test-classes")
}

fn default_classpath() -> Vec<PathBuf> {
    vec![default_test_output_dir()]
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_output() -> PathBuf {
    PathBuf::from("target/test-allocation")
}

/// Tag filters for annotation-driven engines.
///
/// ```toml
/// [junit]
/// include_tags = ["smoke", "integration"]
/// exclude_tags = ["slow"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JunitConfig {
    /// Only methods carrying at least one of these tags are counted.
    /// Empty means every test method is a candidate.
    #[serde(default)]
    pub include_tags: BTreeSet<String>,

    /// Methods carrying any of these tags are never counted.
    #[serde(default)]
    pub exclude_tags: BTreeSet<String>,
}

/// Suite selection for suite-file-driven engines.
///
/// ```toml
/// [testng]
/// suites = ["smoke-suite", "regression-suite"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TestngConfig {
    /// Names of the suites whose classes are allocated. Matching is exact.
    #[serde(default)]
    pub suites: BTreeSet<String>,
}

/// Supported test engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Annotation/tag driven (JUnit 5 style).
    Junit,
    /// Suite XML driven (TestNG style).
    Testng,
}

impl EngineKind {
    /// Lowercase engine name as it appears in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Junit => "junit",
            EngineKind::Testng => "testng",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when an engine name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported test engine: '{0}' (expected 'junit' or 'testng')")]
pub struct UnsupportedEngine(pub String);

impl FromStr for EngineKind {
    type Err = UnsupportedEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "junit" => Ok(EngineKind::Junit),
            "testng" => Ok(EngineKind::Testng),
            _ => Err(UnsupportedEngine(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.allocator.enabled);
        assert_eq!(config.allocator.engine, "junit");
        assert_eq!(config.allocator.max_methods_per_bucket, 20);
        assert_eq!(config.allocator.max_parallel_runners, 10);
        assert!(config.allocator.parallel_methods);
        assert!(config.junit.include_tags.is_empty());
        assert!(config.testng.suites.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r#"
            [allocator]
            enabled = false
            engine = "TESTNG"
            max_methods_per_bucket = 0
            max_parallel_runners = 1
            parallel_methods = false
            test_output_dir = "build/classes/java/test"
            classpath = ["build/classes/java/test", "build/test-index.json"]
            project_root = "C:\\work\\project"
            output = "ci/allocation"

            [junit]
            include_tags = ["smoke", "it"]
            exclude_tags = ["slow"]

            [testng]
            suites = ["Regression Suite", "smoke-suite"]
            "#,
        )
        .unwrap();

        assert!(!config.allocator.enabled);
        assert_eq!(config.allocator.max_methods_per_bucket, 0);
        assert_eq!(config.allocator.classpath.len(), 2);
        assert_eq!(
            config.allocator.project_root,
            PathBuf::from("C:\\work\\project")
        );
        assert!(config.junit.include_tags.contains("it"));
        assert!(config.testng.suites.contains("Regression Suite"));
    }

    #[test]
    fn test_engine_from_str_is_case_insensitive() {
        assert_eq!("junit".parse::<EngineKind>().unwrap(), EngineKind::Junit);
        assert_eq!("TESTNG".parse::<EngineKind>().unwrap(), EngineKind::Testng);
        assert_eq!(" TestNG ".parse::<EngineKind>().unwrap(), EngineKind::Testng);
    }

    #[test]
    fn test_engine_rejects_unknown() {
        for name in ["cucumber", "spock", "unknown", ""] {
            let err = name.parse::<EngineKind>().unwrap_err();
            assert_eq!(err.0, name);
        }
    }

    #[test]
    fn test_suite_names_preserve_case() {
        let config: Config = toml::from_str(
            r#"
            [testng]
            suites = ["Smoke", "smoke"]
            "#,
        )
        .unwrap();
        assert_eq!(config.testng.suites.len(), 2);
    }
}
