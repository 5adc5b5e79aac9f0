//! Allocation orchestration.
//!
//! The [`Allocator`] drives one allocation run:
//!
//! ```text
//! Config ──► Engine ──► ClassCatalog ──► discover ──► count_methods
//!                                                        │
//!                              manifest ◄── Scheduler ◄──┘
//! ```
//!
//! Soft conditions (a class that cannot be loaded, an include naming a
//! method that does not exist) are absorbed by the strategies. Everything
//! else is fatal and surfaces as an [`AllocationError`] naming the stage
//! and the input that failed.
//!
//! # Example
//!
//! ```no_run
//! use test_allocator::config::load_config;
//! use test_allocator::orchestrator::Allocator;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("test-allocator.toml"))?;
//! if let Some(outcome) = Allocator::new(config).run()? {
//!     println!("{} jobs", outcome.manifest.len());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod scheduler;

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::{self, Config, EngineKind, UnsupportedEngine};
use crate::discovery::{self, ClassCatalog, ClasspathError, DiscoveryError};
use crate::framework::{ClassLoader, Engine, MethodCounts, SuiteError};
use crate::report::manifest::{self, AllocationManifest, ManifestError};

pub use scheduler::{Scheduler, TestBucket};

/// Result type for allocation runs.
pub type AllocationResult<T> = Result<T, AllocationError>;

/// Fatal allocation failures, by stage.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    /// The configured engine is not supported. Raised before any I/O.
    #[error(transparent)]
    UnsupportedEngine(#[from] UnsupportedEngine),

    /// The classpath could not be resolved. Raised before discovery.
    #[error("Failed to resolve test classpath")]
    Classpath(#[from] ClasspathError),

    /// The test output directory could not be scanned.
    #[error("Failed to discover test classes")]
    Discovery(#[from] DiscoveryError),

    /// A suite file could not be located or parsed.
    #[error("Failed to read test suites")]
    Suites(#[from] SuiteError),

    /// The manifest could not be written.
    #[error("Failed to write allocation manifest")]
    Manifest(#[from] ManifestError),
}

/// Everything an allocation run produced.
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub engine: EngineKind,

    /// Number of class files found under the test output directory.
    pub class_files: usize,

    /// Effective method count per allocated class.
    pub counts: MethodCounts,

    /// Whether classes were packed (true) or given one bucket each.
    pub packed: bool,

    pub manifest: AllocationManifest,

    /// Where the manifest was written, `None` for a dry run.
    pub manifest_path: Option<PathBuf>,
}

/// Allocates buckets for a set of method counts.
///
/// Classes that fit within `max_parallel_runners` each get a bucket;
/// otherwise they are packed up to `max_methods_per_bucket`.
pub fn allocate_counts(
    counts: &MethodCounts,
    max_parallel_runners: usize,
    max_methods_per_bucket: usize,
) -> Vec<TestBucket> {
    Scheduler::new(max_parallel_runners, max_methods_per_bucket).schedule(counts)
}

/// Runs allocation for one configuration.
pub struct Allocator {
    config: Config,
}

impl Allocator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs allocation and writes the manifest.
    ///
    /// Returns `Ok(None)` without touching the filesystem when allocation
    /// is disabled.
    pub fn run(&self) -> AllocationResult<Option<AllocationOutcome>> {
        if !self.config.allocator.enabled {
            info!("Disabled. Skipping test allocation");
            return Ok(None);
        }

        let mut outcome = self.plan()?;
        let path = manifest::manifest_path(&config::expand_path(&self.config.allocator.output));
        outcome.manifest.write_to(&path)?;
        info!(
            "Wrote {} buckets to {}",
            outcome.manifest.len(),
            path.display()
        );
        outcome.manifest_path = Some(path);
        Ok(Some(outcome))
    }

    /// Computes the allocation without writing anything.
    ///
    /// Runs regardless of the `enabled` flag.
    pub fn plan(&self) -> AllocationResult<AllocationOutcome> {
        self.log_configuration();

        let engine = Engine::from_config(&self.config)?;

        let classpath: Vec<PathBuf> = self
            .config
            .allocator
            .classpath
            .iter()
            .map(|p| config::expand_path(p))
            .collect();
        let catalog = ClassCatalog::from_classpath(&classpath)?;
        info!("Loaded test index with {} classes", catalog.len());

        self.plan_with(&engine, &catalog)
    }

    /// Computes the allocation with an explicit engine and class loader.
    pub fn plan_with<L: ClassLoader>(
        &self,
        engine: &Engine,
        loader: &L,
    ) -> AllocationResult<AllocationOutcome> {
        let settings = &self.config.allocator;
        info!("Starting test splitting with engine {}", engine.kind());

        let test_output_dir = config::expand_path(&settings.test_output_dir);
        let class_names = discovery::discover(&test_output_dir)?;
        info!(
            "Found {} class files in {}",
            class_names.len(),
            test_output_dir.display()
        );

        let counts = engine.count_methods(&class_names, loader, settings.parallel_methods)?;
        info!("classMethodCount size={}", counts.len());
        if counts.is_empty() {
            warn!("No test classes matched the configured filters");
        }

        let scheduler = Scheduler::new(
            settings.max_parallel_runners,
            settings.max_methods_per_bucket,
        );
        let packed = !scheduler.fits_runner_budget(&counts);
        if packed {
            info!(
                "{} classes exceed {} runners; packing up to {} methods per bucket",
                counts.len(),
                settings.max_parallel_runners,
                settings.max_methods_per_bucket
            );
        } else {
            info!(
                "{} classes fit within {} runners; one bucket per class",
                counts.len(),
                settings.max_parallel_runners
            );
        }
        let buckets = scheduler.schedule(&counts);

        Ok(AllocationOutcome {
            engine: engine.kind(),
            class_files: class_names.len(),
            counts,
            packed,
            manifest: AllocationManifest::from_buckets(&buckets),
            manifest_path: None,
        })
    }

    fn log_configuration(&self) {
        let settings = &self.config.allocator;
        info!("testEngine = {}", settings.engine);
        info!("maxMethods = {}", settings.max_methods_per_bucket);
        info!("maxNumberOfParallelRunners = {}", settings.max_parallel_runners);
        info!("parallelMethods = {}", settings.parallel_methods);
        info!("testOutputDir = {}", settings.test_output_dir.display());
        info!("outputJsonFile = {}", settings.output.display());
        match settings.engine.parse::<EngineKind>() {
            Ok(EngineKind::Junit) => {
                info!("tagsInclude = {:?}", self.config.junit.include_tags);
                info!("tagsExclude = {:?}", self.config.junit.exclude_tags);
            }
            Ok(EngineKind::Testng) => {
                info!("suites = {:?}", self.config.testng.suites);
                info!("projectRoot = {}", settings.project_root.display());
            }
            Err(_) => {}
        }
    }
}
