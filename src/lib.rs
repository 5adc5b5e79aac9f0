//! test-allocator: splits test classes into balanced buckets for parallel CI.
//!
//! Given the compiled test classes of a project and a filter (tags or suite
//! names), this crate computes how many test methods of each class will
//! run, packs the classes into buckets, and writes a manifest a CI job
//! matrix can fan out over.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Discovery**: Find compiled test classes and load their metadata
//! - **Framework**: Engine model, tag extraction, method-count strategies
//! - **Orchestrator**: Choose the allocation policy and schedule buckets
//! - **Report**: Write the JSON manifest and print summaries
//!
//! # Example
//!
//! ```no_run
//! use test_allocator::config::load_config;
//! use test_allocator::orchestrator::Allocator;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = load_config(std::path::Path::new("test-allocator.toml"))?;
//!     Allocator::new(config).run()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod framework;
pub mod orchestrator;
pub mod report;

// Re-export commonly used types
pub use config::{Config, EngineKind, load_config};
pub use framework::{ClassLoader, Engine, MethodCounts, TestClass, TestDescriptor};
pub use orchestrator::{AllocationError, AllocationOutcome, Allocator, TestBucket};
pub use report::{AllocationManifest, ConsoleReporter};
