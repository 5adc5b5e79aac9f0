//! Configuration loading and schema definitions for test-allocator.
//!
//! This module provides types and functions for loading configuration from
//! TOML files or strings, plus helpers the CLI uses to apply overrides.

pub mod schema;

pub use schema::*;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Loads test-allocator configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read (e.g., doesn't exist or permission denied)
/// - The file contains invalid TOML syntax
/// - The configuration doesn't match the expected schema
///
/// # Example
///
/// ```no_run
/// use test_allocator::config::load_config;
/// use std::path::Path;
///
/// let config = load_config(Path::new("test-allocator.toml"))?;
/// println!("Max runners: {}", config.allocator.max_parallel_runners);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Loads test-allocator configuration from a TOML string.
///
/// # Example
///
/// ```
/// use test_allocator::config::load_config_str;
///
/// let config = load_config_str(r#"
///     [allocator]
///     max_parallel_runners = 4
/// "#)?;
///
/// assert_eq!(config.allocator.max_parallel_runners, 4);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;

    Ok(config)
}

/// Splits a comma-separated list, trimming entries and dropping blanks.
///
/// ```
/// use test_allocator::config::parse_list;
///
/// let tags = parse_list("  smoke , integration ,, ");
/// assert_eq!(tags.len(), 2);
/// assert!(tags.contains("integration"));
/// ```
pub fn parse_list(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expands `~` and environment variables in a configured path.
///
/// Paths that fail to expand (e.g. an undefined variable) are returned as-is.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(e) => {
            tracing::debug!("Leaving path {} unexpanded: {}", raw, e);
            path.to_path_buf()
        }
    }
}
