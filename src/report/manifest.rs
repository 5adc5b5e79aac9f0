//! Allocation manifest generation.
//!
//! The manifest is the hand-off to CI: a JSON array with one entry per
//! bucket, consumed by a job-matrix expansion step.
//!
//! # Format
//!
//! ```json
//! [
//!   { "jobIndex": 0, "classes": ["a.b.C1", "a.b.C2"], "totalMethods": 15 },
//!   { "jobIndex": 1, "classes": ["a.b.C3"], "totalMethods": 20 }
//! ]
//! ```
//!
//! The file is written compactly on a single line.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::orchestrator::scheduler::TestBucket;

/// Errors raised while persisting a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to write manifest {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize manifest")]
    Serialize(#[from] serde_json::Error),
}

/// One CI job: a bucket and its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub job_index: usize,
    pub classes: Vec<String>,
    pub total_methods: usize,
}

/// Ordered list of CI jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationManifest {
    pub entries: Vec<ManifestEntry>,
}

impl AllocationManifest {
    /// Builds a manifest, numbering jobs in bucket order from zero.
    pub fn from_buckets(buckets: &[TestBucket]) -> Self {
        let entries = buckets
            .iter()
            .enumerate()
            .map(|(job_index, bucket)| ManifestEntry {
                job_index,
                classes: bucket.class_names().to_vec(),
                total_methods: bucket.total_methods(),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of `totalMethods` across all jobs.
    pub fn total_methods(&self) -> usize {
        self.entries.iter().map(|e| e.total_methods).sum()
    }

    /// Serializes the manifest as compact JSON.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Writes the manifest to `path`.
    ///
    /// Parent directories are created. The JSON is written to a temporary
    /// file next to the destination and renamed into place, so the
    /// destination either holds the previous content or the full manifest.
    pub fn write_to(&self, path: &Path) -> Result<(), ManifestError> {
        let json = self.to_json()?;
        let io_err = |source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(io_err)?;

        let mut file = tempfile::NamedTempFile::new_in(&parent).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        file.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

/// Resolves the manifest path, appending `.json` unless already present.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use test_allocator::report::manifest::manifest_path;
///
/// assert_eq!(manifest_path(Path::new("ci/allocation")), PathBuf::from("ci/allocation.json"));
/// assert_eq!(manifest_path(Path::new("ci/allocation.json")), PathBuf::from("ci/allocation.json"));
/// ```
pub fn manifest_path(output: &Path) -> PathBuf {
    if output.extension().is_some_and(|ext| ext == "json") {
        output.to_path_buf()
    } else {
        let mut raw = output.as_os_str().to_os_string();
        raw.push(".json");
        PathBuf::from(raw)
    }
}
