//! Class catalog built from test-index metadata on the classpath.
//!
//! The allocator never inspects compiled classes. Instead, an
//! engine-specific build step writes a `test-index.json` next to the
//! compiled tests describing each class, its methods, the test marker and
//! the tag-declaring annotation types:
//!
//! ```json
//! {
//!   "annotations": [
//!     { "name": "com.acme.Smoke", "tags": ["smoke"], "annotations": [] }
//!   ],
//!   "classes": [
//!     { "name": "com.acme.LoginTest",
//!       "methods": [
//!         { "name": "login", "test": true, "annotations": ["com.acme.Smoke"] },
//!         { "name": "setUp" }
//!       ] }
//!   ]
//! }
//! ```
//!
//! Classpath elements are read in order. A class or annotation defined by
//! an earlier element shadows later definitions, like a JVM classpath.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::framework::tags::{AnnotationInfo, AnnotationRegistry, MethodInfo, TagExtractor};
use crate::framework::{ClassLoader, TestClass};

/// File name looked up inside directory classpath elements.
pub const INDEX_FILE_NAME: &str = "test-index.json";

/// Errors raised while resolving the classpath.
///
/// These are environment failures: the build has not produced the
/// metadata the allocator needs, so no discovery is attempted.
#[derive(Debug, thiserror::Error)]
pub enum ClasspathError {
    #[error("Classpath element does not exist: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read test index {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid test index {}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk test-index document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestIndex {
    #[serde(default)]
    pub annotations: Vec<AnnotationInfo>,
    #[serde(default)]
    pub classes: Vec<ClassInfo>,
}

/// Raw metadata for one class in a test index.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
}

/// In-memory catalog of every class described on the classpath.
#[derive(Debug, Default)]
pub struct ClassCatalog {
    classes: HashMap<String, ClassInfo>,
    registry: AnnotationRegistry,
}

impl ClassCatalog {
    /// Builds a catalog from classpath elements.
    ///
    /// Blank elements are skipped and repeated elements are read once.
    /// A directory without a `test-index.json` contributes nothing.
    ///
    /// # Errors
    ///
    /// Fails if an element does not exist or an index cannot be read or
    /// parsed.
    pub fn from_classpath(elements: &[PathBuf]) -> Result<Self, ClasspathError> {
        let mut catalog = Self::default();
        let mut seen = HashSet::new();

        for element in elements {
            if element.as_os_str().to_string_lossy().trim().is_empty() {
                continue;
            }
            if !seen.insert(element.clone()) {
                continue;
            }
            if !element.exists() {
                return Err(ClasspathError::Missing(element.clone()));
            }

            let index_path = if element.is_dir() {
                let candidate = element.join(INDEX_FILE_NAME);
                if !candidate.is_file() {
                    debug!("No {} in {}", INDEX_FILE_NAME, element.display());
                    continue;
                }
                candidate
            } else {
                element.clone()
            };

            let index = read_index(&index_path)?;
            debug!(
                "Loaded {} classes and {} annotations from {}",
                index.classes.len(),
                index.annotations.len(),
                index_path.display()
            );
            catalog.add_index(index);
        }

        Ok(catalog)
    }

    /// Adds an index. Existing classes and annotations are kept.
    pub fn add_index(&mut self, index: TestIndex) {
        for annotation in index.annotations {
            self.registry.insert(annotation);
        }
        for class in index.classes {
            self.classes.entry(class.name.clone()).or_insert(class);
        }
    }

    /// Number of classes known to the catalog.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassLoader for ClassCatalog {
    fn load(&self, class_name: &str) -> Option<TestClass> {
        let info = self.classes.get(class_name)?;
        let extractor = TagExtractor::new(&self.registry);
        Some(TestClass {
            name: info.name.clone(),
            methods: info.methods.iter().map(|m| extractor.describe(m)).collect(),
        })
    }
}

fn read_index(path: &Path) -> Result<TestIndex, ClasspathError> {
    let content = std::fs::read_to_string(path).map_err(|source| ClasspathError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ClasspathError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}
