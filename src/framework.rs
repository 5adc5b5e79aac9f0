//! Test engine model and method-count strategies.
//!
//! This module provides an engine-agnostic view of test classes and the
//! strategies that turn a population of classes into effective method
//! counts, the weights the bucket allocator packs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Engine                                 │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                   │
//! │  Junit(TagFilter)    class names ──► junit::count_methods ──┐     │
//! │                                                             ▼     │
//! │                                                       MethodCounts│
//! │                                                             ▲     │
//! │  Testng(SuiteSelection) suite XML ─► testng::count_methods ─┘     │
//! │                                                                   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both strategies resolve classes through a [`ClassLoader`], which hands
//! back a [`TestClass`] made of [`TestDescriptor`]s. How those descriptors
//! are produced (annotation metadata, code generation, a build plugin) is
//! the loader's business; the strategies only see names, tags and the test
//! marker.
//!
//! # Built-in Engines
//!
//! | Engine | Selection | Module |
//! |--------|-----------|--------|
//! | `junit` | include/exclude tags | [`junit`] |
//! | `testng` | suite names from XML suite files | [`testng`] |

pub mod junit;
pub mod suite;
pub mod tags;
pub mod testng;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{Config, EngineKind};

pub use suite::{SuiteError, SuiteResult};

/// Effective method count per class identifier.
///
/// Ordered by class name so that iteration, and therefore allocation, is
/// deterministic for a given set of classes.
pub type MethodCounts = BTreeMap<String, usize>;

/// A single method of a test class as seen by the allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDescriptor {
    /// Method name, used for exact matching against suite include lists.
    pub name: String,

    /// Tags resolved for this method, including meta-annotation tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Whether the method carries the engine's test marker.
    #[serde(default)]
    pub is_test: bool,
}

impl TestDescriptor {
    /// Creates a descriptor for a test method with no tags.
    pub fn test(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeSet::new(),
            is_test: true,
        }
    }

    /// Creates a descriptor for a method without the test marker.
    pub fn helper(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeSet::new(),
            is_test: false,
        }
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

/// A loaded test class: its qualified name and declared methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestClass {
    /// Fully qualified name, `$` inner-class notation preserved.
    pub name: String,

    /// Declared methods, in declaration order.
    #[serde(default)]
    pub methods: Vec<TestDescriptor>,
}

impl TestClass {
    /// Creates a class with no methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Adds a declared method.
    pub fn with_method(mut self, method: TestDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Declared methods carrying the test marker.
    pub fn test_methods(&self) -> impl Iterator<Item = &TestDescriptor> {
        self.methods.iter().filter(|m| m.is_test)
    }
}

/// Resolves class identifiers to loaded classes.
///
/// Returning `None` signals "not found". Callers treat that as a soft
/// condition and skip the class.
pub trait ClassLoader {
    /// Loads the class with the given fully qualified name.
    fn load(&self, class_name: &str) -> Option<TestClass>;
}

impl ClassLoader for HashMap<String, TestClass> {
    fn load(&self, class_name: &str) -> Option<TestClass> {
        self.get(class_name).cloned()
    }
}

impl ClassLoader for BTreeMap<String, TestClass> {
    fn load(&self, class_name: &str) -> Option<TestClass> {
        self.get(class_name).cloned()
    }
}

impl<L: ClassLoader + ?Sized> ClassLoader for &L {
    fn load(&self, class_name: &str) -> Option<TestClass> {
        (**self).load(class_name)
    }
}

/// Include/exclude tag filter for annotation-driven engines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    pub include_tags: BTreeSet<String>,
    pub exclude_tags: BTreeSet<String>,
}

impl TagFilter {
    /// Creates a filter from include and exclude tag sets.
    pub fn new(include_tags: BTreeSet<String>, exclude_tags: BTreeSet<String>) -> Self {
        Self {
            include_tags,
            exclude_tags,
        }
    }

    /// Returns true if a method with these tags should run.
    ///
    /// Exclusion wins over inclusion. An empty include set admits every
    /// method that is not excluded.
    pub fn matches(&self, tags: &BTreeSet<String>) -> bool {
        let included =
            self.include_tags.is_empty() || !self.include_tags.is_disjoint(tags);
        included && self.exclude_tags.is_disjoint(tags)
    }
}

/// Suite selection for suite-file-driven engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteSelection {
    /// Suite names to allocate. Matching is exact and case-sensitive.
    pub suites: BTreeSet<String>,

    /// Directory searched recursively for suite files.
    pub project_root: PathBuf,
}

/// The configured test engine together with its filter.
///
/// Dispatched once per run; each variant owns the configuration its
/// strategy needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Engine {
    Junit(TagFilter),
    Testng(SuiteSelection),
}

impl Engine {
    /// Builds the engine selected by `allocator.engine`.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedEngine`](crate::config::UnsupportedEngine) when
    /// the name is neither `junit` nor `testng`.
    pub fn from_config(config: &Config) -> Result<Self, crate::config::UnsupportedEngine> {
        let kind: EngineKind = config.allocator.engine.parse()?;
        Ok(match kind {
            EngineKind::Junit => Engine::Junit(TagFilter::new(
                config.junit.include_tags.clone(),
                config.junit.exclude_tags.clone(),
            )),
            EngineKind::Testng => Engine::Testng(SuiteSelection {
                suites: config.testng.suites.clone(),
                project_root: crate::config::expand_path(&config.allocator.project_root),
            }),
        })
    }

    /// The engine kind.
    pub fn kind(&self) -> EngineKind {
        match self {
            Engine::Junit(_) => EngineKind::Junit,
            Engine::Testng(_) => EngineKind::Testng,
        }
    }

    /// Computes effective method counts with this engine's strategy.
    ///
    /// `class_names` are the discovered classes; the suite-driven engine
    /// ignores them and takes its classes from the suite files instead.
    ///
    /// # Errors
    ///
    /// Only the suite-driven engine can fail, when a suite file cannot be
    /// found or parsed.
    pub fn count_methods<L: ClassLoader>(
        &self,
        class_names: &[String],
        loader: &L,
        parallel_methods: bool,
    ) -> SuiteResult<MethodCounts> {
        match self {
            Engine::Junit(filter) => Ok(junit::count_methods(
                class_names,
                loader,
                filter,
                parallel_methods,
            )),
            Engine::Testng(selection) => testng::count_methods(selection, loader, parallel_methods),
        }
    }
}

/// Weight of a class given how many of its methods will run.
///
/// With `parallel_methods` the class weighs as many units as it has running
/// methods; otherwise it is a single sequential unit as long as anything in
/// it runs.
pub(crate) fn class_weight(running_methods: usize, parallel_methods: bool) -> usize {
    if parallel_methods {
        running_methods
    } else {
        usize::from(running_methods > 0)
    }
}
