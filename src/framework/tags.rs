//! Tag extraction from raw annotation metadata.
//!
//! A method can be tagged directly (`@Tag("smoke")`) or through an
//! annotation that is itself tagged (`@Smoke`, where `Smoke` carries
//! `@Tag("smoke")`). Meta-annotations can nest and, in broken metadata,
//! form cycles; extraction visits each annotation type at most once.
//!
//! # Example
//!
//! ```
//! use test_allocator::framework::tags::{AnnotationInfo, AnnotationRegistry, MethodInfo, TagExtractor};
//!
//! let mut registry = AnnotationRegistry::new();
//! registry.insert(AnnotationInfo::new("com.acme.Smoke").with_tag("smoke"));
//!
//! let method = MethodInfo::test("login")
//!     .with_tag("ui")
//!     .with_annotation("com.acme.Smoke");
//!
//! let tags = TagExtractor::new(&registry).extract_tags(&method);
//! assert!(tags.contains("smoke"));
//! assert!(tags.contains("ui"));
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::TestDescriptor;

/// A tag-declaring annotation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationInfo {
    /// Fully qualified annotation type name.
    pub name: String,

    /// Tags declared directly on the annotation type.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Other annotation types present on this annotation type.
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl AnnotationInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }
}

/// Raw metadata for one declared method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,

    /// Whether the method carries the engine's test marker.
    #[serde(default)]
    pub test: bool,

    /// Tags attached directly to the method.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Annotation types present on the method, candidates for meta-tags.
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl MethodInfo {
    /// A method carrying the test marker.
    pub fn test(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            test: true,
            tags: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// A method without the test marker.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            test: false,
            ..Self::test(name)
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }
}

/// Known tag-declaring annotation types, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct AnnotationRegistry {
    annotations: HashMap<String, AnnotationInfo>,
}

impl AnnotationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an annotation type. An existing definition is kept.
    pub fn insert(&mut self, info: AnnotationInfo) {
        self.annotations.entry(info.name.clone()).or_insert(info);
    }

    pub fn get(&self, name: &str) -> Option<&AnnotationInfo> {
        self.annotations.get(name)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

/// Resolves the full tag set of methods against an [`AnnotationRegistry`].
pub struct TagExtractor<'a> {
    registry: &'a AnnotationRegistry,
}

impl<'a> TagExtractor<'a> {
    pub fn new(registry: &'a AnnotationRegistry) -> Self {
        Self { registry }
    }

    /// Returns every tag attached to `method`, directly or via
    /// meta-annotations. Empty for an untagged method.
    pub fn extract_tags(&self, method: &MethodInfo) -> BTreeSet<String> {
        let mut tags: BTreeSet<String> = method.tags.iter().cloned().collect();
        let mut visited = HashSet::new();
        for annotation in &method.annotations {
            self.collect_meta_tags(annotation, &mut visited, &mut tags);
        }
        tags
    }

    /// Builds the descriptor the method-count strategies consume.
    pub fn describe(&self, method: &MethodInfo) -> TestDescriptor {
        TestDescriptor {
            name: method.name.clone(),
            tags: self.extract_tags(method),
            is_test: method.test,
        }
    }

    fn collect_meta_tags<'r>(
        &'r self,
        annotation: &'r str,
        visited: &mut HashSet<&'r str>,
        tags: &mut BTreeSet<String>,
    ) {
        if !visited.insert(annotation) {
            return;
        }
        // Unregistered types (the test marker, lifecycle annotations) carry no tags.
        let Some(info) = self.registry.get(annotation) else {
            return;
        };
        tags.extend(info.tags.iter().cloned());
        for nested in &info.annotations {
            self.collect_meta_tags(nested, visited, tags);
        }
    }
}
