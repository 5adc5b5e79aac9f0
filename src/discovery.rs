//! Test class discovery.
//!
//! Discovery walks the compiled test output directory and turns every
//! `.class` file into a fully qualified class identifier. Loading those
//! identifiers into [`TestClass`](crate::framework::TestClass) values is
//! the job of the [`catalog`] module.
//!
//! ```text
//! target/test-classes/com/acme/CartTest.class          -> com.acme.CartTest
//! target/test-classes/com/acme/CartTest$Nested.class   -> com.acme.CartTest$Nested
//! target/test-classes/RootTest.class                   -> RootTest
//! ```

pub mod catalog;

use std::path::{Path, PathBuf};

use tracing::debug;

pub use catalog::{ClassCatalog, ClasspathError};

/// Result type for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Errors that can occur while scanning for class files.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Failed to scan {} for class files", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

const CLASS_SUFFIX: &str = ".class";

/// Recursively collects regular `.class` files under `root`, sorted by path.
///
/// A missing root yields an empty list: a module without compiled tests
/// simply has nothing to allocate.
pub fn find_class_files(root: &Path) -> DiscoveryResult<Vec<PathBuf>> {
    if !root.exists() {
        debug!("Test output directory {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| DiscoveryError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.file_name().to_string_lossy().ends_with(CLASS_SUFFIX)
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Converts a class file path into a fully qualified class name.
///
/// Package directories become dot-separated segments and `$` inner-class
/// notation is preserved. A file outside `root` keeps its full path as the
/// starting point.
pub fn file_to_class_name(file: &Path, root: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let joined = relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".");
    joined
        .strip_suffix(CLASS_SUFFIX)
        .map(str::to_string)
        .unwrap_or(joined)
}

/// Discovers every class identifier under `root`.
pub fn discover(root: &Path) -> DiscoveryResult<Vec<String>> {
    Ok(find_class_files(root)?
        .iter()
        .map(|file| file_to_class_name(file, root))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_find_all_class_files() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("com/example/TestClass1.class"));
        touch(&dir.path().join("com/example/TestClass2.class"));
        touch(&dir.path().join("RootClass.class"));
        touch(&dir.path().join("com/example/README.txt"));

        let files = find_class_files(dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.contains(&dir.path().join("RootClass.class")));
    }

    #[test]
    fn test_empty_and_missing_directories() {
        let dir = TempDir::new().unwrap();
        assert!(find_class_files(dir.path()).unwrap().is_empty());

        std::fs::create_dir_all(dir.path().join("dir1/dir2/dir3")).unwrap();
        assert!(find_class_files(dir.path()).unwrap().is_empty());

        assert!(find_class_files(&dir.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn test_ignores_directories_with_class_like_names() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("SomeDir.class")).unwrap();
        touch(&dir.path().join("ActualClass.class"));

        let files = find_class_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("ActualClass.class")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_follows_symlinked_class_files() {
        let dir = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        touch(&elsewhere.path().join("Shared.class"));
        touch(&dir.path().join("com/acme/Local.class"));
        std::os::unix::fs::symlink(
            elsewhere.path().join("Shared.class"),
            dir.path().join("com/acme/Shared.class"),
        )
        .unwrap();

        let names = discover(dir.path()).unwrap();
        assert_eq!(names, vec!["com.acme.Local", "com.acme.Shared"]);
    }

    #[test]
    fn test_file_to_class_name() {
        let root = Path::new("/build/test-classes");
        let cases = [
            ("com/example/test/MyTestClass.class", "com.example.test.MyTestClass"),
            (
                "io/acme/plugins/allocator/test/DeepClass.class",
                "io.acme.plugins.allocator.test.DeepClass",
            ),
            ("RootClass.class", "RootClass"),
            ("com/example/OuterClass$InnerClass.class", "com.example.OuterClass$InnerClass"),
            ("a/b/c/X.class", "a.b.c.X"),
        ];
        for (relative, expected) in cases {
            assert_eq!(file_to_class_name(&root.join(relative), root), expected);
        }
    }

    #[test]
    fn test_discover() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("com/acme/CartTest.class"));
        touch(&dir.path().join("com/acme/CartTest$Nested.class"));

        let names = discover(dir.path()).unwrap();
        assert_eq!(
            names,
            vec!["com.acme.CartTest$Nested", "com.acme.CartTest"]
        );
    }
}
