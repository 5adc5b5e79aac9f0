//! Suite file reading.
//!
//! Suite files are XML documents in the TestNG layout:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <!DOCTYPE suite SYSTEM "https://testng.org/testng-1.0.dtd">
//! <suite name="Regression">
//!   <test name="Checkout">
//!     <classes>
//!       <class name="com.acme.CartTest"/>
//!       <class name="com.acme.PaymentTest">
//!         <methods>
//!           <include name="payByCard"/>
//!         </methods>
//!       </class>
//!     </classes>
//!   </test>
//! </suite>
//! ```
//!
//! Parsing is strict: a document that is not well-formed XML is an error,
//! never an empty suite. Elements the allocator does not need (listeners,
//! parameters, groups, excludes) are ignored.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Result type for suite operations.
pub type SuiteResult<T> = Result<T, SuiteError>;

/// Errors raised while locating or reading suite files.
///
/// All of them are fatal for an allocation run.
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    /// The project tree could not be searched.
    #[error("Failed to search for suite files under {}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A suite file could not be read.
    #[error("Failed to read suite file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A suite file is not valid XML.
    #[error("Failed to parse suite file {}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: quick_xml::DeError,
    },
}

/// A named suite and its tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub name: String,
    pub tests: Vec<SuiteTest>,
}

/// A `<test>` block inside a suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteTest {
    pub name: String,
    pub classes: Vec<ClassRef>,
}

/// A class referenced by a test, optionally narrowed to named methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRef {
    pub name: String,

    /// Explicit `<include>` method names, `None` when the class is
    /// referenced as a whole.
    pub included_methods: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct SuiteXml {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "test", default)]
    tests: Vec<TestXml>,
}

#[derive(Deserialize)]
struct TestXml {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(default)]
    classes: Option<ClassesXml>,
}

#[derive(Deserialize)]
struct ClassesXml {
    #[serde(rename = "class", default)]
    classes: Vec<ClassXml>,
}

#[derive(Deserialize)]
struct ClassXml {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default)]
    methods: Option<MethodsXml>,
}

#[derive(Deserialize)]
struct MethodsXml {
    #[serde(rename = "include", default)]
    includes: Vec<IncludeXml>,
}

#[derive(Deserialize)]
struct IncludeXml {
    #[serde(rename = "@name")]
    name: String,
}

impl From<SuiteXml> for Suite {
    fn from(xml: SuiteXml) -> Self {
        Suite {
            name: xml.name,
            tests: xml.tests.into_iter().map(SuiteTest::from).collect(),
        }
    }
}

impl From<TestXml> for SuiteTest {
    fn from(xml: TestXml) -> Self {
        SuiteTest {
            name: xml.name,
            classes: xml
                .classes
                .map(|c| c.classes.into_iter().map(ClassRef::from).collect())
                .unwrap_or_default(),
        }
    }
}

impl From<ClassXml> for ClassRef {
    fn from(xml: ClassXml) -> Self {
        let included_methods = xml
            .methods
            .map(|m| m.includes.into_iter().map(|i| i.name).collect::<Vec<_>>())
            .filter(|names| !names.is_empty());
        ClassRef {
            name: xml.name,
            included_methods,
        }
    }
}

/// Parses suite XML content.
///
/// The root element is the suite; the returned list holds that one suite.
///
/// # Errors
///
/// Returns the underlying deserialization error for malformed XML.
pub fn parse_suites(content: &str) -> Result<Vec<Suite>, quick_xml::DeError> {
    let suite: SuiteXml = quick_xml::de::from_str(content)?;
    Ok(vec![suite.into()])
}

/// Reads and parses one suite file.
///
/// The file is decoded with the encoding named in its XML declaration (or
/// its byte order mark), so legacy Latin-1 suites parse like UTF-8 ones.
pub fn parse_suite_file(path: &Path) -> SuiteResult<Vec<Suite>> {
    let file = File::open(path).map_err(|source| SuiteError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let suite: SuiteXml =
        quick_xml::de::from_reader(BufReader::new(file)).map_err(|source| {
            SuiteError::Malformed {
                path: path.to_path_buf(),
                source,
            }
        })?;
    Ok(vec![suite.into()])
}

/// Recursively collects every `*.xml` file under `root`, sorted by path.
pub fn find_suite_files(root: &Path) -> SuiteResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| SuiteError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "xml")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
