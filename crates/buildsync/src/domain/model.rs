//! Domain models for resources, projects, and builds.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::Serialize;

/// A workspace project. Identity is the project name.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRef {
    pub name: String,
    pub root: PathBuf,
}

impl ProjectRef {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }
}

impl PartialEq for ProjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ProjectRef {}

impl Hash for ProjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// A filesystem-backed workspace resource and the project that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceRef {
    pub path: PathBuf,
    pub project: ProjectRef,
}

impl ResourceRef {
    pub fn new(path: impl Into<PathBuf>, project: ProjectRef) -> Self {
        Self {
            path: path.into(),
            project,
        }
    }

    pub fn project(&self) -> &ProjectRef {
        &self.project
    }
}

/// The logical build a set of projects belongs to.
///
/// Two values are equal when they point at the same build root, so every project of a
/// multi-project build maps onto one `BuildRef`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BuildRef {
    root: PathBuf,
}

impl BuildRef {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Short display name taken from the last component of the root directory.
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }
}

impl fmt::Display for BuildRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root.display())
    }
}

/// How a synchronization treats projects it discovers and workspace state it finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPolicy {
    /// Import newly discovered sub-projects and merge with existing workspace state.
    ImportAndMerge,
}

impl SyncPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPolicy::ImportAndMerge => "import-and-merge",
        }
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
