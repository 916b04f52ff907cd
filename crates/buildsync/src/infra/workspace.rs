//! Workspace manifest describing projects and the builds they belong to.
//!
//! ```toml
//! [[build]]
//! name = "shop"
//! root = "shop"
//!
//! [[project]]
//! name = "shop-app"
//! root = "shop/app"
//! build = "shop"
//!
//! [[project]]
//! name = "notes"
//! root = "notes"
//! managed = false
//! ```
//!
//! Relative roots are resolved against the workspace root.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::app::adapt::Adaptable;
use crate::app::classify::BuildManagementPredicate;
use crate::app::dedupe::WorkspaceBuildRegistry;
use crate::domain::errors::DomainError;
use crate::domain::model::{BuildRef, ProjectRef, ResourceRef};

/// Raw manifest as written on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "build")]
    pub builds: Vec<BuildEntry>,
    #[serde(default, rename = "project")]
    pub projects: Vec<ProjectEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEntry {
    pub name: String,
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub root: PathBuf,
    /// Owning build. A managed project without one has not been imported yet.
    #[serde(default)]
    pub build: Option<String>,
    #[serde(default = "ProjectEntry::default_managed")]
    pub managed: bool,
}

impl ProjectEntry {
    fn default_managed() -> bool {
        true
    }
}

impl FromStr for Manifest {
    type Err = toml::de::Error;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        toml::from_str(contents)
    }
}

#[derive(Debug, Clone)]
struct Project {
    project: ProjectRef,
    managed: bool,
    build: Option<BuildRef>,
}

/// Validated workspace model. Acts as both the management predicate and the build
/// registry for the synchronize command.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    builds: IndexMap<String, BuildRef>,
    projects: Vec<Project>,
}

impl Workspace {
    /// Read and validate the manifest at `path`, resolving roots against `root`.
    pub fn load(path: &Path, root: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read workspace manifest {}", path.display()))?;
        let manifest = data
            .parse::<Manifest>()
            .with_context(|| format!("invalid workspace manifest {}", path.display()))?;
        let workspace = Self::from_manifest(manifest, root)?;
        tracing::debug!(
            manifest = %path.display(),
            builds = workspace.builds.len(),
            projects = workspace.projects.len(),
            "loaded workspace manifest"
        );
        Ok(workspace)
    }

    pub fn from_manifest(manifest: Manifest, root: &Path) -> Result<Self, DomainError> {
        let mut builds = IndexMap::new();
        let mut build_roots = HashSet::new();
        for entry in manifest.builds {
            let build = BuildRef::new(normalize(&root.join(&entry.root)));
            if !build_roots.insert(build.clone()) {
                return Err(DomainError::DuplicateBuildRoot(build.root().to_path_buf()));
            }
            if builds.insert(entry.name.clone(), build).is_some() {
                return Err(DomainError::DuplicateBuild(entry.name));
            }
        }

        let mut names = HashSet::new();
        let mut projects = Vec::with_capacity(manifest.projects.len());
        for entry in manifest.projects {
            if entry.name.trim().is_empty() {
                return Err(DomainError::EmptyProjectName);
            }
            if !names.insert(entry.name.clone()) {
                return Err(DomainError::DuplicateProject(entry.name));
            }
            let build = match &entry.build {
                Some(name) => Some(builds.get(name).cloned().ok_or_else(|| {
                    DomainError::UnknownBuild {
                        project: entry.name.clone(),
                        build: name.clone(),
                    }
                })?),
                None => None,
            };
            projects.push(Project {
                project: ProjectRef::new(entry.name, normalize(&root.join(&entry.root))),
                managed: entry.managed,
                build,
            });
        }

        Ok(Self {
            root: normalize(root),
            builds,
            projects,
        })
    }

    /// Declared builds in manifest order.
    pub fn builds(&self) -> impl Iterator<Item = (&str, &BuildRef)> {
        self.builds.iter().map(|(name, build)| (name.as_str(), build))
    }

    pub fn project(&self, name: &str) -> Option<&ProjectRef> {
        self.projects
            .iter()
            .find(|entry| entry.project.name == name)
            .map(|entry| &entry.project)
    }

    /// Resolve `path` to a resource owned by the innermost project containing it.
    ///
    /// Relative paths are taken relative to the workspace root. `.` and `..` are resolved
    /// lexically before matching.
    pub fn resource_for(&self, path: &Path) -> Option<ResourceRef> {
        let absolute = if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.root.join(path))
        };
        self.projects
            .iter()
            .filter(|entry| absolute.starts_with(&entry.project.root))
            .max_by_key(|entry| entry.project.root.components().count())
            .map(|entry| ResourceRef::new(absolute.clone(), entry.project.clone()))
    }

    /// A selectable handle for `path` that adapts through this workspace.
    pub fn path(&self, path: impl Into<PathBuf>) -> WorkspacePath<'_> {
        WorkspacePath {
            workspace: self,
            path: path.into(),
        }
    }

    fn entry(&self, project: &ProjectRef) -> Option<&Project> {
        self.projects.iter().find(|entry| entry.project == *project)
    }
}

impl BuildManagementPredicate for Workspace {
    fn is_managed(&self, project: &ProjectRef) -> bool {
        self.entry(project).is_some_and(|entry| entry.managed)
    }
}

impl WorkspaceBuildRegistry for Workspace {
    fn lookup_build(&self, project: &ProjectRef) -> Option<BuildRef> {
        self.entry(project).and_then(|entry| entry.build.clone())
    }
}

/// A path selected in the workspace, adaptable once a project claims it.
#[derive(Debug, Clone)]
pub struct WorkspacePath<'a> {
    workspace: &'a Workspace,
    path: PathBuf,
}

impl Adaptable for WorkspacePath<'_> {
    fn as_resource(&self) -> Option<ResourceRef> {
        self.workspace.resource_for(&self.path)
    }
}

/// Resolve `.` and `..` without touching the filesystem. `..` never climbs above the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
