//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

/// Problems found while validating a workspace manifest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("project name must not be empty")]
    EmptyProjectName,
    #[error("project '{0}' is declared more than once")]
    DuplicateProject(String),
    #[error("project '{project}' refers to unknown build '{build}'")]
    UnknownBuild { project: String, build: String },
    #[error("build '{0}' is declared more than once")]
    DuplicateBuild(String),
    #[error("build root {0} is declared more than once")]
    DuplicateBuildRoot(PathBuf),
}
