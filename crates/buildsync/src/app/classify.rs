//! Filtering resources down to build-managed projects.

use std::collections::HashSet;

use crate::domain::model::{ProjectRef, ResourceRef};

/// Decides whether a project is governed by build metadata.
pub trait BuildManagementPredicate {
    fn is_managed(&self, project: &ProjectRef) -> bool;
}

impl<F> BuildManagementPredicate for F
where
    F: Fn(&ProjectRef) -> bool,
{
    fn is_managed(&self, project: &ProjectRef) -> bool {
        self(project)
    }
}

/// Fixed set of managed project names.
#[derive(Debug, Default, Clone)]
pub struct ManagedProjects {
    names: HashSet<String>,
}

impl ManagedProjects {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl BuildManagementPredicate for ManagedProjects {
    fn is_managed(&self, project: &ProjectRef) -> bool {
        self.names.contains(&project.name)
    }
}

/// Return the owning project of `resource` when that project is build-managed.
pub fn classify(
    resource: &ResourceRef,
    predicate: &dyn BuildManagementPredicate,
) -> Option<ProjectRef> {
    let project = resource.project();
    predicate.is_managed(project).then(|| project.clone())
}
