//! Reducing candidates to the distinct builds they belong to.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::app::adapt::{Adaptable, adapt};
use crate::app::classify::{BuildManagementPredicate, classify};
use crate::domain::model::{BuildRef, ProjectRef};

/// Maps workspace projects onto the builds that own them.
pub trait WorkspaceBuildRegistry {
    /// `None` means the project has no resolvable build right now, e.g. while it is being
    /// imported.
    fn lookup_build(&self, project: &ProjectRef) -> Option<BuildRef>;
}

/// In-memory registry keyed by project name.
#[derive(Debug, Default, Clone)]
pub struct StaticRegistry {
    builds: HashMap<String, BuildRef>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, project: impl Into<String>, build: BuildRef) -> Self {
        self.builds.insert(project.into(), build);
        self
    }
}

impl WorkspaceBuildRegistry for StaticRegistry {
    fn lookup_build(&self, project: &ProjectRef) -> Option<BuildRef> {
        self.builds.get(&project.name).cloned()
    }
}

/// Collect the distinct build-managed projects among `candidates`, in first-seen order.
pub fn collect_projects<'a, I>(
    candidates: I,
    predicate: &dyn BuildManagementPredicate,
) -> IndexSet<ProjectRef>
where
    I: IntoIterator<Item = &'a dyn Adaptable>,
{
    let mut projects = IndexSet::new();
    for candidate in candidates {
        let Some(resource) = adapt(candidate) else {
            tracing::trace!("skipping candidate that is not a resource");
            continue;
        };
        match classify(&resource, predicate) {
            Some(project) => {
                projects.insert(project);
            }
            None => {
                tracing::debug!(
                    path = %resource.path.display(),
                    project = %resource.project.name,
                    "skipping resource outside a managed project"
                );
            }
        }
    }
    projects
}

/// Reduce `candidates` to the ordered set of builds that need synchronizing.
///
/// Builds appear in the order their first contributing project was encountered. Several
/// projects of one build collapse into a single entry, and projects the registry cannot
/// place are dropped.
pub fn dedupe<'a, I>(
    candidates: I,
    predicate: &dyn BuildManagementPredicate,
    registry: &dyn WorkspaceBuildRegistry,
) -> IndexSet<BuildRef>
where
    I: IntoIterator<Item = &'a dyn Adaptable>,
{
    let projects = collect_projects(candidates, predicate);
    if projects.is_empty() {
        return IndexSet::new();
    }

    let mut builds = IndexSet::with_capacity(projects.len());
    for project in &projects {
        match registry.lookup_build(project) {
            Some(build) => {
                builds.insert(build);
            }
            None => {
                tracing::debug!(project = %project.name, "no build registered for project");
            }
        }
    }
    builds
}
