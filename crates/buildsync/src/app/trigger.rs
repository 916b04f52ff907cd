//! Entry point of the synchronize command.

use std::sync::Arc;

use indexmap::IndexSet;

use crate::app::classify::BuildManagementPredicate;
use crate::app::dedupe::{WorkspaceBuildRegistry, dedupe};
use crate::app::dispatch::Dispatcher;
use crate::app::selection::{SelectionEvent, resolve_candidates};
use crate::domain::model::BuildRef;

/// Resolves a selection to distinct builds and schedules one synchronization for each.
///
/// Collaborators are injected so the same pipeline runs against a real workspace or a
/// test double. Nothing is kept between invocations.
pub struct ProjectSynchronizer {
    predicate: Arc<dyn BuildManagementPredicate + Send + Sync>,
    registry: Arc<dyn WorkspaceBuildRegistry + Send + Sync>,
    dispatcher: Dispatcher,
}

impl ProjectSynchronizer {
    pub fn new(
        predicate: Arc<dyn BuildManagementPredicate + Send + Sync>,
        registry: Arc<dyn WorkspaceBuildRegistry + Send + Sync>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            predicate,
            registry,
            dispatcher,
        }
    }

    /// Builds the event refers to, in the order they were first encountered.
    pub fn resolve(&self, event: &SelectionEvent<'_>) -> IndexSet<BuildRef> {
        let candidates = resolve_candidates(event);
        dedupe(candidates, self.predicate.as_ref(), self.registry.as_ref())
    }

    /// Resolve `event` and submit the resulting synchronizations.
    ///
    /// Never fails. Returns the submitted builds in dispatch order; their outcomes are not
    /// observed here.
    pub fn execute(&self, event: &SelectionEvent<'_>) -> IndexSet<BuildRef> {
        let builds = self.resolve(event);
        if builds.is_empty() {
            tracing::debug!("selection contains no synchronizable builds");
            return builds;
        }
        tracing::info!(builds = builds.len(), "scheduling build synchronization");
        self.dispatcher.dispatch(&builds);
        builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app::adapt::Adaptable;
    use crate::app::classify::ManagedProjects;
    use crate::app::dedupe::StaticRegistry;
    use crate::app::dispatch::{InlineRunner, RecordingSynchronizer};
    use crate::app::selection::EditorInput;
    use crate::domain::model::{ProjectRef, ResourceRef};

    fn trigger(recorder: Arc<RecordingSynchronizer>) -> ProjectSynchronizer {
        let registry = StaticRegistry::new()
            .with("p1", BuildRef::new("/ws/build1"))
            .with("p2", BuildRef::new("/ws/build2"));
        ProjectSynchronizer::new(
            Arc::new(ManagedProjects::new(["p1", "p2"])),
            Arc::new(registry),
            Dispatcher::new(recorder, Arc::new(InlineRunner)),
        )
    }

    fn file(path: &str, project: &str) -> Box<dyn Adaptable> {
        Box::new(ResourceRef::new(
            path,
            ProjectRef::new(project, format!("/ws/{project}")),
        ))
    }

    #[test]
    fn execute_dispatches_resolved_builds() {
        let recorder = Arc::new(RecordingSynchronizer::new());
        let trigger = trigger(recorder.clone());
        let event = SelectionEvent::structured(vec![
            file("/ws/p2/a", "p2"),
            file("/ws/p1/b", "p1"),
            file("/ws/p2/c", "p2"),
        ]);

        let submitted = trigger.execute(&event);

        let expected = vec![BuildRef::new("/ws/build2"), BuildRef::new("/ws/build1")];
        assert_eq!(recorder.builds(), expected);
        assert_eq!(submitted.into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn editor_file_is_used_without_selection() {
        let recorder = Arc::new(RecordingSynchronizer::new());
        let trigger = trigger(recorder.clone());
        let resource = ResourceRef::new("/ws/p1/build.gradle", ProjectRef::new("p1", "/ws/p1"));

        trigger.execute(&SelectionEvent::editor(EditorInput::File(resource)));

        assert_eq!(recorder.builds(), vec![BuildRef::new("/ws/build1")]);
    }
}
