//! Handing resolved builds to asynchronous synchronization tasks.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexSet;
use parking_lot::Mutex;

use crate::domain::model::{BuildRef, SyncPolicy};

/// Policy used for every request issued by the synchronize command.
pub const DISPATCH_POLICY: SyncPolicy = SyncPolicy::ImportAndMerge;

/// Performs the actual synchronization of one build.
///
/// Implementations report their own failures; the dispatcher only logs the returned error.
/// When the same build may be synchronized by overlapping invocations, the implementation
/// is responsible for serializing them (see [`crate::app::coalesce::Serialized`]).
pub trait BuildSynchronizer: Send + Sync {
    fn synchronize(&self, build: &BuildRef, policy: SyncPolicy) -> Result<()>;
}

impl<S: BuildSynchronizer + ?Sized> BuildSynchronizer for Arc<S> {
    fn synchronize(&self, build: &BuildRef, policy: SyncPolicy) -> Result<()> {
        (**self).synchronize(build, policy)
    }
}

/// Unit of work handed to a [`TaskRunner`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Executes submitted tasks.
///
/// Production runners hand the task off and return without waiting for it. A runner may
/// instead run the task to completion before returning, as [`InlineRunner`] does for
/// deterministic tests; callers must not rely on either behavior.
pub trait TaskRunner: Send + Sync {
    fn submit(&self, task: Task);
}

/// Runs each task on the submitting thread before returning.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineRunner;

impl TaskRunner for InlineRunner {
    fn submit(&self, task: Task) {
        task();
    }
}

/// Synchronizer that records every request it receives.
#[derive(Debug, Default)]
pub struct RecordingSynchronizer {
    requests: Mutex<Vec<(BuildRef, SyncPolicy)>>,
}

impl RecordingSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<(BuildRef, SyncPolicy)> {
        self.requests.lock().clone()
    }

    pub fn builds(&self) -> Vec<BuildRef> {
        self.requests
            .lock()
            .iter()
            .map(|(build, _)| build.clone())
            .collect()
    }
}

impl BuildSynchronizer for RecordingSynchronizer {
    fn synchronize(&self, build: &BuildRef, policy: SyncPolicy) -> Result<()> {
        tracing::info!(build = %build, %policy, "synchronization requested");
        self.requests.lock().push((build.clone(), policy));
        Ok(())
    }
}

/// Submits one synchronization task per build.
#[derive(Clone)]
pub struct Dispatcher {
    synchronizer: Arc<dyn BuildSynchronizer>,
    runner: Arc<dyn TaskRunner>,
}

impl Dispatcher {
    pub fn new(synchronizer: Arc<dyn BuildSynchronizer>, runner: Arc<dyn TaskRunner>) -> Self {
        Self {
            synchronizer,
            runner,
        }
    }

    /// Submit a task for each build in set order and return once all are submitted.
    pub fn dispatch(&self, builds: &IndexSet<BuildRef>) {
        for build in builds {
            let synchronizer = Arc::clone(&self.synchronizer);
            let build = build.clone();
            tracing::debug!(build = %build, policy = %DISPATCH_POLICY, "submitting synchronization");
            self.runner.submit(Box::new(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    synchronizer.synchronize(&build, DISPATCH_POLICY)
                }));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        tracing::warn!(build = %build, error = %err, "synchronization failed");
                    }
                    Err(payload) => {
                        tracing::warn!(
                            build = %build,
                            panic = %panic_message(&*payload),
                            "synchronization panicked"
                        );
                    }
                }
            }));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::anyhow;

    fn builds(roots: &[&str]) -> IndexSet<BuildRef> {
        roots.iter().map(|root| BuildRef::new(*root)).collect()
    }

    #[test]
    fn dispatches_each_build_once_in_order() {
        let recorder = Arc::new(RecordingSynchronizer::new());
        let dispatcher = Dispatcher::new(recorder.clone(), Arc::new(InlineRunner));

        dispatcher.dispatch(&builds(&["/ws/b", "/ws/a"]));

        assert_eq!(
            recorder.requests(),
            vec![
                (BuildRef::new("/ws/b"), SyncPolicy::ImportAndMerge),
                (BuildRef::new("/ws/a"), SyncPolicy::ImportAndMerge),
            ]
        );
    }

    #[test]
    fn empty_set_submits_nothing() {
        struct PanickingRunner;

        impl TaskRunner for PanickingRunner {
            fn submit(&self, _task: Task) {
                panic!("nothing should be submitted");
            }
        }

        let dispatcher = Dispatcher::new(
            Arc::new(RecordingSynchronizer::new()),
            Arc::new(PanickingRunner),
        );
        dispatcher.dispatch(&IndexSet::new());
    }

    #[test]
    fn failures_do_not_stop_remaining_builds() {
        struct FailFirst(Mutex<Vec<BuildRef>>);

        impl BuildSynchronizer for FailFirst {
            fn synchronize(&self, build: &BuildRef, _policy: SyncPolicy) -> Result<()> {
                let mut seen = self.0.lock();
                seen.push(build.clone());
                if seen.len() == 1 {
                    return Err(anyhow!("gradle daemon unavailable"));
                }
                Ok(())
            }
        }

        let sync = Arc::new(FailFirst(Mutex::new(Vec::new())));
        let dispatcher = Dispatcher::new(sync.clone(), Arc::new(InlineRunner));
        dispatcher.dispatch(&builds(&["/ws/a", "/ws/b"]));
        assert_eq!(sync.0.lock().len(), 2);
    }

    #[test]
    fn panicking_synchronizer_stays_inside_its_task() {
        struct PanicOn(BuildRef, RecordingSynchronizer);

        impl BuildSynchronizer for PanicOn {
            fn synchronize(&self, build: &BuildRef, policy: SyncPolicy) -> Result<()> {
                if *build == self.0 {
                    panic!("corrupt build metadata in {build}");
                }
                self.1.synchronize(build, policy)
            }
        }

        let sync = Arc::new(PanicOn(BuildRef::new("/ws/a"), RecordingSynchronizer::new()));
        let dispatcher = Dispatcher::new(sync.clone(), Arc::new(InlineRunner));

        dispatcher.dispatch(&builds(&["/ws/a", "/ws/b"]));

        assert_eq!(sync.1.builds(), vec![BuildRef::new("/ws/b")]);
    }

    #[test]
    fn panic_messages_are_extracted() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "non-string panic payload");
    }
}
