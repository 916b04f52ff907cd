//! Per-build serialization for synchronizers shared across invocations.

use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::app::dispatch::BuildSynchronizer;
use crate::domain::model::{BuildRef, SyncPolicy};

/// Wraps a synchronizer so that runs for the same build never overlap.
///
/// Distinct builds still synchronize concurrently. A build's lock exists only while some
/// synchronization of that build is running or waiting.
pub struct Serialized<S> {
    inner: S,
    locks: DashMap<BuildRef, Arc<Mutex<()>>>,
}

impl<S: BuildSynchronizer> Serialized<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            locks: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn lock_for(&self, build: &BuildRef) -> Arc<Mutex<()>> {
        // The shard guard must be gone before anyone blocks on the build lock.
        self.locks
            .entry(build.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}

impl<S: BuildSynchronizer> BuildSynchronizer for Serialized<S> {
    fn synchronize(&self, build: &BuildRef, policy: SyncPolicy) -> Result<()> {
        let result = {
            let lock = self.lock_for(build);
            let _guard = match lock.try_lock() {
                Some(guard) => guard,
                None => {
                    tracing::debug!(build = %build, "waiting for running synchronization");
                    lock.lock()
                }
            };
            self.inner.synchronize(build, policy)
        };
        // Only the map holds the lock now unless another run already cloned it.
        self.locks
            .remove_if(build, |_, lock| Arc::strong_count(lock) == 1);
        result
    }
}
