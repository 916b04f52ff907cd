//! Summaries of a synchronize invocation for the command line.

use serde::Serialize;

use crate::domain::model::{BuildRef, SyncPolicy};

/// What one invocation selected and which builds it handed off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Number of candidates in the selection before filtering.
    pub candidates: usize,
    pub policy: SyncPolicy,
    /// Submitted builds, in dispatch order.
    pub builds: Vec<BuildRef>,
}

impl SyncReport {
    pub fn new(
        candidates: usize,
        policy: SyncPolicy,
        builds: impl IntoIterator<Item = BuildRef>,
    ) -> Self {
        Self {
            candidates,
            policy,
            builds: builds.into_iter().collect(),
        }
    }

    pub fn render_text(&self) -> String {
        if self.builds.is_empty() {
            return format!(
                "No builds to synchronize ({} selected item(s)).\n",
                self.candidates
            );
        }

        let mut out = format!(
            "Synchronizing {} build(s) ({}):\n",
            self.builds.len(),
            self.policy
        );
        for (index, build) in self.builds.iter().enumerate() {
            out.push_str(&format!("  {}. {} ({})\n", index + 1, build.name(), build));
        }
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
