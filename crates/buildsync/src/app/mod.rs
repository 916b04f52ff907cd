//! Application layer: the resolution pipeline and synchronization dispatch.

pub mod adapt;
pub mod classify;
pub mod coalesce;
pub mod dedupe;
pub mod dispatch;
pub mod report;
pub mod selection;
pub mod trigger;
