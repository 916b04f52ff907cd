//! Infrastructure adapters: configuration, workspace manifest, logging, task execution.

pub mod config;
pub mod logging;
pub mod runner;
pub mod workspace;
