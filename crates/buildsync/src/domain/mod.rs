//! Core domain types shared by the resolution and dispatch phases.

pub mod errors;
pub mod model;
