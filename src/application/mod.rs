//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the scoring use case.

mod scoring;

pub use scoring::{ModelState, ScoringService};

#[cfg(test)]
pub(crate) use scoring::fakes;
