//! Reconciliation module containing the matching engine and suggestion scorer

pub mod engine;
pub mod scoring;

pub use engine::*;
pub use scoring::*;
