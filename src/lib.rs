//! # Reconciliation Core
//!
//! A bank feed reconciliation library matching externally imported bank
//! transactions against internally recorded ledger transactions with a
//! deterministic multi-factor confidence score.
//!
//! ## Features
//!
//! - **Match suggestions**: deterministic scoring over amount, date
//!   proximity, and description similarity, ranked by confidence
//! - **Manual matching**: full-confidence match creation with atomic
//!   status transitions and audit records
//! - **Unmatching**: idempotent reversal returning bank feed transactions
//!   to the pending pool
//! - **Status aggregation**: per-account reconciliation counts and
//!   percentage
//! - **Tenant isolation**: every storage query is scoped through the
//!   account → entity → tenant chain
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::utils::MemoryStorage;
//! use reconciliation_core::ReconciliationEngine;
//!
//! // This example shows construction - storage is any ReconciliationStore
//! let storage = MemoryStorage::new();
//! let engine = ReconciliationEngine::new(storage);
//! ```

pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
