//! Leave-balance reconciliation
//!
//! Computes the per-category effect of replacing or cancelling a leave
//! request, validates it against the available balance, and applies it
//! through a transaction that can be rolled back.

pub mod cancellation;
pub mod engine;
pub mod transaction;

pub use cancellation::*;
pub use engine::*;
pub use transaction::*;
