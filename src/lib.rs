//! # Leave Core
//!
//! Leave-balance reconciliation for an employee leave system: computing how a
//! change to a leave request moves balances, checking the change against
//! what is available, and applying it so a downstream failure can be undone.
//!
//! ## Features
//!
//! - **Impact computation**: credit/debit entries for modifying or cancelling a request
//! - **Balance validation**: sufficiency checks with inline form messages
//! - **Transactions**: validate, apply, then commit or roll back to the exact pre-image
//! - **Partial cancellation**: cancel individual weekdays and keep the rest of a request
//! - **Grace period**: same-day changes until the morning cutoff
//! - **Collaborator abstraction**: async traits for the balance source and the submitter
//!
//! ## Quick Start
//!
//! ```rust
//! use leave_core::{BalanceReconciliationEngine, BalanceSheet, LeaveCategory};
//!
//! let engine = BalanceReconciliationEngine::new();
//! let balances = BalanceSheet::standard_allotment();
//!
//! // Switch a five-day earned leave to three days of casual leave
//! let impact = engine.compute_impact_for(LeaveCategory::Earned, 5, LeaveCategory::Casual, 3);
//! assert!(engine.validate_impact(&impact, &balances).is_valid());
//!
//! let updated = engine.apply(&impact, &balances).unwrap();
//! assert_eq!(updated.get(LeaveCategory::Earned), 25);
//! assert_eq!(updated.get(LeaveCategory::Casual), 7);
//! ```

pub mod config;
pub mod ledger;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod units;
pub mod utils;

// Re-export commonly used types
pub use config::LeaveConfig;
pub use ledger::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
pub use utils::{MemoryBalanceSource, MemorySubmitter, Submission};
