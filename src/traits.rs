//! Traits for collaborator abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;

/// Source of truth for an employee's balances
///
/// The ledger loads its balance sheet from here once per session and hands
/// committed sheets back. Any backend (HTTP API, database, in-memory) can sit
/// behind it.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Fetch the current balance sheet
    async fn fetch_balances(&self) -> LeaveResult<BalanceSheet>;

    /// Persist a committed balance sheet
    async fn store_balances(&mut self, balances: &BalanceSheet) -> LeaveResult<()>;
}

/// Downstream commit step for leave changes
///
/// Every method is invoked after balances were optimistically applied; an
/// error from any of them causes the ledger to roll the balances back.
#[async_trait]
pub trait LeaveSubmitter: Send + Sync {
    /// Submit a new leave application
    async fn submit_application(&mut self, request: &LeaveRequest) -> LeaveResult<()>;

    /// Submit a modified version of an existing request
    async fn submit_update(&mut self, request: &LeaveRequest) -> LeaveResult<()>;

    /// Submit a cancellation; `remaining` is `None` when the whole request is cancelled
    async fn submit_cancellation(
        &mut self,
        request_id: &str,
        remaining: Option<&LeaveRequest>,
    ) -> LeaveResult<()>;
}

/// Trait for implementing custom leave request validation rules
pub trait RequestValidator: Send + Sync {
    /// Validate a request before it is applied or submitted
    fn validate_request(&self, request: &LeaveRequest) -> LeaveResult<()>;
}

/// Default request validator with basic shape rules
pub struct DefaultRequestValidator;

impl RequestValidator for DefaultRequestValidator {
    fn validate_request(&self, request: &LeaveRequest) -> LeaveResult<()> {
        if request.id.trim().is_empty() {
            return Err(LeaveError::Validation(
                "Request ID cannot be empty".to_string(),
            ));
        }

        if request.end_date < request.start_date {
            return Err(LeaveError::Validation(
                "End date cannot be before start date".to_string(),
            ));
        }

        if request.duration == 0 {
            return Err(LeaveError::Validation(
                "Leave duration must be at least one day".to_string(),
            ));
        }

        Ok(())
    }
}
