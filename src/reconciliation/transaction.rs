//! Single-update transaction over a balance sheet
//!
//! A transaction walks `Idle → Validating → Applying → Committed`. A failed
//! validation ends in `Rejected` without touching the sheet; a downstream
//! failure after apply goes through `RollingBack` back to `Idle` with the
//! captured pre-image restored.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reconciliation::BalanceReconciliationEngine;
use crate::types::*;

/// Lifecycle state of a [`BalanceTransaction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    Idle,
    Validating,
    Applying,
    Committed,
    Rejected,
    RollingBack,
}

/// One in-flight balance change
///
/// The transaction mutably borrows the sheet, so a second transaction cannot
/// be opened against it until this one is dropped. Dropping a transaction
/// that was applied but never committed restores the pre-image.
#[derive(Debug)]
pub struct BalanceTransaction<'a> {
    id: Uuid,
    engine: &'a BalanceReconciliationEngine,
    balances: &'a mut BalanceSheet,
    state: TransactionState,
    impact: Option<ModificationImpact>,
    validation: Option<ValidationResult>,
    pre_image: Option<BalanceSheet>,
}

impl<'a> BalanceTransaction<'a> {
    /// Open a new transaction against `balances`
    pub fn new(engine: &'a BalanceReconciliationEngine, balances: &'a mut BalanceSheet) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine,
            balances,
            state: TransactionState::Idle,
            impact: None,
            validation: None,
            pre_image: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// The validated impact, once validation has succeeded
    pub fn impact(&self) -> Option<&ModificationImpact> {
        self.impact.as_ref()
    }

    /// The most recent validation outcome
    pub fn validation(&self) -> Option<&ValidationResult> {
        self.validation.as_ref()
    }

    /// Current view of the sheet, including any uncommitted apply
    pub fn balances(&self) -> &BalanceSheet {
        &*self.balances
    }

    fn expect_state(&self, expected: TransactionState, action: &str) -> LeaveResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(LeaveError::InvalidState(format!(
                "cannot {} a transaction in state {:?}",
                action, self.state
            )))
        }
    }

    fn reject(&mut self, err: LeaveError) -> LeaveError {
        tracing::debug!(transaction = %self.id, error = %err, "transaction rejected");
        self.state = TransactionState::Rejected;
        self.impact = None;
        err
    }

    /// Validate replacing `old` with `new`
    pub fn validate_modification(
        &mut self,
        old: &LeaveRequest,
        new: &LeaveRequest,
    ) -> LeaveResult<&ModificationImpact> {
        self.expect_state(TransactionState::Idle, "validate")?;
        self.state = TransactionState::Validating;

        let impact = match self.engine.compute_impact(old, new) {
            Ok(impact) => impact,
            Err(err) => return Err(self.reject(err)),
        };

        if let Err(err) = self
            .engine
            .check_change_allowed(impact.old_category, impact.new_category)
        {
            return Err(self.reject(err));
        }

        self.validate_impact(impact)
    }

    /// Validate an impact built by the caller, e.g. a cancellation
    pub fn validate_impact(
        &mut self,
        impact: ModificationImpact,
    ) -> LeaveResult<&ModificationImpact> {
        if self.state == TransactionState::Idle {
            self.state = TransactionState::Validating;
        }
        self.expect_state(TransactionState::Validating, "validate")?;

        let validation = self.engine.validate_impact(&impact, self.balances);
        self.validation = Some(validation.clone());
        if let Err(err) = validation.into_result() {
            return Err(self.reject(err));
        }

        let impact = self.impact.insert(impact);
        Ok(&*impact)
    }

    /// Optimistically apply the validated impact, capturing the pre-image
    pub fn apply(&mut self) -> LeaveResult<&BalanceSheet> {
        self.expect_state(TransactionState::Validating, "apply")?;
        let impact = self.impact.as_ref().ok_or_else(|| {
            LeaveError::InvalidState("no validated impact to apply".to_string())
        })?;

        let pre_image = self.balances.clone();
        if let Err(err) = self.engine.apply_in_place(impact, self.balances) {
            tracing::error!(transaction = %self.id, error = %err, "balance integrity violated");
            return Err(self.reject(err));
        }

        self.pre_image = Some(pre_image);
        self.state = TransactionState::Applying;
        Ok(&*self.balances)
    }

    /// Make the applied change permanent
    pub fn commit(&mut self) -> LeaveResult<()> {
        self.expect_state(TransactionState::Applying, "commit")?;
        self.pre_image = None;
        self.state = TransactionState::Committed;
        tracing::debug!(transaction = %self.id, "transaction committed");
        Ok(())
    }

    /// Undo the applied change after a downstream failure
    pub fn rollback(&mut self) -> LeaveResult<()> {
        self.expect_state(TransactionState::Applying, "roll back")?;
        self.state = TransactionState::RollingBack;

        let snapshot = self.pre_image.take().ok_or_else(|| {
            LeaveError::InvalidState("no pre-image captured".to_string())
        })?;
        self.engine.rollback(self.balances, snapshot);

        self.impact = None;
        self.validation = None;
        self.state = TransactionState::Idle;
        Ok(())
    }
}

impl Drop for BalanceTransaction<'_> {
    fn drop(&mut self) {
        if self.state == TransactionState::Applying {
            if let Some(snapshot) = self.pre_image.take() {
                tracing::warn!(transaction = %self.id, "uncommitted transaction dropped");
                *self.balances = snapshot;
            }
        }
    }
}
