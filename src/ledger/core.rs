//! Leave ledger orchestrator that coordinates balances, requests, and submissions

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::config::LeaveConfig;
use crate::ledger::request::{generate_request_id, LeaveRequestBuilder};
use crate::ledger::RequestManager;
use crate::reconciliation::*;
use crate::traits::*;
use crate::types::*;
use crate::units::RoundingConfig;
use crate::utils::calendar::GracePeriod;

/// What an update would do, computed without touching any balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePreview {
    pub impact: ModificationImpact,
    pub validation: ValidationResult,
    /// Balances after the update, `None` if validation fails
    pub projected: Option<BalanceSheet>,
    pub has_changes: bool,
}

/// Main ledger that runs leave flows for one employee
///
/// The ledger owns the balance sheet. Every flow validates against it, applies
/// the change optimistically, submits downstream, and then either commits or
/// restores the sheet. Once the submitter has accepted a change it stays
/// committed; storing the sheet back to the balance source happens afterwards
/// and a failure there only marks the sheet as unsynced.
pub struct LeaveLedger<B: BalanceSource, S: LeaveSubmitter> {
    source: B,
    submitter: S,
    engine: BalanceReconciliationEngine,
    grace_period: GracePeriod,
    units: RoundingConfig,
    submission_timeout: Duration,
    balances: BalanceSheet,
    requests: RequestManager,
    selected: Option<String>,
    unsynced: bool,
}

impl<B: BalanceSource, S: LeaveSubmitter> LeaveLedger<B, S> {
    /// Create a ledger with default settings and an empty balance sheet
    pub fn new(source: B, submitter: S) -> Self {
        let config = LeaveConfig::default();
        Self {
            source,
            submitter,
            engine: BalanceReconciliationEngine::new(),
            grace_period: GracePeriod::default(),
            units: config.units,
            submission_timeout: config.submission.timeout(),
            balances: BalanceSheet::new(),
            requests: RequestManager::new(),
            selected: None,
            unsynced: false,
        }
    }

    /// Create a ledger from configuration
    pub fn with_config(source: B, submitter: S, config: &LeaveConfig) -> LeaveResult<Self> {
        Ok(Self {
            source,
            submitter,
            engine: BalanceReconciliationEngine::with_config(&config.engine),
            grace_period: config.grace_period.grace_period()?,
            units: config.units.clone(),
            submission_timeout: config.submission.timeout(),
            balances: BalanceSheet::new(),
            requests: RequestManager::new(),
            selected: None,
            unsynced: false,
        })
    }

    /// Replace the request validator
    pub fn with_validator(mut self, validator: Box<dyn RequestValidator>) -> Self {
        let existing: Vec<LeaveRequest> = self.requests.list().to_vec();
        self.requests = RequestManager::with_validator(validator);
        for request in existing {
            // Requests already accepted are carried over as-is
            if let Err(err) = self.requests.add(request) {
                tracing::warn!(error = %err, "dropping request rejected by new validator");
            }
        }
        self
    }

    /// Fetch the current sheet from the balance source
    pub async fn load_balances(&mut self) -> LeaveResult<&BalanceSheet> {
        self.balances = self.source.fetch_balances().await?;
        self.unsynced = false;
        tracing::debug!(total = self.balances.total(), "loaded leave balances");
        Ok(&self.balances)
    }

    pub fn balances(&self) -> &BalanceSheet {
        &self.balances
    }

    pub fn engine(&self) -> &BalanceReconciliationEngine {
        &self.engine
    }

    pub fn grace_period(&self) -> &GracePeriod {
        &self.grace_period
    }

    /// Configured unit rounding policy
    pub fn units(&self) -> &RoundingConfig {
        &self.units
    }

    /// Whole days charged for a part-day request of `request_minutes`
    ///
    /// The deduction is rounded to the policy unit first, then any part day
    /// left over is charged as a full day.
    pub fn charged_days(&self, request_minutes: u32) -> u32 {
        let minutes = self.units.deduction(request_minutes);
        minutes.div_ceil(self.units.full_day_minutes.max(1))
    }

    /// True when a committed sheet could not be stored to the balance source
    pub fn has_unsynced_balances(&self) -> bool {
        self.unsynced
    }

    /// Store the committed sheet to the balance source
    pub async fn sync_balances(&mut self) -> LeaveResult<()> {
        let stored = within_timeout(
            self.submission_timeout,
            self.source.store_balances(&self.balances),
        )
        .await;
        self.unsynced = stored.is_err();
        stored
    }

    /// Store after a commit; a failure is reported but never undoes the commit
    async fn store_committed(&mut self) {
        if let Err(err) = self.sync_balances().await {
            tracing::warn!(
                error = %err,
                "committed balances not stored, sync_balances must be retried"
            );
        }
    }

    // Request list
    /// Track an existing request, e.g. one returned by a listing call
    pub fn track_request(&mut self, request: LeaveRequest) -> LeaveResult<()> {
        self.requests.add(request)
    }

    pub fn get_request(&self, request_id: &str) -> Option<&LeaveRequest> {
        self.requests.get(request_id)
    }

    pub fn requests(&self) -> &[LeaveRequest] {
        self.requests.list()
    }

    pub fn requests_by_status(&self, status: LeaveStatus) -> Vec<&LeaveRequest> {
        self.requests.by_status(status)
    }

    // Selection
    /// Select a request for modification
    ///
    /// Only one request may be selected at a time.
    pub fn select(&mut self, request_id: &str) -> LeaveResult<&LeaveRequest> {
        match self.selected.as_deref() {
            Some(current) if current != request_id => {
                return Err(LeaveError::TransactionInProgress)
            }
            _ => {}
        }
        let request = self.requests.get_required(request_id)?;
        self.selected = Some(request.id.clone());
        Ok(request)
    }

    /// Drop the current selection
    ///
    /// Needed only when a flow future was abandoned before it finished.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    // Read-only checks
    /// Inline check of a form's leave type and duration against current balances
    pub fn validate_form(&self, leave_type: &str, duration: u32) -> ValidationResult {
        self.engine
            .validate_label(leave_type, duration, &self.balances)
    }

    /// Compute what replacing request `request_id` with `updated` would do
    pub fn preview_update(
        &self,
        request_id: &str,
        updated: &LeaveRequest,
    ) -> LeaveResult<UpdatePreview> {
        let current = self.requests.get_required(request_id)?;
        ensure_active(current)?;
        let impact = self.engine.compute_impact(current, updated)?;
        self.engine
            .check_change_allowed(impact.old_category, impact.new_category)?;

        let validation = self.engine.validate_impact(&impact, &self.balances);
        let projected = if validation.is_valid() {
            Some(self.engine.apply(&impact, &self.balances)?)
        } else {
            None
        };

        let has_changes = current.leave_type != updated.leave_type
            || current.start_date != updated.start_date
            || current.end_date != updated.end_date
            || current.duration != updated.duration
            || current.reason != updated.reason;

        Ok(UpdatePreview {
            impact,
            validation,
            projected,
            has_changes,
        })
    }

    // Flows
    /// Apply for leave over `[start_date, end_date]`
    pub async fn apply_leave(
        &mut self,
        category: LeaveCategory,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: impl Into<String>,
        now: NaiveDateTime,
    ) -> LeaveResult<LeaveRequest> {
        let request = LeaveRequestBuilder::new(generate_request_id(), category, start_date, end_date)
            .reason(reason)
            .status(LeaveStatus::Pending)
            .build()?;
        self.submit_application(request, now).await
    }

    /// Debit and submit a fully built application
    ///
    /// The leave may not start before today, and starts today only within the
    /// grace period.
    pub async fn submit_application(
        &mut self,
        mut request: LeaveRequest,
        now: NaiveDateTime,
    ) -> LeaveResult<LeaveRequest> {
        if self.selected.is_some() {
            return Err(LeaveError::TransactionInProgress);
        }
        self.grace_period
            .ensure_modifiable(request.start_date, now)?;
        self.requests.validate(&request)?;
        if self.requests.get(&request.id).is_some() {
            return Err(LeaveError::Validation(format!(
                "Leave request with ID '{}' already exists",
                request.id
            )));
        }

        let category = request.category()?;
        request.status = LeaveStatus::Pending;
        let impact = self
            .engine
            .compute_impact_for(category, 0, category, request.duration);

        let mut txn = BalanceTransaction::new(&self.engine, &mut self.balances);
        txn.validate_impact(impact)?;
        txn.apply()?;
        Self::settle(
            &mut txn,
            self.submission_timeout,
            self.submitter.submit_application(&request),
        )
        .await?;
        drop(txn);

        self.requests.add(request.clone())?;
        self.store_committed().await;
        tracing::info!(
            request = %request.id,
            category = %category,
            days = request.duration,
            "leave application submitted"
        );
        Ok(request)
    }

    /// Replace request `request_id` with `updated`
    ///
    /// The id and creation time of the existing request are kept.
    pub async fn update_leave(
        &mut self,
        request_id: &str,
        updated: LeaveRequest,
        now: NaiveDateTime,
    ) -> LeaveResult<LeaveRequest> {
        self.select(request_id)?;
        let result = self.run_update(request_id, updated, now).await;
        self.selected = None;
        result
    }

    async fn run_update(
        &mut self,
        request_id: &str,
        mut updated: LeaveRequest,
        now: NaiveDateTime,
    ) -> LeaveResult<LeaveRequest> {
        let current = self.requests.get_required(request_id)?.clone();
        ensure_active(&current)?;
        ensure_active(&updated)?;
        self.grace_period
            .ensure_modifiable(current.start_date, now)?;
        self.grace_period
            .ensure_modifiable(updated.start_date, now)?;

        updated.id = current.id.clone();
        updated.created_at = current.created_at;
        updated.touch();
        self.requests.validate(&updated)?;

        let mut txn = BalanceTransaction::new(&self.engine, &mut self.balances);
        txn.validate_modification(&current, &updated)?;
        txn.apply()?;
        Self::settle(
            &mut txn,
            self.submission_timeout,
            self.submitter.submit_update(&updated),
        )
        .await?;
        drop(txn);

        self.requests.replace(updated.clone())?;
        self.store_committed().await;
        tracing::info!(
            request = %updated.id,
            from = %current.leave_type,
            to = %updated.leave_type,
            days = updated.duration,
            "leave request updated"
        );
        Ok(updated)
    }

    /// Cancel request `request_id` entirely
    pub async fn cancel_leave(
        &mut self,
        request_id: &str,
        now: NaiveDateTime,
    ) -> LeaveResult<CancellationPlan> {
        self.select(request_id)?;
        let result = self.run_cancellation(request_id, None, now).await;
        self.selected = None;
        result
    }

    /// Cancel individual weekdays of request `request_id`
    pub async fn cancel_dates(
        &mut self,
        request_id: &str,
        dates: &[NaiveDate],
        now: NaiveDateTime,
    ) -> LeaveResult<CancellationPlan> {
        self.select(request_id)?;
        let result = self.run_cancellation(request_id, Some(dates), now).await;
        self.selected = None;
        result
    }

    async fn run_cancellation(
        &mut self,
        request_id: &str,
        dates: Option<&[NaiveDate]>,
        now: NaiveDateTime,
    ) -> LeaveResult<CancellationPlan> {
        let request = self.requests.get_required(request_id)?.clone();
        ensure_active(&request)?;
        let plan = match dates {
            None => {
                self.grace_period
                    .ensure_modifiable(request.start_date, now)?;
                self.engine.plan_full_cancellation(&request)?
            }
            Some(dates) => {
                for date in dates {
                    self.grace_period.ensure_modifiable(*date, now)?;
                }
                self.engine.plan_partial_cancellation(&request, dates)?
            }
        };

        let mut txn = BalanceTransaction::new(&self.engine, &mut self.balances);
        txn.validate_impact(plan.impact().clone())?;
        txn.apply()?;
        Self::settle(
            &mut txn,
            self.submission_timeout,
            self.submitter
                .submit_cancellation(&request.id, plan.remaining()),
        )
        .await?;
        drop(txn);

        match plan.remaining() {
            Some(remaining) => self.requests.replace(remaining.clone())?,
            None => {
                self.requests.remove(request_id)?;
            }
        }
        self.store_committed().await;
        tracing::info!(
            request = %request.id,
            days = plan.cancelled_days(),
            full = plan.is_full(),
            "leave cancelled"
        );
        Ok(plan)
    }

    /// Await the submission for an applied transaction, then commit or roll back
    async fn settle<F>(
        txn: &mut BalanceTransaction<'_>,
        limit: Duration,
        submission: F,
    ) -> LeaveResult<()>
    where
        F: Future<Output = LeaveResult<()>>,
    {
        match within_timeout(limit, submission).await {
            Ok(()) => txn.commit(),
            Err(err) => {
                txn.rollback()?;
                tracing::warn!(
                    transaction = %txn.id(),
                    error = %err,
                    "submission failed, balances rolled back"
                );
                Err(err)
            }
        }
    }
}

/// Only saved, pending, and approved requests hold days that can be moved
fn ensure_active(request: &LeaveRequest) -> LeaveResult<()> {
    if request.status.is_active() {
        Ok(())
    } else {
        Err(LeaveError::Validation(format!(
            "Leave request '{}' is {:?} and can no longer be changed",
            request.id, request.status
        )))
    }
}

/// Await a downstream call, mapping any failure or expiry to `Persistence`
async fn within_timeout<F>(limit: Duration, call: F) -> LeaveResult<()>
where
    F: Future<Output = LeaveResult<()>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err @ LeaveError::Persistence(_))) => Err(err),
        Ok(Err(err)) => Err(LeaveError::Persistence(err.to_string())),
        Err(_) => Err(LeaveError::Persistence(format!(
            "submission timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{MemoryBalanceSource, MemorySubmitter};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ledger() -> LeaveLedger<MemoryBalanceSource, MemorySubmitter> {
        LeaveLedger::new(
            MemoryBalanceSource::new(BalanceSheet::standard_allotment()),
            MemorySubmitter::new(),
        )
    }

    fn request(id: &str, label: &str, duration: u32) -> LeaveRequest {
        LeaveRequest::new(
            id.to_string(),
            label.to_string(),
            date(2024, 3, 11),
            date(2024, 3, 15),
            duration,
            "Holiday".to_string(),
        )
    }

    #[test]
    fn test_single_selection() {
        let mut ledger = ledger();
        ledger.track_request(request("a", "Earned Leave", 5)).unwrap();
        ledger.track_request(request("b", "Casual Leave", 2)).unwrap();

        ledger.select("a").unwrap();
        assert!(ledger.select("a").is_ok());
        assert_eq!(
            ledger.select("b").unwrap_err(),
            LeaveError::TransactionInProgress
        );

        ledger.deselect();
        assert!(ledger.select("b").is_ok());
        assert_eq!(ledger.selected(), Some("b"));
    }

    #[tokio::test]
    async fn test_preview_does_not_touch_balances() {
        let mut ledger = ledger();
        ledger.load_balances().await.unwrap();
        ledger.track_request(request("a", "Earned Leave", 5)).unwrap();

        let preview = ledger
            .preview_update("a", &request("a", "Casual Leave", 3))
            .unwrap();

        assert!(preview.has_changes);
        assert!(preview.validation.is_valid());
        let projected = preview.projected.unwrap();
        assert_eq!(projected.get(LeaveCategory::Earned), 25);
        assert_eq!(projected.get(LeaveCategory::Casual), 7);
        assert_eq!(ledger.balances().get(LeaveCategory::Earned), 20);
    }

    #[tokio::test]
    async fn test_validate_form() {
        let mut ledger = ledger();
        ledger.load_balances().await.unwrap();

        assert!(ledger.validate_form("Casual Leave", 10).is_valid());
        assert!(!ledger.validate_form("Casual Leave", 11).is_valid());
        assert_eq!(
            ledger.validate_form("Sabbatical", 400).message(),
            "Leave type processing"
        );
    }

    #[test]
    fn test_charged_days_rounds_up_to_whole_days() {
        let ledger = ledger();
        assert_eq!(ledger.charged_days(60), 1);
        assert_eq!(ledger.charged_days(480), 1);
        assert_eq!(ledger.charged_days(500), 2);
        assert_eq!(ledger.charged_days(0), 0);
    }

    #[tokio::test]
    async fn test_within_timeout_wraps_other_errors() {
        let err = within_timeout(Duration::from_secs(1), async {
            Err(LeaveError::Storage("disk full".to_string()))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, LeaveError::Persistence(message) if message.contains("disk full")));
    }
}
