//! Saved leave application drafts

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::request::{generate_request_id, LeaveRequestBuilder};
use crate::types::*;

/// Drafts older than this are discarded on restore
pub fn draft_max_age() -> Duration {
    Duration::hours(24)
}

/// A leave application saved before submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDraft {
    pub leave_type: Option<LeaveCategory>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl LeaveDraft {
    /// Create an empty draft stamped at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            leave_type: None,
            start_date: None,
            end_date: None,
            reason: String::new(),
            timestamp: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp >= draft_max_age()
    }

    pub fn to_json(&self) -> LeaveResult<String> {
        serde_json::to_string(self).map_err(|e| LeaveError::Storage(e.to_string()))
    }

    pub fn from_json(json: &str) -> LeaveResult<Self> {
        serde_json::from_str(json).map_err(|e| LeaveError::Storage(e.to_string()))
    }

    /// Restore a stored draft, `None` if it has expired
    pub fn restore(json: &str, now: DateTime<Utc>) -> LeaveResult<Option<Self>> {
        let draft = Self::from_json(json)?;
        if draft.is_expired(now) {
            tracing::debug!("discarding expired leave draft from {}", draft.timestamp);
            return Ok(None);
        }
        Ok(Some(draft))
    }

    /// Turn a complete draft into a saved request
    pub fn into_request(self) -> LeaveResult<LeaveRequest> {
        let (category, start, end) = match (self.leave_type, self.start_date, self.end_date) {
            (Some(category), Some(start), Some(end)) => (category, start, end),
            _ => {
                return Err(LeaveError::Validation(
                    "Draft is missing a leave type or dates".to_string(),
                ))
            }
        };

        LeaveRequestBuilder::new(generate_request_id(), category, start, end)
            .reason(self.reason)
            .status(LeaveStatus::Saved)
            .build()
    }
}
