//! Leave request construction

use chrono::NaiveDate;
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;
use crate::utils::calendar;

/// Generate a fresh request identifier
pub fn generate_request_id() -> String {
    format!("LV-{}", Uuid::new_v4().simple())
}

/// Builder for leave requests
///
/// The duration defaults to the number of weekdays in the date range.
#[derive(Debug)]
pub struct LeaveRequestBuilder {
    request: LeaveRequest,
}

impl LeaveRequestBuilder {
    /// Start a request for `category` over `[start_date, end_date]`
    pub fn new(
        id: String,
        category: LeaveCategory,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let duration = calendar::business_days_between(start_date, end_date);
        Self {
            request: LeaveRequest::new(
                id,
                category.label().to_string(),
                start_date,
                end_date,
                duration,
                String::new(),
            ),
        }
    }

    /// Set the reason for the leave
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.request.reason = reason.into();
        self
    }

    /// Override the derived duration
    pub fn duration(mut self, duration: u32) -> Self {
        self.request.duration = duration;
        self
    }

    pub fn status(mut self, status: LeaveStatus) -> Self {
        self.request.status = status;
        self
    }

    /// Mark the request approved by `approver` on `date`
    pub fn approved_by(mut self, approver: impl Into<String>, date: NaiveDate) -> Self {
        self.request.status = LeaveStatus::Approved;
        self.request.approver = Some(approver.into());
        self.request.approval_date = Some(date);
        self
    }

    pub fn comments(mut self, comments: impl Into<String>) -> Self {
        self.request.comments = Some(comments.into());
        self
    }

    /// Build the request
    pub fn build(self) -> LeaveResult<LeaveRequest> {
        DefaultRequestValidator.validate_request(&self.request)?;
        Ok(self.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_derives_business_days() {
        // Friday 2024-03-08 through Tuesday 2024-03-12
        let request = LeaveRequestBuilder::new(
            "LV-1".to_string(),
            LeaveCategory::Casual,
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
        )
        .reason("Wedding")
        .build()
        .unwrap();

        assert_eq!(request.duration, 3);
        assert_eq!(request.leave_type, "Casual Leave");
        assert_eq!(request.status, LeaveStatus::Saved);
    }

    #[test]
    fn test_builder_rejects_weekend_only_range() {
        let result = LeaveRequestBuilder::new(
            generate_request_id(),
            LeaveCategory::Earned,
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        )
        .build();

        assert!(matches!(result, Err(LeaveError::Validation(_))));
    }

    #[test]
    fn test_approval_fields() {
        let approved_on = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let request = LeaveRequestBuilder::new(
            generate_request_id(),
            LeaveCategory::Sick,
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
        )
        .approved_by("Priya Nair", approved_on)
        .comments("Get well soon")
        .build()
        .unwrap();

        assert_eq!(request.status, LeaveStatus::Approved);
        assert_eq!(request.approval_date, Some(approved_on));
        assert!(request.id.starts_with("LV-"));
    }
}
