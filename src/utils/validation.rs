//! Validation utilities

use chrono::NaiveDate;

use crate::traits::*;
use crate::types::*;
use crate::utils::calendar;

/// Validate that a request ID is valid
pub fn validate_request_id(request_id: &str) -> LeaveResult<()> {
    if request_id.trim().is_empty() {
        return Err(LeaveError::Validation(
            "Request ID cannot be empty".to_string(),
        ));
    }

    if request_id.len() > 64 {
        return Err(LeaveError::Validation(
            "Request ID cannot exceed 64 characters".to_string(),
        ));
    }

    if !request_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LeaveError::Validation(
            "Request ID can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate the free-text reason for a request
pub fn validate_reason(reason: &str) -> LeaveResult<()> {
    if reason.trim().is_empty() {
        return Err(LeaveError::Validation(
            "Reason for leave cannot be empty".to_string(),
        ));
    }

    if reason.chars().count() > 500 {
        return Err(LeaveError::Validation(
            "Reason for leave cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a date range contains at least one business day
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> LeaveResult<u32> {
    if end < start {
        return Err(LeaveError::Validation(
            "End date cannot be before start date".to_string(),
        ));
    }

    let business_days = calendar::business_days_between(start, end);
    if business_days == 0 {
        return Err(LeaveError::Validation(
            "Selected dates contain no working days".to_string(),
        ));
    }

    Ok(business_days)
}

/// Enhanced request validator with detailed checks
pub struct EnhancedRequestValidator;

impl RequestValidator for EnhancedRequestValidator {
    fn validate_request(&self, request: &LeaveRequest) -> LeaveResult<()> {
        DefaultRequestValidator.validate_request(request)?;

        validate_request_id(&request.id)?;
        validate_reason(&request.reason)?;
        let business_days = validate_date_range(request.start_date, request.end_date)?;

        // Duration may be supplied directly, but never beyond what the range holds
        if request.duration > business_days {
            return Err(LeaveError::Validation(format!(
                "Duration of {} days exceeds the {} working days between {} and {}",
                request.duration, business_days, request.start_date, request.end_date
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(duration: u32, reason: &str) -> LeaveRequest {
        LeaveRequest::new(
            "req-1".to_string(),
            "Earned Leave".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 13).unwrap(),
            duration,
            reason.to_string(),
        )
    }

    #[test]
    fn test_enhanced_validator_accepts_consistent_request() {
        assert!(EnhancedRequestValidator
            .validate_request(&request(3, "Family trip"))
            .is_ok());
        assert!(EnhancedRequestValidator
            .validate_request(&request(2, "Family trip"))
            .is_ok());
    }

    #[test]
    fn test_enhanced_validator_rejects_bad_input() {
        assert!(EnhancedRequestValidator
            .validate_request(&request(4, "Family trip"))
            .is_err());
        assert!(EnhancedRequestValidator
            .validate_request(&request(3, "   "))
            .is_err());
        assert!(EnhancedRequestValidator
            .validate_request(&request(0, "Family trip"))
            .is_err());
    }

    #[test]
    fn test_request_id_characters() {
        assert!(validate_request_id("LV-2024_001").is_ok());
        assert!(validate_request_id("LV 001").is_err());
        assert!(validate_request_id("").is_err());
    }

    #[test]
    fn test_weekend_only_range_rejected() {
        let sat = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let sun = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert!(validate_date_range(sat, sun).is_err());
    }
}
