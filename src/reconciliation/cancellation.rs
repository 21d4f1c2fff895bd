//! Full and partial cancellation as a special case of the engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::reconciliation::BalanceReconciliationEngine;
use crate::types::*;
use crate::utils::calendar;

/// What a cancellation will do to a request and its balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CancellationPlan {
    /// The request is removed and its whole duration credited back
    Full {
        request: LeaveRequest,
        impact: ModificationImpact,
    },
    /// Some dates are cancelled and the request shrinks
    Partial {
        original: LeaveRequest,
        remaining: LeaveRequest,
        cancelled_dates: Vec<NaiveDate>,
        impact: ModificationImpact,
    },
}

impl CancellationPlan {
    pub fn impact(&self) -> &ModificationImpact {
        match self {
            CancellationPlan::Full { impact, .. } | CancellationPlan::Partial { impact, .. } => {
                impact
            }
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            CancellationPlan::Full { request, .. } => &request.id,
            CancellationPlan::Partial { original, .. } => &original.id,
        }
    }

    /// Days credited back by this cancellation
    pub fn cancelled_days(&self) -> u32 {
        let impact = self.impact();
        impact.old_duration - impact.new_duration
    }

    /// The shrunken request, `None` for a full cancellation
    pub fn remaining(&self) -> Option<&LeaveRequest> {
        match self {
            CancellationPlan::Full { .. } => None,
            CancellationPlan::Partial { remaining, .. } => Some(remaining),
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, CancellationPlan::Full { .. })
    }
}

impl BalanceReconciliationEngine {
    /// Plan cancelling the whole request
    pub fn plan_full_cancellation(&self, request: &LeaveRequest) -> LeaveResult<CancellationPlan> {
        let category = request.category()?;
        let impact = self.compute_impact_for(category, request.duration, category, 0);

        Ok(CancellationPlan::Full {
            request: request.clone(),
            impact,
        })
    }

    /// Plan cancelling the selected dates of a request
    ///
    /// Every date must be a weekday inside the request's range and appear once.
    /// When nothing would remain the plan degrades to a full cancellation;
    /// otherwise the remaining request spans the earliest to the latest
    /// remaining weekday.
    pub fn plan_partial_cancellation(
        &self,
        request: &LeaveRequest,
        dates: &[NaiveDate],
    ) -> LeaveResult<CancellationPlan> {
        if dates.is_empty() {
            return Err(LeaveError::Validation(
                "Please select at least one date to cancel".to_string(),
            ));
        }

        let mut cancelled = BTreeSet::new();
        for date in dates {
            if !request.covers(*date) {
                return Err(LeaveError::Validation(format!(
                    "{} is outside the leave period {} to {}",
                    date, request.start_date, request.end_date
                )));
            }
            if calendar::is_weekend(*date) {
                return Err(LeaveError::Validation(format!(
                    "{} falls on a weekend and was never charged",
                    date
                )));
            }
            if !cancelled.insert(*date) {
                return Err(LeaveError::Validation(format!(
                    "{} was selected more than once",
                    date
                )));
            }
        }

        let cancelled_days = cancelled.len() as u32;
        let remaining_dates: Vec<NaiveDate> =
            calendar::dates_in_range(request.start_date, request.end_date)
                .filter(|date| !calendar::is_weekend(*date) && !cancelled.contains(date))
                .collect();

        let (first, last) = match (remaining_dates.first(), remaining_dates.last()) {
            (Some(first), Some(last)) if cancelled_days < request.duration => (*first, *last),
            _ => return self.plan_full_cancellation(request),
        };

        let category = request.category()?;
        let remaining_duration = request.duration - cancelled_days;
        let impact = self.compute_impact_for(category, request.duration, category, remaining_duration);

        let mut remaining = request.clone();
        remaining.original_duration.get_or_insert(request.duration);
        remaining.start_date = first;
        remaining.end_date = last;
        remaining.duration = remaining_duration;
        remaining.touch();

        Ok(CancellationPlan::Partial {
            original: request.clone(),
            remaining,
            cancelled_dates: cancelled.into_iter().collect(),
            impact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    // Monday 2024-03-11 through Wednesday 2024-03-13
    fn three_day_earned() -> LeaveRequest {
        LeaveRequest::new(
            "LV-1".to_string(),
            "Earned Leave".to_string(),
            date(11),
            date(13),
            3,
            "Vacation".to_string(),
        )
    }

    #[test]
    fn test_full_cancellation_credits_whole_duration() {
        let engine = BalanceReconciliationEngine::new();
        let balances = BalanceSheet::from_iter([(LeaveCategory::Earned, 20)]);

        let plan = engine.plan_full_cancellation(&three_day_earned()).unwrap();
        assert!(plan.is_full());
        assert_eq!(plan.cancelled_days(), 3);

        let after = engine.apply(plan.impact(), &balances).unwrap();
        assert_eq!(after.get(LeaveCategory::Earned), 23);
    }

    #[test]
    fn test_partial_cancellation_of_trailing_date() {
        let engine = BalanceReconciliationEngine::new();
        let balances = BalanceSheet::from_iter([(LeaveCategory::Earned, 20)]);

        let plan = engine
            .plan_partial_cancellation(&three_day_earned(), &[date(13)])
            .unwrap();
        let remaining = plan.remaining().unwrap();

        assert_eq!(remaining.duration, 2);
        assert_eq!(remaining.start_date, date(11));
        assert_eq!(remaining.end_date, date(12));
        assert_eq!(remaining.original_duration, Some(3));

        let after = engine.apply(plan.impact(), &balances).unwrap();
        assert_eq!(after.get(LeaveCategory::Earned), 21);
    }

    #[test]
    fn test_partial_cancellation_of_middle_date_keeps_outer_range() {
        let engine = BalanceReconciliationEngine::new();
        let plan = engine
            .plan_partial_cancellation(&three_day_earned(), &[date(12)])
            .unwrap();
        let remaining = plan.remaining().unwrap();

        assert_eq!(remaining.duration, 2);
        assert_eq!(remaining.start_date, date(11));
        assert_eq!(remaining.end_date, date(13));
    }

    #[test]
    fn test_cancelling_every_date_degrades_to_full() {
        let engine = BalanceReconciliationEngine::new();
        let plan = engine
            .plan_partial_cancellation(&three_day_earned(), &[date(11), date(12), date(13)])
            .unwrap();

        assert!(plan.is_full());
        assert_eq!(plan.cancelled_days(), 3);
        assert!(plan.remaining().is_none());
    }

    #[test]
    fn test_remaining_range_skips_weekends() {
        let engine = BalanceReconciliationEngine::new();
        // Friday 2024-03-08 through Tuesday 2024-03-12
        let request = LeaveRequest::new(
            "LV-2".to_string(),
            "Casual Leave".to_string(),
            date(8),
            date(12),
            3,
            "Trip".to_string(),
        );

        let plan = engine.plan_partial_cancellation(&request, &[date(8)]).unwrap();
        let remaining = plan.remaining().unwrap();
        assert_eq!(remaining.start_date, date(11));
        assert_eq!(remaining.duration, 2);
    }

    #[test]
    fn test_invalid_selections_rejected() {
        let engine = BalanceReconciliationEngine::new();
        let request = three_day_earned();

        assert!(engine.plan_partial_cancellation(&request, &[]).is_err());
        assert!(engine.plan_partial_cancellation(&request, &[date(14)]).is_err());
        assert!(engine
            .plan_partial_cancellation(&request, &[date(11), date(11)])
            .is_err());
    }
}
