//! Core types and data structures for the leave system

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Leave categories an employee holds a balance for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveCategory {
    Sick,
    Earned,
    Casual,
    Unpaid,
    Maternity,
    Paternity,
    Compensatory,
    Bereavement,
}

impl LeaveCategory {
    /// Every category, in display order
    pub const ALL: [LeaveCategory; 8] = [
        LeaveCategory::Sick,
        LeaveCategory::Earned,
        LeaveCategory::Casual,
        LeaveCategory::Unpaid,
        LeaveCategory::Maternity,
        LeaveCategory::Paternity,
        LeaveCategory::Compensatory,
        LeaveCategory::Bereavement,
    ];

    /// Human-readable label shown on requests and forms
    pub fn label(&self) -> &'static str {
        match self {
            LeaveCategory::Sick => "Sick Leave",
            LeaveCategory::Earned => "Earned Leave",
            LeaveCategory::Casual => "Casual Leave",
            LeaveCategory::Unpaid => "Unpaid Leave",
            LeaveCategory::Maternity => "Maternity Leave",
            LeaveCategory::Paternity => "Paternity Leave",
            LeaveCategory::Compensatory => "Compensatory Off",
            LeaveCategory::Bereavement => "Bereavement Leave",
        }
    }

    /// Short lowercase key used in configuration and drafts
    pub fn key(&self) -> &'static str {
        match self {
            LeaveCategory::Sick => "sick",
            LeaveCategory::Earned => "earned",
            LeaveCategory::Casual => "casual",
            LeaveCategory::Unpaid => "unpaid",
            LeaveCategory::Maternity => "maternity",
            LeaveCategory::Paternity => "paternity",
            LeaveCategory::Compensatory => "compensatory",
            LeaveCategory::Bereavement => "bereavement",
        }
    }

    /// Resolve a category from its human-readable label
    pub fn from_label(label: &str) -> LeaveResult<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.label() == label)
            .ok_or_else(|| LeaveError::UnknownCategory(label.to_string()))
    }

    /// Resolve a category from its lowercase key
    pub fn from_key(key: &str) -> LeaveResult<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.key() == key)
            .ok_or_else(|| LeaveError::UnknownCategory(key.to_string()))
    }

    /// Whether a request of this category may move to another category
    pub fn change_policy(&self) -> ChangePolicy {
        match self {
            LeaveCategory::Casual | LeaveCategory::Earned | LeaveCategory::Unpaid => {
                ChangePolicy::Interchangeable
            }
            LeaveCategory::Sick
            | LeaveCategory::Maternity
            | LeaveCategory::Paternity
            | LeaveCategory::Bereavement
            | LeaveCategory::Compensatory => ChangePolicy::Fixed,
        }
    }

    /// Returns true if a request of this category may be changed to `target`
    pub fn can_change_to(&self, target: LeaveCategory) -> bool {
        match self.change_policy() {
            ChangePolicy::Fixed => *self == target,
            ChangePolicy::Interchangeable => {
                target.change_policy() == ChangePolicy::Interchangeable
            }
        }
    }
}

impl fmt::Display for LeaveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LeaveCategory {
    type Err = LeaveError;

    /// Accepts either the label ("Earned Leave") or the key ("earned")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).or_else(|_| Self::from_key(s))
    }
}

/// Category change policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangePolicy {
    /// The request must stay in its category
    Fixed,
    /// The request may move between any interchangeable categories
    Interchangeable,
}

/// Lifecycle status of a leave request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Saved,
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Returns true for statuses that still hold days against a balance
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            LeaveStatus::Saved | LeaveStatus::Pending | LeaveStatus::Approved
        )
    }
}

/// A single leave request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier for the request
    pub id: String,
    /// Human-readable leave type label, e.g. "Earned Leave"
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Business days held by this request
    pub duration: u32,
    pub status: LeaveStatus,
    pub reason: String,
    pub approver: Option<String>,
    pub approval_date: Option<NaiveDate>,
    pub comments: Option<String>,
    /// Duration before the first partial cancellation
    pub original_duration: Option<u32>,
    /// When the request was created
    pub created_at: NaiveDateTime,
    /// When the request was last updated
    pub updated_at: NaiveDateTime,
}

impl LeaveRequest {
    /// Create a new request with an explicit duration
    pub fn new(
        id: String,
        leave_type: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        duration: u32,
        reason: String,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            leave_type,
            start_date,
            end_date,
            duration,
            status: LeaveStatus::Saved,
            reason,
            approver: None,
            approval_date: None,
            comments: None,
            original_duration: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Resolve the request's category from its type label
    pub fn category(&self) -> LeaveResult<LeaveCategory> {
        LeaveCategory::from_label(&self.leave_type)
    }

    /// Returns true if `date` lies within the request's range
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

/// Remaining days per leave category for one employee
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSheet {
    balances: BTreeMap<LeaveCategory, u32>,
}

impl BalanceSheet {
    /// Create an empty balance sheet; every category reads as zero
    pub fn new() -> Self {
        Self::default()
    }

    /// The default yearly allotment handed out to a new employee
    pub fn standard_allotment() -> Self {
        Self::from_iter([
            (LeaveCategory::Sick, 15),
            (LeaveCategory::Earned, 20),
            (LeaveCategory::Casual, 10),
            (LeaveCategory::Unpaid, 30),
            (LeaveCategory::Maternity, 90),
            (LeaveCategory::Paternity, 15),
            (LeaveCategory::Compensatory, 5),
            (LeaveCategory::Bereavement, 7),
        ])
    }

    /// Days remaining in a category
    pub fn get(&self, category: LeaveCategory) -> u32 {
        self.balances.get(&category).copied().unwrap_or(0)
    }

    /// Overwrite the balance of a category
    pub fn set(&mut self, category: LeaveCategory, days: u32) {
        self.balances.insert(category, days);
    }

    /// Sum of every category's balance
    pub fn total(&self) -> u64 {
        self.balances.values().map(|days| u64::from(*days)).sum()
    }

    /// Iterate over the categories present in the sheet
    pub fn iter(&self) -> impl Iterator<Item = (LeaveCategory, u32)> + '_ {
        self.balances.iter().map(|(category, days)| (*category, *days))
    }
}

impl FromIterator<(LeaveCategory, u32)> for BalanceSheet {
    fn from_iter<I: IntoIterator<Item = (LeaveCategory, u32)>>(iter: I) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}

/// Direction of a balance entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Days returned to the balance
    Credit,
    /// Days charged against the balance
    Debit,
}

/// One line of a balance impact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub category: LeaveCategory,
    pub entry_type: EntryType,
    /// Always positive; zero-day entries are never produced
    pub days: u32,
}

impl BalanceEntry {
    /// Create a credit entry
    pub fn credit(category: LeaveCategory, days: u32) -> Self {
        Self {
            category,
            entry_type: EntryType::Credit,
            days,
        }
    }

    /// Create a debit entry
    pub fn debit(category: LeaveCategory, days: u32) -> Self {
        Self {
            category,
            entry_type: EntryType::Debit,
            days,
        }
    }

    /// Signed effect on the category balance
    pub fn signed_days(&self) -> i64 {
        match self.entry_type {
            EntryType::Credit => i64::from(self.days),
            EntryType::Debit => -i64::from(self.days),
        }
    }
}

/// Per-category balance changes produced by replacing one request with another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationImpact {
    pub old_category: LeaveCategory,
    pub new_category: LeaveCategory,
    pub old_duration: u32,
    pub new_duration: u32,
    pub entries: Vec<BalanceEntry>,
}

impl ModificationImpact {
    /// Calculate total credited days
    pub fn total_credits(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Credit)
            .map(|e| u64::from(e.days))
            .sum()
    }

    /// Calculate total debited days
    pub fn total_debits(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Debit)
            .map(|e| u64::from(e.days))
            .sum()
    }

    /// Net signed change for one category
    pub fn delta_for(&self, category: LeaveCategory) -> i64 {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .map(BalanceEntry::signed_days)
            .sum()
    }

    /// Net change across all categories (credits minus debits)
    pub fn net_change(&self) -> i64 {
        self.entries.iter().map(BalanceEntry::signed_days).sum()
    }

    /// Returns true when applying the impact changes nothing
    pub fn is_noop(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true when the request moved to a different category
    pub fn changes_category(&self) -> bool {
        self.old_category != self.new_category
    }
}

/// Outcome of checking a requested duration against a balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationResult {
    Sufficient {
        category: LeaveCategory,
        requested: u32,
        available: u32,
    },
    Insufficient {
        category: LeaveCategory,
        requested: u32,
        available: u32,
    },
    /// The leave type label could not be resolved yet; not a failure
    Unresolved { label: String },
}

impl ValidationResult {
    /// Returns true unless the balance is insufficient
    pub fn is_valid(&self) -> bool {
        !matches!(self, ValidationResult::Insufficient { .. })
    }

    /// Message suitable for inline form feedback
    pub fn message(&self) -> String {
        match self {
            ValidationResult::Sufficient { .. } => "Sufficient balance".to_string(),
            ValidationResult::Insufficient {
                category,
                requested,
                available,
            } => LeaveError::InsufficientBalance {
                category: *category,
                requested: *requested,
                available: *available,
            }
            .to_string(),
            ValidationResult::Unresolved { .. } => "Leave type processing".to_string(),
        }
    }

    /// Convert an insufficient result into its error
    pub fn into_result(self) -> LeaveResult<Self> {
        match self {
            ValidationResult::Insufficient {
                category,
                requested,
                available,
            } => Err(LeaveError::InsufficientBalance {
                category,
                requested,
                available,
            }),
            other => Ok(other),
        }
    }
}

/// Errors that can occur in the leave system
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaveError {
    #[error("Unknown leave category: {0}")]
    UnknownCategory(String),
    #[error("Insufficient {category} balance. Available: {available} days, Required: {requested} days")]
    InsufficientBalance {
        category: LeaveCategory,
        requested: u32,
        available: u32,
    },
    #[error("Balance integrity violated: {category} would become {would_be}")]
    BalanceIntegrity {
        category: LeaveCategory,
        would_be: i64,
    },
    #[error("Persistence failure: {0}")]
    Persistence(String),
    #[error("Cannot change {from} to {to}")]
    ChangeNotAllowed {
        from: LeaveCategory,
        to: LeaveCategory,
    },
    #[error("Leave on {0} can no longer be modified")]
    OutsideGracePeriod(NaiveDate),
    #[error("Leave request not found: {0}")]
    RequestNotFound(String),
    #[error("Another leave transaction is already in progress")]
    TransactionInProgress,
    #[error("Invalid transaction state: {0}")]
    InvalidState(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LeaveError {
    /// Soft errors are transient and are not surfaced to the user
    pub fn is_soft(&self) -> bool {
        matches!(self, LeaveError::UnknownCategory(_))
    }
}

/// Result type for leave operations
pub type LeaveResult<T> = Result<T, LeaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_table_round_trips() {
        for category in LeaveCategory::ALL {
            assert_eq!(LeaveCategory::from_label(category.label()).unwrap(), category);
            assert_eq!(category.key().parse::<LeaveCategory>().unwrap(), category);
        }
        assert_eq!(
            LeaveCategory::from_label("Compensatory Off").unwrap(),
            LeaveCategory::Compensatory
        );
    }

    #[test]
    fn test_unknown_label_is_soft_error() {
        let err = LeaveCategory::from_label("Study Leave").unwrap_err();
        assert_eq!(err, LeaveError::UnknownCategory("Study Leave".to_string()));
        assert!(err.is_soft());
    }

    #[test]
    fn test_change_policy() {
        use LeaveCategory::*;

        for fixed in [Sick, Maternity, Paternity, Bereavement, Compensatory] {
            assert!(fixed.can_change_to(fixed));
            assert!(!fixed.can_change_to(Earned));
        }
        for from in [Casual, Earned, Unpaid] {
            for to in [Casual, Earned, Unpaid] {
                assert!(from.can_change_to(to));
            }
            assert!(!from.can_change_to(Sick));
        }
    }

    #[test]
    fn test_balance_sheet_defaults_to_zero() {
        let sheet = BalanceSheet::new();
        assert_eq!(sheet.get(LeaveCategory::Earned), 0);

        let standard = BalanceSheet::standard_allotment();
        assert_eq!(standard.get(LeaveCategory::Maternity), 90);
        assert_eq!(standard.total(), 192);
    }

    #[test]
    fn test_insufficient_message() {
        let result = ValidationResult::Insufficient {
            category: LeaveCategory::Casual,
            requested: 15,
            available: 10,
        };
        assert!(!result.is_valid());
        assert_eq!(
            result.message(),
            "Insufficient Casual Leave balance. Available: 10 days, Required: 15 days"
        );
    }

    #[test]
    fn test_category_serializes_as_key() {
        let json = serde_json::to_string(&LeaveCategory::Compensatory).unwrap();
        assert_eq!(json, "\"compensatory\"");
    }
}
