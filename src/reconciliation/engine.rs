//! Balance impact computation, validation, and all-or-nothing application

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::types::*;

/// Computes and applies the balance effect of replacing one leave request with another
///
/// The engine holds no balances of its own; every operation works on a
/// [`BalanceSheet`] the caller owns.
#[derive(Debug, Clone)]
pub struct BalanceReconciliationEngine {
    enforce_change_policy: bool,
}

impl Default for BalanceReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceReconciliationEngine {
    /// Create an engine that enforces the category change policy
    pub fn new() -> Self {
        Self {
            enforce_change_policy: true,
        }
    }

    /// Create an engine from configuration
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            enforce_change_policy: config.enforce_change_policy,
        }
    }

    /// Compute the impact of replacing `old` with `new`, resolving both type labels
    pub fn compute_impact(
        &self,
        old: &LeaveRequest,
        new: &LeaveRequest,
    ) -> LeaveResult<ModificationImpact> {
        let old_category = old.category()?;
        let new_category = new.category()?;
        Ok(self.compute_impact_for(old_category, old.duration, new_category, new.duration))
    }

    /// Compute the impact of replacing `old_duration` days of `old_category`
    /// with `new_duration` days of `new_category`
    pub fn compute_impact_for(
        &self,
        old_category: LeaveCategory,
        old_duration: u32,
        new_category: LeaveCategory,
        new_duration: u32,
    ) -> ModificationImpact {
        let mut entries = Vec::with_capacity(2);

        if old_category == new_category {
            if old_duration > new_duration {
                entries.push(BalanceEntry::credit(old_category, old_duration - new_duration));
            } else if new_duration > old_duration {
                entries.push(BalanceEntry::debit(new_category, new_duration - old_duration));
            }
        } else {
            // The old request is released in full and the new one charged in full
            if old_duration > 0 {
                entries.push(BalanceEntry::credit(old_category, old_duration));
            }
            if new_duration > 0 {
                entries.push(BalanceEntry::debit(new_category, new_duration));
            }
        }

        let impact = ModificationImpact {
            old_category,
            new_category,
            old_duration,
            new_duration,
            entries,
        };
        tracing::debug!(
            old = %old_category,
            new = %new_category,
            old_duration,
            new_duration,
            net = impact.net_change(),
            "computed balance impact"
        );
        impact
    }

    /// Check a requested duration against the balance of one category
    pub fn validate(
        &self,
        category: LeaveCategory,
        duration: u32,
        balances: &BalanceSheet,
    ) -> ValidationResult {
        let available = balances.get(category);
        if available < duration {
            ValidationResult::Insufficient {
                category,
                requested: duration,
                available,
            }
        } else {
            ValidationResult::Sufficient {
                category,
                requested: duration,
                available,
            }
        }
    }

    /// Like [`validate`](Self::validate) but starting from a type label
    ///
    /// A label that does not resolve is reported as `Unresolved`, not as a failure.
    pub fn validate_label(
        &self,
        label: &str,
        duration: u32,
        balances: &BalanceSheet,
    ) -> ValidationResult {
        match LeaveCategory::from_label(label) {
            Ok(category) => self.validate(category, duration, balances),
            Err(_) => {
                tracing::debug!(label, "leave type not resolved yet, skipping validation");
                ValidationResult::Unresolved {
                    label: label.to_string(),
                }
            }
        }
    }

    /// Validate the new side of a modification against the pre-application sheet
    ///
    /// Within one category the days held by the old request count as available.
    /// Across categories only the new category's own balance counts.
    pub fn validate_impact(
        &self,
        impact: &ModificationImpact,
        balances: &BalanceSheet,
    ) -> ValidationResult {
        let balance = balances.get(impact.new_category);
        let available = if impact.changes_category() {
            balance
        } else {
            balance.saturating_add(impact.old_duration)
        };

        if available < impact.new_duration {
            ValidationResult::Insufficient {
                category: impact.new_category,
                requested: impact.new_duration,
                available,
            }
        } else {
            ValidationResult::Sufficient {
                category: impact.new_category,
                requested: impact.new_duration,
                available,
            }
        }
    }

    /// Reject category changes the policy does not permit
    pub fn check_change_allowed(&self, from: LeaveCategory, to: LeaveCategory) -> LeaveResult<()> {
        if !self.enforce_change_policy || from.can_change_to(to) {
            Ok(())
        } else {
            Err(LeaveError::ChangeNotAllowed { from, to })
        }
    }

    /// Apply an impact, returning the resulting sheet
    ///
    /// Fails with `BalanceIntegrity` if any category would go negative; the
    /// input sheet is never modified.
    pub fn apply(
        &self,
        impact: &ModificationImpact,
        balances: &BalanceSheet,
    ) -> LeaveResult<BalanceSheet> {
        let mut deltas: BTreeMap<LeaveCategory, i64> = BTreeMap::new();
        for entry in &impact.entries {
            *deltas.entry(entry.category).or_insert(0) += entry.signed_days();
        }

        let mut updated = balances.clone();
        for (category, delta) in deltas {
            let would_be = i64::from(balances.get(category)) + delta;
            let days = u32::try_from(would_be)
                .map_err(|_| LeaveError::BalanceIntegrity { category, would_be })?;
            updated.set(category, days);
        }

        Ok(updated)
    }

    /// Apply an impact to `balances` in place with the same all-or-nothing guarantee
    pub fn apply_in_place(
        &self,
        impact: &ModificationImpact,
        balances: &mut BalanceSheet,
    ) -> LeaveResult<()> {
        *balances = self.apply(impact, balances)?;
        Ok(())
    }

    /// Restore `balances` to a previously captured snapshot
    pub fn rollback(&self, balances: &mut BalanceSheet, snapshot: BalanceSheet) {
        tracing::warn!("rolling balances back to captured snapshot");
        *balances = snapshot;
    }
}
