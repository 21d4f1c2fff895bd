//! Leave unit conversion and rounding
//!
//! Balances are tracked in whole days, but deductions, accruals, and
//! carry-forwards are computed in minutes and rounded to a policy unit first.
//! The ledger uses the deduction policy to charge part-day requests
//! (`LeaveLedger::charged_days`); the other conversions are standalone helpers.

use serde::{Deserialize, Serialize};

use crate::types::*;

/// How a minute amount is snapped to a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    /// Half a unit or more rounds up
    Nearest,
    Ceil,
    Floor,
}

/// Round `value` to a multiple of `step`; a zero step leaves the value alone
///
/// Rounding up past `u32::MAX` saturates.
pub fn round_minutes(value: u32, step: u32, mode: RoundingMode) -> u32 {
    if step == 0 {
        return value;
    }
    match mode {
        RoundingMode::Ceil => value.div_ceil(step).saturating_mul(step),
        RoundingMode::Floor => (value / step) * step,
        RoundingMode::Nearest => {
            let (quotient, remainder) = (value / step, value % step);
            if remainder >= step - remainder {
                (quotient + 1).saturating_mul(step)
            } else {
                quotient * step
            }
        }
    }
}

/// Format minutes as `h:mm`
pub fn format_hhmm(minutes: u32) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

fn default_full_day_minutes() -> u32 {
    480
}

fn default_min_apply_unit_minutes() -> u32 {
    240
}

fn default_min_carry_forward_unit_minutes() -> u32 {
    60
}

fn default_accrual_rounding() -> RoundingMode {
    RoundingMode::Nearest
}

fn default_deduction_rounding() -> RoundingMode {
    RoundingMode::Ceil
}

fn default_carry_forward_rounding() -> RoundingMode {
    RoundingMode::Floor
}

/// Rounding policy for leave units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingConfig {
    /// Length of a working day
    #[serde(default = "default_full_day_minutes")]
    pub full_day_minutes: u32,
    /// Smallest unit a request is charged in (half a day by default)
    #[serde(default = "default_min_apply_unit_minutes")]
    pub min_apply_unit_minutes: u32,
    #[serde(default = "default_min_carry_forward_unit_minutes")]
    pub min_carry_forward_unit_minutes: u32,
    #[serde(default = "default_accrual_rounding")]
    pub accrual_rounding: RoundingMode,
    #[serde(default = "default_deduction_rounding")]
    pub deduction_rounding: RoundingMode,
    #[serde(default = "default_carry_forward_rounding")]
    pub carry_forward_rounding: RoundingMode,
    /// Upper bound on what may be carried into the next period
    #[serde(default)]
    pub carry_forward_cap_minutes: Option<u32>,
}

impl Default for RoundingConfig {
    fn default() -> Self {
        Self {
            full_day_minutes: default_full_day_minutes(),
            min_apply_unit_minutes: default_min_apply_unit_minutes(),
            min_carry_forward_unit_minutes: default_min_carry_forward_unit_minutes(),
            accrual_rounding: default_accrual_rounding(),
            deduction_rounding: default_deduction_rounding(),
            carry_forward_rounding: default_carry_forward_rounding(),
            carry_forward_cap_minutes: None,
        }
    }
}

impl RoundingConfig {
    pub fn validate(&self) -> LeaveResult<()> {
        if self.full_day_minutes == 0 {
            return Err(LeaveError::Config(
                "full_day_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Minutes charged for a request of `request_minutes`
    pub fn deduction(&self, request_minutes: u32) -> u32 {
        round_minutes(
            request_minutes,
            self.min_apply_unit_minutes,
            self.deduction_rounding,
        )
    }

    /// Minutes carried forward from an unused balance, capped if configured
    pub fn carry_forward(&self, balance_minutes: u32) -> u32 {
        let rounded = round_minutes(
            balance_minutes,
            self.min_carry_forward_unit_minutes,
            self.carry_forward_rounding,
        );
        match self.carry_forward_cap_minutes {
            Some(cap) => rounded.min(cap),
            None => rounded,
        }
    }

    /// Accruals are tracked at one-minute granularity
    pub fn accrual(&self, accrued_minutes: u32) -> u32 {
        round_minutes(accrued_minutes, 1, self.accrual_rounding)
    }

    pub fn days_to_minutes(&self, days: f64) -> u32 {
        (days * f64::from(self.full_day_minutes)).round() as u32
    }

    pub fn minutes_to_days(&self, minutes: u32) -> f64 {
        f64::from(minutes) / f64::from(self.full_day_minutes)
    }

    /// Display helper, e.g. `1.5d`
    pub fn format_days(&self, minutes: u32) -> String {
        format!("{:.1}d", self.minutes_to_days(minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_modes() {
        assert_eq!(round_minutes(250, 240, RoundingMode::Ceil), 480);
        assert_eq!(round_minutes(250, 240, RoundingMode::Floor), 240);
        assert_eq!(round_minutes(120, 240, RoundingMode::Nearest), 240);
        assert_eq!(round_minutes(119, 240, RoundingMode::Nearest), 0);
        assert_eq!(round_minutes(77, 0, RoundingMode::Ceil), 77);
    }

    #[test]
    fn test_rounding_saturates_near_max() {
        assert_eq!(round_minutes(u32::MAX, 240, RoundingMode::Ceil), u32::MAX);
        assert_eq!(
            round_minutes(4_000_000_000, 2_500_000_000, RoundingMode::Nearest),
            u32::MAX
        );
        assert_eq!(round_minutes(u32::MAX, 240, RoundingMode::Floor), u32::MAX / 240 * 240);
        assert_eq!(round_minutes(u32::MAX - 1, u32::MAX, RoundingMode::Nearest), u32::MAX);
    }

    #[test]
    fn test_deduction_charges_half_days() {
        let config = RoundingConfig::default();
        assert_eq!(config.deduction(60), 240);
        assert_eq!(config.deduction(480), 480);
        assert_eq!(config.format_days(config.deduction(500)), "1.5d");
    }

    #[test]
    fn test_carry_forward_floors_and_caps() {
        let mut config = RoundingConfig::default();
        assert_eq!(config.carry_forward(1_000), 960);

        config.carry_forward_cap_minutes = Some(480);
        assert_eq!(config.carry_forward(1_000), 480);
    }

    #[test]
    fn test_conversions() {
        let config = RoundingConfig::default();
        assert_eq!(config.days_to_minutes(1.5), 720);
        assert_eq!(config.minutes_to_days(240), 0.5);
        assert_eq!(format_hhmm(485), "8:05");
    }
}
