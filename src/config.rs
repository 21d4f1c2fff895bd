//! Configuration
//!
//! Loaded from TOML with per-field defaults; a handful of values can be
//! overridden from the environment.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::types::*;
use crate::units::RoundingConfig;
use crate::utils::calendar::GracePeriod;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub grace_period: GracePeriodConfig,

    #[serde(default)]
    pub submission: SubmissionConfig,

    #[serde(default)]
    pub units: RoundingConfig,

    /// Opening balances keyed by category key, e.g. `earned = 20`
    #[serde(default = "default_balances")]
    pub balances: BTreeMap<String, u32>,
}

fn default_balances() -> BTreeMap<String, u32> {
    BalanceSheet::standard_allotment()
        .iter()
        .map(|(category, days)| (category.key().to_string(), days))
        .collect()
}

impl Default for LeaveConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            grace_period: GracePeriodConfig::default(),
            submission: SubmissionConfig::default(),
            units: RoundingConfig::default(),
            balances: default_balances(),
        }
    }
}

/// Reconciliation engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_enforce_change_policy")]
    pub enforce_change_policy: bool,
}

fn default_enforce_change_policy() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enforce_change_policy: default_enforce_change_policy(),
        }
    }
}

/// Same-day modification cutoff
#[derive(Debug, Clone, Deserialize)]
pub struct GracePeriodConfig {
    #[serde(default = "default_cutoff_hour")]
    pub cutoff_hour: u32,

    #[serde(default)]
    pub cutoff_minute: u32,
}

fn default_cutoff_hour() -> u32 {
    9
}

impl Default for GracePeriodConfig {
    fn default() -> Self {
        Self {
            cutoff_hour: default_cutoff_hour(),
            cutoff_minute: 0,
        }
    }
}

impl GracePeriodConfig {
    pub fn grace_period(&self) -> LeaveResult<GracePeriod> {
        GracePeriod::new(self.cutoff_hour, self.cutoff_minute)
    }
}

/// Downstream submission settings
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl SubmissionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl LeaveConfig {
    fn parse(content: &str) -> LeaveResult<Self> {
        toml::from_str(content).map_err(|e| LeaveError::Config(e.to_string()))
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> LeaveResult<Self> {
        let config = Self::parse(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, then apply environment overrides
    pub fn load(path: &Path) -> LeaveResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LeaveError::Config(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::parse(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        tracing::info!("Loaded leave config from {:?}", path);
        Ok(config)
    }

    /// Opening balance sheet built from the `[balances]` section
    pub fn balance_sheet(&self) -> LeaveResult<BalanceSheet> {
        self.balances
            .iter()
            .map(|(key, days)| -> LeaveResult<(LeaveCategory, u32)> {
                Ok((LeaveCategory::from_key(key)?, *days))
            })
            .collect()
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> LeaveResult<()> {
        self.grace_period.grace_period()?;
        self.balance_sheet()?;
        self.units.validate()?;
        if self.submission.timeout_ms == 0 {
            return Err(LeaveError::Config(
                "submission timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(timeout) = std::env::var("LEAVE_SUBMISSION_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.submission.timeout_ms = ms;
            }
        }
        if let Ok(hour) = std::env::var("LEAVE_GRACE_CUTOFF_HOUR") {
            if let Ok(h) = hour.parse() {
                self.grace_period.cutoff_hour = h;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = LeaveConfig::from_toml("").unwrap();

        assert!(config.engine.enforce_change_policy);
        assert_eq!(config.grace_period.cutoff_hour, 9);
        assert_eq!(config.submission.timeout(), Duration::from_secs(10));
        assert_eq!(config.units.full_day_minutes, 480);
        assert_eq!(
            config.balance_sheet().unwrap(),
            BalanceSheet::standard_allotment()
        );
        assert_eq!(
            LeaveConfig::default().balance_sheet().unwrap(),
            BalanceSheet::standard_allotment()
        );
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = LeaveConfig::from_toml(
            r#"
            [engine]
            enforce_change_policy = false

            [grace_period]
            cutoff_hour = 10
            cutoff_minute = 30

            [units]
            deduction_rounding = "floor"

            [balances]
            earned = 12
            casual = 4
            "#,
        )
        .unwrap();

        assert!(!config.engine.enforce_change_policy);
        assert_eq!(config.grace_period.cutoff_minute, 30);
        assert_eq!(
            config.units.deduction_rounding,
            crate::units::RoundingMode::Floor
        );
        let balances = config.balance_sheet().unwrap();
        assert_eq!(balances.get(LeaveCategory::Earned), 12);
        assert_eq!(balances.get(LeaveCategory::Sick), 0);
    }

    #[test]
    fn test_env_overrides_are_validated() {
        let path = std::env::temp_dir().join(format!("leave-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[submission]\ntimeout_ms = 2500\n").unwrap();

        assert_eq!(
            LeaveConfig::load(&path).unwrap().submission.timeout(),
            Duration::from_millis(2500)
        );

        // Only this test touches the variable
        std::env::set_var("LEAVE_SUBMISSION_TIMEOUT_MS", "0");
        let result = LeaveConfig::load(&path);
        std::env::remove_var("LEAVE_SUBMISSION_TIMEOUT_MS");
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(LeaveError::Config(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = LeaveConfig::from_toml("[grace_period]\ncutoff_hour = 25\n").unwrap_err();
        assert!(matches!(err, LeaveError::Config(_)));

        let err = LeaveConfig::from_toml("[balances]\nstudy = 3\n").unwrap_err();
        assert_eq!(err, LeaveError::UnknownCategory("study".to_string()));
    }
}
