// Engine settings: embedded defaults, optionally overlaid by a JSON file, then by environment variables.
use crate::error::{EngineError, Result};
use crate::timeseries::AggMode;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../config/default.json");

/// What the dashboard builder does when a single KPI or chart fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The first failing item aborts the whole dashboard.
    #[default]
    Strict,
    /// Failing items are reported and left out of the document.
    SkipFailed,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub default_agg_mode: AggMode,
    pub drop_all_zero_months: bool,
    pub default_currency: String,
    pub max_kpis: usize,
    pub max_charts: usize,
    pub max_insights: usize,
    pub default_top_n: usize,
    pub preview_rows: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            default_agg_mode: AggMode::GroupBy,
            drop_all_zero_months: true,
            default_currency: "BRL".to_string(),
            max_kpis: 6,
            max_charts: 4,
            max_insights: 4,
            default_top_n: 5,
            preview_rows: 5,
            failure_policy: FailurePolicy::Strict,
        }
    }
}

impl EngineSettings {
    /// Embedded defaults, the optional JSON file on top, then `DEFAULT_AGG_MODE` /
    /// `DEFAULT_DROP_ALL_ZERO` from the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let overlay = match path {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
                EngineError::ConfigError(format!("cannot read '{}': {}", path.display(), e))
            })?),
            None => None,
        };
        let mut settings = Self::from_json_overlay(overlay.as_deref())?;
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        tracing::debug!(?settings, "Engine settings loaded");
        Ok(settings)
    }

    pub fn from_json_overlay(overlay: Option<&str>) -> Result<Self> {
        let mut merged: Value = serde_json::from_str(DEFAULT_CONFIG)
            .map_err(|e| EngineError::ConfigError(format!("embedded defaults: {}", e)))?;
        if let Some(text) = overlay {
            let patch: Value = serde_json::from_str(text)
                .map_err(|e| EngineError::ConfigError(format!("settings file: {}", e)))?;
            merge(&mut merged, patch);
        }
        let settings: EngineSettings = serde_json::from_value(merged)
            .map_err(|e| EngineError::ConfigError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("DEFAULT_AGG_MODE") {
            self.default_agg_mode = AggMode::from_label(&mode);
        }
        if let Some(flag) = lookup("DEFAULT_DROP_ALL_ZERO") {
            self.drop_all_zero_months =
                matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
    }

    fn validate(&self) -> Result<()> {
        if self.default_top_n == 0 {
            return Err(EngineError::ConfigError("default_top_n must be greater than 0".to_string()));
        }
        if self.default_currency.trim().is_empty() {
            return Err(EngineError::ConfigError("default_currency must not be empty".to_string()));
        }
        Ok(())
    }
}

fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_match_default_impl() {
        let settings = EngineSettings::from_json_overlay(None).unwrap();
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn test_overlay_keeps_unspecified_fields() {
        let settings =
            EngineSettings::from_json_overlay(Some(r#"{"default_agg_mode":"resample","max_kpis":3}"#)).unwrap();
        assert_eq!(settings.default_agg_mode, AggMode::Resample);
        assert_eq!(settings.max_kpis, 3);
        assert_eq!(settings.max_charts, 4);
        assert!(settings.drop_all_zero_months);
    }

    #[test]
    fn test_invalid_overlay_is_config_error() {
        let err = EngineSettings::from_json_overlay(Some(r#"{"default_top_n":0}"#)).unwrap_err();
        assert!(matches!(err, EngineError::ConfigError(_)));
        let err = EngineSettings::from_json_overlay(Some("not json")).unwrap_err();
        assert!(matches!(err, EngineError::ConfigError(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = EngineSettings::default();
        settings.apply_env_overrides(|key| match key {
            "DEFAULT_AGG_MODE" => Some(" Resample ".to_string()),
            "DEFAULT_DROP_ALL_ZERO" => Some("off".to_string()),
            _ => None,
        });
        assert_eq!(settings.default_agg_mode, AggMode::Resample);
        assert!(!settings.drop_all_zero_months);

        settings.apply_env_overrides(|key| (key == "DEFAULT_AGG_MODE").then(|| "weekly".to_string()));
        assert_eq!(settings.default_agg_mode, AggMode::GroupBy);
    }
}
