// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::Result;
use crate::config_err;
use crate::layout::force::ForceConfig;
use crate::verdict::RiskLevel;

/// Cadence of a single progress run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Percentage points added on every tick (1..=100).
    pub increment_per_tick: u32,
    /// Wall-clock time between ticks.
    pub tick_interval_ms: u64,
    /// Number of equal sub-steps the 0-100 range is divided into.
    pub total_sub_steps: u32,
}

impl ProgressConfig {
    pub fn new(increment_per_tick: u32, tick_interval_ms: u64, total_sub_steps: u32) -> Self {
        Self {
            increment_per_tick,
            tick_interval_ms,
            total_sub_steps,
        }
    }

    /// Feature engineering: 5% every 150ms across five sub-steps.
    pub fn feature_engineering() -> Self {
        Self::new(5, 150, 5)
    }

    /// Model scoring: 10% every 300ms, a single phase.
    pub fn model_scoring() -> Self {
        Self::new(10, 300, 1)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Number of ticks a run needs to reach 100%.
    pub fn ticks_to_complete(&self) -> u32 {
        if self.increment_per_tick == 0 {
            return 0;
        }
        100_u32.div_ceil(self.increment_per_tick)
    }

    pub fn validate(&self) -> Result<()> {
        if self.increment_per_tick == 0 || self.increment_per_tick > 100 {
            return config_err!(format!(
                "increment_per_tick must be in 1..=100, got {}",
                self.increment_per_tick
            ));
        }
        if self.tick_interval_ms == 0 {
            return config_err!("tick_interval_ms must be positive".to_string());
        }
        if self.total_sub_steps == 0 {
            return config_err!("total_sub_steps must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Canned content of the verdict produced at the end of a scoring run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    pub subject_id: String,
    pub risk_level: RiskLevel,
    /// Lower bound of the synthesized confidence, in percent.
    pub confidence_min: f64,
    /// Upper bound of the synthesized confidence, in percent.
    pub confidence_max: f64,
    pub explanation: String,
}

impl VerdictConfig {
    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if !in_range(self.confidence_min) || !in_range(self.confidence_max) {
            return config_err!(format!(
                "confidence bounds must lie in [0, 100], got [{}, {}]",
                self.confidence_min, self.confidence_max
            ));
        }
        if self.confidence_min > self.confidence_max {
            return config_err!(format!(
                "confidence_min {} exceeds confidence_max {}",
                self.confidence_min, self.confidence_max
            ));
        }
        if self.subject_id.is_empty() {
            return config_err!("subject_id must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            subject_id: "U20260315007".to_string(),
            risk_level: RiskLevel::Medium,
            confidence_min: 85.0,
            confidence_max: 95.0,
            explanation: "The subject shows several fraud-risk indicators; \
                          further manual review is recommended."
                .to_string(),
        }
    }
}

/// Top-level configuration for a wizard session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    pub feature: ProgressConfig,
    pub scoring: ProgressConfig,
    pub verdict: VerdictConfig,
    pub layout: ForceConfig,
    /// Cadence of the graph animation loop.
    pub frame_interval_ms: u64,
    /// Seed for verdict synthesis and layout jiggle. `None` draws from OS
    /// entropy.
    pub seed: Option<u64>,
}

impl WizardConfig {
    /// Parse a (possibly partial) JSON document; absent fields keep their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: WizardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        self.feature.validate()?;
        self.scoring.validate()?;
        self.verdict.validate()?;
        self.layout.validate()?;
        if self.frame_interval_ms == 0 {
            return config_err!("frame_interval_ms must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            feature: ProgressConfig::feature_engineering(),
            scoring: ProgressConfig::model_scoring(),
            verdict: VerdictConfig::default(),
            layout: ForceConfig::default(),
            frame_interval_ms: 16,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;

    #[test]
    fn test_default_config() {
        let config = WizardConfig::default();

        assert_eq!(config.feature.increment_per_tick, 5);
        assert_eq!(config.feature.tick_interval_ms, 150);
        assert_eq!(config.feature.total_sub_steps, 5);
        assert_eq!(config.feature.ticks_to_complete(), 20);

        assert_eq!(config.scoring.increment_per_tick, 10);
        assert_eq!(config.scoring.tick_interval_ms, 300);
        assert_eq!(config.scoring.ticks_to_complete(), 10);

        assert!((config.verdict.confidence_min - 85.0).abs() < f64::EPSILON);
        assert!((config.verdict.confidence_max - 95.0).abs() < f64::EPSILON);
        assert_eq!(config.verdict.risk_level, RiskLevel::Medium);

        assert_eq!(config.frame_interval_ms, 16);
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ticks_to_complete_rounds_up() {
        assert_eq!(ProgressConfig::new(3, 10, 1).ticks_to_complete(), 34);
        assert_eq!(ProgressConfig::new(100, 10, 1).ticks_to_complete(), 1);
        assert_eq!(ProgressConfig::new(30, 10, 1).ticks_to_complete(), 4);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = WizardConfig::from_json_str(
            r#"{
                "scoring": {
                    "increment_per_tick": 25,
                    "tick_interval_ms": 50,
                    "total_sub_steps": 1
                },
                "verdict": { "subject_id": "U1" },
                "seed": 7
            }"#,
        )
        .unwrap();
        assert_eq!(config.scoring, ProgressConfig::new(25, 50, 1));
        assert_eq!(config.verdict.subject_id, "U1");
        assert!((config.verdict.confidence_max - 95.0).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.feature, ProgressConfig::feature_engineering());

        // a progress cadence must be given in full
        let partial = r#"{ "feature": { "tick_interval_ms": 50 } }"#;
        assert!(WizardConfig::from_json_str(partial).is_err());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let err = ProgressConfig::new(0, 150, 5).validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);
        assert!(ProgressConfig::new(101, 150, 5).validate().is_err());
        assert!(ProgressConfig::new(5, 0, 5).validate().is_err());
        assert!(ProgressConfig::new(5, 150, 0).validate().is_err());

        let verdict = VerdictConfig {
            confidence_min: 96.0,
            ..VerdictConfig::default()
        };
        assert!(verdict.validate().is_err());

        let err = WizardConfig::from_json_str(r#"{ "frame_interval_ms": 0 }"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);

        let err = WizardConfig::from_json_str("not json").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);
    }
}
