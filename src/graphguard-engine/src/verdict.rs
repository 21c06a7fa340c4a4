// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::common::{Error, ErrorCode, ErrorKind};
use crate::config::VerdictConfig;

/// Scoring strategies the operator can pick between.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoringModel {
    #[serde(rename = "GraphSAGE")]
    GraphSage,
    #[serde(rename = "GAT2")]
    Gat2,
    #[serde(rename = "GSA")]
    Gsa,
}

impl ScoringModel {
    pub const ALL: [ScoringModel; 3] = [
        ScoringModel::GraphSage,
        ScoringModel::Gat2,
        ScoringModel::Gsa,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScoringModel::GraphSage => "GraphSAGE",
            ScoringModel::Gat2 => "GAT2",
            ScoringModel::Gsa => "GSA",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ScoringModel::GraphSage => {
                "Sampling-based graph neural network capturing local neighbourhood features."
            }
            ScoringModel::Gat2 => "Graph attention network weighting the most important relations.",
            ScoringModel::Gsa => "Combines structural information with an attention mechanism.",
        }
    }
}

impl fmt::Display for ScoringModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ScoringModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoringModel::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::Config,
                    ErrorCode::InvalidConfig,
                    Some(format!("unknown scoring model '{s}'")),
                )
            })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low risk",
            RiskLevel::Medium => "Medium risk",
            RiskLevel::High => "High risk",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Result of one completed scoring run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub risk_level: RiskLevel,
    pub subject_id: String,
    /// Percentage, rounded to one decimal place.
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub explanation: String,
    pub model: ScoringModel,
}

impl RiskVerdict {
    /// Confidence as shown to the operator, e.g. `"87.3%"`.
    pub fn confidence_label(&self) -> String {
        format!("{:.1}%", self.confidence)
    }
}

/// Source of completion timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Synthesize the verdict for a finished run. The output depends only on
/// the arguments, so a seeded `rng` reproduces it exactly.
pub fn generate_verdict(
    model: ScoringModel,
    completed_at: DateTime<Utc>,
    rng: &mut dyn RngCore,
    config: &VerdictConfig,
) -> RiskVerdict {
    let raw = if config.confidence_max > config.confidence_min {
        rng.random_range(config.confidence_min..config.confidence_max)
    } else {
        config.confidence_min
    };
    let confidence =
        ((raw * 10.0).round() / 10.0).clamp(config.confidence_min, config.confidence_max);

    RiskVerdict {
        risk_level: config.risk_level,
        subject_id: config.subject_id.clone(),
        confidence,
        timestamp: completed_at,
        explanation: config.explanation.clone(),
        model,
    }
}
