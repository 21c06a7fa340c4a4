// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod common;
pub mod config;
pub mod diagram;
pub mod layout;
pub mod observer;
pub mod progress;
pub mod verdict;
pub mod wizard;

pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::config::{ProgressConfig, VerdictConfig, WizardConfig};
pub use self::layout::{ForceConfig, GraphLayoutEngine, GraphSnapshot, Position};
pub use self::observer::{ObserverId, WizardEvent};
pub use self::progress::{ProgressSimulator, ProgressTick};
pub use self::verdict::{Clock, FixedClock, RiskLevel, RiskVerdict, ScoringModel, SystemClock};
pub use self::wizard::{
    CompletionSummary, FeatureGroup, FeatureSubStep, ItemStatus, Stage, StageStatus,
    WizardController, WizardState,
};
