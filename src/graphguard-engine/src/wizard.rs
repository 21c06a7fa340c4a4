// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The three-stage assessment workflow.
//!
//! [`WizardController`] owns every piece of session state: the stage, both
//! progress simulators, the most recent verdict and, while the graph review
//! is open, the layout engine. The host forwards operator intents to it and
//! calls [`WizardController::advance`] from its event loop; everything that
//! changes is reported through [`WizardEvent`]s.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::common::Result;
use crate::config::WizardConfig;
use crate::diagram::render_svg;
use crate::layout::fixture;
use crate::layout::force::{GraphLayoutEngine, GraphSnapshot};
use crate::layout::graph::{CaseGraph, Position};
use crate::observer::{Observer, ObserverId, Observers, WizardEvent};
use crate::progress::ProgressSimulator;
use crate::verdict::{Clock, RiskLevel, RiskVerdict, ScoringModel, SystemClock, generate_verdict};
use crate::{graph_err, wizard_err};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    FeatureEngineering,
    ModelJudgment,
    GraphReview,
}

impl Stage {
    pub const ALL: [Stage; 3] = [
        Stage::FeatureEngineering,
        Stage::ModelJudgment,
        Stage::GraphReview,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::FeatureEngineering => "Feature engineering",
            Stage::ModelJudgment => "Model judgment",
            Stage::GraphReview => "Graph review",
        }
    }

    /// Where this stage sits relative to `current` in the step indicator.
    pub fn status(self, current: Stage) -> StageStatus {
        use std::cmp::Ordering::*;
        match self.cmp(&current) {
            Less => StageStatus::Done,
            Equal => StageStatus::Current,
            Greater => StageStatus::Pending,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Done,
    Current,
    Pending,
}

/// The five phases of the feature-engineering animation, in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSubStep {
    DataCleaning,
    FeatureExtraction,
    FeatureTransformation,
    FeatureSelection,
    FeatureGeneration,
}

impl FeatureSubStep {
    pub const ALL: [FeatureSubStep; 5] = [
        FeatureSubStep::DataCleaning,
        FeatureSubStep::FeatureExtraction,
        FeatureSubStep::FeatureTransformation,
        FeatureSubStep::FeatureSelection,
        FeatureSubStep::FeatureGeneration,
    ];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            FeatureSubStep::DataCleaning => "Data cleaning",
            FeatureSubStep::FeatureExtraction => "Feature extraction",
            FeatureSubStep::FeatureTransformation => "Feature transformation",
            FeatureSubStep::FeatureSelection => "Feature selection",
            FeatureSubStep::FeatureGeneration => "Feature generation",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FeatureSubStep::DataCleaning => "Handle missing values, outliers and duplicates",
            FeatureSubStep::FeatureExtraction => "Extract basic attributes and behaviour features",
            FeatureSubStep::FeatureTransformation => "Normalise, encode and discretise",
            FeatureSubStep::FeatureSelection => "Keep the features that carry the most signal",
            FeatureSubStep::FeatureGeneration => "Derive graph and temporal features",
        }
    }
}

/// Feature groups shown on the stage-one status board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroup {
    Preprocessing,
    BasicFeatures,
    GraphStructure,
    Temporal,
}

impl FeatureGroup {
    pub const ALL: [FeatureGroup; 4] = [
        FeatureGroup::Preprocessing,
        FeatureGroup::BasicFeatures,
        FeatureGroup::GraphStructure,
        FeatureGroup::Temporal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FeatureGroup::Preprocessing => "Data cleaning & preprocessing",
            FeatureGroup::BasicFeatures => "Basic feature extraction",
            FeatureGroup::GraphStructure => "Graph structure features",
            FeatureGroup::Temporal => "Temporal features",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Waiting,
    Processing,
    Done,
}

/// Status of the `idx`-th feature group. A group is done once progress has
/// passed its 20%-wide band, and processing while a run is active and the
/// current sub-step has reached it.
pub fn feature_item_status(
    idx: usize,
    progress: u32,
    running: bool,
    sub_step: Option<usize>,
) -> ItemStatus {
    if u64::from(progress) > (idx as u64 + 1) * 20 {
        ItemStatus::Done
    } else if running && sub_step.is_some_and(|s| s >= idx) {
        ItemStatus::Processing
    } else {
        ItemStatus::Waiting
    }
}

/// Everything the presentation layer needs to draw the wizard, minus the
/// graph (see [`WizardController::graph_snapshot`]).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WizardState {
    pub stage: Stage,
    pub feature_progress: u32,
    /// `None` until the first feature tick.
    pub process_sub_step: Option<usize>,
    pub selected_model: Option<ScoringModel>,
    pub model_progress: u32,
    pub risk_verdict: Option<RiskVerdict>,
    pub recognition_completed: bool,
}

impl WizardState {
    fn new() -> Self {
        WizardState {
            stage: Stage::FeatureEngineering,
            feature_progress: 0,
            process_sub_step: None,
            selected_model: None,
            model_progress: 0,
            risk_verdict: None,
            recognition_completed: false,
        }
    }

    /// The sub-step as -1..4, -1 meaning not started.
    pub fn process_sub_step_index(&self) -> i32 {
        self.process_sub_step.map_or(-1, |s| s as i32)
    }
}

/// Shown once the operator has confirmed the review.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionSummary {
    pub subject_id: String,
    pub risk_level: RiskLevel,
    pub model: ScoringModel,
    pub confidence: f64,
    pub assessed_at: DateTime<Utc>,
}

/// Upper bound on layout ticks run by a single `advance`.
pub const MAX_CATCH_UP_FRAMES: u32 = 60;

pub struct WizardController {
    config: WizardConfig,
    state: WizardState,
    feature: ProgressSimulator,
    scoring: ProgressSimulator,
    /// Model of the scoring run in flight.
    scoring_model: Option<ScoringModel>,
    case_graph: CaseGraph,
    graph: Option<GraphLayoutEngine>,
    frame_debt: Duration,
    rng: Box<dyn RngCore>,
    clock: Box<dyn Clock>,
    observers: Observers,
}

impl WizardController {
    /// A controller on the system clock. Randomness is seeded from
    /// `config.seed`, or from OS entropy when unset.
    pub fn new(config: WizardConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng_and_clock(config, Box::new(rng), Box::new(SystemClock))
    }

    pub fn with_rng_and_clock(
        config: WizardConfig,
        rng: Box<dyn RngCore>,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let case_graph = fixture::case_graph()?;

        Ok(WizardController {
            config,
            state: WizardState::new(),
            feature: ProgressSimulator::new("feature_engineering"),
            scoring: ProgressSimulator::new("model_scoring"),
            scoring_model: None,
            case_graph,
            graph: None,
            frame_debt: Duration::ZERO,
            rng,
            clock,
            observers: Observers::default(),
        })
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn stage_status(&self, stage: Stage) -> StageStatus {
        stage.status(self.state.stage)
    }

    pub fn is_processing_features(&self) -> bool {
        self.feature.is_running()
    }

    pub fn is_scoring(&self) -> bool {
        self.scoring.is_running()
    }

    pub fn feature_sub_step(&self) -> Option<FeatureSubStep> {
        self.state
            .process_sub_step
            .and_then(FeatureSubStep::from_index)
    }

    pub fn feature_items(&self) -> [(FeatureGroup, ItemStatus); 4] {
        FeatureGroup::ALL.map(|group| {
            let status = feature_item_status(
                group as usize,
                self.state.feature_progress,
                self.feature.is_running(),
                self.state.process_sub_step,
            );
            (group, status)
        })
    }

    pub fn subscribe(&mut self, observer: Observer) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Start the feature run. Does nothing while it runs or once it has
    /// reached 100%.
    pub fn begin_feature_engineering(&mut self) -> Result<()> {
        if self.feature.is_running() || self.state.feature_progress == 100 {
            debug!(
                progress = self.state.feature_progress,
                "feature engineering already started"
            );
            return Ok(());
        }

        self.feature.start(self.config.feature.clone())?;
        self.state.feature_progress = 0;
        self.state.process_sub_step = None;
        self.observers.emit(&WizardEvent::FeatureStarted);
        Ok(())
    }

    fn check_gate(&self, leaving: Stage) -> Result<()> {
        match leaving {
            Stage::FeatureEngineering if self.state.feature_progress < 100 => wizard_err!(
                StageNotReady,
                format!(
                    "feature engineering is at {}%",
                    self.state.feature_progress
                )
            ),
            Stage::ModelJudgment if self.state.risk_verdict.is_none() => wizard_err!(
                StageNotReady,
                "model judgment has not produced a verdict".to_string()
            ),
            _ => Ok(()),
        }
    }

    fn check_gates(&self, target: Stage) -> Result<()> {
        Stage::ALL
            .iter()
            .filter(|&&s| s >= self.state.stage && s < target)
            .try_for_each(|&s| self.check_gate(s))
    }

    /// Whether `advance_stage(target)` would currently succeed.
    pub fn can_advance_to(&self, target: Stage) -> bool {
        self.check_gates(target).is_ok()
    }

    /// Move to `target`. Forward moves require every gate in between to
    /// hold; backward moves are always allowed and keep all progress.
    pub fn advance_stage(&mut self, target: Stage) -> Result<()> {
        self.try_advance_stage(target)
            .inspect_err(|err| warn!(%err, to = ?target, "stage change rejected"))
    }

    fn try_advance_stage(&mut self, target: Stage) -> Result<()> {
        let from = self.state.stage;
        if target == from {
            return Ok(());
        }
        self.check_gates(target)?;

        let entering_graph = if target == Stage::GraphReview {
            let seed = self.rng.next_u64();
            Some(GraphLayoutEngine::new(
                &self.case_graph,
                self.config.layout.clone(),
                seed,
            )?)
        } else {
            None
        };

        match from {
            Stage::ModelJudgment => {
                if self.scoring.cancel() {
                    self.scoring_model = None;
                    self.observers.emit(&WizardEvent::ScoringCancelled {
                        percentage: self.state.model_progress,
                    });
                }
            }
            Stage::GraphReview => {
                if self.graph.take().is_some() {
                    debug!("graph view closed");
                }
            }
            Stage::FeatureEngineering => {}
        }

        if entering_graph.is_some() {
            self.graph = entering_graph;
            self.frame_debt = Duration::ZERO;
        }

        self.state.stage = target;
        info!(from = ?from, to = ?target, "stage changed");
        self.observers
            .emit(&WizardEvent::StageChanged { from, to: target });
        Ok(())
    }

    fn require_stage(&self, stage: Stage, action: &str) -> Result<()> {
        if self.state.stage != stage {
            return wizard_err!(
                StageNotReady,
                format!(
                    "{action} is only available during {}",
                    stage.title().to_lowercase()
                )
            );
        }
        Ok(())
    }

    /// Record the scoring strategy. Only available during model judgment,
    /// and rejected while a run is in flight.
    pub fn select_model(&mut self, model: ScoringModel) -> Result<()> {
        if let Err(err) = self.require_stage(Stage::ModelJudgment, "model selection") {
            warn!(%err, model = %model, "model selection rejected");
            return Err(err);
        }
        if self.scoring.is_running() {
            warn!(model = %model, "model change rejected while scoring");
            return wizard_err!(
                AlreadyRunning,
                format!("cannot switch to {model} while scoring")
            );
        }
        self.state.selected_model = Some(model);
        debug!(model = %model, "model selected");
        self.observers.emit(&WizardEvent::ModelSelected(model));
        Ok(())
    }

    /// Start a scoring run with `model`, or with the selected model when
    /// `None`. Only available during model judgment; any previous verdict
    /// is discarded.
    pub fn run_scoring(&mut self, model: Option<ScoringModel>) -> Result<()> {
        self.try_run_scoring(model)
            .inspect_err(|err| warn!(%err, "scoring rejected"))
    }

    fn try_run_scoring(&mut self, model: Option<ScoringModel>) -> Result<()> {
        self.require_stage(Stage::ModelJudgment, "scoring")?;
        if self.state.recognition_completed {
            return wizard_err!(
                StageNotReady,
                "the assessment has already been completed".to_string()
            );
        }
        let Some(model) = model.or(self.state.selected_model) else {
            return wizard_err!(NoModelSelected);
        };
        if self.scoring.is_running() {
            return wizard_err!(
                AlreadyRunning,
                format!("scoring is at {}%", self.state.model_progress)
            );
        }

        self.scoring.start(self.config.scoring.clone())?;
        self.scoring_model = Some(model);
        self.state.selected_model = Some(model);
        self.state.risk_verdict = None;
        self.state.model_progress = 0;

        info!(model = %model, "scoring started");
        self.observers.emit(&WizardEvent::ScoringStarted(model));
        Ok(())
    }

    /// Mark the assessment as reviewed. Only available during graph review
    /// with a verdict present; repeating it changes nothing.
    pub fn complete_recognition(&mut self) -> Result<()> {
        if self.state.stage != Stage::GraphReview {
            warn!(stage = ?self.state.stage, "recognition attempted outside graph review");
            return wizard_err!(
                NotYetReviewed,
                "the graph has not been reviewed yet".to_string()
            );
        }
        if self.state.risk_verdict.is_none() {
            warn!("recognition attempted without a verdict");
            return wizard_err!(NotYetReviewed);
        }
        if self.state.recognition_completed {
            return Ok(());
        }

        self.state.recognition_completed = true;
        info!("recognition completed");
        self.observers.emit(&WizardEvent::RecognitionCompleted);
        Ok(())
    }

    /// Available once recognition is completed.
    pub fn completion_summary(&self) -> Option<CompletionSummary> {
        if !self.state.recognition_completed {
            return None;
        }
        self.state
            .risk_verdict
            .as_ref()
            .map(|verdict| CompletionSummary {
                subject_id: verdict.subject_id.clone(),
                risk_level: verdict.risk_level,
                model: verdict.model,
                confidence: verdict.confidence,
                assessed_at: verdict.timestamp,
            })
    }

    /// Feed `elapsed` wall-clock time to the running simulators and to the
    /// graph animation, in that order.
    pub fn advance(&mut self, elapsed: Duration) {
        for tick in self.feature.advance(elapsed) {
            self.state.feature_progress = tick.percentage;
            self.state.process_sub_step = tick.sub_step;
            self.observers.emit(&WizardEvent::FeatureProgress {
                percentage: tick.percentage,
                sub_step: tick.sub_step,
            });
            if tick.completed {
                self.observers.emit(&WizardEvent::FeatureCompleted);
            }
        }

        for tick in self.scoring.advance(elapsed) {
            self.state.model_progress = tick.percentage;
            self.observers.emit(&WizardEvent::ScoringProgress {
                percentage: tick.percentage,
            });
            if tick.completed {
                self.finish_scoring();
            }
        }

        self.advance_graph(elapsed);
    }

    fn finish_scoring(&mut self) {
        let Some(model) = self.scoring_model.take() else {
            warn!("scoring completed without a model");
            return;
        };

        let verdict = generate_verdict(
            model,
            self.clock.now(),
            &mut *self.rng,
            &self.config.verdict,
        );
        info!(
            model = %model,
            risk_level = %verdict.risk_level,
            confidence = verdict.confidence,
            "verdict ready"
        );
        self.state.risk_verdict = Some(verdict.clone());
        self.observers.emit(&WizardEvent::VerdictReady(verdict));
    }

    fn advance_graph(&mut self, elapsed: Duration) {
        let Some(graph) = self.graph.as_mut() else {
            return;
        };
        if !graph.is_running() {
            self.frame_debt = Duration::ZERO;
            return;
        }

        // frames missed during a long host pause are dropped, not replayed
        let frame = self.config.frame_interval();
        let max_debt = frame * MAX_CATCH_UP_FRAMES;
        self.frame_debt += elapsed;
        if self.frame_debt > max_debt {
            debug!(owed = ?self.frame_debt, "dropping missed graph frames");
            self.frame_debt = max_debt;
        }
        while self.frame_debt >= frame {
            self.frame_debt -= frame;
            let running = graph.tick();
            self.observers.emit(&WizardEvent::GraphFrame {
                alpha: graph.alpha(),
                running,
            });
            if !running {
                self.frame_debt = Duration::ZERO;
                break;
            }
        }
    }

    fn active_graph(&mut self) -> Result<&mut GraphLayoutEngine> {
        match self.graph.as_mut() {
            Some(graph) => Ok(graph),
            None => graph_err!(
                GraphInactive,
                "the graph is only shown during graph review".to_string()
            ),
        }
    }

    pub fn drag_start(&mut self, id: &str) -> Result<()> {
        self.active_graph()?.drag_start(id)?;
        self.observers.emit(&WizardEvent::NodeDragged {
            node: id.to_string(),
            pinned: true,
        });
        Ok(())
    }

    pub fn drag_to(&mut self, id: &str, x: f64, y: f64) -> Result<()> {
        self.active_graph()?.drag_to(id, Position::new(x, y))?;
        self.observers.emit(&WizardEvent::NodeDragged {
            node: id.to_string(),
            pinned: true,
        });
        Ok(())
    }

    pub fn drag_end(&mut self, id: &str) -> Result<()> {
        self.active_graph()?.drag_end(id)?;
        self.observers.emit(&WizardEvent::NodeDragged {
            node: id.to_string(),
            pinned: false,
        });
        Ok(())
    }

    /// The live layout, present only during graph review.
    pub fn graph(&self) -> Option<&GraphLayoutEngine> {
        self.graph.as_ref()
    }

    pub fn graph_snapshot(&self) -> Option<GraphSnapshot> {
        self.graph.as_ref().map(GraphLayoutEngine::snapshot)
    }

    pub fn render_graph_svg(&self) -> Option<String> {
        self.graph_snapshot().map(|snapshot| render_svg(&snapshot))
    }
}
