// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! End-to-end runs of the assessment workflow, driven the way a host event
//! loop drives it: actions interleaved with elapsed time.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use float_cmp::approx_eq;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use graphguard_engine::progress::{ProgressSimulator, sub_step_for};
use graphguard_engine::{
    ErrorCode, FixedClock, ProgressConfig, RiskLevel, ScoringModel, Stage, WizardConfig,
    WizardController, WizardEvent,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn controller(seed: u64) -> WizardController {
    let config = WizardConfig {
        seed: Some(seed),
        ..WizardConfig::default()
    };
    WizardController::with_rng_and_clock(
        config,
        Box::new(StdRng::seed_from_u64(seed)),
        Box::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 3, 15, 14, 5, 0).unwrap(),
        )),
    )
    .unwrap()
}

#[test]
fn full_assessment_flow() {
    let mut w = controller(2026);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    w.subscribe(Box::new(move |e| sink.borrow_mut().push(e.clone())));

    w.begin_feature_engineering().unwrap();
    for i in 1..=20 {
        w.advance(ms(150));
        assert_eq!(w.state().feature_progress, 5 * i);
    }
    assert!(!w.is_processing_features());
    assert_eq!(w.state().process_sub_step, Some(4));

    w.advance_stage(Stage::ModelJudgment).unwrap();
    w.select_model(ScoringModel::Gat2).unwrap();
    w.run_scoring(None).unwrap();
    for _ in 0..10 {
        w.advance(ms(300));
    }
    assert_eq!(w.state().model_progress, 100);

    let verdict = w.state().risk_verdict.clone().expect("verdict after scoring");
    assert_eq!(verdict.risk_level, RiskLevel::Medium);
    assert!(!verdict.risk_level.label().is_empty());
    assert!((85.0..=95.0).contains(&verdict.confidence));
    assert_eq!(verdict.model, ScoringModel::Gat2);

    w.advance_stage(Stage::GraphReview).unwrap();
    assert!(w.graph().is_some());

    w.complete_recognition().unwrap();
    let state = w.state().clone();
    w.complete_recognition().unwrap();
    assert_eq!(&state, w.state());
    assert!(state.recognition_completed);

    let summary = w.completion_summary().unwrap();
    assert!(approx_eq!(f64, summary.confidence, verdict.confidence, ulps = 2));

    let events = events.borrow();
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, WizardEvent::RecognitionCompleted))
            .count(),
        1
    );
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, WizardEvent::VerdictReady(_)))
            .count(),
        1
    );
}

#[test]
fn same_seed_same_session() {
    let run = |seed| {
        let mut w = controller(seed);
        w.begin_feature_engineering().unwrap();
        w.advance(ms(3_000));
        w.advance_stage(Stage::ModelJudgment).unwrap();
        w.run_scoring(Some(ScoringModel::GraphSage)).unwrap();
        w.advance(ms(3_000));
        w.advance_stage(Stage::GraphReview).unwrap();
        w.advance(ms(800));
        (w.state().clone(), w.graph_snapshot().unwrap())
    };

    assert_eq!(run(5), run(5));
}

#[test]
fn graph_review_drag_round_trip() {
    let mut w = controller(9);
    w.begin_feature_engineering().unwrap();
    w.advance(ms(3_000));
    w.advance_stage(Stage::ModelJudgment).unwrap();
    w.run_scoring(Some(ScoringModel::Gsa)).unwrap();
    w.advance(ms(3_000));
    w.advance_stage(Stage::GraphReview).unwrap();

    w.drag_start("risk1").unwrap();
    for step in 0..20 {
        let x = 100.0 + f64::from(step) * 10.0;
        w.drag_to("risk1", x, 80.0).unwrap();
        w.advance(ms(16));
        let snapshot = w.graph_snapshot().unwrap();
        let node = snapshot.node("risk1").unwrap();
        assert!(node.pinned);
        assert!(approx_eq!(f64, node.position.x, x, ulps = 2));
        assert!(approx_eq!(f64, node.position.y, 80.0, ulps = 2));
    }
    w.drag_end("risk1").unwrap();
    assert!(!w.graph_snapshot().unwrap().node("risk1").unwrap().pinned);

    let svg = w.render_graph_svg().unwrap();
    assert!(svg.contains("data-id=\"risk1\""));
    assert!(svg.contains("Abnormal login"));

    w.advance_stage(Stage::ModelJudgment).unwrap();
    assert_eq!(
        w.drag_start("risk1").unwrap_err().code,
        ErrorCode::GraphInactive
    );
}

#[test]
fn config_from_json_drives_cadence() {
    let config = WizardConfig::from_json_str(
        r#"{
            "feature": { "increment_per_tick": 20, "tick_interval_ms": 100, "total_sub_steps": 5 },
            "seed": 1
        }"#,
    )
    .unwrap();
    let mut w = WizardController::new(config).unwrap();
    w.begin_feature_engineering().unwrap();
    w.advance(ms(400));
    assert_eq!(w.state().feature_progress, 80);
    assert!(!w.can_advance_to(Stage::ModelJudgment));
    w.advance(ms(100));
    assert!(w.can_advance_to(Stage::ModelJudgment));
}

proptest! {
    #[test]
    fn any_cadence_completes_exactly_once(
        increment in 1u32..=100,
        interval in 1u64..500,
        sub_steps in 1u32..=10,
        chunk in 1u64..2_000,
    ) {
        let mut sim = ProgressSimulator::new("prop");
        let config = ProgressConfig::new(increment, interval, sub_steps);
        let expected_ticks = config.ticks_to_complete();
        sim.start(config).unwrap();

        let mut completions = 0;
        let mut last_pct = 0;
        let mut last_step: Option<usize> = None;
        let mut fired = 0;
        // generous upper bound on the time needed
        for _ in 0..(u64::from(expected_ticks) * interval / chunk + 2) {
            for tick in sim.advance(Duration::from_millis(chunk)) {
                fired += 1;
                prop_assert!(tick.percentage <= 100);
                prop_assert!(tick.percentage >= last_pct);
                prop_assert!(tick.sub_step >= last_step);
                last_pct = tick.percentage;
                last_step = tick.sub_step;
                if tick.completed {
                    completions += 1;
                }
            }
        }

        prop_assert_eq!(completions, 1);
        prop_assert_eq!(fired, expected_ticks);
        prop_assert_eq!(last_pct, 100);
        prop_assert_eq!(last_step, Some(sub_steps as usize - 1));
        prop_assert!(sim.advance(Duration::from_secs(3_600)).is_empty());
    }

    #[test]
    fn sub_step_is_monotonic(total in 1u32..=20, a in 0u32..=100, b in 0u32..=100) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(sub_step_for(lo, total) <= sub_step_for(hi, total));
        prop_assert!(sub_step_for(hi, total) < total as usize);
    }

    #[test]
    fn feature_gate_holds_below_one_hundred(ticks in 0u32..20) {
        let mut w = controller(3);
        w.begin_feature_engineering().unwrap();
        w.advance(ms(150 * u64::from(ticks)));
        prop_assert_eq!(w.state().feature_progress, 5 * ticks);

        let err = w.advance_stage(Stage::ModelJudgment).unwrap_err();
        prop_assert_eq!(err.code, ErrorCode::StageNotReady);
        prop_assert_eq!(w.stage(), Stage::FeatureEngineering);
    }

    #[test]
    fn scoring_without_model_changes_nothing(elapsed in 0u64..10_000) {
        let mut w = controller(4);
        w.begin_feature_engineering().unwrap();
        w.advance(ms(3_000));
        w.advance_stage(Stage::ModelJudgment).unwrap();

        let before = w.state().clone();
        let err = w.run_scoring(None).unwrap_err();
        prop_assert_eq!(err.code, ErrorCode::NoModelSelected);
        w.advance(ms(elapsed));
        prop_assert_eq!(&before, w.state());
    }
}
