// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use super::graph::{CaseGraph, CaseGraphBuilder, NodeKind};
use crate::common::Result;

pub const SUBJECT_ID: &str = "user";

/// The relationship graph reviewed in the last stage: the evaluated
/// subject, its feature groups, related external parties and the risk
/// signal detected on its behaviour.
pub fn case_graph() -> Result<CaseGraph> {
    let mut b = CaseGraphBuilder::new();
    b.add_node(SUBJECT_ID, "Evaluated subject", NodeKind::Subject)
        .add_node("basic", "Basic profile", NodeKind::Feature)
        .add_node("behavior", "Behaviour", NodeKind::Feature)
        .add_node("social", "Social ties", NodeKind::Feature)
        .add_node("contact1", "Contact A", NodeKind::ExternalEntity)
        .add_node("device", "Device fingerprint", NodeKind::ExternalEntity)
        .add_node("risk1", "Abnormal login", NodeKind::RiskSignal);

    b.add_edge(SUBJECT_ID, "basic")
        .add_edge(SUBJECT_ID, "behavior")
        .add_edge(SUBJECT_ID, "social")
        .add_edge(SUBJECT_ID, "contact1")
        .add_edge(SUBJECT_ID, "device")
        .add_edge("behavior", "risk1");

    b.build()
}
