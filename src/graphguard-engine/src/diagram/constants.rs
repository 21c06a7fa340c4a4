// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::layout::graph::NodeKind;

pub const SUBJECT_RADIUS: f64 = 35.0;
pub const NODE_RADIUS: f64 = 25.0;
/// Distance from a node's centre down to its label baseline.
pub const LABEL_OFFSET: f64 = 45.0;
pub const LINE_SPACING: f64 = 14.0;
pub const VIEW_BOX_PADDING: f64 = 10.0;

pub const EDGE_COLOR: &str = "#aaa";
pub const SUBJECT_COLOR: &str = "#4dabf7";
pub const FEATURE_COLOR: &str = "#52c41a";
pub const RISK_SIGNAL_COLOR: &str = "#f5222d";
pub const EXTERNAL_ENTITY_COLOR: &str = "#fa8c16";

pub fn node_radius(kind: NodeKind) -> f64 {
    match kind {
        NodeKind::Subject => SUBJECT_RADIUS,
        _ => NODE_RADIUS,
    }
}

pub fn node_color(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Subject => SUBJECT_COLOR,
        NodeKind::Feature => FEATURE_COLOR,
        NodeKind::RiskSignal => RISK_SIGNAL_COLOR,
        NodeKind::ExternalEntity => EXTERNAL_ENTITY_COLOR,
    }
}
