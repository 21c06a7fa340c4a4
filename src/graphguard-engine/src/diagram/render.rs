// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::diagram::common::{Rect, calc_view_box, escape_xml_attr, escape_xml_text, format_coord};
use crate::diagram::constants::{
    EDGE_COLOR, LABEL_OFFSET, LINE_SPACING, VIEW_BOX_PADDING, node_color, node_radius,
};
use crate::layout::force::{EdgeSnapshot, GraphSnapshot, NodeSnapshot};
use crate::layout::graph::{NodeKind, Position};

const RENDER_STYLES: &str = r#"
.graphguard-graph text {
  fill: #333333;
  font-size: 12px;
  font-family: "Roboto", "Open Sans", "Arial", sans-serif;
  text-anchor: middle;
  white-space: nowrap;
}

.graphguard-edge {
  stroke-width: 2px;
  stroke-opacity: 0.6;
}

.graphguard-node circle {
  stroke-width: 2px;
  stroke: #ffffff;
  cursor: grab;
}

.graphguard-node.graphguard-pinned circle {
  cursor: grabbing;
}
"#;

fn kind_class(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Subject => "graphguard-subject",
        NodeKind::Feature => "graphguard-feature",
        NodeKind::ExternalEntity => "graphguard-external",
        NodeKind::RiskSignal => "graphguard-risk",
    }
}

fn node_bounds(node: &NodeSnapshot) -> Rect {
    let mut b = Rect::around(node.position, node_radius(node.kind));
    b.bottom = node.position.y + LABEL_OFFSET + LINE_SPACING;
    b
}

fn render_edge(edge: &EdgeSnapshot) -> String {
    format!(
        "<line class=\"graphguard-edge\" stroke=\"{}\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"></line>",
        EDGE_COLOR,
        format_coord(edge.from.x),
        format_coord(edge.from.y),
        format_coord(edge.to.x),
        format_coord(edge.to.y),
    )
}

fn render_node(node: &NodeSnapshot) -> String {
    let Position { x, y } = node.position;
    let pinned = if node.pinned { " graphguard-pinned" } else { "" };
    format!(
        "<g class=\"graphguard-node {}{}\" data-id=\"{}\"><circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"></circle><text x=\"{}\" y=\"{}\">{}</text></g>",
        kind_class(node.kind),
        pinned,
        escape_xml_attr(&node.id),
        format_coord(x),
        format_coord(y),
        format_coord(node_radius(node.kind)),
        node_color(node.kind),
        format_coord(x),
        format_coord(y + LABEL_OFFSET),
        escape_xml_text(&node.name),
    )
}

/// Render one frame of the case graph as a standalone SVG document.
/// Edges are drawn beneath nodes; each node's label sits below its circle.
pub fn render_svg(snapshot: &GraphSnapshot) -> String {
    let bounds: Vec<Rect> = snapshot.nodes.iter().map(node_bounds).collect();

    let (vb_str, width, height) = if let Some(vb) = calc_view_box(&bounds) {
        let left = (vb.left - VIEW_BOX_PADDING).floor() as i64;
        let top = (vb.top - VIEW_BOX_PADDING).floor() as i64;
        let width = (vb.right + VIEW_BOX_PADDING - left as f64).ceil() as i64;
        let height = (vb.bottom + VIEW_BOX_PADDING - top as f64).ceil() as i64;
        (format!("{left} {top} {width} {height}"), width, height)
    } else {
        ("0 0 100 100".to_string(), 100, 100)
    };

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg style=\"width: {width}; height: {height};\" xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{vb_str}\" preserveAspectRatio=\"xMidYMid\" class=\"graphguard-graph\">"
    ));
    svg.push_str("<style>\n");
    svg.push_str(RENDER_STYLES);
    svg.push_str("\n</style>\n");

    svg.push_str("<g class=\"graphguard-edges\">");
    for edge in &snapshot.edges {
        svg.push_str(&render_edge(edge));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"graphguard-nodes\">");
    for node in &snapshot.nodes {
        svg.push_str(&render_node(node));
    }
    svg.push_str("</g>");
    svg.push_str("</svg>");

    svg
}
