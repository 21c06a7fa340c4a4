// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::common::Result;
use crate::graph_err;

/// 2D position/vector used throughout the layout.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (other - self).length()
    }
}

impl Add for Position {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Position {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f64> for Position {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// Role of a node in the case graph. Drives size and colour only; every
/// kind obeys the same physics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// The entity under evaluation.
    Subject,
    Feature,
    /// Devices, contacts and other related parties.
    ExternalEntity,
    RiskSignal,
}

/// Static description of a node, before it has a position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
}

/// Edges are stored source -> target but treated as undirected by the
/// layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

/// Immutable node-link graph whose edges are known to resolve. Use
/// `CaseGraphBuilder` to construct.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseGraph {
    nodes: Vec<NodeSpec>,
    edges: Vec<GraphEdge>,
}

impl CaseGraph {
    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Number of edges touching `id`, in either direction.
    pub fn degree(&self, id: &str) -> usize {
        self.edges
            .iter()
            .filter(|e| e.source == id || e.target == id)
            .count()
    }
}

#[derive(Default)]
pub struct CaseGraphBuilder {
    nodes: Vec<NodeSpec>,
    edges: Vec<GraphEdge>,
}

impl CaseGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: &str, name: &str, kind: NodeKind) -> &mut Self {
        self.nodes.push(NodeSpec {
            id: id.to_string(),
            name: name.to_string(),
            kind,
        });
        self
    }

    pub fn add_edge(&mut self, source: &str, target: &str) -> &mut Self {
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
        });
        self
    }

    /// Validate ids and edge endpoints. Fails with `InvalidGraph` on a
    /// duplicate node id, a self loop or an edge endpoint that names no
    /// node.
    pub fn build(&self) -> Result<CaseGraph> {
        let mut ids = BTreeSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return graph_err!(InvalidGraph, format!("duplicate node id '{}'", node.id));
            }
        }

        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    return graph_err!(
                        InvalidGraph,
                        format!(
                            "edge {} -> {} references missing node '{}'",
                            edge.source, edge.target, endpoint
                        )
                    );
                }
            }
            if edge.source == edge.target {
                return graph_err!(InvalidGraph, format!("self loop on '{}'", edge.source));
            }
        }

        Ok(CaseGraph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        })
    }
}
