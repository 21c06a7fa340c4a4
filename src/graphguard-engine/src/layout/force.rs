// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::graph::{CaseGraph, NodeKind, Position};
use crate::common::Result;
use crate::{config_err, graph_err};

/// Configuration for the interactive force simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Separation every link pulls its endpoints toward.
    pub link_distance: f64,
    /// Pairwise repulsion; each pair's offset is scaled by
    /// `strength * alpha / distance^2`.
    pub repulsion_strength: f64,
    /// Fraction of the centroid's offset from the viewport centre removed
    /// on every tick.
    pub center_strength: f64,
    /// Pairs closer than this are treated as this far apart when repelling.
    pub distance_min: f64,
    /// The simulation stops once alpha drops below this.
    pub alpha_min: f64,
    /// Fraction of the gap to `alpha_target` closed on every tick.
    pub alpha_decay: f64,
    /// Fraction of velocity lost on every tick.
    pub velocity_decay: f64,
    /// Alpha target held while a node is being dragged.
    pub drag_alpha_target: f64,
    /// Alpha is raised to at least this when a drag ends.
    pub reheat_alpha: f64,
    pub width: f64,
    pub height: f64,
}

impl ForceConfig {
    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !(self.link_distance.is_finite() && self.link_distance > 0.0) {
            return config_err!(format!(
                "link_distance must be positive, got {}",
                self.link_distance
            ));
        }
        if !(self.repulsion_strength.is_finite() && self.repulsion_strength >= 0.0) {
            return config_err!(format!(
                "repulsion_strength must be non-negative, got {}",
                self.repulsion_strength
            ));
        }
        if !(self.distance_min.is_finite() && self.distance_min > 0.0) {
            return config_err!("distance_min must be positive".to_string());
        }
        if !(self.alpha_min > 0.0 && self.alpha_min < 1.0) {
            return config_err!(format!("alpha_min must be in (0, 1), got {}", self.alpha_min));
        }
        if !(self.alpha_decay > 0.0 && self.alpha_decay < 1.0) {
            return config_err!(format!(
                "alpha_decay must be in (0, 1), got {}",
                self.alpha_decay
            ));
        }
        if !unit(self.velocity_decay) || self.velocity_decay >= 1.0 {
            return config_err!(format!(
                "velocity_decay must be in [0, 1), got {}",
                self.velocity_decay
            ));
        }
        if !unit(self.center_strength) || !unit(self.drag_alpha_target) || !unit(self.reheat_alpha)
        {
            return config_err!(
                "center_strength, drag_alpha_target and reheat_alpha must be in [0, 1]"
                    .to_string()
            );
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return config_err!(format!(
                "viewport must have a positive size, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}

impl Default for ForceConfig {
    fn default() -> Self {
        let alpha_min = 0.001;
        Self {
            link_distance: 120.0,
            repulsion_strength: 400.0,
            center_strength: 0.1,
            distance_min: 1.0,
            alpha_min,
            // reaches alpha_min from 1.0 in ~300 ticks
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
            reheat_alpha: 0.3,
            width: 800.0,
            height: 500.0,
        }
    }
}

/// A node as the simulation sees it. Position and velocity are owned by
/// the engine; callers read them and move nodes only through drag intents.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    position: Position,
    velocity: Position,
    pin: Option<Position>,
}

impl GraphNode {
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn velocity(&self) -> Position {
        self.velocity
    }

    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }
}

#[derive(Copy, Clone, Debug)]
struct Link {
    source: usize,
    target: usize,
    strength: f64,
    /// Share of the correction applied to the target end.
    bias: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub position: Position,
    pub pinned: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EdgeSnapshot {
    pub source: String,
    pub target: String,
    pub from: Position,
    pub to: Position,
}

/// Read-only view of one simulation frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
    pub alpha: f64,
    pub running: bool,
}

impl GraphSnapshot {
    pub fn node(&self, id: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Force-directed layout for a small case graph, relaxed one tick per
/// animation frame.
pub struct GraphLayoutEngine {
    config: ForceConfig,
    nodes: Vec<GraphNode>,
    index: BTreeMap<String, usize>,
    links: Vec<Link>,
    alpha: f64,
    alpha_target: f64,
    running: bool,
    ticks: u64,
    rng: StdRng,
}

impl GraphLayoutEngine {
    /// Place nodes on a phyllotaxis spiral around the viewport centre and
    /// start the simulation hot (alpha = 1).
    pub fn new(graph: &CaseGraph, config: ForceConfig, seed: u64) -> Result<Self> {
        config.validate()?;

        let center = config.center();
        let initial_angle = PI * (3.0 - 5.0_f64.sqrt());

        let mut index = BTreeMap::new();
        let nodes: Vec<GraphNode> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                index.insert(spec.id.clone(), i);
                let radius = 10.0 * (0.5 + i as f64).sqrt();
                let angle = i as f64 * initial_angle;
                GraphNode {
                    id: spec.id.clone(),
                    name: spec.name.clone(),
                    kind: spec.kind,
                    position: Position::new(
                        center.x + radius * angle.cos(),
                        center.y + radius * angle.sin(),
                    ),
                    velocity: Position::default(),
                    pin: None,
                }
            })
            .collect();

        let mut degree = vec![0usize; nodes.len()];
        let mut resolved = Vec::with_capacity(graph.edges().len());
        for edge in graph.edges() {
            let (Some(&source), Some(&target)) = (index.get(&edge.source), index.get(&edge.target))
            else {
                return graph_err!(
                    InvalidGraph,
                    format!("edge {} -> {} does not resolve", edge.source, edge.target)
                );
            };
            degree[source] += 1;
            degree[target] += 1;
            resolved.push((source, target));
        }

        let links = resolved
            .into_iter()
            .map(|(source, target)| {
                let (ds, dt) = (degree[source] as f64, degree[target] as f64);
                Link {
                    source,
                    target,
                    strength: 1.0 / ds.min(dt),
                    bias: ds / (ds + dt),
                }
            })
            .collect();

        debug!(
            nodes = nodes.len(),
            edges = graph.edges().len(),
            "layout engine created"
        );

        Ok(GraphLayoutEngine {
            config,
            nodes,
            index,
            links,
            alpha: 1.0,
            alpha_target: 0.0,
            running: true,
            ticks: 0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Run one relaxation step. Returns whether the simulation is still
    /// running afterwards; once it has stopped this is a no-op until a drag
    /// restarts it.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        self.apply_links();
        self.apply_repulsion();
        self.apply_centering();
        self.integrate();
        self.ticks += 1;

        if self.alpha < self.config.alpha_min && !self.has_pinned() {
            debug!(ticks = self.ticks, "layout settled");
            self.running = false;
        }
        self.running
    }

    /// Tick until the simulation stops or `max_ticks` have run. Returns the
    /// number of ticks performed.
    pub fn run_until_settled(&mut self, max_ticks: usize) -> usize {
        let mut n = 0;
        while n < max_ticks && self.running {
            self.tick();
            n += 1;
        }
        n
    }

    fn jiggle(&mut self) -> f64 {
        (self.rng.random::<f64>() - 0.5) * 1e-6
    }

    fn apply_links(&mut self) {
        let alpha = self.alpha;
        let distance = self.config.link_distance;

        for i in 0..self.links.len() {
            let link = self.links[i];
            let (s, t) = (link.source, link.target);

            let ahead_t = self.nodes[t].position + self.nodes[t].velocity;
            let ahead_s = self.nodes[s].position + self.nodes[s].velocity;
            let mut dx = ahead_t.x - ahead_s.x;
            let mut dy = ahead_t.y - ahead_s.y;
            if dx == 0.0 {
                dx = self.jiggle();
            }
            if dy == 0.0 {
                dy = self.jiggle();
            }

            let len = (dx * dx + dy * dy).sqrt();
            let k = (len - distance) / len * alpha * link.strength;
            let correction = Position::new(dx * k, dy * k);

            let target = &mut self.nodes[t];
            target.velocity = target.velocity - correction * link.bias;
            let source = &mut self.nodes[s];
            source.velocity = source.velocity + correction * (1.0 - link.bias);
        }
    }

    fn apply_repulsion(&mut self) {
        let alpha = self.alpha;
        let strength = self.config.repulsion_strength;
        let min2 = self.config.distance_min * self.config.distance_min;
        let n = self.nodes.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let mut dx = self.nodes[j].position.x - self.nodes[i].position.x;
                let mut dy = self.nodes[j].position.y - self.nodes[i].position.y;
                if dx == 0.0 {
                    dx = self.jiggle();
                }
                if dy == 0.0 {
                    dy = self.jiggle();
                }

                let mut l2 = dx * dx + dy * dy;
                if l2 < min2 {
                    l2 = (min2 * l2).sqrt();
                }
                let w = strength * alpha / l2;
                let push = Position::new(dx * w, dy * w);

                self.nodes[i].velocity = self.nodes[i].velocity - push;
                self.nodes[j].velocity = self.nodes[j].velocity + push;
            }
        }
    }

    fn apply_centering(&mut self) {
        let strength = self.config.center_strength;
        if strength == 0.0 || self.nodes.is_empty() {
            return;
        }

        let sum = self
            .nodes
            .iter()
            .fold(Position::default(), |acc, n| acc + n.position);
        let centroid = sum * (1.0 / self.nodes.len() as f64);
        let shift = (centroid - self.config.center()) * strength;

        for node in self.nodes.iter_mut().filter(|n| n.pin.is_none()) {
            node.position = node.position - shift;
        }
    }

    /// Pinned nodes are written last so a drag always wins over the forces
    /// computed in the same tick.
    fn integrate(&mut self) {
        let keep = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            match node.pin {
                Some(pin) => {
                    node.position = pin;
                    node.velocity = Position::default();
                }
                None => {
                    node.velocity = node.velocity * keep;
                    node.position = node.position + node.velocity;
                }
            }
        }
    }

    fn node_index(&self, id: &str) -> Result<usize> {
        match self.index.get(id) {
            Some(&idx) => Ok(idx),
            None => graph_err!(UnknownNode, format!("no node with id '{id}'")),
        }
    }

    /// Pin `id` where it currently is and keep the simulation warm while
    /// the drag lasts.
    pub fn drag_start(&mut self, id: &str) -> Result<()> {
        let idx = self.node_index(id)?;
        let node = &mut self.nodes[idx];
        node.pin = Some(node.position);
        self.alpha_target = self.config.drag_alpha_target;
        self.running = true;
        debug!(node = id, "drag started");
        Ok(())
    }

    /// Move a dragged node. A node that was not yet pinned is pinned here.
    pub fn drag_to(&mut self, id: &str, to: Position) -> Result<()> {
        let idx = self.node_index(id)?;
        if self.nodes[idx].pin.is_none() {
            self.drag_start(id)?;
        }
        let node = &mut self.nodes[idx];
        node.pin = Some(to);
        node.position = to;
        node.velocity = Position::default();
        Ok(())
    }

    /// Release a dragged node and briefly re-heat the layout so its
    /// neighbours resettle around the new spot.
    pub fn drag_end(&mut self, id: &str) -> Result<()> {
        let idx = self.node_index(id)?;
        if self.nodes[idx].pin.take().is_none() {
            return Ok(());
        }
        if !self.has_pinned() {
            self.alpha_target = 0.0;
        }
        self.alpha = self.alpha.max(self.config.reheat_alpha);
        self.running = true;
        debug!(node = id, alpha = self.alpha, "drag ended");
        Ok(())
    }

    /// Halt the simulation. Ticks become no-ops until a drag restarts it.
    pub fn stop(&mut self) {
        if self.running {
            debug!(ticks = self.ticks, "layout stopped");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    pub fn has_pinned(&self) -> bool {
        self.nodes.iter().any(|n| n.pin.is_some())
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.node(id).map(|n| n.position)
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.nodes
            .iter()
            .map(|n| 0.5 * n.velocity.length_squared())
            .sum()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .nodes
            .iter()
            .map(|n| NodeSnapshot {
                id: n.id.clone(),
                name: n.name.clone(),
                kind: n.kind,
                position: n.position,
                pinned: n.pin.is_some(),
            })
            .collect();
        let edges = self
            .links
            .iter()
            .map(|l| {
                let (s, t) = (&self.nodes[l.source], &self.nodes[l.target]);
                EdgeSnapshot {
                    source: s.id.clone(),
                    target: t.id.clone(),
                    from: s.position,
                    to: t.position,
                }
            })
            .collect();

        GraphSnapshot {
            nodes,
            edges,
            alpha: self.alpha,
            running: self.running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;
    use crate::layout::fixture::case_graph;
    use crate::layout::graph::CaseGraphBuilder;

    fn engine() -> GraphLayoutEngine {
        GraphLayoutEngine::new(&case_graph().unwrap(), ForceConfig::default(), 42).unwrap()
    }

    #[test]
    fn test_initial_positions_distinct() {
        let e = engine();
        let positions: Vec<Position> = e.nodes().iter().map(|n| n.position()).collect();
        for (i, a) in positions.iter().enumerate() {
            assert!(a.x.is_finite() && a.y.is_finite());
            for b in &positions[i + 1..] {
                assert!(a.distance_to(*b) > 1.0);
            }
        }
        assert!(e.is_running());
        assert!((e.alpha() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_link_strength_and_bias() {
        let e = engine();
        // user (degree 5) -> basic (degree 1)
        let link = e.links[0];
        assert!((link.strength - 1.0).abs() < f64::EPSILON);
        assert!((link.bias - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_alpha_decays_and_simulation_stops() {
        let mut e = engine();
        let mut prev = e.alpha();
        let mut stopped_after = None;
        for i in 0..1_000 {
            let running = e.tick();
            assert!(e.alpha() < prev, "alpha rose at tick {i}");
            prev = e.alpha();
            if !running {
                stopped_after = Some(i + 1);
                break;
            }
        }
        let stopped_after = stopped_after.expect("simulation never stopped");
        assert!((250..=350).contains(&stopped_after), "stopped after {stopped_after}");
        assert!(e.alpha() < e.config().alpha_min);

        // further ticks leave everything untouched
        let before = e.snapshot();
        assert!(!e.tick());
        assert_eq!(before, e.snapshot());
    }

    #[test]
    fn test_kinetic_energy_decreases_monotonically() {
        let mut e = engine();
        e.tick();
        let peak = e.kinetic_energy();
        assert!(peak > 0.0);

        let mut prev = peak;
        while e.tick() {
            let energy = e.kinetic_energy();
            assert!(
                energy <= prev,
                "energy rose from {prev} to {energy} at tick {}",
                e.ticks()
            );
            prev = energy;
        }
        assert!(
            e.kinetic_energy() < peak * 0.05,
            "final energy {} vs peak {}",
            e.kinetic_energy(),
            peak
        );
    }

    #[test]
    fn test_settled_layout_is_spread_and_centered() {
        let mut e = engine();
        e.run_until_settled(10_000);
        assert!(!e.is_running());

        let snap = e.snapshot();
        for (i, a) in snap.nodes.iter().enumerate() {
            for b in &snap.nodes[i + 1..] {
                assert!(
                    a.position.distance_to(b.position) > 20.0,
                    "{} and {} overlap",
                    a.id,
                    b.id
                );
            }
        }

        let mean_edge = snap
            .edges
            .iter()
            .map(|edge| edge.from.distance_to(edge.to))
            .sum::<f64>()
            / snap.edges.len() as f64;
        assert!((80.0..250.0).contains(&mean_edge), "mean edge {mean_edge}");

        let centroid = snap
            .nodes
            .iter()
            .fold(Position::default(), |acc, n| acc + n.position)
            * (1.0 / snap.nodes.len() as f64);
        assert!(centroid.distance_to(e.config().center()) < 10.0);
    }

    #[test]
    fn test_pinned_node_follows_drag() {
        let mut e = engine();
        e.run_until_settled(50);

        e.drag_start("user").unwrap();
        assert!(e.node("user").unwrap().is_pinned());
        assert!((e.alpha_target() - 0.3).abs() < f64::EPSILON);

        let target = Position::new(100.0, 100.0);
        e.drag_to("user", target).unwrap();
        assert_eq!(e.position("user"), Some(target));

        for _ in 0..500 {
            assert!(e.tick(), "simulation must keep running while pinned");
            assert_eq!(e.position("user"), Some(target));
            assert_eq!(e.node("user").unwrap().velocity(), Position::default());
        }

        let next = Position::new(640.0, 90.0);
        e.drag_to("user", next).unwrap();
        e.tick();
        assert_eq!(e.position("user"), Some(next));
    }

    #[test]
    fn test_drag_end_reheats_and_resettles() {
        let mut e = engine();
        e.run_until_settled(10_000);
        assert!(!e.is_running());
        let basic_before = e.position("basic").unwrap();

        e.drag_start("user").unwrap();
        e.drag_to("user", Position::new(60.0, 60.0)).unwrap();
        for _ in 0..5 {
            e.tick();
        }
        e.drag_end("user").unwrap();

        assert!(e.is_running());
        assert!(!e.node("user").unwrap().is_pinned());
        assert!(e.alpha() >= e.config().reheat_alpha);
        assert!(e.alpha_target().abs() < f64::EPSILON);

        e.run_until_settled(10_000);
        assert!(!e.is_running());
        let basic_after = e.position("basic").unwrap();
        assert!(basic_before.distance_to(basic_after) > 1.0);
    }

    #[test]
    fn test_drag_unknown_node() {
        let mut e = engine();
        assert_eq!(e.drag_start("ghost").unwrap_err().code, ErrorCode::UnknownNode);
        assert_eq!(
            e.drag_to("ghost", Position::default()).unwrap_err().code,
            ErrorCode::UnknownNode
        );
        assert_eq!(e.drag_end("ghost").unwrap_err().code, ErrorCode::UnknownNode);
        // releasing a node that was never grabbed is harmless
        assert!(e.drag_end("basic").is_ok());
    }

    #[test]
    fn test_drag_to_pins_implicitly() {
        let mut e = engine();
        e.drag_to("device", Position::new(10.0, 20.0)).unwrap();
        assert!(e.node("device").unwrap().is_pinned());
        e.tick();
        assert_eq!(e.position("device"), Some(Position::new(10.0, 20.0)));
    }

    #[test]
    fn test_stop_halts_simulation() {
        let mut e = engine();
        e.tick();
        e.stop();
        let before = e.snapshot();
        assert!(!before.running);
        assert!(!e.tick());
        assert_eq!(before, e.snapshot());
        assert_eq!(e.run_until_settled(100), 0);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = engine();
        let mut b = engine();
        for _ in 0..120 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_coincident_nodes_separate() {
        let mut b = CaseGraphBuilder::new();
        b.add_node("a", "A", NodeKind::Subject)
            .add_node("b", "B", NodeKind::Feature);
        let g = b.build().unwrap();
        let mut e = GraphLayoutEngine::new(&g, ForceConfig::default(), 1).unwrap();
        let p = Position::new(400.0, 250.0);
        e.drag_to("a", p).unwrap();
        e.drag_end("a").unwrap();
        e.drag_to("b", p).unwrap();
        e.drag_end("b").unwrap();

        e.run_until_settled(10_000);
        let (pa, pb) = (e.position("a").unwrap(), e.position("b").unwrap());
        assert!(pa.x.is_finite() && pb.y.is_finite());
        assert!(pa.distance_to(pb) > 1.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ForceConfig {
            alpha_decay: 0.0,
            ..ForceConfig::default()
        };
        let err = GraphLayoutEngine::new(&case_graph().unwrap(), config, 0)
            .err()
            .unwrap();
        assert_eq!(err.code, ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_snapshot_edges_track_positions() {
        let mut e = engine();
        e.tick();
        let snap = e.snapshot();
        assert_eq!(snap.nodes.len(), 7);
        assert_eq!(snap.edges.len(), 6);
        for edge in &snap.edges {
            assert_eq!(Some(edge.from), e.position(&edge.source));
            assert_eq!(Some(edge.to), e.position(&edge.target));
        }
        assert_eq!(snap.node("risk1").map(|n| n.kind), Some(NodeKind::RiskSignal));
    }
}
