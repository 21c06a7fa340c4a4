// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

pub mod fixture;
pub mod force;
pub mod graph;

pub use self::force::{
    EdgeSnapshot, ForceConfig, GraphLayoutEngine, GraphNode, GraphSnapshot, NodeSnapshot,
};
pub use self::graph::{CaseGraph, CaseGraphBuilder, GraphEdge, NodeKind, NodeSpec, Position};
