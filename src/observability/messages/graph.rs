// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph construction events.

use std::fmt::{Display, Formatter};
use tracing::Span;

use super::StructuredLog;
use crate::graph::NodeId;

/// A node was added to the graph.
pub struct NodeAdded {
    pub node: NodeId,
    pub weight: i64,
}

impl Display for NodeAdded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "node {} added with weight {}", self.node, self.weight)
    }
}

impl StructuredLog for NodeAdded {
    fn log(&self) {
        tracing::debug!(node = %self.node, weight = self.weight, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("node_added", span_name = name, node = %self.node, weight = self.weight)
    }
}

/// Cycle detection rejected a graph before any work ran.
pub struct CycleDetected {
    pub remaining_nodes: usize,
}

impl Display for CycleDetected {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "cycle detected: {} non-signaled node(s) unreachable from any root",
            self.remaining_nodes
        )
    }
}

impl StructuredLog for CycleDetected {
    fn log(&self) {
        tracing::error!(remaining_nodes = self.remaining_nodes, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "cycle_detected",
            span_name = name,
            remaining_nodes = self.remaining_nodes,
        )
    }
}

/// A caller-supplied argument was rejected before any work ran.
pub struct InvalidArgumentRejected<'a> {
    pub reason: &'a str,
}

impl Display for InvalidArgumentRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "invalid argument rejected: {}", self.reason)
    }
}

impl StructuredLog for InvalidArgumentRejected<'_> {
    fn log(&self) {
        tracing::error!(reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("invalid_argument_rejected", span_name = name, reason = self.reason)
    }
}

/// An edge edit was rejected because the node had already left `NotStarted`.
pub struct InvalidStateRejected {
    pub node: NodeId,
}

impl Display for InvalidStateRejected {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "edit on node {} rejected: no longer NotStarted", self.node)
    }
}

impl StructuredLog for InvalidStateRejected {
    fn log(&self) {
        tracing::error!(node = %self.node, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("invalid_state_rejected", span_name = name, node = %self.node)
    }
}
