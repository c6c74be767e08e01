// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for run lifecycle, dispatch, completion, and cancellation events.

use std::fmt::{Display, Formatter};
use tracing::Span;

use super::StructuredLog;
use crate::graph::NodeId;

/// A run started.
pub struct RunStarted {
    pub strategy: &'static str,
    pub node_count: usize,
    pub global_cap: usize,
}

impl Display for RunStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "starting {} run: {} node(s), global_cap={}",
            self.strategy, self.node_count, self.global_cap
        )
    }
}

impl StructuredLog for RunStarted {
    fn log(&self) {
        tracing::info!(
            strategy = self.strategy,
            node_count = self.node_count,
            global_cap = self.global_cap,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            strategy = self.strategy,
            node_count = self.node_count,
            global_cap = self.global_cap,
        )
    }
}

/// A run completed without cancellation (individual nodes may still have failed).
pub struct RunCompleted {
    pub strategy: &'static str,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration: std::time::Duration,
}

impl Display for RunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} run finished in {:?}: {} completed, {} failed, {} skipped",
            self.strategy, self.duration, self.completed, self.failed, self.skipped
        )
    }
}

impl StructuredLog for RunCompleted {
    fn log(&self) {
        tracing::info!(
            strategy = self.strategy,
            completed = self.completed,
            failed = self.failed,
            skipped = self.skipped,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            strategy = self.strategy,
            completed = self.completed,
            failed = self.failed,
            skipped = self.skipped,
        )
    }
}

/// A node was launched.
pub struct NodeLaunched {
    pub node: NodeId,
    pub weight: i64,
}

impl Display for NodeLaunched {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "launching node {} (weight {})", self.node, self.weight)
    }
}

impl StructuredLog for NodeLaunched {
    fn log(&self) {
        tracing::debug!(node = %self.node, weight = self.weight, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("node_launched", span_name = name, node = %self.node)
    }
}

/// A node's action failed; its transitive successors are being skip-propagated.
pub struct NodeFailed<'a> {
    pub node: NodeId,
    pub error: &'a anyhow::Error,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "node {} failed: {}", self.node, self.error)
    }
}

impl StructuredLog for NodeFailed<'_> {
    fn log(&self) {
        tracing::error!(node = %self.node, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("node_failed", span_name = name, node = %self.node, error = %self.error)
    }
}

/// A node was skipped because a predecessor became faulted.
pub struct NodeSkipped {
    pub node: NodeId,
    pub cause: NodeId,
}

impl Display for NodeSkipped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "node {} skipped (caused by {})", self.node, self.cause)
    }
}

impl StructuredLog for NodeSkipped {
    fn log(&self) {
        tracing::warn!(node = %self.node, cause = %self.cause, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("node_skipped", span_name = name, node = %self.node, cause = %self.cause)
    }
}

/// The run observed cancellation.
pub struct RunCancelled {
    pub in_flight: usize,
}

impl Display for RunCancelled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "run cancelled with {} node(s) in flight", self.in_flight)
    }
}

impl StructuredLog for RunCancelled {
    fn log(&self) {
        tracing::warn!(in_flight = self.in_flight, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("run_cancelled", span_name = name, in_flight = self.in_flight)
    }
}
