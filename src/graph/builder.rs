// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The graph builder: node creation and edge editing, guarded by a single mutex so
//! concurrent builders observe a consistent graph.
//!
//! This is the "object-graph" facade referred to throughout the crate: callers hold
//! [`NodeId`] handles and wire predecessor/successor edges directly. [`crate::builders::IdKeyedBuilder`]
//! is a thin adapter over the same `Graph`.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::SchedulerError;
use crate::observability::messages::graph as log;
use crate::observability::messages::StructuredLog;

use super::action::Action;
use super::node::{Node, NodeId, NodeState};
use super::pool::Pool;

/// Owns the set of [`Node`]s submitted so far and the id counter that names them.
///
/// A `Graph` is typically built once and then handed to
/// [`crate::executor::Scheduler::execute`]; nothing prevents reusing it across runs,
/// but edits are rejected once a node has left `NotStarted` (see
/// [`Graph::add_predecessor`]).
pub struct Graph {
    next_id: AtomicU64,
    edit_lock: Mutex<()>,
    nodes: Mutex<HashMap<NodeId, Arc<Node>>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// An empty graph with its own id counter, starting at 1.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            edit_lock: Mutex::new(()),
            nodes: Mutex::new(HashMap::new()),
        }
    }

    /// Create a node with the given `weight` and `pool` (pass [`Pool::default_pool`]
    /// for the implicit default pool) wrapping `action`. Returns the new node's id.
    pub fn add_node(&self, weight: i64, pool: Pool, action: Arc<dyn Action>) -> NodeId {
        let _guard = self.edit_lock.lock();
        let id = NodeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let node = Arc::new(Node::new(id, weight, pool, action));
        self.nodes.lock().insert(id, node);
        log::NodeAdded { node: id, weight }.log();
        id
    }

    /// Record `predecessor` as a predecessor of `node` (and, symmetrically, `node` as a
    /// successor of `predecessor`). Duplicates are silently ignored.
    ///
    /// Fails with [`SchedulerError::InvalidState`] if `node` has left `NotStarted`.
    pub fn add_predecessor(&self, node: NodeId, predecessor: NodeId) -> Result<(), SchedulerError> {
        let _guard = self.edit_lock.lock();
        let (n, p) = self.fetch_pair(node, predecessor)?;
        self.ensure_not_started(&n, node)?;
        n.add_predecessor_edge(predecessor);
        p.add_successor_edge(node);
        Ok(())
    }

    /// The exact inverse of [`Self::add_predecessor`].
    ///
    /// Fails with [`SchedulerError::InvalidState`] if `node` has left `NotStarted`.
    pub fn remove_predecessor(
        &self,
        node: NodeId,
        predecessor: NodeId,
    ) -> Result<(), SchedulerError> {
        let _guard = self.edit_lock.lock();
        let (n, p) = self.fetch_pair(node, predecessor)?;
        self.ensure_not_started(&n, node)?;
        n.remove_predecessor_edge(predecessor);
        p.remove_successor_edge(node);
        Ok(())
    }

    /// Look up a node by id.
    pub fn get(&self, id: NodeId) -> Option<Arc<Node>> {
        self.nodes.lock().get(&id).cloned()
    }

    /// All nodes currently in the graph, in no particular order.
    pub fn nodes(&self) -> Vec<Arc<Node>> {
        self.nodes.lock().values().cloned().collect()
    }

    /// The number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    /// `true` iff the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }

    fn fetch_pair(
        &self,
        node: NodeId,
        predecessor: NodeId,
    ) -> Result<(Arc<Node>, Arc<Node>), SchedulerError> {
        let nodes = self.nodes.lock();
        let n = nodes.get(&node).cloned().ok_or_else(|| {
            let reason = format!("unknown node {node:?}");
            log::InvalidArgumentRejected { reason: &reason }.log();
            SchedulerError::InvalidArgument(reason)
        })?;
        let p = nodes.get(&predecessor).cloned().ok_or_else(|| {
            let reason = format!("unknown node {predecessor:?}");
            log::InvalidArgumentRejected { reason: &reason }.log();
            SchedulerError::InvalidArgument(reason)
        })?;
        Ok((n, p))
    }

    fn ensure_not_started(&self, node: &Node, id: NodeId) -> Result<(), SchedulerError> {
        if node.state() != NodeState::NotStarted {
            log::InvalidStateRejected { node: id }.log();
            return Err(SchedulerError::InvalidState { node: id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::action::FnAction;
    use std::future::Future;
    use std::pin::Pin;

    fn noop_action() -> Arc<dyn Action> {
        Arc::new(FnAction::new(|_cancel| {
            Box::pin(async { Ok(()) })
                as Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        }))
    }

    #[test]
    fn add_predecessor_is_mutual() {
        let g = Graph::new();
        let p = g.add_node(0, Pool::default_pool(), noop_action());
        let n = g.add_node(0, Pool::default_pool(), noop_action());

        g.add_predecessor(n, p).unwrap();

        assert_eq!(g.get(n).unwrap().predecessors(), vec![p]);
        assert_eq!(g.get(p).unwrap().successors(), vec![n]);
    }

    #[test]
    fn remove_predecessor_is_the_exact_inverse() {
        let g = Graph::new();
        let p = g.add_node(0, Pool::default_pool(), noop_action());
        let n = g.add_node(0, Pool::default_pool(), noop_action());

        g.add_predecessor(n, p).unwrap();
        g.remove_predecessor(n, p).unwrap();

        assert!(g.get(n).unwrap().predecessors().is_empty());
        assert!(g.get(p).unwrap().successors().is_empty());
    }

    #[test]
    fn duplicate_predecessor_is_silently_ignored() {
        let g = Graph::new();
        let p = g.add_node(0, Pool::default_pool(), noop_action());
        let n = g.add_node(0, Pool::default_pool(), noop_action());

        g.add_predecessor(n, p).unwrap();
        g.add_predecessor(n, p).unwrap();

        assert_eq!(g.get(n).unwrap().predecessors().len(), 1);
    }

    #[test]
    fn edits_are_rejected_once_a_node_has_left_not_started() {
        let g = Graph::new();
        let p = g.add_node(0, Pool::default_pool(), noop_action());
        let n = g.add_node(0, Pool::default_pool(), noop_action());
        g.get(n).unwrap().set_state(NodeState::ReadyToRun);

        let err = g.add_predecessor(n, p).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidState { node } if node == n));
    }

    #[test]
    fn ids_are_stable_and_unique() {
        let g = Graph::new();
        let a = g.add_node(0, Pool::default_pool(), noop_action());
        let b = g.add_node(0, Pool::default_pool(), noop_action());
        assert_ne!(a, b);
    }
}
