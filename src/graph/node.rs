// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use super::action::Action;
use super::pool::Pool;

/// A stable, process-local identity assigned to a node when it is created.
///
/// Identities are monotonic for the lifetime of the owning [`super::Graph`] and are
/// never reused, which is what makes them safe to feed into topological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The lifecycle state of a node.
///
/// Valid transitions: `NotStarted -> ReadyToRun -> Running -> {Completed | Failed}`, or
/// from any pre-run state to `Skipped` once a predecessor becomes `faulted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    NotStarted,
    ReadyToRun,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl NodeState {
    /// A node has reached a terminal state.
    pub fn is_signaled(self) -> bool {
        matches!(self, NodeState::Completed | NodeState::Failed | NodeState::Skipped)
    }

    /// A signaled node whose terminal state is `Failed` or `Skipped`.
    pub fn is_faulted(self) -> bool {
        matches!(self, NodeState::Failed | NodeState::Skipped)
    }
}

/// One operation in the dependency graph.
///
/// Predecessor/successor edges are stored as [`NodeId`] sets rather than direct `Arc`
/// references, so two nodes never strongly own each other even though the relation
/// they describe is cyclic in the general case (a caller could, before validation,
/// wire up an actual cycle, which is exactly what the validator exists to reject).
pub struct Node {
    id: NodeId,
    weight: i64,
    pool: Pool,
    action: Arc<dyn Action>,
    state: Mutex<NodeState>,
    failure: Mutex<Option<Arc<anyhow::Error>>>,
    predecessors: Mutex<HashSet<NodeId>>,
    successors: Mutex<HashSet<NodeId>>,
}

impl Node {
    pub(crate) fn new(id: NodeId, weight: i64, pool: Pool, action: Arc<dyn Action>) -> Self {
        Self {
            id,
            weight,
            pool,
            action,
            state: Mutex::new(NodeState::NotStarted),
            failure: Mutex::new(None),
            predecessors: Mutex::new(HashSet::new()),
            successors: Mutex::new(HashSet::new()),
        }
    }

    /// This node's stable identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The tie-break priority among ready siblings in the same pool; higher wins.
    pub fn weight(&self) -> i64 {
        self.weight
    }

    /// The pool this node belongs to (the default pool if none was given explicitly).
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub(crate) fn action(&self) -> Arc<dyn Action> {
        self.action.clone()
    }

    /// The node's current lifecycle state.
    pub fn state(&self) -> NodeState {
        *self.state.lock()
    }

    /// `true` once this node has reached a terminal state.
    pub fn signaled(&self) -> bool {
        self.state().is_signaled()
    }

    /// `true` if this node's terminal state is `Failed` or `Skipped`.
    pub fn faulted(&self) -> bool {
        self.state().is_faulted()
    }

    /// The captured failure value, if this node ended `Failed`.
    pub fn failure(&self) -> Option<Arc<anyhow::Error>> {
        self.failure.lock().clone()
    }

    /// A snapshot of this node's predecessor ids.
    pub fn predecessors(&self) -> Vec<NodeId> {
        self.predecessors.lock().iter().copied().collect()
    }

    /// A snapshot of this node's successor ids.
    pub fn successors(&self) -> Vec<NodeId> {
        self.successors.lock().iter().copied().collect()
    }

    pub(crate) fn predecessor_count(&self) -> usize {
        self.predecessors.lock().len()
    }

    pub(crate) fn add_predecessor_edge(&self, predecessor: NodeId) {
        self.predecessors.lock().insert(predecessor);
    }

    pub(crate) fn remove_predecessor_edge(&self, predecessor: NodeId) {
        self.predecessors.lock().remove(&predecessor);
    }

    pub(crate) fn add_successor_edge(&self, successor: NodeId) {
        self.successors.lock().insert(successor);
    }

    pub(crate) fn remove_successor_edge(&self, successor: NodeId) {
        self.successors.lock().remove(&successor);
    }

    /// Force this node to `Skipped` unless it has already reached a terminal state.
    ///
    /// Used by eager skip-propagation. Returns `true` if this call actually performed
    /// the transition (callers use this to decide whether to keep walking successors).
    pub(crate) fn mark_skipped_if_pending(&self) -> bool {
        let mut state = self.state.lock();
        if state.is_signaled() {
            return false;
        }
        *state = NodeState::Skipped;
        true
    }

    pub(crate) fn set_state(&self, new_state: NodeState) {
        *self.state.lock() = new_state;
    }

    /// Transition `Running -> Completed`, but only if nothing else (skip-propagation
    /// from a failed predecessor) already moved this node to `Skipped` first. This is
    /// the monotonicity gate the state model requires.
    pub(crate) fn complete_if_running(&self) {
        let mut state = self.state.lock();
        if *state == NodeState::Running {
            *state = NodeState::Completed;
        }
    }

    /// Transition `Running -> Failed` with the same monotonicity gate as
    /// [`Self::complete_if_running`], recording `err` only if the transition happens.
    pub(crate) fn fail_if_running(&self, err: anyhow::Error) -> bool {
        let mut state = self.state.lock();
        if *state == NodeState::Running {
            *state = NodeState::Failed;
            *self.failure.lock() = Some(Arc::new(err));
            true
        } else {
            false
        }
    }

    /// Reset this node to `NotStarted` and clear any captured failure, for
    /// `reset_after_done`.
    pub(crate) fn reset(&self) {
        *self.state.lock() = NodeState::NotStarted;
        *self.failure.lock() = None;
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("weight", &self.weight)
            .field("state", &self.state())
            .finish()
    }
}
