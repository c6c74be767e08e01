// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A builder keyed by caller-chosen ids, for callers who'd rather name their
//! dependencies than hold [`NodeId`] handles.
//!
//! This is a presentation constraint layered on top of [`Graph`], not a graph
//! constraint: it requires every dependency to already be registered at the point an
//! operation is added, rejecting forward references rather than admitting them and
//! catching the mistake later in the validator.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::SchedulerError;
use crate::graph::{Action, Graph, NodeId, Pool};
use crate::observability::messages::graph::InvalidArgumentRejected;
use crate::observability::messages::StructuredLog;

/// Builds a [`Graph`] keyed by caller ids of type `Id` rather than [`NodeId`].
///
/// `Id` values are never exposed by the graph itself; this type is the only place that
/// remembers the mapping, and it's consulted only at admission time.
pub struct IdKeyedBuilder<Id: Eq + Hash + Clone> {
    graph: Graph,
    ids: Mutex<HashMap<Id, NodeId>>,
}

impl<Id: Eq + Hash + Clone + std::fmt::Debug> Default for IdKeyedBuilder<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Eq + Hash + Clone + std::fmt::Debug> IdKeyedBuilder<Id> {
    /// An empty builder wrapping a fresh [`Graph`].
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            ids: Mutex::new(HashMap::new()),
        }
    }

    /// Register an operation under `id`, with predecessors named by `depends_on`.
    ///
    /// Fails with [`SchedulerError::InvalidArgument`] if `id` is already registered, or
    /// if any entry in `depends_on` hasn't been registered yet (forward references are
    /// rejected rather than admitted), so a caller always adds operations in an order
    /// consistent with their own dependency graph.
    pub fn add_operation(
        &self,
        id: Id,
        weight: i64,
        pool: Pool,
        action: Arc<dyn Action>,
        depends_on: &[Id],
    ) -> Result<NodeId, SchedulerError> {
        let mut ids = self.ids.lock();
        if ids.contains_key(&id) {
            let reason = format!("duplicate id {id:?}");
            InvalidArgumentRejected { reason: &reason }.log();
            return Err(SchedulerError::InvalidArgument(reason));
        }

        let mut predecessors = Vec::with_capacity(depends_on.len());
        for dep in depends_on {
            let predecessor = ids.get(dep).copied().ok_or_else(|| {
                let reason = format!("unregistered dependency id {dep:?}");
                InvalidArgumentRejected { reason: &reason }.log();
                SchedulerError::InvalidArgument(reason)
            })?;
            predecessors.push(predecessor);
        }

        let node_id = self.graph.add_node(weight, pool, action);
        for predecessor in predecessors {
            self.graph.add_predecessor(node_id, predecessor)?;
        }
        ids.insert(id, node_id);
        Ok(node_id)
    }

    /// The [`NodeId`] registered under `id`, if any.
    pub fn node_id(&self, id: &Id) -> Option<NodeId> {
        self.ids.lock().get(id).copied()
    }

    /// The underlying [`Graph`], ready to hand to [`crate::executor::Scheduler::execute`].
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Consume the builder and take ownership of its [`Graph`].
    pub fn into_graph(self) -> Graph {
        self.graph
    }
}
