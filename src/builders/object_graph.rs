// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A thin wrapper over [`Graph`] for callers who already hold [`NodeId`] handles and
//! want to wire predecessor/successor edges directly, without an id-keyed layer on top.

use std::sync::Arc;

use crate::errors::SchedulerError;
use crate::graph::{Action, Graph, Node, NodeId, Pool};

/// Builds a [`Graph`] by direct node/edge calls. Every method here forwards straight to
/// the identically-named [`Graph`] method: this type exists so callers can name the
/// front-end they're using rather than reach into `graph` directly, and as a seam for
/// any object-graph-specific behavior a future front-end might need.
#[derive(Default)]
pub struct ObjectGraphBuilder {
    graph: Graph,
}

impl ObjectGraphBuilder {
    /// An empty builder wrapping a fresh [`Graph`].
    pub fn new() -> Self {
        Self { graph: Graph::new() }
    }

    /// See [`Graph::add_node`].
    pub fn add_node(&self, weight: i64, pool: Pool, action: Arc<dyn Action>) -> NodeId {
        self.graph.add_node(weight, pool, action)
    }

    /// See [`Graph::add_predecessor`].
    pub fn add_predecessor(&self, node: NodeId, predecessor: NodeId) -> Result<(), SchedulerError> {
        self.graph.add_predecessor(node, predecessor)
    }

    /// See [`Graph::remove_predecessor`].
    pub fn remove_predecessor(
        &self,
        node: NodeId,
        predecessor: NodeId,
    ) -> Result<(), SchedulerError> {
        self.graph.remove_predecessor(node, predecessor)
    }

    /// See [`Graph::get`].
    pub fn get(&self, id: NodeId) -> Option<Arc<Node>> {
        self.graph.get(id)
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
    fn forwards_to_the_underlying_graph() {
        let builder = ObjectGraphBuilder::new();
        let p = builder.add_node(0, Pool::default_pool(), noop_action());
        let n = builder.add_node(0, Pool::default_pool(), noop_action());
        builder.add_predecessor(n, p).unwrap();

        assert_eq!(builder.get(n).unwrap().predecessors(), vec![p]);
        assert_eq!(builder.graph().get(p).unwrap().successors(), vec![n]);
    }
}
