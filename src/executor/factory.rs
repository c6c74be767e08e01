// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Selects the dispatch strategy for a run.

use std::sync::Arc;

use crate::graph::Node;

/// Which run loop drives a given execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strategy {
    /// `global_cap == 1` and no runnable node overrides the default pool.
    Sequential,
    /// A pool override is in play, or the global cap allows more than one runner.
    Pooled,
}

/// Sequential dispatch is only behaviorally identical to pooled dispatch with a
/// default-pool cap of 1, so that's the only condition under which it's chosen. Any
/// pool override, even a single one, forces the pooled path so that pool's cap is
/// actually observed.
pub(crate) fn select(global_cap: usize, run_set: &[Arc<Node>]) -> Strategy {
    if global_cap == 1 && run_set.iter().all(|n| n.pool().is_default()) {
        Strategy::Sequential
    } else {
        Strategy::Pooled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::action::FnAction;
    use crate::graph::{Action, Graph, Pool};
    use std::future::Future;
    use std::pin::Pin;

    fn noop_action() -> Arc<dyn Action> {
        Arc::new(FnAction::new(|_cancel| {
            Box::pin(async { Ok(()) })
                as Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        }))
    }

    fn node(graph: &Graph, pool: Pool) -> Arc<Node> {
        let id = graph.add_node(0, pool, noop_action());
        graph.get(id).unwrap()
    }

    #[test]
    fn cap_one_with_only_default_pool_nodes_is_sequential() {
        let g = Graph::new();
        let run_set = vec![node(&g, Pool::default_pool()), node(&g, Pool::default_pool())];
        assert_eq!(select(1, &run_set), Strategy::Sequential);
    }

    #[test]
    fn cap_one_with_a_named_pool_is_pooled() {
        let g = Graph::new();
        let run_set = vec![node(&g, Pool::default_pool()), node(&g, Pool::new(2))];
        assert_eq!(select(1, &run_set), Strategy::Pooled);
    }

    #[test]
    fn cap_above_one_is_pooled() {
        let g = Graph::new();
        let run_set = vec![node(&g, Pool::default_pool())];
        assert_eq!(select(3, &run_set), Strategy::Pooled);
    }
}
