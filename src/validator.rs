// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Restricts a graph's nodes to the runnable subset and proves that subset is
//! acyclic, via a root-reachability pass followed by an independent Kahn's-algorithm
//! peel.
//!
//! # Algorithm Overview
//!
//! Validation runs in two independent passes before an [`crate::executor::Scheduler`]
//! launches any node:
//!
//! 1. **Root-reachability walk**: starting from every node with no non-signaled
//!    successor (a root), recursively admit predecessors into the run set. A caller
//!    node that is non-signaled but unreachable from any root proves a cycle among
//!    non-signaled nodes, and is rejected immediately without running Kahn's algorithm.
//! 2. **Kahn's-algorithm peel**: restricted to the run set computed above, repeatedly
//!    remove nodes whose remaining in-run-set predecessor count has dropped to zero. If
//!    nodes remain once no more can be peeled, the run set itself contains a cycle.
//!
//! # Key Properties
//!
//! - **Non-destructive on success**: the only state mutation is `NotStarted ->
//!   ReadyToRun` on admitted nodes.
//! - **Restorative on failure**: every node touched by the Kahn peel reverts to
//!   `NotStarted` before `Err(SchedulerError::Cycle)` is returned, so a caller can fix
//!   the graph and retry without rebuilding it.
//! - **Idempotent with respect to already-signaled nodes**: a node that is
//!   `Completed`/`Failed`/`Skipped` from a prior run is excluded from the run set
//!   entirely rather than re-validated.
//!
//! # Performance Characteristics
//!
//! Both passes are linear in the size of the graph: the root-reachability walk visits
//! each node and edge once via an explicit stack, and the Kahn peel visits each
//! in-run-set edge exactly once while decrementing in-degree counts. Memory use is
//! `O(V + E)` for the adjacency snapshots taken from each node's predecessor/successor
//! sets.
//!
//! # Examples
//!
//! ```rust
//! use std::future::Future;
//! use std::pin::Pin;
//! use std::sync::Arc;
//!
//! use taskgraph::graph::action::FnAction;
//! use taskgraph::{Graph, NodeState, Pool, Scheduler};
//! use tokio_util::sync::CancellationToken;
//!
//! fn noop() -> Arc<dyn taskgraph::Action> {
//!     Arc::new(FnAction::new(|_cancel| {
//!         Box::pin(async { Ok(()) }) as Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
//!     }))
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let graph = Graph::new();
//!     let upstream = graph.add_node(0, Pool::default_pool(), noop());
//!     let downstream = graph.add_node(0, Pool::default_pool(), noop());
//!     graph.add_predecessor(downstream, upstream).unwrap();
//!
//!     // `Scheduler::execute` validates the graph (rejecting it on a cycle) before
//!     // launching anything.
//!     Scheduler::execute(&graph, 4, false, CancellationToken::new())
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(graph.get(downstream).unwrap().state(), NodeState::Completed);
//! }
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::errors::SchedulerError;
use crate::graph::{Graph, Node, NodeId, NodeState};
use crate::observability::messages::graph::CycleDetected;
use crate::observability::messages::StructuredLog;

/// Compute the run set for `graph` and prove it acyclic.
///
/// On success, every returned node has been transitioned `NotStarted -> ReadyToRun`.
/// On a detected cycle, every node touched by the Kahn peel is restored to
/// `NotStarted` before `Err(SchedulerError::Cycle)` is returned.
pub fn validate(graph: &Graph) -> Result<Vec<Arc<Node>>, SchedulerError> {
    let all_nodes = graph.nodes();
    let run_set = compute_run_set(&all_nodes)?;
    detect_cycle(&run_set)?;
    Ok(run_set)
}

/// Roots are nodes whose successors (restricted to non-signaled ones) are empty.
/// Starting from each root, walk predecessors recursively, admitting every newly seen
/// non-signaled node to the run set and marking it `ReadyToRun`.
fn compute_run_set(all_nodes: &[Arc<Node>]) -> Result<Vec<Arc<Node>>, SchedulerError> {
    let by_id: HashMap<NodeId, &Arc<Node>> = all_nodes.iter().map(|n| (n.id(), n)).collect();

    let is_root = |n: &Arc<Node>| -> bool {
        n.successors()
            .iter()
            .all(|s| by_id.get(s).map(|s| s.signaled()).unwrap_or(true))
    };

    let mut stack: Vec<Arc<Node>> = all_nodes
        .iter()
        .filter(|n| !n.signaled() && is_root(n))
        .cloned()
        .collect();

    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut run_set = Vec::new();

    while let Some(node) = stack.pop() {
        if !seen.insert(node.id()) {
            continue;
        }
        if !node.signaled() {
            node.set_state(NodeState::ReadyToRun);
            run_set.push(node.clone());
        }
        for predecessor_id in node.predecessors() {
            if let Some(predecessor) = by_id.get(&predecessor_id) {
                if !seen.contains(&predecessor_id) {
                    stack.push((*predecessor).clone());
                }
            }
        }
    }

    if run_set.is_empty() && all_nodes.iter().any(|n| !n.signaled()) {
        CycleDetected {
            remaining_nodes: all_nodes.iter().filter(|n| !n.signaled()).count(),
        }
        .log();
        return Err(SchedulerError::Cycle);
    }

    Ok(run_set)
}

/// Kahn's algorithm restricted to `run_set`: repeatedly peel zero in-degree nodes. If
/// any remain once no more can be peeled, the run set contains a cycle.
fn detect_cycle(run_set: &[Arc<Node>]) -> Result<(), SchedulerError> {
    let run_ids: HashSet<NodeId> = run_set.iter().map(|n| n.id()).collect();
    let by_id: HashMap<NodeId, &Arc<Node>> = run_set.iter().map(|n| (n.id(), n)).collect();

    let mut in_degree: HashMap<NodeId, usize> = run_set
        .iter()
        .map(|n| {
            let count = n
                .predecessors()
                .into_iter()
                .filter(|p| run_ids.contains(p))
                .count();
            (n.id(), count)
        })
        .collect();

    let mut queue: VecDeque<NodeId> = in_degree
        .iter()
        .filter(|(_, &count)| count == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut processed = 0usize;
    while let Some(id) = queue.pop_front() {
        processed += 1;
        if let Some(node) = by_id.get(&id) {
            for successor_id in node.successors() {
                if !run_ids.contains(&successor_id) {
                    continue;
                }
                if let Some(count) = in_degree.get_mut(&successor_id) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(successor_id);
                    }
                }
            }
        }
    }

    if processed != run_set.len() {
        for node in run_set {
            node.set_state(NodeState::NotStarted);
        }
        CycleDetected {
            remaining_nodes: run_set.len() - processed,
        }
        .log();
        return Err(SchedulerError::Cycle);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::action::FnAction;
    use crate::graph::{Action, Pool};
    use std::future::Future;
    use std::pin::Pin;

    fn noop_action() -> Arc<dyn Action> {
        Arc::new(FnAction::new(|_cancel| {
            Box::pin(async { Ok(()) })
                as Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        }))
    }

    #[test]
    fn diamond_is_acyclic_and_fully_admitted() {
        let g = Graph::new();
        let a = g.add_node(10, Pool::default_pool(), noop_action());
        let b = g.add_node(20, Pool::default_pool(), noop_action());
        let c = g.add_node(10, Pool::default_pool(), noop_action());
        g.add_predecessor(c, a).unwrap();
        g.add_predecessor(c, b).unwrap();

        let run_set = validate(&g).unwrap();
        let ids: HashSet<NodeId> = run_set.iter().map(|n| n.id()).collect();
        assert_eq!(ids, HashSet::from([a, b, c]));
        for n in &run_set {
            assert_eq!(n.state(), NodeState::ReadyToRun);
        }
    }

    #[test]
    fn self_cycle_via_mutual_predecessor_has_no_roots() {
        // A <- B <- C, and C <- B (B and C are mutual predecessors).
        let g = Graph::new();
        let a = g.add_node(0, Pool::default_pool(), noop_action());
        let b = g.add_node(0, Pool::default_pool(), noop_action());
        let c = g.add_node(0, Pool::default_pool(), noop_action());
        g.add_predecessor(b, a).unwrap();
        g.add_predecessor(c, b).unwrap();
        g.add_predecessor(b, c).unwrap();

        let err = validate(&g).unwrap_err();
        assert!(matches!(err, SchedulerError::Cycle));
        for n in g.nodes() {
            assert_eq!(n.state(), NodeState::NotStarted);
        }
    }

    #[test]
    fn pure_cycle_with_no_roots_is_rejected_before_traversal() {
        let g = Graph::new();
        let a = g.add_node(0, Pool::default_pool(), noop_action());
        let b = g.add_node(0, Pool::default_pool(), noop_action());
        let c = g.add_node(0, Pool::default_pool(), noop_action());
        g.add_predecessor(b, a).unwrap();
        g.add_predecessor(c, b).unwrap();
        g.add_predecessor(a, c).unwrap();

        let err = validate(&g).unwrap_err();
        assert!(matches!(err, SchedulerError::Cycle));
    }

    #[test]
    fn a_cycle_reachable_from_a_real_root_is_still_caught_by_the_kahn_pass() {
        // root R has predecessor P, whose predecessors Q and S cycle on each other.
        let g = Graph::new();
        let r = g.add_node(0, Pool::default_pool(), noop_action());
        let p = g.add_node(0, Pool::default_pool(), noop_action());
        let q = g.add_node(0, Pool::default_pool(), noop_action());
        let s = g.add_node(0, Pool::default_pool(), noop_action());
        g.add_predecessor(r, p).unwrap();
        g.add_predecessor(p, q).unwrap();
        g.add_predecessor(q, s).unwrap();
        g.add_predecessor(s, q).unwrap();

        let err = validate(&g).unwrap_err();
        assert!(matches!(err, SchedulerError::Cycle));
    }

    #[test]
    fn empty_graph_has_an_empty_run_set() {
        let g = Graph::new();
        let run_set = validate(&g).unwrap();
        assert!(run_set.is_empty());
    }
}
