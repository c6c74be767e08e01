// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The general-purpose run loop: one [`tokio::task::JoinSet`] shared across every pool,
//! with per-pool pending/running bookkeeping enforcing each pool's independent cap.
//!
//! This is the path taken whenever any runnable node overrides the default pool, or the
//! global cap allows more than one concurrent default-pool node.
//!
//! # Architecture Overview
//!
//! Nodes are partitioned by pool identity into a [`PoolSlot`] carrying that pool's
//! effective cap, its not-yet-launched `pending` list, and a count of how many of its
//! slots are occupied. A single `JoinSet` is shared across every pool so the main loop
//! can wait on the first completion from any of them with one `join_next_with_id`
//! call, rather than polling each pool's own handle list in turn.
//!
//! # Key Features
//!
//! - **Independent pool caps**: each pool's `running` count is tracked and enforced
//!   separately; the default pool borrows the run's `global_cap`.
//! - **Weight-ordered launch**: within one pool at one scheduling decision, eligible
//!   pending nodes are launched highest-weight-first, truncated to the pool's free
//!   capacity.
//! - **Eager skip-propagation**: a launched node's failure walks its successor closure
//!   and marks every reachable pre-run node `Skipped` before the main loop's next
//!   iteration, even if some of those successors are themselves already running.
//! - **Cooperative cancellation**: the run's `CancellationToken` is checked at the top
//!   of every iteration and handed to every launched action.
//!
//! # Main Loop
//!
//! 1. Reap nodes skip-propagation already signaled out of every pool's `pending` list.
//! 2. For each pool with free capacity, launch up to that many eligible pending nodes.
//! 3. Await the first completion across every pool's in-flight tasks.
//! 4. Finalize that node's outcome (completed or failed, with skip-propagation) and
//!    loop until every node in the run set is signaled.
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
//!     let cpu_bound = Pool::new(1);
//!     let a = graph.add_node(0, cpu_bound.clone(), noop());
//!     let b = graph.add_node(0, cpu_bound, noop());
//!
//!     // `a` and `b` share a pool capped at 1, so the pooled executor runs them one
//!     // at a time even though the global cap below allows more concurrency.
//!     Scheduler::execute(&graph, 4, false, CancellationToken::new())
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(graph.get(a).unwrap().state(), NodeState::Completed);
//!     assert_eq!(graph.get(b).unwrap().state(), NodeState::Completed);
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::{Id as TaskId, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::errors::SchedulerError;
use crate::graph::{Node, NodeId, NodeState, Pool};
use crate::observability::messages::executor::{
    NodeFailed, NodeLaunched, RunCancelled, RunCompleted, RunStarted,
};
use crate::observability::messages::StructuredLog;

use super::{predecessors_signaled, propagate_skip, tally};

/// Per-pool bookkeeping for one run: the nodes not yet launched and how many of the
/// pool's slots are currently occupied.
struct PoolSlot {
    pool: Pool,
    cap: usize,
    pending: Vec<NodeId>,
    running: usize,
}

type TaskOutput = (NodeId, u64, anyhow::Result<()>);

pub(crate) async fn run(
    run_set: &[Arc<Node>],
    by_id: &HashMap<NodeId, Arc<Node>>,
    global_cap: usize,
    cancellation: &CancellationToken,
) -> Result<(), SchedulerError> {
    RunStarted {
        strategy: "pooled",
        node_count: run_set.len(),
        global_cap,
    }
    .log();
    let start = Instant::now();

    let mut pools: HashMap<u64, PoolSlot> = HashMap::new();
    for node in run_set {
        let key = node.pool().key();
        pools
            .entry(key)
            .or_insert_with(|| PoolSlot {
                pool: node.pool().clone(),
                cap: node.pool().effective_cap(global_cap),
                pending: Vec::new(),
                running: 0,
            })
            .pending
            .push(node.id());
    }

    let mut join_set: JoinSet<TaskOutput> = JoinSet::new();
    let mut task_owner: HashMap<TaskId, NodeId> = HashMap::new();

    while run_set.iter().any(|n| !n.signaled()) {
        if cancellation.is_cancelled() {
            RunCancelled {
                in_flight: join_set.len(),
            }
            .log();
            while join_set.join_next().await.is_some() {}
            return Err(SchedulerError::Cancelled);
        }

        // Reap nodes that skip-propagation already signaled while they were still
        // sitting in a pool's pending list.
        for slot in pools.values_mut() {
            slot.pending.retain(|id| !by_id[id].signaled());
        }

        for slot in pools.values_mut() {
            let capacity = slot.cap.saturating_sub(slot.running);
            if capacity == 0 {
                continue;
            }

            let mut eligible: Vec<NodeId> = slot
                .pending
                .iter()
                .copied()
                .filter(|id| predecessors_signaled(&by_id[id], by_id))
                .collect();
            eligible.sort_by_key(|id| std::cmp::Reverse(by_id[id].weight()));
            eligible.truncate(capacity);

            for id in eligible {
                slot.pending.retain(|pid| *pid != id);
                let node = by_id[&id].clone();
                node.set_state(NodeState::Running);
                NodeLaunched {
                    node: node.id(),
                    weight: node.weight(),
                }
                .log();

                let cancel = cancellation.clone();
                let pool_key = slot.pool.key();
                let node_for_task = node.clone();
                let handle = join_set.spawn(async move {
                    let result = node_for_task.action().run(cancel).await;
                    (node_for_task.id(), pool_key, result)
                });
                task_owner.insert(handle.id(), id);
                slot.running += 1;
            }
        }

        if join_set.is_empty() {
            // Nothing running, nothing launched, yet the loop condition says work
            // remains; every remaining node is blocked on a predecessor that will
            // never signal. The validator should have ruled this out.
            return Err(SchedulerError::Cycle);
        }

        match join_set.join_next_with_id().await {
            Some(Ok((task_id, (node_id, pool_key, result)))) => {
                task_owner.remove(&task_id);
                if let Some(slot) = pools.get_mut(&pool_key) {
                    slot.running = slot.running.saturating_sub(1);
                }
                finalize(&by_id[&node_id], result, by_id);
            }
            Some(Err(join_err)) => {
                if let Some(node_id) = task_owner.remove(&join_err.id()) {
                    let node = &by_id[&node_id];
                    if let Some(slot) = pools.get_mut(&node.pool().key()) {
                        slot.running = slot.running.saturating_sub(1);
                    }
                    finalize(
                        node,
                        Err(anyhow::anyhow!("action task panicked: {join_err}")),
                        by_id,
                    );
                }
            }
            None => {}
        }
    }

    // Defensive drain: the loop only exits once every node is signaled, but a
    // straggling completion could still be in flight from a node whose predecessor
    // was skip-propagated after launch.
    while join_set.join_next().await.is_some() {}

    let (completed, failed, skipped) = tally(run_set);
    RunCompleted {
        strategy: "pooled",
        completed,
        failed,
        skipped,
        duration: start.elapsed(),
    }
    .log();

    Ok(())
}

/// Apply a completed action's outcome to its node, propagating skips on failure. Gated
/// on the node still being `Running` so an in-flight completion can never clobber a
/// `Skipped` marker a failed predecessor set while this node was launched.
fn finalize(node: &Arc<Node>, result: anyhow::Result<()>, by_id: &HashMap<NodeId, Arc<Node>>) {
    match result {
        Ok(()) => {
            node.complete_if_running();
        }
        Err(err) => {
            NodeFailed {
                node: node.id(),
                error: &err,
            }
            .log();
            if node.fail_if_running(err) {
                propagate_skip(node, by_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::action::FnAction;
    use crate::graph::{Action, Graph};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn noop_action() -> Arc<dyn Action> {
        Arc::new(FnAction::new(|_cancel| {
            Box::pin(async { Ok(()) })
                as Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        }))
    }

    fn failing_action() -> Arc<dyn Action> {
        Arc::new(FnAction::new(|_cancel| {
            Box::pin(async { Err(anyhow::anyhow!("boom")) })
                as Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        }))
    }

    fn tracking_action(
        started: Arc<StdMutex<Vec<&'static str>>>,
        label: &'static str,
        delay: Duration,
    ) -> Arc<dyn Action> {
        Arc::new(FnAction::new(move |_cancel| {
            let started = started.clone();
            Box::pin(async move {
                started.lock().unwrap().push(label);
                tokio::time::sleep(delay).await;
                Ok(())
            }) as Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        }))
    }

    async fn run_set_from(graph: &Graph) -> Vec<Arc<Node>> {
        crate::validator::validate(graph).unwrap()
    }

    #[tokio::test]
    async fn diamond_under_global_cap_three_all_complete() {
        let g = Graph::new();
        let a = g.add_node(10, Pool::default_pool(), noop_action());
        let b = g.add_node(20, Pool::default_pool(), noop_action());
        let c = g.add_node(10, Pool::default_pool(), noop_action());
        g.add_predecessor(c, a).unwrap();
        g.add_predecessor(c, b).unwrap();

        let run_set = run_set_from(&g).await;
        let by_id: HashMap<NodeId, Arc<Node>> =
            run_set.iter().map(|n| (n.id(), n.clone())).collect();
        run(&run_set, &by_id, 3, &CancellationToken::new()).await.unwrap();

        for n in &run_set {
            assert_eq!(n.state(), NodeState::Completed);
        }
    }

    #[tokio::test]
    async fn cross_pool_caps_are_respected() {
        let g = Graph::new();
        let pool_a = Pool::new(2);
        let pool_b = Pool::new(2);
        let pool_c = Pool::new(2);
        let started = Arc::new(StdMutex::new(Vec::new()));

        let mut ids = Vec::new();
        for (i, pool) in [&pool_a, &pool_b, &pool_c].iter().cycle().take(9).enumerate() {
            let label: &'static str = Box::leak(format!("n{i}").into_boxed_str());
            ids.push(g.add_node(
                0,
                (*pool).clone(),
                tracking_action(started.clone(), label, Duration::from_millis(5)),
            ));
        }

        let run_set = run_set_from(&g).await;
        let by_id: HashMap<NodeId, Arc<Node>> =
            run_set.iter().map(|n| (n.id(), n.clone())).collect();
        run(&run_set, &by_id, 3, &CancellationToken::new()).await.unwrap();

        for id in ids {
            assert_eq!(g.get(id).unwrap().state(), NodeState::Completed);
        }
    }

    #[tokio::test]
    async fn failure_skips_downstream_but_not_siblings() {
        let g = Graph::new();
        let a = g.add_node(0, Pool::default_pool(), noop_action());
        let b = g.add_node(0, Pool::default_pool(), failing_action());
        let c = g.add_node(0, Pool::default_pool(), noop_action());
        let sibling = g.add_node(0, Pool::default_pool(), noop_action());
        g.add_predecessor(b, a).unwrap();
        g.add_predecessor(c, b).unwrap();

        let run_set = run_set_from(&g).await;
        let by_id: HashMap<NodeId, Arc<Node>> =
            run_set.iter().map(|n| (n.id(), n.clone())).collect();
        run(&run_set, &by_id, 4, &CancellationToken::new()).await.unwrap();

        assert_eq!(g.get(a).unwrap().state(), NodeState::Completed);
        assert_eq!(g.get(b).unwrap().state(), NodeState::Failed);
        assert_eq!(g.get(c).unwrap().state(), NodeState::Skipped);
        assert_eq!(g.get(sibling).unwrap().state(), NodeState::Completed);
    }

    #[tokio::test]
    async fn cancellation_surfaces_and_stops_new_launches() {
        let g = Graph::new();
        let observed = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let observed = observed.clone();
            g.add_node(
                0,
                Pool::default_pool(),
                Arc::new(FnAction::new(move |cancel: CancellationToken| {
                    let observed = observed.clone();
                    Box::pin(async move {
                        tokio::select! {
                            _ = tokio::time::sleep(Duration::from_millis(500)) => {}
                            _ = cancel.cancelled() => {
                                observed.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                        Ok(())
                    }) as Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
                })),
            );
        }

        let run_set = run_set_from(&g).await;
        let by_id: HashMap<NodeId, Arc<Node>> =
            run_set.iter().map(|n| (n.id(), n.clone())).collect();
        let token = CancellationToken::new();
        let token_clone = token.clone();

        let run_future = run(&run_set, &by_id, 3, &token);
        tokio::pin!(run_future);

        tokio::select! {
            _ = &mut run_future => panic!("run should not finish before cancellation"),
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                token_clone.cancel();
            }
        }

        let result = run_future.await;
        assert!(matches!(result, Err(SchedulerError::Cancelled)));
        assert!(observed.load(Ordering::SeqCst) >= 1);
    }
}
