// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The scheduler's run entry point and the two dispatch strategies it chooses between.
//!
//! [`Scheduler::execute`] validates the graph, decides whether the run can take the
//! cheap [`sequential`] path or needs the [`pooled`] path (see [`factory::select`]),
//! drains the run set under that strategy, and applies `reset_after_done` once the run
//! finishes successfully.

mod factory;
mod pooled;
mod sequential;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::errors::SchedulerError;
use crate::graph::{Graph, Node, NodeId};
use crate::observability::messages::executor::NodeSkipped;
use crate::observability::messages::graph::InvalidArgumentRejected;
use crate::observability::messages::StructuredLog;
use crate::validator;

/// Runs a validated graph to completion.
///
/// This is a thin coordinator: validation and dispatch-strategy selection live in
/// [`validator`] and [`factory`], the two run loops live in [`sequential`] and
/// [`pooled`]. `Scheduler` itself holds no state: a run is entirely described by its
/// arguments.
pub struct Scheduler;

impl Scheduler {
    /// Execute every non-signaled node reachable from a root in `graph`.
    ///
    /// `global_cap` bounds how many default-pool nodes may run at once; it may be `< 1`
    /// only if every node in the run set uses an explicit non-default pool (checked
    /// after the run set is computed, per the source's deferred validation). Returns
    /// once every node has reached a terminal state, or as soon as `cancellation` fires
    /// or a cycle is detected. Individual node failures do not fail the run: inspect
    /// each node's `state()`/`failure()` afterward.
    pub async fn execute(
        graph: &Graph,
        global_cap: usize,
        reset_after_done: bool,
        cancellation: CancellationToken,
    ) -> Result<(), SchedulerError> {
        let run_set = validator::validate(graph)?;
        if run_set.is_empty() {
            return Ok(());
        }

        if global_cap < 1 && run_set.iter().any(|n| n.pool().is_default()) {
            let reason = "global_cap < 1 requires every runnable node to use a non-default pool";
            InvalidArgumentRejected { reason }.log();
            return Err(SchedulerError::InvalidArgument(reason.into()));
        }

        let by_id: HashMap<NodeId, Arc<Node>> =
            run_set.iter().map(|n| (n.id(), n.clone())).collect();

        let result = match factory::select(global_cap, &run_set) {
            factory::Strategy::Sequential => sequential::run(&run_set, &by_id, &cancellation).await,
            factory::Strategy::Pooled => pooled::run(&run_set, &by_id, global_cap, &cancellation).await,
        };

        if result.is_ok() && reset_after_done {
            for node in &run_set {
                node.reset();
            }
        }

        result
    }
}

/// `true` iff every predecessor of `node` is `signaled`.
///
/// A predecessor id absent from `by_id` is, by construction of the run set, already
/// `signaled` before the run began (the validator only admits non-signaled nodes), so
/// its absence itself counts as satisfied.
pub(crate) fn predecessors_signaled(node: &Node, by_id: &HashMap<NodeId, Arc<Node>>) -> bool {
    node.predecessors()
        .iter()
        .all(|p| by_id.get(p).map(|p| p.signaled()).unwrap_or(true))
}

/// Eagerly mark every node transitively reachable from `failed` via `successors` as
/// `Skipped`, tolerating nodes that are `Running` or have already reached some other
/// terminal state. Returns the number of nodes this call actually transitioned.
///
/// Walks the full successor closure regardless of whether an intermediate node's own
/// transition took effect, since the graph reachability (not any one node's outcome)
/// is what determines which nodes are downstream of the failure.
pub(crate) fn propagate_skip(failed: &Node, by_id: &HashMap<NodeId, Arc<Node>>) -> usize {
    let mut queue: VecDeque<NodeId> = failed.successors().into_iter().collect();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut transitioned = 0;

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        let Some(node) = by_id.get(&id) else {
            continue;
        };
        if node.mark_skipped_if_pending() {
            transitioned += 1;
            NodeSkipped {
                node: node.id(),
                cause: failed.id(),
            }
            .log();
        }
        queue.extend(node.successors());
    }

    transitioned
}

/// Tally the terminal states of `run_set` for the `RunCompleted` log line. Read at the
/// end of a run rather than accumulated during it, since skip-propagation can move
/// nodes to `Skipped` from outside whichever node is actively being finalized.
pub(crate) fn tally(run_set: &[Arc<Node>]) -> (usize, usize, usize) {
    use crate::graph::NodeState;

    let mut completed = 0;
    let mut failed = 0;
    let mut skipped = 0;
    for node in run_set {
        match node.state() {
            NodeState::Completed => completed += 1,
            NodeState::Failed => failed += 1,
            NodeState::Skipped => skipped += 1,
            _ => {}
        }
    }
    (completed, failed, skipped)
}
