// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The fast-path run loop for `global_cap == 1` with no pool overrides: one node at a
//! time, highest weight first, no task spawning at all.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::errors::SchedulerError;
use crate::graph::{Node, NodeId, NodeState};
use crate::observability::messages::executor::{
    NodeFailed, NodeLaunched, RunCancelled, RunCompleted, RunStarted,
};
use crate::observability::messages::StructuredLog;

use super::{predecessors_signaled, propagate_skip, tally};

pub(crate) async fn run(
    run_set: &[Arc<Node>],
    by_id: &HashMap<NodeId, Arc<Node>>,
    cancellation: &CancellationToken,
) -> Result<(), SchedulerError> {
    RunStarted {
        strategy: "sequential",
        node_count: run_set.len(),
        global_cap: 1,
    }
    .log();
    let start = Instant::now();

    let mut pending: Vec<NodeId> = run_set.iter().map(|n| n.id()).collect();

    while !pending.is_empty() {
        if cancellation.is_cancelled() {
            RunCancelled { in_flight: 0 }.log();
            return Err(SchedulerError::Cancelled);
        }

        // Skip-propagation from an earlier failure may have moved a still-pending node
        // straight to `Skipped`; drop it here so successors observe it as signaled.
        pending.retain(|id| !by_id[id].signaled());
        if pending.is_empty() {
            break;
        }

        let next = pending
            .iter()
            .copied()
            .filter(|id| predecessors_signaled(&by_id[id], by_id))
            .max_by_key(|id| by_id[id].weight());

        let Some(next) = next else {
            // Every pending node is blocked on a non-signaled predecessor with none
            // eligible; the validator should have ruled this out.
            return Err(SchedulerError::Cycle);
        };

        pending.retain(|id| *id != next);
        let node = by_id[&next].clone();

        node.set_state(NodeState::Running);
        NodeLaunched {
            node: node.id(),
            weight: node.weight(),
        }
        .log();

        match node.action().run(cancellation.clone()).await {
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
                    propagate_skip(&node, by_id);
                }
            }
        }
    }

    let (completed, failed, skipped) = tally(run_set);
    RunCompleted {
        strategy: "sequential",
        completed,
        failed,
        skipped,
        duration: start.elapsed(),
    }
    .log();

    Ok(())
}
