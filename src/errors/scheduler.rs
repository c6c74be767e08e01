// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::graph::NodeId;

/// Errors the scheduler itself can raise.
///
/// These are distinct from a user action's own failure, which is recorded on the node
/// that produced it rather than returned from [`crate::executor::Scheduler::execute`].
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A malformed input was supplied: `global_cap < 1` while a runnable node still
    /// uses the default pool, a duplicate id in the id-keyed front-end, a dependency id
    /// that was never registered, or a node missing its action.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An edge edit (`add_predecessor`/`remove_predecessor`) was attempted on a node
    /// that has already left `NotStarted`.
    #[error("node {node:?} is no longer NotStarted (edits are only valid before a run starts)")]
    InvalidState {
        /// The node the edit was attempted against.
        node: NodeId,
    },

    /// A cycle was detected among non-signaled nodes, either before traversal (no root
    /// reaches them) or during Kahn peeling.
    #[error("cycle detected among non-signaled nodes")]
    Cycle,

    /// The caller's cancellation token fired before the run completed.
    #[error("run was cancelled")]
    Cancelled,
}
