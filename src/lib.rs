// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A dependency-aware asynchronous task scheduler.
//!
//! Callers build a graph of operations ([`graph::Node`]) connected by
//! predecessor/successor edges, then hand the graph to [`executor::Scheduler`] for
//! execution. The scheduler runs every operation exactly once, as early as the
//! dependency order and any per-[`graph::Pool`] concurrency caps allow, and records a
//! terminal outcome (completed, failed, or skipped) on every node.
//!
//! Two front-ends sit over the same core graph: [`builders::IdKeyedBuilder`] for
//! callers who want to refer to operations by their own ids, and
//! [`builders::ObjectGraphBuilder`] for callers who already hold node handles and want
//! to wire edges directly.

pub mod builders;
pub mod errors;
pub mod executor;
pub mod graph;
pub mod observability;
mod validator;

pub use errors::SchedulerError;
pub use executor::Scheduler;
pub use graph::{Action, FnAction, Graph, Node, NodeId, NodeState, Pool};
