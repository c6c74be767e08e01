// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The operation graph: nodes, pools, and the builder that wires them together.
//!
//! A node is a flat `NodeId -> Arc<Node>` entry owned by [`Graph`]; predecessor and
//! successor edges are stored as `NodeId` sets on each node rather than direct `Arc`
//! cycles, so no node ever strongly owns another.

pub mod action;
mod builder;
mod node;
mod pool;

pub use action::{Action, FnAction};
pub use builder::Graph;
pub use node::{Node, NodeId, NodeState};
pub use pool::Pool;
