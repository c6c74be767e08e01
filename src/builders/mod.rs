// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph-construction facades over the core [`crate::graph::Graph`].
//!
//! Both front-ends are thin: neither adds scheduling behavior of its own. They differ
//! only in how a caller names the node they want to add an edge to.

mod id_keyed;
mod object_graph;

pub use id_keyed::IdKeyedBuilder;
pub use object_graph::ObjectGraphBuilder;
