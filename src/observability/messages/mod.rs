// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging and distributed tracing.
//!
//! * `graph` (node/edge construction and rejection events)
//! * `executor` (run lifecycle, dispatch, completion, and cancellation events)

pub mod executor;
pub mod graph;

use tracing::Span;

/// A loggable event that carries both a human-readable `Display` and structured,
/// queryable fields.
pub trait StructuredLog: std::fmt::Display {
    /// Emit this event at its appropriate level, with fields attached for querying.
    fn log(&self);

    /// Open a `tracing::Span` named `name` carrying this event's fields as attributes.
    fn span(&self, name: &str) -> Span;
}
