// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging and tracing for graph construction and execution.
//!
//! Message types follow a struct-based pattern with a `Display` impl (human-readable)
//! and a [`messages::StructuredLog`] impl (machine-readable fields plus a
//! `tracing::Span` for distributed tracing), so that the same event carries both a
//! readable line and queryable fields without duplicating the two by hand.

pub mod messages;
