// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types raised by the scheduler itself.
//!
//! Failures produced by *user actions* are not part of this enum: they are carried as
//! opaque [`anyhow::Error`] values on the node that produced them (see
//! [`crate::graph::Node::failure`]) and never escape as a control-flow error from
//! [`crate::executor::Scheduler::execute`].

mod scheduler;

pub use scheduler::SchedulerError;
