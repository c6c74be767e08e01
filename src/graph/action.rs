// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// The opaque unit of work a [`crate::graph::Node`] wraps.
///
/// The scheduler never inspects what an action does; it only observes whether `run`
/// returns `Ok` or `Err`. Implementations should check `cancel` periodically during
/// long-running work and return early (any `Err`) once it is triggered.
#[async_trait]
pub trait Action: Send + Sync {
    /// Perform the operation's work, observing `cancel` for early abandonment.
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A closure-backed [`Action`] for callers who don't want to hand-write a type.
///
/// Constructed via [`Action`]'s blanket impl below: wrap any
/// `Fn(CancellationToken) -> BoxFuture<'static, anyhow::Result<()>>` in an `Arc` and
/// use it directly wherever `Arc<dyn Action>` is expected.
pub struct FnAction<F>(F);

impl<F> FnAction<F>
where
    F: Fn(CancellationToken) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync,
{
    /// Wrap a closure as an [`Action`].
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Action for FnAction<F>
where
    F: Fn(CancellationToken) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync,
{
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        (self.0)(cancel).await
    }
}
