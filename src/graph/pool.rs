// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

struct PoolInner {
    id: u64,
    max_parallelism: i64,
}

/// A named concurrency bucket with its own cap.
///
/// Two pools are the same pool iff they share an identity (`Pool::same_as`), not merely
/// an equal `max_parallelism`. Cloning a `Pool` is cheap (it shares the same identity).
#[derive(Clone)]
pub struct Pool(Arc<PoolInner>);

impl Pool {
    /// Create a new pool with the given cap. `max_parallelism` must be `>= 1`; values
    /// below that are clamped to 1 since a pool that admits nothing is not useful.
    pub fn new(max_parallelism: i64) -> Self {
        Self(Arc::new(PoolInner {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            max_parallelism: max_parallelism.max(1),
        }))
    }

    /// The implicit default pool, whose cap of `-1` means "use the global cap" at run
    /// time. Every call returns a handle to the same singleton pool identity.
    pub fn default_pool() -> Self {
        static DEFAULT: OnceLock<Pool> = OnceLock::new();
        DEFAULT
            .get_or_init(|| {
                Pool(Arc::new(PoolInner {
                    id: 0,
                    max_parallelism: -1,
                }))
            })
            .clone()
    }

    /// `true` iff this handle names the process-wide default pool.
    pub fn is_default(&self) -> bool {
        self.0.id == 0
    }

    /// The pool's declared cap (may be the `-1` default-pool sentinel).
    pub fn max_parallelism(&self) -> i64 {
        self.0.max_parallelism
    }

    /// The cap to enforce at run time: `max_parallelism` if positive, else `global_cap`.
    pub fn effective_cap(&self, global_cap: usize) -> usize {
        if self.0.max_parallelism > 0 {
            self.0.max_parallelism as usize
        } else {
            global_cap
        }
    }

    /// `true` iff `self` and `other` refer to the same pool identity.
    pub fn same_as(&self, other: &Pool) -> bool {
        self.0.id == other.0.id
    }

    pub(crate) fn key(&self) -> u64 {
        self.0.id
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.0.id)
            .field("max_parallelism", &self.0.max_parallelism)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_is_a_stable_singleton() {
        let a = Pool::default_pool();
        let b = Pool::default_pool();
        assert!(a.same_as(&b));
        assert!(a.is_default());
        assert_eq!(a.max_parallelism(), -1);
    }

    #[test]
    fn distinct_pools_have_distinct_identity() {
        let a = Pool::new(2);
        let b = Pool::new(2);
        assert!(!a.same_as(&b));
    }

    #[test]
    fn effective_cap_falls_back_to_global_for_default_pool() {
        let default = Pool::default_pool();
        assert_eq!(default.effective_cap(5), 5);

        let named = Pool::new(2);
        assert_eq!(named.effective_cap(5), 2);
    }

    #[test]
    fn max_parallelism_is_clamped_to_at_least_one() {
        let pool = Pool::new(0);
        assert_eq!(pool.max_parallelism(), 1);
    }
}
