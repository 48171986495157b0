//! The `Lock` handle returned by a [`crate::Coordinator`], and the
//! `Coordinator` trait itself.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Driver-specific lock behavior. Implementors back one [`Lock`] handle.
#[async_trait]
pub(crate) trait LockImpl: Send + Sync {
    async fn acquire(&self, timeout: Option<Duration>) -> Result<()>;
    fn is_locked(&self) -> bool;
    fn release(&self);
    async fn renew(&self) -> Result<()>;
}

/// A named mutual-exclusion lock. `acquire` is idempotent (a no-op if
/// already held by this handle); `release` is idempotent. Released on
/// `Drop` regardless of the exit path, so a panicking or cancelled task
/// never leaves the lock held.
pub struct Lock {
    pub(crate) domain: String,
    pub(crate) inner: Box<dyn LockImpl>,
}

impl Lock {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub async fn acquire(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.inner.acquire(timeout).await
    }

    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    pub fn release(&mut self) {
        self.inner.release();
    }

    /// Confirm the lease backing this lock is still held. Call before a
    /// commit that must not go through on a lock silently lost out from
    /// under the holder; returns `Error::LeaseLost` if it has been.
    pub async fn renew(&self) -> Result<()> {
        self.inner.renew().await
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        self.inner.release();
    }
}

/// Named mutual-exclusion locks over a catalog. A lock is identified by a
/// string key — the `bundle_id` for per-bundle publish locks.
#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Construct (but do not yet acquire) a lock for `domain`.
    async fn get_index_lock(&self, domain: &str) -> Result<Lock>;
}
