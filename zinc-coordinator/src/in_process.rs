//! In-process [`Coordinator`] for same-process concurrent publishers and
//! for tests.
//!
//! Each domain key maps to a single owned permit; `acquire`/`release` are
//! idempotent per [`Lock`] handle, matching the external contract. True
//! thread-spanning reentrancy (the same process recursively acquiring a
//! domain it already holds through a second handle) is not modeled — see
//! `DESIGN.md`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::{Error, Result};
use crate::lock::{Coordinator, Lock, LockImpl};

#[derive(Default)]
pub struct InProcessCoordinator {
    domains: DashMap<String, Arc<Semaphore>>,
}

impl InProcessCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn semaphore_for(&self, domain: &str) -> Arc<Semaphore> {
        self.domains
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone()
    }
}

struct InProcessLock {
    domain: String,
    semaphore: Arc<Semaphore>,
    permit: Mutex<Option<OwnedSemaphorePermit>>,
}

#[async_trait]
impl LockImpl for InProcessLock {
    async fn acquire(&self, timeout: Option<Duration>) -> Result<()> {
        if self.is_locked() {
            return Ok(());
        }

        let acquire_fut = self.semaphore.clone().acquire_owned();
        let permit = match timeout {
            Some(duration) => tokio::time::timeout(duration, acquire_fut)
                .await
                .map_err(|_| Error::LockUnavailable {
                    domain: self.domain.clone(),
                    timeout_secs: duration.as_secs(),
                })?
                .expect("semaphore is never closed"),
            None => acquire_fut.await.expect("semaphore is never closed"),
        };

        *self.permit.lock() = Some(permit);
        debug!(domain = %self.domain, "acquired in-process lock");
        Ok(())
    }

    fn is_locked(&self) -> bool {
        self.permit.lock().is_some()
    }

    fn release(&self) {
        let mut guard = self.permit.lock();
        if guard.take().is_some() {
            debug!(domain = %self.domain, "released in-process lock");
        }
    }

    async fn renew(&self) -> Result<()> {
        if self.is_locked() {
            Ok(())
        } else {
            Err(Error::LeaseLost { domain: self.domain.clone() })
        }
    }
}

#[async_trait]
impl Coordinator for InProcessCoordinator {
    async fn get_index_lock(&self, domain: &str) -> Result<Lock> {
        Ok(Lock {
            domain: domain.to_string(),
            inner: Box::new(InProcessLock {
                domain: domain.to_string(),
                semaphore: self.semaphore_for(domain),
                permit: Mutex::new(None),
            }),
        })
    }
}
