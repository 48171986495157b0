//! Cross-process [`Coordinator`] for the `file://` CLI driver: one
//! `fslock`-backed lock file per domain key, under a lock directory.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fslock::LockFile;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::lock::{Coordinator, Lock, LockImpl};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

pub struct FileLockCoordinator {
    lock_dir: PathBuf,
}

impl FileLockCoordinator {
    pub fn new(lock_dir: impl Into<PathBuf>) -> Result<Self> {
        let lock_dir = lock_dir.into();
        std::fs::create_dir_all(&lock_dir)?;
        Ok(Self { lock_dir })
    }

    fn path_for(&self, domain: &str) -> PathBuf {
        let file_name: String = domain
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.lock_dir.join(format!("{file_name}.lock"))
    }
}

struct FileHandle {
    domain: String,
    path: PathBuf,
    file: Mutex<Option<LockFile>>,
}

#[async_trait]
impl LockImpl for FileHandle {
    async fn acquire(&self, timeout: Option<Duration>) -> Result<()> {
        if self.is_locked() {
            return Ok(());
        }

        let path = self.path.clone();
        let deadline = timeout.map(|d| Instant::now() + d);
        let locked = tokio::task::spawn_blocking(move || -> std::io::Result<Option<LockFile>> {
            loop {
                let mut file = LockFile::open(&path)?;
                if file.try_lock()? {
                    return Ok(Some(file));
                }
                match deadline {
                    Some(deadline) if Instant::now() >= deadline => return Ok(None),
                    _ => std::thread::sleep(POLL_INTERVAL),
                }
            }
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))??;

        match locked {
            Some(file) => {
                *self.file.lock() = Some(file);
                debug!(domain = %self.domain, "acquired file lock");
                Ok(())
            }
            None => Err(Error::LockUnavailable {
                domain: self.domain.clone(),
                timeout_secs: timeout.map_or(0, |d| d.as_secs()),
            }),
        }
    }

    fn is_locked(&self) -> bool {
        self.file.lock().is_some()
    }

    fn release(&self) {
        let mut guard = self.file.lock();
        if let Some(mut file) = guard.take() {
            let _ = file.unlock();
            debug!(domain = %self.domain, "released file lock");
        }
    }

    /// An OS-level `flock` never expires on its own, so renewal here is a
    /// liveness check rather than a heartbeat: confirm the lock file we
    /// hold still exists. If something else removed it out from under us
    /// (e.g. a cleanup sweep of a stale-looking lock directory) our fd no
    /// longer protects anything against a fresh acquirer, so the lease is
    /// treated as lost.
    async fn renew(&self) -> Result<()> {
        if !self.is_locked() {
            return Err(Error::LeaseLost { domain: self.domain.clone() });
        }

        let path = self.path.clone();
        let still_present = tokio::task::spawn_blocking(move || path.exists())
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

        if still_present {
            Ok(())
        } else {
            *self.file.lock() = None;
            Err(Error::LeaseLost { domain: self.domain.clone() })
        }
    }
}

#[async_trait]
impl Coordinator for FileLockCoordinator {
    async fn get_index_lock(&self, domain: &str) -> Result<Lock> {
        Ok(Lock {
            domain: domain.to_string(),
            inner: Box::new(FileHandle {
                domain: domain.to_string(),
                path: self.path_for(domain),
                file: Mutex::new(None),
            }),
        })
    }
}
