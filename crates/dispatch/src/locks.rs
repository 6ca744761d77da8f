use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per key, created on demand and dropped again once nobody
/// holds or waits for it.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

pub(crate) struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub(crate) async fn lock(&self, key: &str) -> KeyGuard {
        // Clone the mutex out before awaiting so no map shard stays locked.
        let mutex = self.locks.entry(key.to_string()).or_default().clone();
        KeyGuard {
            key: key.to_string(),
            guard: Some(mutex.lock_owned().await),
            locks: self.locks.clone(),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release first, so that the only remaining reference to an unwanted
        // mutex is the map's own.
        drop(self.guard.take());
        self.locks.remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
