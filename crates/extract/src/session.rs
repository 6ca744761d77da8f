//! Lazily renewed, time-bounded upstream sessions.
//!
//! Some sources hand out credentials that silently stop working after a
//! while (e.g. Twitter guest tokens are invalidated after ~3 hours). Rather
//! than renewing on a timer, a [`SessionCache`] records when the current
//! session was created and swaps in a new one on the first access after it
//! has gone stale.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::error::Result;

/// Creates fresh sessions for a [`SessionCache`].
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: Send + Sync;

    async fn create(&self) -> Result<Self::Session>;
}

struct Entry<S> {
    session: Arc<S>,
    created: Instant,
}

/// Shared holder of one renewable session.
///
/// Readers only ever observe a fully constructed session: the new session is
/// created *before* it is swapped in under the write lock. Renewal itself is
/// serialised by a separate mutex, and the staleness check is repeated after
/// acquiring it, so tasks racing on an expired session trigger one renewal.
pub struct SessionCache<F: SessionFactory> {
    factory: F,
    ttl: Duration,
    current: RwLock<Option<Entry<F::Session>>>,
    renewing: Mutex<()>,
}
impl<F: SessionFactory> SessionCache<F> {
    pub fn new(factory: F, ttl: Duration) -> Self {
        Self {
            factory,
            ttl,
            current: RwLock::new(None),
            renewing: Mutex::new(()),
        }
    }

    /// Returns the current session, renewing it first if it is missing or
    /// older than the TTL.
    pub async fn get(&self) -> Result<Arc<F::Session>> {
        if let Some(session) = self.fresh().await {
            return Ok(session);
        }
        let _renewing = self.renewing.lock().await;
        // Someone else may have renewed while we were waiting for the lock.
        if let Some(session) = self.fresh().await {
            return Ok(session);
        }
        let session = Arc::new(self.factory.create().await?);
        let created = Instant::now();
        *self.current.write().await = Some(Entry { session: session.clone(), created });
        tracing::info!(ttl_secs = self.ttl.as_secs(), "upstream session renewed");
        Ok(session)
    }

    /// Drop the current session so that the next [`get`](Self::get) creates a
    /// new one. Used when the upstream rejects a session before its TTL.
    pub async fn invalidate(&self) {
        if self.current.write().await.take().is_some() {
            tracing::info!("upstream session invalidated");
        }
    }

    async fn fresh(&self) -> Option<Arc<F::Session>> {
        let guard = self.current.read().await;
        guard.as_ref().filter(|entry| entry.created.elapsed() < self.ttl).map(|entry| entry.session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        created: AtomicUsize,
    }

    #[async_trait]
    impl SessionFactory for Counting {
        type Session = usize;

        async fn create(&self) -> Result<usize> {
            // Give racing tasks a chance to pile up behind the renewal.
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(self.created.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    struct Failing;

    #[async_trait]
    impl SessionFactory for Failing {
        type Session = ();

        async fn create(&self) -> Result<()> {
            exn::bail!(ErrorKind::Upstream)
        }
    }

    const TTL: Duration = Duration::from_secs(9000);

    #[tokio::test(start_paused = true)]
    async fn test_reused_within_ttl() {
        let cache = SessionCache::new(Counting::default(), TTL);
        assert_eq!(*cache.get().await.unwrap(), 1);
        tokio::time::advance(Duration::from_secs(60 * 60 * 2)).await;
        assert_eq!(*cache.get().await.unwrap(), 1);
        assert_eq!(cache.factory.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_renewed_lazily_after_ttl() {
        let cache = SessionCache::new(Counting::default(), TTL);
        assert_eq!(*cache.get().await.unwrap(), 1);
        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        // Nothing happens until the next access.
        assert_eq!(cache.factory.created.load(Ordering::SeqCst), 1);
        assert_eq!(*cache.get().await.unwrap(), 2);
        assert_eq!(*cache.get().await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_renewal() {
        let cache = SessionCache::new(Counting::default(), TTL);
        assert_eq!(*cache.get().await.unwrap(), 1);
        cache.invalidate().await;
        assert_eq!(*cache.get().await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_renewal_happens_once() {
        let cache = Arc::new(SessionCache::new(Counting::default(), TTL));
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { *cache.get().await.unwrap() })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), 1);
        }
        assert_eq!(cache.factory.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_creation_leaves_nothing_behind() {
        let cache = SessionCache::new(Failing, TTL);
        assert_eq!(*cache.get().await.unwrap_err(), ErrorKind::Upstream);
        assert!(cache.current.read().await.is_none());
    }
}
