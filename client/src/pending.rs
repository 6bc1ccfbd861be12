//! Registry of in-flight operations keyed by name
//!
//! At most one operation runs per key. Callers arriving while it runs await
//! the same shared future and receive a clone of its output. The entry is
//! removed by the operation itself when it settles, so the next caller
//! starts a fresh one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};

type Inflight<T> = HashMap<&'static str, (u64, Shared<BoxFuture<'static, T>>)>;

pub struct PendingRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<RegistryInner<T>>>,
}

struct RegistryInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    inflight: Inflight<T>,
    generation: u64,
}

impl<T> Default for PendingRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                inflight: HashMap::new(),
                generation: 0,
            })),
        }
    }
}

impl<T> PendingRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the operation running under `key`, or start it with `start`
    ///
    /// `start` is only called when nothing is in flight. The started future
    /// keeps running as long as any caller polls it; if every caller is
    /// dropped, the next caller for the key resumes it.
    pub async fn run<F, Fut>(&self, key: &'static str, start: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let shared = {
            let mut inner = lock(&self.inner);
            match inner.inflight.get(key) {
                Some((_, shared)) => shared.clone(),
                None => {
                    inner.generation += 1;
                    let generation = inner.generation;
                    let registry = Arc::clone(&self.inner);
                    let operation = start();

                    let shared = async move {
                        let output = operation.await;
                        let mut inner = lock(&registry);
                        if inner
                            .inflight
                            .get(key)
                            .is_some_and(|(current, _)| *current == generation)
                        {
                            inner.inflight.remove(key);
                        }
                        output
                    }
                    .boxed()
                    .shared();

                    inner.inflight.insert(key, (generation, shared.clone()));
                    shared
                }
            }
        };

        shared.await
    }

    /// Whether an operation is running under `key`
    pub fn is_pending(&self, key: &str) -> bool {
        lock(&self.inner).inflight.contains_key(key)
    }
}

fn lock<T>(inner: &Mutex<RegistryInner<T>>) -> MutexGuard<'_, RegistryInner<T>>
where
    T: Clone + Send + Sync + 'static,
{
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
