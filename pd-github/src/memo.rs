//! Per-instance memoisation.

use std::future::Future;
use std::sync::OnceLock;

use tokio::sync::Mutex;

/// A value computed on first access and cached for the owner's lifetime.
///
/// Synchronous and asynchronous initialisers share the same slot: whichever
/// succeeds first wins and later calls return the cached value without
/// running their initialiser. A failed async initialiser caches nothing.
#[derive(Debug)]
pub struct Memo<T> {
    value: OnceLock<T>,
    init_lock: Mutex<()>,
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Self {
            value: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// The cached value, if computed.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Return the cached value, computing it with `f` on first access.
    pub fn get_or_init<F>(&self, f: F) -> &T
    where
        F: FnOnce() -> T,
    {
        self.value.get_or_init(f)
    }

    /// Return the cached value, awaiting `f` on first access.
    ///
    /// Concurrent callers wait for the one running initialiser. If it fails
    /// the error is returned and the next call tries again.
    pub async fn get_or_try_init<F, Fut, E>(&self, f: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(v) = self.value.get() {
            return Ok(v);
        }

        let _guard = self.init_lock.lock().await;
        if let Some(v) = self.value.get() {
            return Ok(v);
        }

        let computed = f().await?;
        Ok(self.value.get_or_init(|| computed))
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}
