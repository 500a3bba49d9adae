//! Runtime-agnostic async abstractions.
//!
//! The bridge only needs a handful of runtime services: timers, timeouts,
//! task spawning and an async mutex. This module hides which runtime
//! provides them.
//!
//! # Feature Flags
//!
//! Enable one of the following features to select your runtime:
//!
//! - `runtime-tokio` (default) - Use the tokio runtime
//! - `runtime-async-std` - Use the async-std runtime
//! - `runtime-smol` - Use the smol runtime
//!
//! # Example
//!
//! ```toml
//! [dependencies]
//! # Using async-std
//! sengled-bridge = { version = "0.1", default-features = false, features = ["runtime-async-std"] }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as SyncMutex};
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{Either, FutureExt, Shared};

#[cfg(feature = "runtime-tokio")]
mod tokio_impl;

#[cfg(feature = "runtime-async-std")]
mod async_std_impl;

#[cfg(feature = "runtime-smol")]
mod smol_impl;

#[cfg(feature = "runtime-tokio")]
pub use tokio_impl::*;

#[cfg(feature = "runtime-async-std")]
pub use async_std_impl::*;

#[cfg(feature = "runtime-smol")]
pub use smol_impl::*;

/// Trait for async task spawning.
pub trait Spawner {
    /// A handle to a spawned task.
    type JoinHandle<T: Send + 'static>: Future<Output = T> + Send;

    /// Spawn a future as a background task.
    fn spawn<F, T>(future: F) -> Self::JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static;
}

/// Sleep for the specified duration.
pub async fn sleep(duration: Duration) {
    sleep_impl(duration).await
}

/// Run a future with a timeout.
///
/// Returns `Err(TimedOut)` if the timeout expires before the future completes.
pub async fn timeout<F, T>(duration: Duration, future: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    timeout_impl(duration, future).await
}

/// Error returned when a timeout expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut;

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation timed out")
    }
}

impl std::error::Error for TimedOut {}

/// Cooperative shutdown signal shared between the bridge loops.
///
/// Cloning yields another handle to the same signal. Once [`cancel`] is
/// called every pending and future [`cancelled`] wait resolves.
///
/// [`cancel`]: ShutdownToken::cancel
/// [`cancelled`]: ShutdownToken::cancelled
#[derive(Clone)]
pub struct ShutdownToken {
    trigger: Arc<SyncMutex<Option<oneshot::Sender<()>>>>,
    signal: Shared<oneshot::Receiver<()>>,
    flag: Arc<AtomicBool>,
}

impl std::fmt::Debug for ShutdownToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownToken {
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            trigger: Arc::new(SyncMutex::new(Some(tx))),
            signal: rx.shared(),
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request shutdown. Calling it more than once is harmless.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let sender = match self.trigger.lock() {
            Ok(mut trigger) => trigger.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(tx) = sender {
            let _ = tx.send(());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been requested.
    pub async fn cancelled(&self) {
        // A dropped sender also means nobody can cancel anymore; treat it alike.
        let _ = self.signal.clone().await;
    }

    /// Sleep for `duration` unless shutdown is requested first.
    ///
    /// Returns `true` when the sleep was cut short by a shutdown request.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }

        let nap = sleep(duration);
        let stop = self.cancelled();
        futures::pin_mut!(nap);
        futures::pin_mut!(stop);

        match futures::future::select(nap, stop).await {
            Either::Left(_) => self.is_cancelled(),
            Either::Right(_) => true,
        }
    }
}

// Async mutex re-export
#[cfg(feature = "runtime-tokio")]
pub use tokio::sync::Mutex;

#[cfg(feature = "runtime-async-std")]
pub use async_std::sync::Mutex;

#[cfg(feature = "runtime-smol")]
pub use async_lock::Mutex;

// JoinHandle type alias for task spawning
#[cfg(feature = "runtime-tokio")]
pub type JoinHandle<T> = tokio_impl::TokioJoinHandle<T>;

#[cfg(feature = "runtime-async-std")]
pub type JoinHandle<T> = async_std_impl::AsyncStdJoinHandle<T>;

#[cfg(feature = "runtime-smol")]
pub type JoinHandle<T> = smol_impl::SmolJoinHandle<T>;

// Compile-time check to ensure exactly one runtime is selected
#[cfg(not(any(
    feature = "runtime-tokio",
    feature = "runtime-async-std",
    feature = "runtime-smol"
)))]
compile_error!(
    "One of \"runtime-tokio\", \"runtime-async-std\", or \"runtime-smol\" features must be enabled"
);

#[cfg(all(feature = "runtime-tokio", feature = "runtime-async-std"))]
compile_error!("Features \"runtime-tokio\" and \"runtime-async-std\" are mutually exclusive");

#[cfg(all(feature = "runtime-tokio", feature = "runtime-smol"))]
compile_error!("Features \"runtime-tokio\" and \"runtime-smol\" are mutually exclusive");

#[cfg(all(feature = "runtime-async-std", feature = "runtime-smol"))]
compile_error!("Features \"runtime-async-std\" and \"runtime-smol\" are mutually exclusive");

#[cfg(all(test, feature = "runtime-tokio"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sleep_returns_false_without_cancel() {
        let token = ShutdownToken::new();
        assert!(!token.sleep(Duration::from_millis(5)).await);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_sleep() {
        let token = ShutdownToken::new();
        let other = token.clone();
        let waiter = tokio::spawn(async move { other.sleep(Duration::from_secs(60)).await });
        token.cancel();
        assert!(waiter.await.unwrap());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_twice_is_harmless() {
        let token = ShutdownToken::new();
        token.cancel();
        token.cancel();
        token.cancelled().await;
        assert!(token.sleep(Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn test_spawned_task_stops_through_token() {
        let token = ShutdownToken::new();
        let other = token.clone();
        let task = spawn(async move {
            other.cancelled().await;
            7
        });
        token.cancel();
        assert_eq!(task.await, 7);
    }
}
