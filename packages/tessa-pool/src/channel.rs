//! FIFO hand-off of idle values between owners.
//!
//! A mutex guards the queue itself while a counting semaphore tracks how many
//! values are outstanding, so takers park instead of polling. Waiting takers
//! are served in arrival order.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::{Semaphore, TryAcquireError};

/// The channel was closed before or while the operation ran.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("channel closed")]
pub struct Closed;

/// A `put` on a closed channel. Carries the rejected value back.
#[derive(Error)]
#[error("channel closed")]
pub struct PutError<T>(pub T);

impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PutError").finish_non_exhaustive()
    }
}

pub struct IdleChannel<T> {
    queue: Mutex<VecDeque<T>>,
    available: Semaphore,
}

impl<T> IdleChannel<T> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            available: Semaphore::new(0),
        }
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `value` and wakes the longest-waiting taker, if any.
    pub fn put(&self, value: T) -> Result<(), PutError<T>> {
        {
            let mut queue = self.queue();
            if self.available.is_closed() {
                return Err(PutError(value));
            }
            queue.push_back(value);
        }
        self.available.add_permits(1);
        Ok(())
    }

    /// Removes the oldest value, suspending until one is put.
    ///
    /// Cancel safe: dropping the future before it resolves claims nothing.
    pub async fn take(&self) -> Result<T, Closed> {
        let permit = self.available.acquire().await.map_err(|_| Closed)?;
        permit.forget();
        self.pop()
    }

    /// Blocking form of [`take`](Self::take). Must not be called from within
    /// an async task.
    pub fn take_blocking(&self) -> Result<T, Closed> {
        futures::executor::block_on(self.take())
    }

    /// Takes the oldest value if one is immediately available.
    pub fn try_take(&self) -> Result<Option<T>, Closed> {
        match self.available.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.pop().map(Some)
            }
            Err(TryAcquireError::NoPermits) => Ok(None),
            Err(TryAcquireError::Closed) => Err(Closed),
        }
    }

    // A claimed permit always has a value behind it unless `close` drained
    // the queue in between.
    fn pop(&self) -> Result<T, Closed> {
        self.queue().pop_front().ok_or(Closed)
    }

    /// Number of unclaimed values. A hint only: another taker may claim them
    /// before the caller acts on it.
    pub fn count(&self) -> usize {
        if self.available.is_closed() {
            return 0;
        }
        self.available.available_permits()
    }

    pub fn is_closed(&self) -> bool {
        self.available.is_closed()
    }

    /// Closes the channel, failing every pending and future `take`/`put`.
    /// Returns whatever was still queued. Idempotent.
    pub fn close(&self) -> Vec<T> {
        let mut queue = self.queue();
        self.available.close();
        queue.drain(..).collect()
    }
}

impl<T> Default for IdleChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IdleChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleChannel")
            .field("count", &self.count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let chan = IdleChannel::new();
        for i in 0..5 {
            chan.put(i).unwrap();
        }
        assert_eq!(chan.count(), 5);
        let taken: Vec<_> = (0..5).map(|_| chan.take_blocking().unwrap()).collect();
        assert_eq!(taken, vec![0, 1, 2, 3, 4]);
        assert_eq!(chan.count(), 0);
    }

    #[test]
    fn test_try_take_empty() {
        let chan: IdleChannel<u8> = IdleChannel::new();
        assert_eq!(chan.try_take(), Ok(None));
        chan.put(9).unwrap();
        assert_eq!(chan.try_take(), Ok(Some(9)));
    }

    #[tokio::test]
    async fn test_take_waits_for_put() {
        let chan = Arc::new(IdleChannel::new());
        let taker = {
            let chan = Arc::clone(&chan);
            tokio::spawn(async move { chan.take().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!taker.is_finished());
        chan.put("worker").unwrap();
        assert_eq!(taker.await.unwrap(), Ok("worker"));
    }

    #[test]
    fn test_blocking_take_from_thread() {
        let chan = Arc::new(IdleChannel::new());
        let handle = {
            let chan = Arc::clone(&chan);
            std::thread::spawn(move || chan.take_blocking())
        };
        std::thread::sleep(Duration::from_millis(20));
        chan.put(42u32).unwrap();
        assert_eq!(handle.join().unwrap(), Ok(42));
    }

    #[tokio::test]
    async fn test_waiters_served_in_order() {
        let chan = Arc::new(IdleChannel::new());
        let mut waiters = Vec::new();
        for _ in 0..3 {
            let chan = Arc::clone(&chan);
            waiters.push(tokio::spawn(async move { chan.take().await }));
            // Let each waiter queue up before the next.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        for v in ["a", "b", "c"] {
            chan.put(v).unwrap();
        }
        let mut got = Vec::new();
        for w in waiters {
            got.push(w.await.unwrap().unwrap());
        }
        assert_eq!(got, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_close_fails_pending_and_future_ops() {
        let chan = Arc::new(IdleChannel::<u8>::new());
        let pending = {
            let chan = Arc::clone(&chan);
            tokio::spawn(async move { chan.take().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(chan.close().is_empty());
        assert_eq!(pending.await.unwrap(), Err(Closed));
        assert_eq!(chan.take().await, Err(Closed));
        assert_eq!(chan.try_take(), Err(Closed));
        let rejected = chan.put(3).unwrap_err();
        assert_eq!(rejected.0, 3);
        // idempotent
        assert!(chan.close().is_empty());
        assert!(chan.is_closed());
    }

    #[test]
    fn test_close_returns_leftovers() {
        let chan = IdleChannel::new();
        chan.put(1).unwrap();
        chan.put(2).unwrap();
        assert_eq!(chan.close(), vec![1, 2]);
        assert_eq!(chan.count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_take_claims_nothing() {
        let chan = IdleChannel::new();
        let res = tokio::time::timeout(Duration::from_millis(10), chan.take()).await;
        assert!(res.is_err());
        chan.put(5).unwrap();
        assert_eq!(chan.try_take(), Ok(Some(5)));
    }
}
