//! Bounded worker pool.
//!
//! At most `capacity` submitted tasks run at once; the rest wait for a permit.
//! Waiting submissions form the queue, which is unbounded unless
//! `max_queued` is set, in which case [`WorkerPool::submit`] fails with
//! [`PoolError::Saturated`] once that many are waiting.
//!
//! Closing the pool only refuses new submissions. Tasks already running or
//! waiting are never cancelled; [`WorkerPool::wait`] resolves once they have
//! all finished.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::error::PoolError;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    permits: Arc<Semaphore>,
    capacity: usize,
    max_queued: Option<usize>,
    queued: AtomicUsize,
    closed: AtomicBool,
    tasks: TaskTracker,
}

impl WorkerPool {
    pub fn new(capacity: usize, max_queued: Option<usize>) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Inner {
                permits: Arc::new(Semaphore::new(capacity)),
                capacity,
                max_queued,
                queued: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                tasks: TaskTracker::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Tasks currently holding a worker slot.
    pub fn active(&self) -> usize {
        self.inner.capacity - self.inner.permits.available_permits()
    }

    /// Tasks waiting for a worker slot.
    pub fn queued(&self) -> usize {
        self.inner.queued.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.tasks.close();
    }

    /// Waits until the pool is closed and every submitted task has finished.
    pub async fn wait(&self) {
        self.inner.tasks.wait().await;
    }

    /// Schedules `task` on the pool.
    ///
    /// On error the task is dropped without being polled.
    pub fn submit<F>(&self, task: F) -> Result<JoinHandle<()>, PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }

        // Fast path: a worker is free right now.
        if let Ok(permit) = self.inner.permits.clone().try_acquire_owned() {
            return Ok(self.inner.tasks.spawn(async move {
                task.await;
                drop(permit);
            }));
        }

        self.reserve_queue_slot()?;

        let inner = self.inner.clone();
        Ok(self.inner.tasks.spawn(async move {
            let permit = inner.permits.clone().acquire_owned().await;
            inner.queued.fetch_sub(1, Ordering::AcqRel);

            // The semaphore is never closed, so this only guards against misuse.
            let Ok(permit) = permit else {
                return;
            };
            task.await;
            drop(permit);
        }))
    }

    fn reserve_queue_slot(&self) -> Result<(), PoolError> {
        match self.inner.max_queued {
            Some(max) => self
                .inner
                .queued
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |q| {
                    (q < max).then_some(q + 1)
                })
                .map(|_| ())
                .map_err(PoolError::Saturated),
            None => {
                self.inner.queued.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
        }
    }
}
