//! Bounded dispatch between the producer and the worker pool.
//!
//! The producer feeds a bounded `mpsc` channel, draining the retry backlog
//! before the target stream. Every item sent is counted as pending until a
//! worker releases it, and the producer only closes the channel once the
//! stream and backlog are both empty and nothing is pending.

use super::stream::TargetStream;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, Mutex as AsyncMutex, Notify};
use tracing::trace;

/// A target together with the number of times it has been retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch<T> {
    pub target: T,
    pub attempt: u32,
}

impl<T> Dispatch<T> {
    /// First dispatch of a target.
    pub fn first(target: T) -> Self {
        Self { target, attempt: 0 }
    }

    fn retried(self) -> Self {
        Self {
            target: self.target,
            attempt: self.attempt.saturating_add(1),
        }
    }
}

/// State shared by the producer and every worker.
pub struct DispatchQueue<T> {
    receiver: AsyncMutex<mpsc::Receiver<Dispatch<T>>>,
    backlog: Mutex<VecDeque<Dispatch<T>>>,
    pending: AtomicUsize,
    dispatched: AtomicUsize,
    retried: AtomicUsize,
    progress: Notify,
}

impl<T: Send + 'static> DispatchQueue<T> {
    /// Create a queue of `capacity` slots and the producer feeding it.
    pub fn bounded(capacity: usize, stream: TargetStream<T>) -> (Arc<Self>, Producer<T>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let queue = Arc::new(Self {
            receiver: AsyncMutex::new(receiver),
            backlog: Mutex::new(VecDeque::new()),
            pending: AtomicUsize::new(0),
            dispatched: AtomicUsize::new(0),
            retried: AtomicUsize::new(0),
            progress: Notify::new(),
        });
        let producer = Producer {
            sender,
            stream,
            queue: Arc::clone(&queue),
        };
        (queue, producer)
    }

    /// Take the next item, or `None` once the producer has closed the queue
    /// and everything sent has been handed out.
    pub async fn next(&self) -> Option<Dispatch<T>> {
        self.receiver.lock().await.recv().await
    }

    /// Mark an item as in progress. Dropping the guard releases it.
    pub fn begin(&self) -> InFlight<'_, T> {
        InFlight { queue: self }
    }

    /// Send an errored item back for another attempt.
    ///
    /// Must be called while the original is still in flight so the pending
    /// count cannot touch zero between the two.
    pub fn requeue(&self, item: Dispatch<T>) {
        self.backlog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item.retried());
        self.retried.fetch_add(1, Ordering::Relaxed);
        self.progress.notify_one();
    }

    /// Items sent to workers so far, retries included.
    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Items sent back through the backlog.
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::Relaxed)
    }

    /// Items sent but not yet released.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    fn pop_backlog(&self) -> Option<Dispatch<T>> {
        self.backlog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn backlog_is_empty(&self) -> bool {
        self.backlog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    fn release(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        self.progress.notify_one();
    }
}

/// Releases one pending item when dropped, including during a panic unwind.
pub struct InFlight<'a, T: Send + 'static> {
    queue: &'a DispatchQueue<T>,
}

impl<T: Send + 'static> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        self.queue.release();
    }
}

/// Sole writer of the dispatch channel.
pub struct Producer<T> {
    sender: mpsc::Sender<Dispatch<T>>,
    stream: TargetStream<T>,
    queue: Arc<DispatchQueue<T>>,
}

impl<T: Send + 'static> Producer<T> {
    /// Feed the channel until every target has been processed, then close it.
    ///
    /// Returns the number of items dispatched.
    pub async fn run(mut self) -> usize {
        loop {
            let next = self
                .queue
                .pop_backlog()
                .or_else(|| self.stream.next().map(Dispatch::first));

            match next {
                Some(item) => {
                    self.queue.pending.fetch_add(1, Ordering::SeqCst);
                    if self.sender.send(item).await.is_err() {
                        // Every worker is gone; nothing can drain the queue.
                        self.queue.pending.fetch_sub(1, Ordering::SeqCst);
                        break;
                    }
                    self.queue.dispatched.fetch_add(1, Ordering::Relaxed);
                }
                None => {
                    // Pending is read before the backlog: a worker pushes its
                    // retry before releasing the original.
                    if self.queue.pending() == 0 && self.queue.backlog_is_empty() {
                        break;
                    }
                    self.queue.progress.notified().await;
                }
            }
        }

        trace!(
            produced = self.stream.produced(),
            exhausted = self.stream.is_exhausted(),
            "producer finished"
        );
        self.queue.dispatched()
    }
}
