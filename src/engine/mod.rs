//! The concurrent probing engine.
//!
//! A single producer feeds targets into a bounded queue and a fixed pool of
//! tokio workers probes them. Outcomes go to an [`OutcomeSink`]; errored
//! targets are handed to the [`RetryPolicy`] and, if it allows, go back
//! through the queue. [`Engine::run`] returns once every target has been
//! retired.

mod queue;
mod rate_limiter;
mod retry;
mod stream;

pub use queue::{Dispatch, DispatchQueue, Producer};
pub use rate_limiter::RateLimiter;
pub use retry::{RetryDecision, RetryPolicy};
pub use stream::TargetStream;

use crate::error::EngineError;
use crate::limits;
use crate::probe::{Probe, ProbeOutcome};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Queue slots per worker.
pub const QUEUE_SLOTS_PER_WORKER: usize = 3;

/// Receives the classified outcome of every retired target.
pub trait OutcomeSink<T>: Send + Sync + 'static {
    /// Final outcome for `target`. Called exactly once per dispatched
    /// target that is not retried; errored outcomes arriving here were
    /// abandoned by the retry policy.
    fn record(&self, target: &T, outcome: &ProbeOutcome, attempt: u32);

    /// `target` errored and will be dispatched again.
    fn retrying(&self, _target: &T, _outcome: &ProbeOutcome, _attempt: u32) {}
}

/// Engine tuning, fixed for the length of a run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    workers: usize,
    retry: RetryPolicy,
    rate_limiter: Option<RateLimiter>,
}

impl EngineConfig {
    /// `workers` is clamped to `1..=limits::worker_ceiling()`.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: clamp_workers(workers, limits::worker_ceiling()),
            retry: RetryPolicy::default(),
            rate_limiter: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Cap probes per second; 0 disables the limit.
    pub fn with_rate_limit(mut self, per_second: u32) -> Self {
        self.rate_limiter = RateLimiter::per_second(per_second);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

fn clamp_workers(requested: usize, ceiling: usize) -> usize {
    let ceiling = ceiling.max(1);
    let workers = requested.clamp(1, ceiling);
    if workers != requested {
        warn!(requested, using = workers, "worker count out of range, clamped");
    }
    workers
}

/// Counters for one engine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Items handed to workers, retries included.
    pub dispatched: usize,
    /// Items sent back for another attempt.
    pub retried: usize,
    /// Targets the retry policy gave up on.
    pub abandoned: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Runs a probe over a target stream with a bounded worker pool.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Probe every target in `stream` and block until all are retired.
    pub async fn run<P, S>(
        &self,
        stream: TargetStream<P::Target>,
        probe: Arc<P>,
        sink: Arc<S>,
    ) -> Result<RunStats, EngineError>
    where
        P: Probe,
        S: OutcomeSink<P::Target>,
    {
        let started = Instant::now();
        let workers = self.config.workers;
        let (queue, producer) =
            DispatchQueue::bounded(workers * QUEUE_SLOTS_PER_WORKER, stream);
        let abandoned = Arc::new(AtomicUsize::new(0));

        debug!(workers, "starting worker pool");
        let producer = tokio::spawn(producer.run());
        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    queue: Arc::clone(&queue),
                    probe: Arc::clone(&probe),
                    sink: Arc::clone(&sink),
                    retry: self.config.retry,
                    rate_limiter: self.config.rate_limiter.clone(),
                    abandoned: Arc::clone(&abandoned),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        let mut failure = None;
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                failure.get_or_insert(e);
            }
        }
        if let Some(e) = failure {
            producer.abort();
            return Err(EngineError::WorkerFailed(e));
        }
        producer.await?;

        let stats = RunStats {
            dispatched: queue.dispatched(),
            retried: queue.retried(),
            abandoned: abandoned.load(Ordering::Relaxed),
            elapsed: started.elapsed(),
        };
        debug!(?stats, "engine drained");
        Ok(stats)
    }
}

struct Worker<P: Probe, S> {
    id: usize,
    queue: Arc<DispatchQueue<P::Target>>,
    probe: Arc<P>,
    sink: Arc<S>,
    retry: RetryPolicy,
    rate_limiter: Option<RateLimiter>,
    abandoned: Arc<AtomicUsize>,
}

impl<P, S> Worker<P, S>
where
    P: Probe,
    S: OutcomeSink<P::Target>,
{
    async fn run(self) {
        let mut handled = 0usize;
        while let Some(item) = self.queue.next().await {
            let _in_flight = self.queue.begin();
            if let Some(limiter) = &self.rate_limiter {
                limiter.wait().await;
            }

            let outcome = self.probe.probe(&item.target).await;
            handled += 1;

            if !outcome.is_transient() {
                self.sink.record(&item.target, &outcome, item.attempt);
                continue;
            }

            match self.retry.decide(item.attempt) {
                RetryDecision::Retry { delay } => {
                    self.sink.retrying(&item.target, &outcome, item.attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    self.queue.requeue(item);
                }
                RetryDecision::GiveUp => {
                    self.abandoned.fetch_add(1, Ordering::Relaxed);
                    self.sink.record(&item.target, &outcome, item.attempt);
                }
            }
        }
        debug!(worker = self.id, handled, "worker exiting");
    }
}
