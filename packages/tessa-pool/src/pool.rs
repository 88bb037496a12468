//! Bounded pool of OCR workers.
//!
//! Each request checks out one worker, reusing an idle one, creating one
//! while under the ceiling, or else waiting for one to come back. The worker
//! is returned on every exit path, including panics and cancelled callers,
//! through the [`Lease`] guard.
//!
//! Bookkeeping (`members`, `busy`, `ceiling`, options) lives behind a single
//! gate that is never held across an await point or a native call.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tessa_ocr::{Image, OcrError, OcrOptions, OcrWorker, Region, WorkerFactory};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::IdleChannel;
use crate::error::PoolError;
use crate::request::OcrRequest;
use crate::settings::{PoolSettings, DEFAULT_CEILING};

/// Bookkeeping snapshot, taken atomically under the pool gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub members: usize,
    pub idle: usize,
    pub busy: usize,
    pub ceiling: usize,
    pub closed: bool,
}

struct Member<W> {
    id: u64,
    worker: W,
    applied: Option<Arc<OcrOptions>>,
}

impl<W: OcrWorker> Member<W> {
    fn serve(
        &mut self,
        options: &Arc<OcrOptions>,
        image: &Image,
        region: Option<Region>,
    ) -> Result<String, OcrError> {
        if self.applied.as_deref() != Some(options.as_ref()) {
            debug!(worker = self.id, language = %options.language, "reconfiguring worker");
            // A failed configure leaves the engine in an unknown state.
            self.applied = None;
            self.worker.configure(options)?;
            self.applied = Some(Arc::clone(options));
        }
        self.worker.recognize(image, region)
    }
}

struct PoolState {
    members: HashSet<u64>,
    busy: usize,
    ceiling: usize,
    options: Arc<OcrOptions>,
    closed: bool,
    next_id: u64,
}

struct Shared<F: WorkerFactory> {
    factory: F,
    gate: Mutex<PoolState>,
    idle: IdleChannel<Member<F::Worker>>,
    member_count: watch::Sender<usize>,
}

enum Claim<F: WorkerFactory> {
    Ready(Lease<F>),
    Wait,
}

impl<F: WorkerFactory> Shared<F> {
    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn forget(&self, state: &mut PoolState, id: u64) {
        state.members.remove(&id);
        self.member_count.send_replace(state.members.len());
        debug!(worker = id, members = state.members.len(), "worker destroyed");
    }

    fn lease(self: &Arc<Self>, state: &mut PoolState, member: Member<F::Worker>) -> Lease<F> {
        state.busy += 1;
        Lease {
            shared: Arc::clone(self),
            options: Arc::clone(&state.options),
            member: Some(member),
        }
    }

    /// Reuse, then create, then wait.
    fn claim(self: &Arc<Self>) -> Result<Claim<F>, PoolError> {
        let mut state = self.state();
        if state.closed {
            return Err(PoolError::Closed);
        }

        if self.idle.count() > 0 {
            // The count may be stale; fall through when another taker won.
            if let Some(member) = self.idle.try_take().map_err(|_| PoolError::Closed)? {
                return Ok(Claim::Ready(self.lease(&mut state, member)));
            }
        }

        if state.members.len() < state.ceiling {
            let worker = self.factory.create()?;
            let id = state.next_id;
            state.next_id += 1;
            state.members.insert(id);
            self.member_count.send_replace(state.members.len());
            debug!(worker = id, members = state.members.len(), "worker created");
            let member = Member {
                id,
                worker,
                applied: None,
            };
            return Ok(Claim::Ready(self.lease(&mut state, member)));
        }

        Ok(Claim::Wait)
    }

    async fn check_out(self: &Arc<Self>) -> Result<Lease<F>, PoolError> {
        if let Claim::Ready(lease) = self.claim()? {
            return Ok(lease);
        }

        let member = self.idle.take().await.map_err(|_| PoolError::Closed)?;
        let mut state = self.state();
        if state.closed {
            self.forget(&mut state, member.id);
            drop(state);
            drop(member);
            return Err(PoolError::Closed);
        }
        Ok(self.lease(&mut state, member))
    }

    fn check_in(&self, member: Member<F::Worker>) {
        let mut state = self.state();
        state.busy = state.busy.saturating_sub(1);

        let excess = state.closed || state.members.len() > state.ceiling;
        let rejected = if excess {
            Some(member)
        } else {
            self.idle.put(member).err().map(|e| e.0)
        };

        if let Some(member) = rejected {
            self.forget(&mut state, member.id);
            drop(state);
            drop(member);
        }
    }

    /// Destroys idle workers, oldest first, until membership fits the ceiling.
    fn drain_excess(&self, state: &mut PoolState, limit: usize) -> Vec<Member<F::Worker>> {
        let mut victims = Vec::new();
        while state.members.len() > limit {
            match self.idle.try_take() {
                Ok(Some(member)) => {
                    self.forget(state, member.id);
                    victims.push(member);
                }
                _ => break,
            }
        }
        victims
    }
}

/// A checked-out worker. Dropping it hands the worker back.
struct Lease<F: WorkerFactory> {
    shared: Arc<Shared<F>>,
    options: Arc<OcrOptions>,
    member: Option<Member<F::Worker>>,
}

impl<F: WorkerFactory> Lease<F> {
    fn run(mut self, image: &Image, region: Option<Region>) -> Result<String, OcrError> {
        let Some(member) = self.member.as_mut() else {
            unreachable!("lease emptied before drop");
        };
        let result = member.serve(&self.options, image, region);
        if let Err(err) = &result {
            warn!(worker = member.id, error = %err, "ocr request failed");
        }
        result
    }
}

impl<F: WorkerFactory> Drop for Lease<F> {
    fn drop(&mut self) {
        if let Some(member) = self.member.take() {
            self.shared.check_in(member);
        }
    }
}

/// Shares a bounded set of OCR workers between concurrent callers.
///
/// Cloning is cheap and yields a handle to the same pool.
pub struct OcrPool<F: WorkerFactory> {
    shared: Arc<Shared<F>>,
}

impl<F: WorkerFactory> Clone for OcrPool<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: WorkerFactory> OcrPool<F> {
    /// Pool with default options and a ceiling of six workers.
    pub fn new(factory: F) -> Self {
        Self::build(factory, OcrOptions::default(), DEFAULT_CEILING)
    }

    pub fn with_options(factory: F, options: OcrOptions, ceiling: usize) -> Result<Self, PoolError> {
        if ceiling == 0 {
            return Err(PoolError::InvalidCeiling);
        }
        Ok(Self::build(factory, options, ceiling))
    }

    pub fn with_settings(factory: F, settings: PoolSettings) -> Result<Self, PoolError> {
        Self::with_options(factory, settings.options, settings.ceiling)
    }

    fn build(factory: F, options: OcrOptions, ceiling: usize) -> Self {
        let (member_count, _) = watch::channel(0);
        let state = PoolState {
            members: HashSet::new(),
            busy: 0,
            ceiling,
            options: Arc::new(options),
            closed: false,
            next_id: 0,
        };
        Self {
            shared: Arc::new(Shared {
                factory,
                gate: Mutex::new(state),
                idle: IdleChannel::new(),
                member_count,
            }),
        }
    }

    /// Runs OCR on a pooled worker, suspending while none is free.
    ///
    /// The native call runs on tokio's blocking pool. Dropping the returned
    /// future never leaks a worker: an in-flight call finishes in the
    /// background and the worker is returned afterwards.
    pub async fn process(&self, request: OcrRequest) -> Result<String, PoolError> {
        let region = request.validate()?;
        let lease = self.shared.check_out().await?;
        let image = request.image().clone();
        tokio::task::spawn_blocking(move || lease.run(&image, region))
            .await
            .map_err(|e| PoolError::Join(e.to_string()))?
            .map_err(PoolError::from)
    }

    /// Like [`process`](Self::process), but gives up with
    /// [`PoolError::Cancelled`] once `token` fires.
    pub async fn process_with_cancel(
        &self,
        request: OcrRequest,
        token: &CancellationToken,
    ) -> Result<String, PoolError> {
        let region = request.validate()?;
        let lease = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(PoolError::Cancelled),
            lease = self.shared.check_out() => lease?,
        };
        let image = request.image().clone();
        let task = tokio::task::spawn_blocking(move || lease.run(&image, region));
        tokio::select! {
            biased;
            // The detached task still returns the worker when it finishes.
            _ = token.cancelled() => Err(PoolError::Cancelled),
            joined = task => joined
                .map_err(|e| PoolError::Join(e.to_string()))?
                .map_err(PoolError::from),
        }
    }

    /// Blocking form of [`process`](Self::process); the engine runs on the
    /// calling thread. Must not be called from within an async task.
    pub fn process_blocking(&self, request: &OcrRequest) -> Result<String, PoolError> {
        let region = request.validate()?;
        let lease = futures::executor::block_on(self.shared.check_out())?;
        lease.run(request.image(), region).map_err(PoolError::from)
    }

    pub fn ceiling(&self) -> usize {
        self.shared.state().ceiling
    }

    /// Changes the ceiling. Excess idle workers are destroyed right away;
    /// excess busy workers are destroyed when they come back. Never waits.
    pub fn set_ceiling(&self, ceiling: usize) -> Result<(), PoolError> {
        if ceiling == 0 {
            return Err(PoolError::InvalidCeiling);
        }
        let victims = {
            let mut state = self.shared.state();
            if state.closed {
                return Err(PoolError::Closed);
            }
            let previous = state.ceiling;
            state.ceiling = ceiling;
            let victims = self.shared.drain_excess(&mut state, ceiling);
            info!(
                from = previous,
                to = ceiling,
                destroyed = victims.len(),
                busy = state.busy,
                "pool resized"
            );
            victims
        };
        drop(victims);
        Ok(())
    }

    /// Snapshot of the options the next dispatched request will use.
    pub fn options(&self) -> OcrOptions {
        self.shared.state().options.as_ref().clone()
    }

    /// Replaces the options for future requests. Requests already dispatched
    /// keep the snapshot they started with.
    pub fn set_options(&self, options: OcrOptions) {
        self.shared.state().options = Arc::new(options);
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state();
        PoolStats {
            members: state.members.len(),
            idle: self.shared.idle.count(),
            busy: state.busy,
            ceiling: state.ceiling,
            closed: state.closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state().closed
    }

    /// Stops the pool: new and parked requests fail with
    /// [`PoolError::Closed`], idle workers are destroyed immediately, and busy
    /// workers are destroyed as they finish. Resolves once every worker is
    /// gone. Idempotent.
    pub async fn shutdown(&self) {
        let (victims, mut remaining) = {
            let mut state = self.shared.state();
            if !state.closed {
                info!(members = state.members.len(), busy = state.busy, "pool shutting down");
            }
            state.closed = true;
            // Closing takes every queued worker, including ones already
            // promised to a parked taker that may never come back for it.
            // Busy workers are then rejected by `put` on check-in.
            let victims = self.shared.idle.close();
            for member in &victims {
                self.shared.forget(&mut state, member.id);
            }
            (victims, self.shared.member_count.subscribe())
        };
        drop(victims);

        // The sender lives in `shared`, so this only ends on a zero count.
        let _ = remaining.wait_for(|&n| n == 0).await;
        debug!("pool shut down");
    }

    /// Blocking form of [`shutdown`](Self::shutdown).
    pub fn shutdown_blocking(&self) {
        futures::executor::block_on(self.shutdown());
    }
}
