//! Cooperative completion reactor
//!
//! Registered handles are driven as futures on the caller's task. Nothing is
//! spawned: progress only happens inside [`Reactor::step`].

use std::collections::HashSet;
use std::time::Duration;

use airalo_domain::Result;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tracing::trace;

use super::executor::{Handle, HttpExecutor};
use super::response::RawResponse;

/// Arena index of a handle inside one multiplexed run.
pub(crate) type HandleId = usize;

/// Health of the reactor after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReactorStatus {
    Ok,
    Fault(String),
}

/// Outcome of one [`Reactor::step`].
#[derive(Debug)]
pub(crate) struct Step {
    pub completed: Vec<(HandleId, RawResponse)>,
    pub status: ReactorStatus,
}

impl Step {
    fn idle() -> Self {
        Self { completed: Vec::new(), status: ReactorStatus::Ok }
    }

    fn fault(&mut self, reason: String) {
        if self.status == ReactorStatus::Ok {
            self.status = ReactorStatus::Fault(reason);
        }
    }
}

type Completion = (HandleId, Result<RawResponse>);

pub(crate) struct Reactor {
    executor: HttpExecutor,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    registered: HashSet<HandleId>,
    poll_interval: Duration,
}

impl Reactor {
    pub(crate) fn new(executor: HttpExecutor, poll_interval: Duration) -> Self {
        Self {
            executor,
            in_flight: FuturesUnordered::new(),
            registered: HashSet::new(),
            poll_interval,
        }
    }

    /// Start driving `handle`. It makes progress on the next [`step`](Self::step).
    pub(crate) fn register(&mut self, id: HandleId, handle: Handle) {
        let executor = self.executor.clone();
        self.registered.insert(id);
        self.in_flight.push(async move { (id, executor.execute(handle).await) }.boxed());
    }

    pub(crate) fn deregister(&mut self, id: HandleId) -> bool {
        self.registered.remove(&id)
    }

    /// Handles registered and not yet completed.
    pub(crate) fn active(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Wait up to one poll interval for a completion, then drain every
    /// completion that is already ready.
    pub(crate) async fn step(&mut self) -> Step {
        if self.in_flight.is_empty() {
            return Step::idle();
        }

        let first = match tokio::time::timeout(self.poll_interval, self.in_flight.next()).await {
            Ok(Some(done)) => done,
            Ok(None) => return Step::idle(),
            Err(_) => {
                trace!(active = self.active(), "no completion within poll interval");
                return Step::idle();
            }
        };

        let mut step = Step::idle();
        self.absorb(first, &mut step);
        while let Some(Some(done)) = self.in_flight.next().now_or_never() {
            self.absorb(done, &mut step);
        }
        step
    }

    fn absorb(&self, (id, result): Completion, step: &mut Step) {
        if !self.registered.contains(&id) {
            step.fault(format!("completion for unregistered handle {id}"));
            return;
        }

        match result {
            Ok(raw) => step.completed.push((id, raw)),
            Err(err) => step.fault(err.to_string()),
        }
    }
}
