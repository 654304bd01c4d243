//! Rolling-window request multiplexer
//!
//! Requests are queued with [`RequestMultiplexer::add`] and issued by
//! [`RequestMultiplexer::run`], which keeps at most `window` of them in
//! flight. Each completion immediately admits the next queued request, so
//! throughput does not wait for the slowest member of a batch.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use airalo_domain::constants::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_WINDOW, MAX_WINDOW};
use airalo_domain::{AiraloError, Result};
use tracing::{debug, info, warn};

use super::executor::{Handle, HttpExecutor};
use super::reactor::{HandleId, Reactor, ReactorStatus};
use super::request::{RequestSpec, TransportOptions};
use super::response::RawResponse;

/// What `add` does when a tag is already queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagCollisionPolicy {
    /// The later request takes the tag and the earlier one is never issued.
    #[default]
    Replace,
    /// The later `add` fails with `AiraloError::DuplicateTag`.
    Reject,
}

/// Effective window for a requested size. `None`, zero and anything above
/// the maximum fall back to the default.
pub fn effective_window(requested: Option<usize>) -> usize {
    match requested {
        Some(window) if (1..=MAX_WINDOW).contains(&window) => window,
        _ => DEFAULT_WINDOW,
    }
}

struct Pending {
    tag: String,
    handle: Handle,
}

/// Issues queued requests concurrently and returns responses keyed by tag.
pub struct RequestMultiplexer {
    executor: HttpExecutor,
    pending: Vec<Pending>,
    tag_index: HashMap<String, HandleId>,
    next_position: usize,
    shared_headers: Vec<String>,
    shared_options: TransportOptions,
    collision_policy: TagCollisionPolicy,
    poll_interval: Duration,
}

impl RequestMultiplexer {
    pub fn new(executor: HttpExecutor) -> Self {
        Self {
            executor,
            pending: Vec::new(),
            tag_index: HashMap::new(),
            next_position: 0,
            shared_headers: Vec::new(),
            shared_options: TransportOptions::default(),
            collision_policy: TagCollisionPolicy::default(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    pub fn with_collision_policy(mut self, policy: TagCollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Upper bound on a single wait inside the run loop.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Header lines for requests added after this call. Replaces lines set
    /// earlier; already-queued requests keep theirs.
    pub fn set_headers<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared_headers = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Timeout for requests added after this call.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.shared_options.timeout = Some(timeout);
        self
    }

    /// Skip certificate checks for requests added after this call.
    pub fn ignore_ssl(&mut self) -> &mut Self {
        self.shared_options.accept_invalid_certs = Some(true);
        self
    }

    /// Overlay `options` onto the defaults for later requests. Unset fields
    /// keep their current value.
    pub fn set_transport_options(&mut self, options: TransportOptions) -> &mut Self {
        self.shared_options = options.or(&self.shared_options);
        self
    }

    /// Queue a request under `tag`, or under its position among untagged
    /// adds (`"0"`, `"1"`, ...) when `tag` is `None`.
    ///
    /// # Errors
    /// Returns the preparation error for an invalid spec, or
    /// `AiraloError::DuplicateTag` under [`TagCollisionPolicy::Reject`].
    pub fn add(&mut self, tag: Option<&str>, spec: RequestSpec) -> Result<&mut Self> {
        let spec = spec.with_defaults(&self.shared_headers, &self.shared_options);
        let handle = self.executor.prepare(&spec)?;

        let tag = match tag {
            Some(tag) => tag.to_string(),
            None => {
                let tag = self.next_position.to_string();
                self.next_position += 1;
                tag
            }
        };

        match self.tag_index.get(&tag) {
            Some(&id) => match self.collision_policy {
                TagCollisionPolicy::Reject => return Err(AiraloError::DuplicateTag(tag)),
                TagCollisionPolicy::Replace => {
                    debug!(%tag, "replacing queued request with the same tag");
                    self.pending[id].handle = handle;
                }
            },
            None => {
                self.tag_index.insert(tag.clone(), self.pending.len());
                self.pending.push(Pending { tag, handle });
            }
        }

        Ok(self)
    }

    /// Requests queued and not yet run.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Issue every queued request with at most `window` in flight.
    ///
    /// Returns `None` when nothing was queued. The queue is empty afterwards
    /// whatever the outcome, so the multiplexer can be reused.
    pub async fn run(&mut self, window: Option<usize>) -> Option<RunOutcome> {
        let pending = std::mem::take(&mut self.pending);
        self.tag_index.clear();
        self.next_position = 0;

        if pending.is_empty() {
            return None;
        }

        let window = effective_window(window);
        let total = pending.len();

        let mut tags = Vec::with_capacity(total);
        let mut queue: VecDeque<(HandleId, Handle)> = VecDeque::with_capacity(total);
        for (id, Pending { tag, handle }) in pending.into_iter().enumerate() {
            tags.push(tag);
            queue.push_back((id, handle));
        }

        debug!(total, window, "starting multiplexed run");

        let mut reactor = Reactor::new(self.executor.clone(), self.poll_interval);
        for (id, handle) in queue.drain(..window.min(total)) {
            reactor.register(id, handle);
        }

        let mut responses = HashMap::with_capacity(total);
        let mut fault = None;

        loop {
            let step = reactor.step().await;

            for (id, raw) in step.completed {
                if let Some(tag) = tags.get(id) {
                    responses.insert(tag.clone(), raw);
                }
                // Admit the next request before releasing the finished slot.
                if let Some((next_id, next)) = queue.pop_front() {
                    reactor.register(next_id, next);
                }
                reactor.deregister(id);
            }

            if let ReactorStatus::Fault(reason) = step.status {
                fault = Some(reason);
                break;
            }

            if reactor.is_idle() {
                match queue.pop_front() {
                    Some((next_id, next)) => reactor.register(next_id, next),
                    None => break,
                }
            }
        }

        let abandoned: Vec<String> =
            tags.into_iter().filter(|tag| !responses.contains_key(tag)).collect();

        match &fault {
            Some(reason) => warn!(
                total,
                completed = responses.len(),
                abandoned = abandoned.len(),
                %reason,
                "multiplexed run aborted"
            ),
            None => info!(total, window, "multiplexed run finished"),
        }

        Some(RunOutcome { responses, abandoned, fault })
    }
}

impl std::fmt::Debug for RequestMultiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestMultiplexer")
            .field("pending", &self.pending.len())
            .field("collision_policy", &self.collision_policy)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

/// Responses of one run, keyed by tag.
///
/// After a fault the map only holds requests that finished before it;
/// the rest are listed in [`abandoned`](Self::abandoned).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    responses: HashMap<String, RawResponse>,
    abandoned: Vec<String>,
    fault: Option<String>,
}

impl RunOutcome {
    pub fn get(&self, tag: &str) -> Option<&RawResponse> {
        self.responses.get(tag)
    }

    pub fn responses(&self) -> &HashMap<String, RawResponse> {
        &self.responses
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Every queued request produced an entry.
    pub fn is_complete(&self) -> bool {
        self.fault.is_none() && self.abandoned.is_empty()
    }

    /// Tags that were queued but never completed.
    pub fn abandoned(&self) -> &[String] {
        &self.abandoned
    }

    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    pub fn into_responses(self) -> HashMap<String, RawResponse> {
        self.responses
    }

    pub(crate) fn into_parts(self) -> (HashMap<String, RawResponse>, Vec<String>) {
        (self.responses, self.abandoned)
    }
}
