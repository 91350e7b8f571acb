/// Fan-in of per-recipient send outcomes into one response
///
/// State transitions:
/// - Subordinate: Pending → Ok | Error (terminal)
/// - Aggregate: Open → Resolved (terminal), when no subordinate is pending
///   after a transition, or on a top-level failure
///
/// Every transition, top-level failure and `add()` runs under one mutex, so
/// racing callbacks collapse into exactly one delivery.
use crate::error::{AggregateError, AggregateResult, ErrorReport};
use crate::payload::{RecipientResult, ResponsePayload};
use crate::responder::Responder;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Pending,
    Ok,
    Error(ErrorReport),
}

impl Status {
    pub fn is_pending(&self) -> bool {
        matches!(self, Status::Pending)
    }
}

struct Entry {
    device_token: Arc<str>,
    status: Status,
}

impl Entry {
    fn to_result(&self) -> Option<RecipientResult> {
        match &self.status {
            Status::Pending => None,
            Status::Ok => Some(RecipientResult::ok(&*self.device_token)),
            Status::Error(report) => Some(RecipientResult::error(&*self.device_token, report)),
        }
    }
}

struct AggregateState {
    entries: Vec<Entry>,
    /// Set once; the payload that was (or, without a responder, would have been) delivered
    resolved: Option<ResponsePayload>,
}

struct Shared {
    state: Mutex<AggregateState>,
    responder: Option<Box<dyn Responder>>,
}

impl Shared {
    /// Latch resolution if nothing is pending. Returns the payload to deliver.
    fn complete_if_settled(&self, state: &mut AggregateState) -> Option<ResponsePayload> {
        if state.resolved.is_some() || state.entries.iter().any(|e| e.status.is_pending()) {
            return None;
        }

        let recipient_results = state.entries.iter().filter_map(Entry::to_result).collect();
        let payload = ResponsePayload::Completed { recipient_results };
        state.resolved = Some(payload.clone());
        Some(payload)
    }

    /// Call the responder; never invoked with the lock held
    fn deliver(&self, payload: ResponsePayload) {
        match &self.responder {
            Some(responder) => {
                info!(
                    recipients = payload.recipient_results().map_or(0, <[_]>::len),
                    failed = payload.is_failed(),
                    "Delivering aggregated response"
                );
                responder.deliver(payload);
            }
            None => debug!("No responder registered, response dropped"),
        }
    }
}

fn token_prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

/// Tracks the outcomes of all recipients of one request
///
/// Cloning yields another handle to the same aggregate.
#[derive(Clone)]
pub struct Aggregate {
    inner: Arc<Shared>,
}

impl Aggregate {
    /// Create an aggregate; with `None` outcomes are tracked but never delivered
    pub fn create(responder: Option<Box<dyn Responder>>) -> Self {
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(AggregateState {
                    entries: Vec::new(),
                    resolved: None,
                }),
                responder,
            }),
        }
    }

    pub fn with_responder(responder: impl Responder + 'static) -> Self {
        let responder: Box<dyn Responder> = Box::new(responder);
        Self::create(Some(responder))
    }

    /// Aggregate for a requester that does not want a reply
    pub fn without_responder() -> Self {
        Self::create(None)
    }

    /// Register a recipient and return its pending handle
    pub fn add(&self, device_token: impl Into<String>) -> Subordinate {
        let device_token: Arc<str> = Arc::from(device_token.into());
        let mut state = self.inner.state.lock();

        if state.resolved.is_some() {
            warn!(
                device_token = %token_prefix(&device_token),
                "Recipient added after the response was resolved; it will not be reported"
            );
        }

        let index = state.entries.len();
        state.entries.push(Entry {
            device_token: Arc::clone(&device_token),
            status: Status::Pending,
        });
        debug!(device_token = %token_prefix(&device_token), index, "Recipient added");

        Subordinate {
            inner: Arc::clone(&self.inner),
            index,
            device_token,
        }
    }

    /// Fail the whole request
    ///
    /// The payload carries only `report`, never per-recipient results. Has no
    /// effect once the aggregate is resolved.
    pub fn fail(&self, report: ErrorReport) -> AggregateResult<()> {
        let payload = {
            let mut state = self.inner.state.lock();
            if state.resolved.is_some() {
                warn!(
                    error_code = %report.code,
                    "Top-level failure after the response was resolved, ignoring"
                );
                return Err(AggregateError::AlreadyResolved);
            }

            warn!(
                error_code = %report.code,
                error = %report.message,
                pending = state.entries.iter().filter(|e| e.status.is_pending()).count(),
                "Request failed"
            );
            let payload = ResponsePayload::failed(&report);
            state.resolved = Some(payload.clone());
            payload
        };

        self.inner.deliver(payload);
        Ok(())
    }

    /// Number of recipients added so far
    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .entries
            .iter()
            .filter(|e| e.status.is_pending())
            .count()
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.state.lock().resolved.is_some()
    }

    /// True when resolved by a top-level failure
    pub fn is_failed(&self) -> bool {
        self.inner
            .state
            .lock()
            .resolved
            .as_ref()
            .is_some_and(ResponsePayload::is_failed)
    }

    /// The resolved payload
    pub fn to_payload(&self) -> AggregateResult<ResponsePayload> {
        self.inner
            .state
            .lock()
            .resolved
            .clone()
            .ok_or(AggregateError::StillPending)
    }
}

impl fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Aggregate")
            .field("recipients", &state.entries.len())
            .field("resolved", &state.resolved.is_some())
            .field("has_responder", &self.inner.responder.is_some())
            .finish()
    }
}

/// Handle for one recipient's outcome
///
/// Handles are cheap to clone and may be moved to whichever thread or task
/// receives the provider callback.
#[derive(Clone)]
pub struct Subordinate {
    inner: Arc<Shared>,
    index: usize,
    device_token: Arc<str>,
}

impl Subordinate {
    pub fn device_token(&self) -> &str {
        &self.device_token
    }

    pub fn status(&self) -> Status {
        self.inner.state.lock().entries[self.index].status.clone()
    }

    /// Record a successful send
    pub fn succeed(&self) -> AggregateResult<()> {
        self.resolve(Status::Ok)
    }

    /// Record a failed send
    pub fn fail(&self, report: ErrorReport) -> AggregateResult<()> {
        self.resolve(Status::Error(report))
    }

    fn resolve(&self, status: Status) -> AggregateResult<()> {
        let payload = {
            let mut state = self.inner.state.lock();
            let entry = &mut state.entries[self.index];

            if !entry.status.is_pending() {
                warn!(
                    device_token = %token_prefix(&self.device_token),
                    "Recipient result already resolved, keeping the first outcome"
                );
                return Err(AggregateError::AlreadyResolved);
            }

            match &status {
                Status::Error(report) => debug!(
                    device_token = %token_prefix(&self.device_token),
                    error_code = %report.code,
                    "Recipient failed"
                ),
                _ => debug!(device_token = %token_prefix(&self.device_token), "Recipient succeeded"),
            }
            entry.status = status;

            self.inner.complete_if_settled(&mut state)
        };

        if let Some(payload) = payload {
            self.inner.deliver(payload);
        }
        Ok(())
    }

    /// This recipient's entry in the response
    pub fn to_payload(&self) -> AggregateResult<RecipientResult> {
        self.inner.state.lock().entries[self.index]
            .to_result()
            .ok_or(AggregateError::StillPending)
    }
}

impl fmt::Debug for Subordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subordinate")
            .field("device_token", &token_prefix(&self.device_token))
            .field("index", &self.index)
            .finish()
    }
}
