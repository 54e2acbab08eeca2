// ── Camera entity ──
//
// One per accessory. Owns the cached snapshot and the availability state
// machine; the host reads it, the refresh task drives it. State lives in a
// `watch` channel so hosts can observe changes without polling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::error::FetchError;
use crate::fetcher::SnapshotFetcher;
use crate::model::{Accessory, Availability, EntityState, Snapshot};
use crate::session::CloudSession;

/// Prefix of every entity's unique id.
pub const UNIQUE_ID_PREFIX: &str = "logicircle_";

/// What a call to [`CameraEntity::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot replaced the cached one.
    Updated,
    /// The fetch succeeded but a result from a later refresh was already
    /// applied.
    Discarded,
    /// The fetch failed; the failure was counted.
    Failed,
    /// Another refresh was already in flight; nothing was done.
    Coalesced,
}

/// Host-facing camera backed by one accessory.
pub struct CameraEntity {
    accessory: Arc<Accessory>,
    unique_id: String,
    cloud: Arc<CloudSession>,
    fetcher: Arc<SnapshotFetcher>,
    failure_threshold: u32,
    in_flight: AtomicBool,
    /// Issued once per refresh, in start order.
    next_ticket: AtomicU64,
    /// Ticket of the snapshot currently cached; written under the state lock.
    applied_ticket: AtomicU64,
    state: watch::Sender<EntityState>,
}

impl std::fmt::Debug for CameraEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("CameraEntity")
            .field("unique_id", &self.unique_id)
            .field("name", &self.accessory.name)
            .field("availability", &state.availability)
            .field("consecutive_failures", &state.consecutive_failures)
            .finish_non_exhaustive()
    }
}

impl CameraEntity {
    pub fn new(
        accessory: Arc<Accessory>,
        cloud: Arc<CloudSession>,
        fetcher: Arc<SnapshotFetcher>,
        failure_threshold: u32,
    ) -> Self {
        let (state, _) = watch::channel(EntityState::default());
        Self {
            unique_id: format!("{UNIQUE_ID_PREFIX}{}", accessory.id),
            accessory,
            cloud,
            fetcher,
            failure_threshold: failure_threshold.max(1),
            in_flight: AtomicBool::new(false),
            next_ticket: AtomicU64::new(0),
            applied_ticket: AtomicU64::new(0),
            state,
        }
    }

    // ── Host protocol ────────────────────────────────────────────

    /// Unique id derived from the accessory identifier.
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.accessory.name
    }

    pub fn accessory(&self) -> &Arc<Accessory> {
        &self.accessory
    }

    pub fn is_available(&self) -> bool {
        self.state.borrow().availability == Availability::Available
    }

    /// Latest image bytes; `None` only until the first successful fetch.
    pub fn current_image(&self) -> Option<Bytes> {
        self.state
            .borrow()
            .snapshot
            .as_ref()
            .map(|s| s.bytes.clone())
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.state.borrow().snapshot.clone()
    }

    /// Unavailable but still serving an older image.
    pub fn is_stale(&self) -> bool {
        self.state.borrow().is_stale()
    }

    pub fn state(&self) -> EntityState {
        self.state.borrow().clone()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<EntityState> {
        self.state.subscribe()
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Fetch a new snapshot unless one is already being fetched.
    ///
    /// Never fails: errors are logged and folded into the entity state.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_flight) = InFlight::acquire(&self.in_flight) else {
            trace!(entity = %self.unique_id, "refresh already in flight, coalescing");
            return RefreshOutcome::Coalesced;
        };

        let ticket = self.issue_ticket();
        let result = match self.cloud.current().await {
            Ok(session) => self.fetcher.fetch(&session, &self.accessory.id).await,
            Err(e) => Err(FetchError::Auth(e)),
        };
        self.apply(ticket, result)
    }

    fn issue_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Fold a fetch result into the state machine.
    ///
    /// Results are ordered by the ticket issued when their refresh started,
    /// not by `captured_at`, so a wall clock step never blocks new images.
    pub(crate) fn apply(&self, ticket: u64, result: Result<Snapshot, FetchError>) -> RefreshOutcome {
        match result {
            Ok(snapshot) => self.apply_snapshot(ticket, snapshot),
            Err(e) => self.apply_failure(&e),
        }
    }

    fn apply_snapshot(&self, ticket: u64, snapshot: Snapshot) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::Updated;
        let mut recovered = false;

        self.state.send_if_modified(|state| {
            if ticket < self.applied_ticket.load(Ordering::Acquire) {
                outcome = RefreshOutcome::Discarded;
                return false;
            }
            self.applied_ticket.store(ticket, Ordering::Release);
            recovered = state.availability == Availability::Unavailable;
            state.snapshot = Some(Arc::new(snapshot));
            state.availability = Availability::Available;
            state.consecutive_failures = 0;
            state.last_error = None;
            true
        });

        match outcome {
            RefreshOutcome::Discarded => {
                debug!(entity = %self.unique_id, ticket, "discarding result of an earlier refresh");
            }
            _ if recovered => info!(entity = %self.unique_id, "camera available"),
            _ => trace!(entity = %self.unique_id, "snapshot updated"),
        }
        outcome
    }

    fn apply_failure(&self, error: &FetchError) -> RefreshOutcome {
        let threshold = self.failure_threshold;
        let mut failures = 0;
        let mut went_unavailable = false;

        self.state.send_modify(|state| {
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
            state.last_error = Some(error.to_string());
            failures = state.consecutive_failures;
            if failures >= threshold && state.availability == Availability::Available {
                state.availability = Availability::Unavailable;
                went_unavailable = true;
            }
        });

        warn!(
            entity = %self.unique_id,
            error = %error,
            consecutive_failures = failures,
            "snapshot refresh failed"
        );
        if went_unavailable {
            warn!(
                entity = %self.unique_id,
                threshold,
                "camera unavailable, keeping last image as stale"
            );
        }
        RefreshOutcome::Failed
    }
}

/// Holds the per-entity in-flight flag for the duration of one refresh.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
