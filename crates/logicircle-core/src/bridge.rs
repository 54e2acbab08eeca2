// ── Bridge lifecycle ──
//
// Startup/shutdown facade a host talks to: authenticate, discover, register
// one entity per accessory, and drive each entity from its own periodic
// task. All tasks share one cancellation token.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use futures_util::future::join_all;
use indexmap::IndexMap;
use strum::Display;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use logicircle_api::{CircleClient, TlsMode, TransportConfig};

use crate::config::BridgeConfig;
use crate::directory::AccessoryDirectory;
use crate::entity::{CameraEntity, RefreshOutcome};
use crate::error::CoreError;
use crate::fetcher::SnapshotFetcher;
use crate::session::CloudSession;

/// Entity registry, keyed by unique id, in service order.
pub type EntityMap = IndexMap<String, Arc<CameraEntity>>;

/// Lifecycle state of a [`Bridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BridgeState {
    Stopped,
    Starting,
    Running,
    /// Startup failed; no entities are registered.
    Failed,
}

/// Build the cloud session for a configuration without starting anything.
///
/// Useful for one-shot hosts that only need a listing or a single snapshot.
pub fn cloud_session(config: &BridgeConfig) -> Result<CloudSession, CoreError> {
    let transport = TransportConfig {
        tls: config
            .ca_cert
            .clone()
            .map_or(TlsMode::System, TlsMode::CustomCa),
        timeout: config.timeout,
    };
    let client = CircleClient::new(config.api_url.clone(), &transport)?;
    Ok(CloudSession::new(client, config.credentials.clone()))
}

/// The running integration for one account.
///
/// Cheaply cloneable via `Arc<BridgeInner>`.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    state: watch::Sender<BridgeState>,
    entities: ArcSwap<EntityMap>,
    /// Held for the whole of `start()` and `shutdown()`.
    lifecycle: Mutex<()>,
    cancel: CancellationToken,
    /// Child token for the current run; replaced on every start.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("state", &*self.inner.state.borrow())
            .field("entities", &self.inner.entities.load().len())
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Create a bridge. Does NOT connect; call [`start()`](Self::start).
    pub fn new(config: BridgeConfig) -> Self {
        let (state, _) = watch::channel(BridgeState::Stopped);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(BridgeInner {
                config,
                state,
                entities: ArcSwap::from_pointee(EntityMap::new()),
                lifecycle: Mutex::new(()),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn state(&self) -> BridgeState {
        *self.inner.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<BridgeState> {
        self.inner.state.subscribe()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Authenticate, discover accessories, register entities, and spawn
    /// their refresh tasks.
    ///
    /// An authentication failure aborts startup with no entity registered.
    /// Calling this on a running bridge does nothing; concurrent calls are
    /// serialized, so only the first one registers anything.
    pub async fn start(&self) -> Result<(), CoreError> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if self.state() == BridgeState::Running {
            debug!("bridge already running");
            return Ok(());
        }
        self.inner.config.validate()?;
        self.inner.state.send_replace(BridgeState::Starting);

        match self.register().await {
            Ok(count) => {
                self.inner.state.send_replace(BridgeState::Running);
                info!(cameras = count, "bridge started");
                Ok(())
            }
            Err(e) => {
                self.inner.entities.store(Arc::new(EntityMap::new()));
                self.inner.state.send_replace(BridgeState::Failed);
                warn!(error = %e, "bridge startup failed");
                Err(e)
            }
        }
    }

    async fn register(&self) -> Result<usize, CoreError> {
        let config = &self.inner.config;
        let cloud = Arc::new(cloud_session(config)?);
        cloud.authenticate().await?;

        let directory = AccessoryDirectory::new(Arc::clone(&cloud), config.name.as_str());
        let accessories = directory
            .list_accessories_with_backoff(config.discovery_backoff)
            .await?;

        let fetcher = Arc::new(SnapshotFetcher::new(Arc::clone(&cloud)));
        let mut entities = EntityMap::with_capacity(accessories.len());
        for accessory in accessories {
            let entity = CameraEntity::new(
                Arc::new(accessory),
                Arc::clone(&cloud),
                Arc::clone(&fetcher),
                config.failure_threshold,
            );
            let key = entity.unique_id().to_owned();
            if entities.contains_key(&key) {
                warn!(entity = %key, "duplicate accessory in listing, skipping");
                continue;
            }
            debug!(entity = %key, name = entity.name(), "registered camera");
            entities.insert(key, Arc::new(entity));
        }

        let count = entities.len();
        let entities = Arc::new(entities);
        self.inner.entities.store(Arc::clone(&entities));

        // Fresh child token for this run; a leftover one is cancelled so no
        // earlier task outlives the swap.
        let child = self.inner.cancel.child_token();
        let previous = {
            let mut slot = self.inner.cancel_child.lock().await;
            std::mem::replace(&mut *slot, child.clone())
        };
        previous.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for entity in entities.values() {
            handles.push(tokio::spawn(refresh_task(
                Arc::clone(entity),
                config.refresh_interval,
                child.clone(),
            )));
        }
        Ok(count)
    }

    /// Cancel and join every refresh task, then drop the entities.
    pub async fn shutdown(&self) {
        let _lifecycle = self.inner.lifecycle.lock().await;
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "refresh task ended abnormally");
            }
        }
        drop(handles);

        self.inner.entities.store(Arc::new(EntityMap::new()));
        self.inner.state.send_replace(BridgeState::Stopped);
        debug!("bridge stopped");
    }

    // ── Entities ─────────────────────────────────────────────────

    /// Registered entities in service order.
    pub fn entities(&self) -> Arc<EntityMap> {
        self.inner.entities.load_full()
    }

    pub fn entity(&self, unique_id: &str) -> Option<Arc<CameraEntity>> {
        self.inner.entities.load().get(unique_id).cloned()
    }

    /// Refresh every entity concurrently, outside its schedule.
    ///
    /// Entities with a refresh already in flight report `Coalesced`.
    pub async fn refresh_all(&self) -> Result<Vec<(String, RefreshOutcome)>, CoreError> {
        if self.state() != BridgeState::Running {
            return Err(CoreError::NotRunning);
        }
        let entities = self.entities();
        let outcomes = join_all(entities.values().map(|e| e.refresh())).await;
        Ok(entities.keys().cloned().zip(outcomes).collect())
    }
}

/// Periodically refresh one entity until cancelled.
///
/// The first tick fires immediately so hosts get an image right after
/// startup. Missed ticks are skipped, never bunched.
async fn refresh_task(entity: Arc<CameraEntity>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    outcome = entity.refresh() => {
                        trace!(entity = entity.unique_id(), ?outcome, "refresh tick");
                    }
                }
            }
        }
    }
    debug!(entity = entity.unique_id(), "refresh task stopped");
}
