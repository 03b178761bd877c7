//! The coordinator that serializes every state change.
//!
//! One task owns the viewer registry, the stream statistics and the
//! recorder handle. Value sources, transports and the recorder talk to it
//! only through [`Hub`], a clonable handle around its inbound channel, so
//! events from all sources are processed one at a time in arrival order and
//! every viewer observes the same sequence of updates.

use std::sync::Arc;

use clap::ValueEnum;
use myo_stats::{DetectorParams, StreamStats};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{HubError, HubResult};
use crate::recorder::RecorderHandle;
use crate::registry::{Payload, RegistrationResult, ViewerId, ViewerRegistry, DEFAULT_MAX_VIEWERS};
use crate::update::{now_millis, Update, UpdateRole};

/// How updates reach viewers that are slower than the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanoutPolicy {
    /// Hand each update to every viewer in turn, waiting for each to accept
    /// it. Viewer queues hold a single update, so one stalled viewer stalls
    /// the whole pipeline; `viewer_queue` is ignored.
    Block,
    /// Queue up to `viewer_queue` updates per viewer; a viewer whose queue
    /// overflows is disconnected.
    #[value(name = "disconnect")]
    DisconnectOnOverflow,
}

/// Hub tuning
#[derive(Debug, Clone)]
pub struct HubOptions {
    pub detector: DetectorParams,
    pub fanout: FanoutPolicy,
    /// Per-viewer outbound queue length
    pub viewer_queue: usize,
    pub max_viewers: usize,
    /// Inbound event channel length
    pub inbound_queue: usize,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            detector: DetectorParams::default(),
            fanout: FanoutPolicy::DisconnectOnOverflow,
            viewer_queue: 1024,
            max_viewers: DEFAULT_MAX_VIEWERS,
            inbound_queue: 64,
        }
    }
}

/// Snapshot of the coordinator's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubStatus {
    pub viewers: usize,
    pub updates_processed: u64,
    pub samples_seen: u64,
    pub stats_warm: bool,
    pub recording: bool,
}

enum HubEvent {
    Subscribe {
        id: ViewerId,
        outbox: mpsc::Sender<Payload>,
        reply: oneshot::Sender<RegistrationResult>,
    },
    Unsubscribe(ViewerId),
    Update(Update),
    Status(oneshot::Sender<HubStatus>),
}

/// A registered viewer's end of the stream
#[derive(Debug)]
pub struct Viewer {
    pub id: ViewerId,
    pub updates: mpsc::Receiver<Payload>,
}

impl Viewer {
    /// Next serialized update; `None` once the hub has dropped this viewer.
    pub async fn recv(&mut self) -> Option<Payload> {
        self.updates.recv().await
    }
}

/// Handle to the coordinator
#[derive(Clone)]
pub struct Hub {
    events: mpsc::Sender<HubEvent>,
    viewer_queue: usize,
    max_viewers: usize,
}

impl Hub {
    /// Start the coordinator task.
    ///
    /// The task ends with an error if the recorder stops accepting updates,
    /// and with `Ok` once every `Hub` handle has been dropped.
    pub fn spawn(
        options: HubOptions,
        recorder: Option<RecorderHandle>,
    ) -> HubResult<(Hub, JoinHandle<HubResult<()>>)> {
        let stats = StreamStats::new(options.detector)?;
        let (events, inbound) = mpsc::channel(options.inbound_queue.max(1));

        let coordinator = Coordinator {
            registry: ViewerRegistry::with_capacity(options.max_viewers),
            stats,
            recorder,
            fanout: options.fanout,
            updates_processed: 0,
        };
        let task = tokio::spawn(coordinator.run(inbound));

        let viewer_queue = match options.fanout {
            FanoutPolicy::Block => 1,
            FanoutPolicy::DisconnectOnOverflow => options.viewer_queue.max(1),
        };
        let hub = Hub {
            events,
            viewer_queue,
            max_viewers: options.max_viewers,
        };
        Ok((hub, task))
    }

    /// Register a new viewer. It receives every update processed from now on.
    pub async fn subscribe(&self) -> HubResult<Viewer> {
        let id = Uuid::new_v4();
        let (outbox, updates) = mpsc::channel(self.viewer_queue);
        let (reply, result) = oneshot::channel();

        self.send(HubEvent::Subscribe { id, outbox, reply }).await?;
        match result.await.map_err(|_| HubError::HubClosed)? {
            RegistrationResult::Ok => Ok(Viewer { id, updates }),
            RegistrationResult::AtCapacity => Err(HubError::AtCapacity(self.max_viewers)),
        }
    }

    pub async fn unsubscribe(&self, id: ViewerId) -> HubResult<()> {
        self.send(HubEvent::Unsubscribe(id)).await
    }

    pub async fn broadcast(&self, update: Update) -> HubResult<()> {
        self.send(HubEvent::Update(update)).await
    }

    /// Broadcast a manual label.
    pub async fn label(&self) -> HubResult<()> {
        self.broadcast(Update::label()).await
    }

    /// Broadcast a stream discontinuity marker.
    pub async fn reset(&self) -> HubResult<()> {
        self.broadcast(Update::reset_marker()).await
    }

    pub async fn status(&self) -> HubResult<HubStatus> {
        let (reply, status) = oneshot::channel();
        self.send(HubEvent::Status(reply)).await?;
        status.await.map_err(|_| HubError::HubClosed)
    }

    async fn send(&self, event: HubEvent) -> HubResult<()> {
        self.events.send(event).await.map_err(|_| HubError::HubClosed)
    }
}

struct Coordinator {
    registry: ViewerRegistry,
    stats: StreamStats,
    recorder: Option<RecorderHandle>,
    fanout: FanoutPolicy,
    updates_processed: u64,
}

impl Coordinator {
    async fn run(mut self, mut inbound: mpsc::Receiver<HubEvent>) -> HubResult<()> {
        info!(fanout = ?self.fanout, "Hub coordinator started");

        while let Some(event) = inbound.recv().await {
            match event {
                HubEvent::Subscribe { id, outbox, reply } => {
                    let result = self.registry.register(id, outbox);
                    match result {
                        RegistrationResult::Ok => {
                            info!("Viewer {} registered ({} connected)", id, self.registry.len())
                        }
                        RegistrationResult::AtCapacity => warn!(
                            "Rejected viewer {}: limit of {} reached",
                            id,
                            self.registry.max_viewers()
                        ),
                    }
                    let _ = reply.send(result);
                }
                HubEvent::Unsubscribe(id) => {
                    if self.registry.remove(&id).is_some() {
                        info!("Viewer {} unregistered ({} connected)", id, self.registry.len());
                    }
                }
                HubEvent::Update(update) => {
                    if let Err(e) = self.process(update).await {
                        error!("Hub coordinator stopping: {}", e);
                        return Err(e);
                    }
                }
                HubEvent::Status(reply) => {
                    let _ = reply.send(self.status());
                }
            }
        }

        info!("Hub coordinator stopped");
        Ok(())
    }

    async fn process(&mut self, mut update: Update) -> HubResult<()> {
        if update.is_non_finite_sample() {
            warn!("Dropping non-finite sample {:?}", update.value);
            return Ok(());
        }
        update.normalize();
        if update.time.is_none() {
            update.time = Some(now_millis());
        }

        if let Some(recorder) = &self.recorder {
            recorder.record(update.clone()).await?;
        }

        if update.role() == UpdateRole::Sample {
            if let Some(value) = update.value {
                self.stats.push(f64::from(value));
                if self.stats.is_full() {
                    update.pred = self.stats.pred();
                }
            }
        }

        self.updates_processed += 1;
        let payload: Payload = Arc::from(serde_json::to_string(&update)?);
        self.fan_out(payload).await;
        Ok(())
    }

    /// Deliver one payload to every registered viewer, dropping viewers
    /// that are gone or, under [`FanoutPolicy::DisconnectOnOverflow`], full.
    async fn fan_out(&mut self, payload: Payload) {
        let mut dropped = Vec::new();

        for (id, viewer) in self.registry.iter() {
            let delivered = match self.fanout {
                FanoutPolicy::Block => viewer.outbox.send(payload.clone()).await.is_ok(),
                FanoutPolicy::DisconnectOnOverflow => {
                    match viewer.outbox.try_send(payload.clone()) {
                        Ok(()) => true,
                        Err(TrySendError::Full(_)) => {
                            warn!("Viewer {} fell behind, disconnecting", id);
                            false
                        }
                        Err(TrySendError::Closed(_)) => false,
                    }
                }
            };
            if !delivered {
                dropped.push(*id);
            }
        }

        for id in dropped {
            if let Some(viewer) = self.registry.remove(&id) {
                debug!(
                    "Dropped viewer {} connected since {}",
                    id, viewer.connected_at
                );
            }
        }
    }

    fn status(&self) -> HubStatus {
        HubStatus {
            viewers: self.registry.len(),
            updates_processed: self.updates_processed,
            samples_seen: self.stats.samples_seen(),
            stats_warm: self.stats.is_full(),
            recording: self.recorder.is_some(),
        }
    }
}
