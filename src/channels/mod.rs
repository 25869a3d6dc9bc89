//! Channel scheduler.
//!
//! Each started channel gets one background task that advances a simulated
//! playback position once per tick and loops through the channel's playlist.
//! The task is the only writer of its [`ChannelState`]; HTTP handlers read
//! the shared map without ever waiting on a task.
//!
//! Per-channel lifecycle: `Stopped -> Starting -> Running -> Stopped`.

pub mod playlist;
pub mod probe;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use homereel_common::{Error, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ChannelDefinition;
pub use probe::{DurationProbe, FfprobeDurationProbe, StaticDurationProbe};

/// Where a running channel currently is.
#[derive(Debug, Clone)]
pub struct ChannelState {
    pub channel_id: String,
    pub playlist: Arc<[PathBuf]>,
    /// Always a valid index into `playlist`.
    pub current_index: usize,
    /// Elapsed milliseconds into the current video.
    pub position_ms: u64,
    /// `None` when the duration could not be determined.
    pub duration_ms: Option<u64>,
    pub last_updated: DateTime<Utc>,
    generation: u64,
}

impl ChannelState {
    pub fn current_file(&self) -> &Path {
        &self.playlist[self.current_index]
    }
}

fn duration_ms(duration: Option<Duration>) -> Option<u64> {
    duration
        .map(|d| d.as_millis() as u64)
        .filter(|ms| *ms > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Stopped,
    Starting,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// The channel was already starting or running; nothing changed.
    AlreadyRunning,
    /// A stop or shutdown arrived while the playlist was being resolved.
    Cancelled,
}

enum Slot {
    Starting(u64),
    Running {
        generation: u64,
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    },
}

impl Slot {
    fn generation(&self) -> u64 {
        match self {
            Slot::Starting(generation) => *generation,
            Slot::Running { generation, .. } => *generation,
        }
    }
}

/// Releases a `Starting` slot if the start never completes, including when
/// the start future is dropped.
struct StartGuard<'a> {
    tasks: &'a Mutex<HashMap<String, Slot>>,
    id: &'a str,
    generation: u64,
    armed: bool,
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut tasks = self.tasks.lock();
        if let Some(Slot::Starting(generation)) = tasks.get(self.id) {
            if *generation == self.generation {
                tasks.remove(self.id);
            }
        }
    }
}

pub struct ChannelScheduler {
    states: Arc<DashMap<String, ChannelState>>,
    tasks: Mutex<HashMap<String, Slot>>,
    generation: AtomicU64,
    probe: Arc<dyn DurationProbe>,
    tick: Duration,
    root: Mutex<CancellationToken>,
}

impl ChannelScheduler {
    pub fn new(probe: Arc<dyn DurationProbe>, tick: Duration) -> Self {
        Self {
            states: Arc::new(DashMap::new()),
            tasks: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            probe,
            tick,
            root: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Start `definition` unless it is already starting or running.
    ///
    /// Fails with [`Error::ChannelResolutionEmpty`] when its folders hold no
    /// videos; the channel then stays stopped.
    pub async fn start_channel(&self, definition: &ChannelDefinition) -> Result<StartOutcome> {
        let id = definition.id.as_str();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        {
            let mut tasks = self.tasks.lock();
            if tasks.contains_key(id) {
                return Ok(StartOutcome::AlreadyRunning);
            }
            tasks.insert(id.to_string(), Slot::Starting(generation));
        }
        let mut guard = StartGuard {
            tasks: &self.tasks,
            id,
            generation,
            armed: true,
        };

        let def = definition.clone();
        let playlist = tokio::task::spawn_blocking(move || playlist::resolve(&def))
            .await
            .map_err(|e| Error::internal(format!("Playlist resolution failed: {e}")))?;

        if playlist.is_empty() {
            tracing::warn!(channel_id = %id, "Channel has no playable files");
            return Err(Error::ChannelResolutionEmpty(id.to_string()));
        }

        let duration = self.probe.duration(&playlist[0]).await;

        let mut tasks = self.tasks.lock();
        match tasks.get(id) {
            Some(slot) if slot.generation() == generation => {}
            _ => {
                tracing::debug!(channel_id = %id, "Channel start cancelled");
                return Ok(StartOutcome::Cancelled);
            }
        }

        let cancel = self.root.lock().child_token();
        let state = ChannelState {
            channel_id: id.to_string(),
            playlist: playlist.clone(),
            current_index: 0,
            position_ms: 0,
            duration_ms: duration_ms(duration),
            last_updated: Utc::now(),
            generation,
        };
        self.states.insert(id.to_string(), state);

        let handle = tokio::spawn(run_channel(ChannelTask {
            states: self.states.clone(),
            id: id.to_string(),
            generation,
            playlist,
            duration,
            probe: self.probe.clone(),
            tick: self.tick,
            cancel: cancel.clone(),
        }));

        tasks.insert(
            id.to_string(),
            Slot::Running {
                generation,
                cancel,
                handle,
            },
        );
        guard.armed = false;

        tracing::info!(channel_id = %id, "Channel started");
        Ok(StartOutcome::Started)
    }

    /// Start every active definition. Failures are logged and do not affect
    /// the other channels.
    pub async fn start_all(&self, definitions: &[ChannelDefinition]) -> usize {
        let mut started = 0;
        for definition in definitions.iter().filter(|d| d.active) {
            match self.start_channel(definition).await {
                Ok(StartOutcome::Started) => started += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(channel_id = %definition.id, "Failed to start channel: {}", e)
                }
            }
        }
        started
    }

    /// Stop a channel and remove its state. Returns `false` if it was not
    /// starting or running.
    pub async fn stop_channel(&self, id: &str) -> bool {
        let slot = self.tasks.lock().remove(id);
        match slot {
            None => false,
            Some(Slot::Starting(_)) => true,
            Some(Slot::Running {
                generation,
                cancel,
                handle,
            }) => {
                cancel.cancel();
                self.states.remove_if(id, |_, s| s.generation == generation);
                await_task(id, handle).await;
                tracing::info!(channel_id = %id, "Channel stopped");
                true
            }
        }
    }

    pub fn get_channel_state(&self, id: &str) -> Option<ChannelState> {
        self.states.get(id).map(|s| s.value().clone())
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    pub fn status(&self, id: &str) -> ChannelStatus {
        match self.tasks.lock().get(id) {
            None => ChannelStatus::Stopped,
            Some(Slot::Starting(_)) => ChannelStatus::Starting,
            Some(Slot::Running { .. }) => ChannelStatus::Running,
        }
    }

    /// Ids of running channels, sorted.
    pub fn active_channels(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.states.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Cancel every channel task and wait for them to finish.
    ///
    /// The scheduler can start channels again afterwards.
    pub async fn shutdown(&self) {
        let drained: Vec<(String, Slot)> = self.tasks.lock().drain().collect();

        {
            let mut root = self.root.lock();
            root.cancel();
            *root = CancellationToken::new();
        }

        let count = drained.len();
        for (id, slot) in drained {
            if let Slot::Running { handle, .. } = slot {
                await_task(&id, handle).await;
            }
        }
        self.states.clear();

        if count > 0 {
            tracing::info!(channels = count, "Channel scheduler shut down");
        }
    }
}

impl Drop for ChannelScheduler {
    fn drop(&mut self) {
        self.root.get_mut().cancel();
    }
}

async fn await_task(id: &str, handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        if e.is_panic() {
            tracing::error!(channel_id = %id, "Channel task panicked: {}", e);
        }
    }
}

struct ChannelTask {
    states: Arc<DashMap<String, ChannelState>>,
    id: String,
    generation: u64,
    playlist: Arc<[PathBuf]>,
    duration: Option<Duration>,
    probe: Arc<dyn DurationProbe>,
    tick: Duration,
    cancel: CancellationToken,
}

async fn run_channel(task: ChannelTask) {
    let ChannelTask {
        states,
        id,
        generation,
        playlist,
        mut duration,
        probe,
        tick,
        cancel,
    } = task;

    let mut index = 0usize;
    let mut position = Duration::ZERO;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(tick) => {}
        }

        position += tick;
        let finished = match duration {
            Some(d) if !d.is_zero() => position >= d,
            _ => true,
        };

        if finished {
            index = (index + 1) % playlist.len();
            position = Duration::ZERO;
            duration = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                d = probe.duration(&playlist[index]) => d,
            };
            tracing::debug!(channel_id = %id, index, "Channel advanced to {:?}", playlist[index]);
        }

        let published = match states.get_mut(&id) {
            Some(mut state) if state.generation == generation => {
                state.current_index = index;
                state.position_ms = position.as_millis() as u64;
                state.duration_ms = duration_ms(duration);
                state.last_updated = Utc::now();
                true
            }
            _ => false,
        };
        if !published {
            break;
        }
    }

    tracing::debug!(channel_id = %id, "Channel task exited");
}
