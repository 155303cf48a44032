//! Match state and authoritative tick loop

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::util::time::{physics_step, unix_secs, FrameTimer, GameClock, MAX_FRAME_DELTA, TICK_DURATION_MICROS};

use super::collision::CollisionSystem;
use super::flag::FlagSystem;
use super::phase::PhaseSystem;
use super::physics::PhysicsSystem;
use super::session::SessionSystem;
use super::snapshot::{SnapshotBuilder, SnapshotStats};
use super::world::{MatchPhase, PlayerId, World};
use super::SessionEvent;

/// How often silent players are looked for
pub const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the running match, cloned into every connection
#[derive(Clone)]
pub struct MatchHandle {
    pub events_tx: mpsc::Sender<SessionEvent>,
    /// Serialized `state` messages
    pub snapshot_tx: broadcast::Sender<Arc<str>>,
    pub player_count: Arc<AtomicUsize>,
    pub running: Arc<AtomicBool>,
}

impl MatchHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub fn phase_name(&self) -> &'static str {
        if self.running.load(Ordering::Relaxed) {
            "running"
        } else {
            "lobby"
        }
    }
}

/// The authoritative game match
pub struct GameMatch {
    world: World,
    clock: GameClock,
    frame: FrameTimer,
    idle_timeout: f64,
    events_rx: mpsc::Receiver<SessionEvent>,
    snapshot_tx: broadcast::Sender<Arc<str>>,
    /// Per-connection close triggers, used for idle eviction
    kicks: HashMap<PlayerId, oneshot::Sender<()>>,
    player_count: Arc<AtomicUsize>,
    running: Arc<AtomicBool>,
    stats: SnapshotStats,
}

impl GameMatch {
    /// Create the match and the handle connections use to reach it
    pub fn new(idle_timeout: Duration) -> (Self, MatchHandle) {
        let (events_tx, events_rx) = mpsc::channel(1024);
        let (snapshot_tx, _) = broadcast::channel(64);
        let player_count = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicBool::new(false));

        let handle = MatchHandle {
            events_tx,
            snapshot_tx: snapshot_tx.clone(),
            player_count: player_count.clone(),
            running: running.clone(),
        };

        let game_match = Self {
            world: World::new(),
            clock: GameClock::new(),
            frame: FrameTimer::new(),
            idle_timeout: idle_timeout.as_secs_f64(),
            events_rx,
            snapshot_tx,
            kicks: HashMap::new(),
            player_count,
            running,
            stats: SnapshotStats::default(),
        };

        (game_match, handle)
    }

    /// Run the authoritative tick loop until every handle is dropped
    pub async fn run(mut self) {
        info!("Match driver started");

        let mut tick_interval = interval(Duration::from_micros(TICK_DURATION_MICROS));
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut sweep_interval = interval(IDLE_SWEEP_INTERVAL);
        sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let now = self.clock.now();
                    if !self.process_events(now) {
                        break;
                    }

                    let dt = self.frame.delta();
                    Self::step(&mut self.world, dt, now);
                    self.publish_status();
                    self.broadcast_snapshot(now);
                }
                _ = sweep_interval.tick() => {
                    let now = self.clock.now();
                    self.sweep_idle(now);
                }
            }
        }

        info!(
            snapshots = self.stats.total_snapshots,
            avg_bytes = self.stats.avg_bytes(),
            "Match driver stopped"
        );
    }

    /// Drain queued connection events. Returns false once no handle is left.
    fn process_events(&mut self, now: f64) -> bool {
        loop {
            match self.events_rx.try_recv() {
                Ok(SessionEvent::Connected { player_id, kick }) => {
                    SessionSystem::connect(&mut self.world, player_id.clone(), now);
                    self.kicks.insert(player_id, kick);
                }
                Ok(SessionEvent::Message { player_id, msg }) => {
                    SessionSystem::handle_message(&mut self.world, &player_id, msg, now);
                }
                Ok(SessionEvent::Disconnected { player_id }) => {
                    self.kicks.remove(&player_id);
                    SessionSystem::disconnect(&mut self.world, &player_id);
                }
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Advance the world by one outer tick of `dt` seconds.
    ///
    /// Movement and collisions run in fixed sub-steps; flags and the phase
    /// machine run once afterwards, so a carrier tagged mid-tick has already
    /// dropped the flag before captures are checked.
    pub fn step(world: &mut World, dt: f32, now: f64) {
        let step = physics_step();
        let mut remaining = dt.min(MAX_FRAME_DELTA);

        while remaining > f32::EPSILON {
            let h = step.min(remaining);
            remaining -= h;

            for player in world.players.values_mut() {
                PhysicsSystem::integrate(player, h, now);
            }
            CollisionSystem::resolve_all(world, now);
        }

        if let Some(capture) = FlagSystem::update(world, now) {
            debug!(
                carrier = %capture.carrier,
                team = %capture.team,
                flag = %capture.flag,
                "Round reset after capture"
            );
        }
        PhaseSystem::update(world, now);
    }

    /// Remove players silent for longer than `timeout` seconds
    pub fn evict_idle(world: &mut World, now: f64, timeout: f64) -> Vec<PlayerId> {
        let idle = SessionSystem::idle_players(world, now, timeout);
        for id in &idle {
            SessionSystem::disconnect(world, id);
        }
        idle
    }

    fn sweep_idle(&mut self, now: f64) {
        for id in Self::evict_idle(&mut self.world, now, self.idle_timeout) {
            info!(player_id = %id, "Evicting idle player");
            if let Some(kick) = self.kicks.remove(&id) {
                let _ = kick.send(());
            }
        }
        self.publish_status();
    }

    fn publish_status(&self) {
        self.player_count.store(self.world.players.len(), Ordering::Relaxed);
        self.running
            .store(self.world.phase == MatchPhase::Running, Ordering::Relaxed);
    }

    fn broadcast_snapshot(&mut self, now: f64) {
        let snapshot = SnapshotBuilder::build(&self.world, now, unix_secs());
        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                self.stats.record(json.len());
                // no receivers is fine: nobody is connected
                let _ = self.snapshot_tx.send(Arc::from(json));
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize snapshot");
            }
        }

        if self.stats.total_snapshots % 600 == 0 {
            debug!(avg_bytes = self.stats.avg_bytes(), "Snapshot size");
        }
    }
}
