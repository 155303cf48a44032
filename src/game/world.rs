//! Entity store: players, flags, scores and match phase for the single match
//!
//! The `World` is owned by the match driver and passed by reference into
//! every simulation system. Timestamps are seconds on the driver's
//! monotonic [`GameClock`](crate::util::time::GameClock).

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::field::{Team, PLACEHOLDER_POS, PLACEHOLDER_YAW};

/// Seconds a player stays frozen and untouchable after (re)spawning
pub const SPAWN_LOCK_SECS: f64 = 3.0;

pub const DEFAULT_NAME: &str = "Player";

/// Opaque connection identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Fresh random identity for a newly accepted connection
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directional and dash intent as last reported by the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub dash: bool,
}

impl InputState {
    /// Forward wish scalar in [-1, 1]
    pub fn forward_axis(&self) -> f32 {
        (self.forward as i8 - self.back as i8) as f32
    }

    /// Strafe wish scalar in [-1, 1], positive to the left
    pub fn strafe_axis(&self) -> f32 {
        (self.left as i8 - self.right as i8) as f32
    }
}

/// Authoritative player record
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team: Option<Team>,
    pub spawned: bool,
    pub ready: bool,

    // Transform
    pub pos: Vec2,
    pub yaw: f32,
    vel: Vec2,
    speed: f32,

    pub input: InputState,
    pub spawn_lock_until: f64,
    pub last_dash_at: f64,
    pub dash_until: f64,

    // Stats
    pub kills: u32,
    pub captures: u32,
    pub points: u32,

    /// Last time any message arrived from this player's connection
    pub last_seen: f64,
}

impl Player {
    pub fn new(id: PlayerId, now: f64) -> Self {
        Self {
            id,
            name: DEFAULT_NAME.to_string(),
            team: None,
            spawned: false,
            ready: false,
            pos: PLACEHOLDER_POS,
            yaw: PLACEHOLDER_YAW,
            vel: Vec2::ZERO,
            speed: 0.0,
            input: InputState::default(),
            spawn_lock_until: 0.0,
            // far enough in the past that the first dash is available at once
            last_dash_at: -100.0,
            dash_until: 0.0,
            kills: 0,
            captures: 0,
            points: 0,
            last_seen: now,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.vel
    }

    /// Always equal to the length of [`velocity`](Self::velocity)
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_velocity(&mut self, vel: Vec2) {
        self.vel = vel;
        self.speed = vel.length();
    }

    pub fn stop(&mut self) {
        self.set_velocity(Vec2::ZERO);
    }

    pub fn is_spawn_locked(&self, now: f64) -> bool {
        now < self.spawn_lock_until
    }

    pub fn is_dashing(&self, now: f64) -> bool {
        now < self.dash_until
    }

    /// On the field and taking part in collisions and tags
    pub fn is_active(&self, now: f64) -> bool {
        self.team.is_some() && self.spawned && !self.is_spawn_locked(now)
    }

    pub fn spawn_lock_remaining(&self, now: f64) -> f64 {
        (self.spawn_lock_until - now).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    /// Team whose base this flag belongs to
    pub base_team: Team,
    /// Team allowed to pick it up
    pub steal_team: Team,
    pub pos: Vec2,
    pub carrier: Option<PlayerId>,
}

impl Flag {
    pub fn new(base_team: Team) -> Self {
        Self {
            base_team,
            steal_team: base_team.opponent(),
            pos: base_team.flag_home(),
            carrier: None,
        }
    }

    /// Back to the home checkerboard with no carrier
    pub fn reset(&mut self) {
        self.carrier = None;
        self.pos = self.base_team.flag_home();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamScores {
    pub red: u32,
    pub blue: u32,
}

impl TeamScores {
    pub fn award(&mut self, team: Team) {
        match team {
            Team::Red => self.red += 1,
            Team::Blue => self.blue += 1,
        }
    }
}

/// Match phase. `Countdown` is the lobby with a pending start time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchPhase {
    Lobby,
    Countdown { ends_at: f64 },
    Running,
}

impl MatchPhase {
    /// Wire name; the countdown is reported as part of the lobby
    pub fn wire_name(&self) -> &'static str {
        match self {
            MatchPhase::Lobby | MatchPhase::Countdown { .. } => "lobby",
            MatchPhase::Running => "running",
        }
    }
}

/// All authoritative state for the match
#[derive(Debug, Clone)]
pub struct World {
    pub players: BTreeMap<PlayerId, Player>,
    /// Indexed by team: red first, blue second
    pub flags: [Flag; 2],
    pub scores: TeamScores,
    pub phase: MatchPhase,
}

impl World {
    pub fn new() -> Self {
        Self {
            players: BTreeMap::new(),
            flags: [Flag::new(Team::Red), Flag::new(Team::Blue)],
            scores: TeamScores::default(),
            phase: MatchPhase::Lobby,
        }
    }

    pub fn flag(&self, base_team: Team) -> &Flag {
        &self.flags[Self::flag_index(base_team)]
    }

    pub fn flag_mut(&mut self, base_team: Team) -> &mut Flag {
        &mut self.flags[Self::flag_index(base_team)]
    }

    fn flag_index(team: Team) -> usize {
        match team {
            Team::Red => 0,
            Team::Blue => 1,
        }
    }

    /// Team-assigned players
    pub fn roster(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.team.is_some())
    }

    pub fn roster_size(&self) -> usize {
        self.roster().count()
    }

    /// Return every flag carried by `id` to its base
    pub fn drop_flags_carried_by(&mut self, id: &PlayerId) {
        for flag in self.flags.iter_mut() {
            if flag.carrier.as_ref() == Some(id) {
                debug!(player_id = %id, base_team = %flag.base_team, "Flag returned to base");
                flag.reset();
            }
        }
    }

    /// Teleport a team-assigned player to their spawn, freeze them for the
    /// spawn lock and drop anything they carry
    pub fn respawn(&mut self, id: &PlayerId, now: f64) {
        let Some(player) = self.players.get_mut(id) else {
            return;
        };
        let Some(team) = player.team else {
            return;
        };

        let spawn = team.spawn();
        player.pos = spawn.pos;
        player.yaw = spawn.yaw;
        player.stop();
        player.spawn_lock_until = now + SPAWN_LOCK_SECS;

        self.drop_flags_carried_by(id);
    }

    /// Flags home, every team-assigned player back to spawn. Scores, stats and
    /// readiness are kept.
    pub fn reset_round(&mut self, now: f64) {
        for flag in self.flags.iter_mut() {
            flag.reset();
        }

        let ids: Vec<PlayerId> = self.roster().map(|p| p.id.clone()).collect();
        for id in &ids {
            self.respawn(id, now);
        }
    }

    /// Back to lobby defaults: scores zeroed, flags home, every remaining
    /// player unspawned, unready and with cleared stats
    pub fn reset_match(&mut self) {
        self.scores = TeamScores::default();
        self.phase = MatchPhase::Lobby;
        for flag in self.flags.iter_mut() {
            flag.reset();
        }

        for player in self.players.values_mut() {
            player.spawned = false;
            player.ready = false;
            player.stop();
            player.spawn_lock_until = 0.0;
            player.kills = 0;
            player.captures = 0;
            player.points = 0;
        }

        info!(players = self.players.len(), "Match reset to lobby");
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
