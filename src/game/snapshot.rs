//! Snapshot building: world state to the `state` wire message

use crate::ws::protocol::{
    FlagSnapshot, LeaderEntry, Leaderboards, PlayerSnapshot, RosterEntry, ServerMsg, StateSnapshot,
};

use super::phase::PhaseSystem;
use super::world::{MatchPhase, Player, World};

/// Entries per leaderboard
pub const LEADERBOARD_SIZE: usize = 3;

/// Builds snapshots for network transmission
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Build the `state` message. `now` is the simulation clock, `wall_time`
    /// the unix time reported to clients.
    pub fn build(world: &World, now: f64, wall_time: f64) -> ServerMsg {
        let roster = world
            .roster()
            .filter_map(|p| {
                p.team.map(|team| RosterEntry {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    team,
                    ready: p.ready,
                })
            })
            .collect();

        let leaders = Leaderboards {
            kills: Self::top_by(world, |p| p.kills),
            captures: Self::top_by(world, |p| p.captures),
            points: Self::top_by(world, |p| p.points),
        };

        let flags = world
            .flags
            .iter()
            .map(|f| FlagSnapshot {
                base_team: f.base_team,
                x: f.pos.x,
                z: f.pos.y,
                carrier: f.carrier.clone(),
            })
            .collect();

        let players = if world.phase == MatchPhase::Running {
            world
                .roster()
                .filter(|p| p.spawned)
                .filter_map(|p| {
                    p.team.map(|team| PlayerSnapshot {
                        id: p.id.clone(),
                        name: p.name.clone(),
                        team,
                        x: p.pos.x,
                        z: p.pos.y,
                        yaw: p.yaw,
                        speed: p.speed(),
                        lock: p.spawn_lock_remaining(now) as f32,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        ServerMsg::State(StateSnapshot {
            phase: world.phase.wire_name(),
            lobby_countdown: PhaseSystem::countdown_display(world, now),
            roster,
            leaders,
            scores: world.scores,
            flags,
            t: wall_time,
            players,
        })
    }

    /// Top team-assigned players by a stat: highest first, ties by name
    fn top_by<F>(world: &World, stat: F) -> Vec<LeaderEntry>
    where
        F: Fn(&Player) -> u32,
    {
        let mut entries: Vec<LeaderEntry> = world
            .roster()
            .filter_map(|p| {
                p.team.map(|team| LeaderEntry {
                    name: p.name.clone(),
                    team,
                    value: stat(p),
                })
            })
            .collect();

        entries.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
        entries.truncate(LEADERBOARD_SIZE);
        entries
    }
}

/// Snapshot size stats for diagnostics
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    pub total_bytes: u64,
}

impl SnapshotStats {
    pub fn record(&mut self, bytes: usize) {
        self.total_snapshots += 1;
        self.total_bytes += bytes as u64;
    }

    pub fn avg_bytes(&self) -> u64 {
        if self.total_snapshots == 0 {
            0
        } else {
            self.total_bytes / self.total_snapshots
        }
    }
}
