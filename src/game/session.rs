//! Player lifecycle and protocol dispatch against the world
//!
//! Everything here runs on the match driver between ticks. Invalid requests
//! (wrong phase, no team) are silently ignored.

use tracing::{debug, info};

use crate::ws::protocol::ClientMsg;

use super::field::Team;
use super::world::{InputState, MatchPhase, Player, PlayerId, World, DEFAULT_NAME};

/// Longest display name kept, in characters
pub const NAME_MAX_CHARS: usize = 18;

pub struct SessionSystem;

impl SessionSystem {
    /// Create the player record for a freshly accepted connection
    pub fn connect(world: &mut World, id: PlayerId, now: f64) {
        info!(player_id = %id, "Player connected");
        world.players.insert(id.clone(), Player::new(id, now));
    }

    /// Remove a player and release what they held. Safe to call more than
    /// once; only the first call does anything. Returns whether it did.
    pub fn disconnect(world: &mut World, id: &PlayerId) -> bool {
        if !world.players.contains_key(id) {
            return false;
        }

        world.drop_flags_carried_by(id);
        world.players.remove(id);
        info!(player_id = %id, remaining = world.players.len(), "Player removed");

        if world.roster_size() == 0 {
            world.reset_match();
        }
        true
    }

    /// Apply one client message from `id`
    pub fn handle_message(world: &mut World, id: &PlayerId, msg: ClientMsg, now: f64) {
        let Some(player) = world.players.get_mut(id) else {
            return;
        };
        player.last_seen = now;

        match msg {
            ClientMsg::Hello { name, team } => {
                let team = team.as_deref().and_then(Team::parse);
                Self::handle_hello(world, id, Self::sanitize_name(name.as_deref()), team, now);
            }
            ClientMsg::Ready { ready } => Self::handle_ready(world, id, ready),
            ClientMsg::Spawn => Self::handle_spawn(world, id, now),
            ClientMsg::Input { w, a, s, d, r, yaw } => {
                let input = InputState {
                    forward: w,
                    back: s,
                    left: a,
                    right: d,
                    dash: r,
                };
                Self::handle_input(world, id, input, yaw);
            }
            ClientMsg::Unknown => {
                debug!(player_id = %id, "Ignoring unknown message type");
            }
        }
    }

    /// Trimmed, length-capped display name, defaulted when empty
    pub fn sanitize_name(raw: Option<&str>) -> String {
        let name: String = raw.unwrap_or(DEFAULT_NAME).trim().chars().take(NAME_MAX_CHARS).collect();
        let name = name.trim_end().to_string();
        if name.is_empty() {
            DEFAULT_NAME.to_string()
        } else {
            name
        }
    }

    fn handle_hello(world: &mut World, id: &PlayerId, name: String, team: Option<Team>, now: f64) {
        let phase = world.phase;
        let Some(player) = world.players.get_mut(id) else {
            return;
        };

        player.name = name;
        let changed = player.team != team;
        if changed {
            // a new side has to confirm again
            player.ready = false;
        }
        player.team = team;

        let respawn = match (phase, team) {
            (MatchPhase::Running, Some(_)) => !player.spawned,
            (MatchPhase::Running, None) => {
                player.spawned = false;
                false
            }
            (MatchPhase::Lobby | MatchPhase::Countdown { .. }, _) => {
                player.spawned = false;
                false
            }
        };
        if respawn {
            player.spawned = true;
        }

        info!(player_id = %id, name = %player.name, team = ?team, "Hello");

        if changed {
            world.drop_flags_carried_by(id);
        }
        if respawn {
            world.respawn(id, now);
        }
    }

    fn handle_ready(world: &mut World, id: &PlayerId, ready: bool) {
        let Some(player) = world.players.get_mut(id) else {
            return;
        };
        if player.team.is_none() {
            player.ready = false;
            return;
        }
        player.ready = ready;
        debug!(player_id = %id, ready, "Ready toggled");

        if !ready {
            if let MatchPhase::Countdown { .. } = world.phase {
                world.phase = MatchPhase::Lobby;
                info!(player_id = %id, "Countdown cancelled");
            }
        }
    }

    fn handle_spawn(world: &mut World, id: &PlayerId, now: f64) {
        if world.phase != MatchPhase::Running {
            return;
        }
        let Some(player) = world.players.get_mut(id) else {
            return;
        };
        if player.team.is_none() || player.spawned {
            return;
        }

        player.spawned = true;
        world.respawn(id, now);
    }

    fn handle_input(world: &mut World, id: &PlayerId, input: InputState, yaw: Option<f32>) {
        let running = world.phase == MatchPhase::Running;
        let Some(player) = world.players.get_mut(id) else {
            return;
        };

        // facing is accepted in any phase so the client can aim pre-spawn
        if let Some(yaw) = yaw.filter(|y| y.is_finite()) {
            player.yaw = yaw;
        }

        if running && player.team.is_some() && player.spawned {
            player.input = input;
        }
    }

    /// Players silent for longer than `timeout_secs`
    pub fn idle_players(world: &World, now: f64, timeout_secs: f64) -> Vec<PlayerId> {
        world
            .players
            .values()
            .filter(|p| now - p.last_seen > timeout_secs)
            .map(|p| p.id.clone())
            .collect()
    }
}
