//! Lobby → countdown → running transitions driven by roster readiness

use tracing::info;

use super::world::{MatchPhase, PlayerId, World};

/// Length of the pre-match countdown
pub const COUNTDOWN_SECS: f64 = 5.0;

pub struct PhaseSystem;

impl PhaseSystem {
    /// Non-empty roster with every team-assigned player ready
    pub fn everyone_ready(world: &World) -> bool {
        let mut roster = world.roster().peekable();
        roster.peek().is_some() && roster.all(|p| p.ready)
    }

    /// Advance the phase machine once. Returns true on the tick the match
    /// starts running.
    pub fn update(world: &mut World, now: f64) -> bool {
        let ready = Self::everyone_ready(world);

        match world.phase {
            MatchPhase::Running => false,
            MatchPhase::Lobby => {
                if ready {
                    world.phase = MatchPhase::Countdown {
                        ends_at: now + COUNTDOWN_SECS,
                    };
                    info!(players = world.roster_size(), "Countdown started");
                }
                false
            }
            MatchPhase::Countdown { ends_at } => {
                if !ready {
                    world.phase = MatchPhase::Lobby;
                    info!("Countdown cancelled");
                    false
                } else if now >= ends_at {
                    Self::start_match(world, now);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Everyone on a team enters the field together under a spawn lock
    fn start_match(world: &mut World, now: f64) {
        world.phase = MatchPhase::Running;

        let ids: Vec<PlayerId> = world.roster().map(|p| p.id.clone()).collect();
        for id in &ids {
            if let Some(p) = world.players.get_mut(id) {
                p.spawned = true;
            }
            world.respawn(id, now);
        }

        info!(players = ids.len(), "Match running");
    }

    /// Whole seconds left on the countdown for display (never 0 while
    /// counting), or 0 outside a countdown
    pub fn countdown_display(world: &World, now: f64) -> u32 {
        match world.phase {
            MatchPhase::Countdown { ends_at } => (ends_at - now).ceil().max(1.0) as u32,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::field::Team;
    use crate::game::world::tests::add_player;
    use glam::Vec2;
    use crate::game::world::SPAWN_LOCK_SECS;

    fn lobby_with_two() -> (World, PlayerId, PlayerId) {
        let mut world = World::new();
        let r = add_player(&mut world, "r", Some(Team::Red), Vec2::new(-200.0, 0.0));
        let b = add_player(&mut world, "b", Some(Team::Blue), Vec2::new(-200.0, 0.0));
        for p in world.players.values_mut() {
            p.spawned = false;
        }
        (world, r, b)
    }

    #[test]
    fn countdown_starts_when_all_ready() {
        let (mut world, r, b) = lobby_with_two();
        world.players.get_mut(&r).unwrap().ready = true;
        PhaseSystem::update(&mut world, 10.0);
        assert_eq!(world.phase, MatchPhase::Lobby);

        world.players.get_mut(&b).unwrap().ready = true;
        PhaseSystem::update(&mut world, 10.0);
        assert_eq!(world.phase, MatchPhase::Countdown { ends_at: 15.0 });
        assert_eq!(PhaseSystem::countdown_display(&world, 10.0), 5);
        assert_eq!(PhaseSystem::countdown_display(&world, 14.9), 1);
    }

    #[test]
    fn countdown_cancels_when_someone_unreadies() {
        let (mut world, r, b) = lobby_with_two();
        world.players.get_mut(&r).unwrap().ready = true;
        world.players.get_mut(&b).unwrap().ready = true;
        PhaseSystem::update(&mut world, 10.0);

        world.players.get_mut(&b).unwrap().ready = false;
        PhaseSystem::update(&mut world, 12.0);

        assert_eq!(world.phase, MatchPhase::Lobby);
        assert_eq!(PhaseSystem::countdown_display(&world, 12.0), 0);
    }

    #[test]
    fn empty_roster_never_counts_down() {
        let mut world = World::new();
        let spectator = add_player(&mut world, "s", None, Vec2::new(0.0, 0.0));
        world.players.get_mut(&spectator).unwrap().ready = true;

        PhaseSystem::update(&mut world, 1.0);

        assert_eq!(world.phase, MatchPhase::Lobby);
    }

    #[test]
    fn expiry_spawns_everyone_locked() {
        let (mut world, r, b) = lobby_with_two();
        for p in world.players.values_mut() {
            p.ready = true;
        }
        PhaseSystem::update(&mut world, 10.0);
        assert!(!PhaseSystem::update(&mut world, 14.0));
        assert!(PhaseSystem::update(&mut world, 15.0));

        assert_eq!(world.phase, MatchPhase::Running);
        for (id, team) in [(&r, Team::Red), (&b, Team::Blue)] {
            let p = &world.players[id];
            assert!(p.spawned);
            assert_eq!(p.pos, team.spawn().pos);
            assert_eq!(p.spawn_lock_until, 15.0 + SPAWN_LOCK_SECS);
        }
    }

    #[test]
    fn running_ignores_readiness() {
        let (mut world, r, _) = lobby_with_two();
        world.phase = MatchPhase::Running;
        world.players.get_mut(&r).unwrap().ready = false;

        assert!(!PhaseSystem::update(&mut world, 1.0));
        assert_eq!(world.phase, MatchPhase::Running);
    }
}
