//! Vehicle-vs-vehicle contact: oriented-box separation, impulse exchange and
//! the pre/post contact tag checks

use glam::Vec2;

use super::combat::{CombatSystem, TagOutcome};
use super::field::{CAR_HALF_X, CAR_HALF_Z, CAR_RADIUS};
use super::math::{obb_contact, Obb};
use super::world::{Player, PlayerId, World};

/// Restitution for car-to-car contact (0..1)
pub const PLAYER_BOUNCE: f32 = 0.35;
/// Fraction of tangential relative velocity kept on contact (0..1)
pub const PLAYER_FRICTION: f32 = 0.92;
/// Centre distance within which the tag rule is checked before contact
pub const TAG_RADIUS: f32 = CAR_RADIUS * 2.0 + 0.35;

/// Collision system for resolving every active pair once per sub-step
pub struct CollisionSystem;

impl CollisionSystem {
    /// Collision shape of a vehicle
    pub fn vehicle_box(player: &Player) -> Obb {
        Obb::new(player.pos, player.yaw, CAR_HALF_X, CAR_HALF_Z)
    }

    /// Resolve all unordered pairs of active players.
    ///
    /// Activity is rechecked per pair: a player tagged earlier in the pass is
    /// spawn-locked and drops out of the remaining pairs.
    pub fn resolve_all(world: &mut World, now: f64) {
        let ids: Vec<PlayerId> = world
            .players
            .values()
            .filter(|p| p.is_active(now))
            .map(|p| p.id.clone())
            .collect();

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                Self::resolve_pair(world, &ids[i], &ids[j], now);
            }
        }
    }

    fn resolve_pair(world: &mut World, a_id: &PlayerId, b_id: &PlayerId, now: f64) {
        let (Some(a), Some(b)) = (world.players.get(a_id), world.players.get(b_id)) else {
            return;
        };
        if !a.is_active(now) || !b.is_active(now) {
            return;
        }

        let contact = obb_contact(&Self::vehicle_box(a), &Self::vehicle_box(b));
        let close = a.pos.distance_squared(b.pos) <= TAG_RADIUS * TAG_RADIUS;
        let (va, vb) = (a.velocity(), b.velocity());

        // Tags reachable without contact
        let pre = if close {
            CombatSystem::resolve_tags(world, a_id, b_id, now)
        } else {
            TagOutcome::default()
        };

        if let Some(contact) = contact {
            let push = contact.normal * (contact.depth / 2.0);
            let (va, vb) = Self::exchange_impulse(va, vb, contact.normal);

            // A player already sent back to spawn keeps its respawn state
            if !pre.first_tagged {
                if let Some(a) = world.players.get_mut(a_id) {
                    a.pos -= push;
                    a.set_velocity(va);
                }
            }
            if !pre.second_tagged {
                if let Some(b) = world.players.get_mut(b_id) {
                    b.pos += push;
                    b.set_velocity(vb);
                }
            }
        }

        // Tags reachable through the separation step
        CombatSystem::resolve_tags(world, a_id, b_id, now);
    }

    /// Restitution impulse along `normal` (pointing from a to b) plus
    /// tangential damping, split evenly. Separating pairs are left alone.
    pub fn exchange_impulse(mut va: Vec2, mut vb: Vec2, normal: Vec2) -> (Vec2, Vec2) {
        let rel_n = (vb - va).dot(normal);
        if rel_n >= 0.0 {
            return (va, vb);
        }

        let j = -(1.0 + PLAYER_BOUNCE) * rel_n / 2.0;
        va -= normal * j;
        vb += normal * j;

        let tangent = normal.perp();
        let rel_t = (vb - va).dot(tangent);
        let jt = rel_t * (1.0 - PLAYER_FRICTION) / 2.0;
        va += tangent * jt;
        vb -= tangent * jt;

        (va, vb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::field::Team;
    use crate::game::world::tests::add_player;
    use std::f32::consts::FRAC_PI_4;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn overlap_depth(world: &World, a: &PlayerId, b: &PlayerId) -> f32 {
        let ba = CollisionSystem::vehicle_box(&world.players[a]);
        let bb = CollisionSystem::vehicle_box(&world.players[b]);
        obb_contact(&ba, &bb).map_or(0.0, |c| c.depth)
    }

    #[test]
    fn head_on_teammates_separate_and_bounce() {
        let mut world = World::new();
        let a = add_player(&mut world, "a", Some(Team::Red), Vec2::new(-50.0, 0.0));
        let b = add_player(&mut world, "b", Some(Team::Red), Vec2::new(-48.5, 0.0));
        world.players.get_mut(&a).unwrap().set_velocity(Vec2::new(10.0, 0.0));
        world.players.get_mut(&b).unwrap().set_velocity(Vec2::new(-10.0, 0.0));

        CollisionSystem::resolve_all(&mut world, 0.0);

        let (pa, pb) = (&world.players[&a], &world.players[&b]);
        assert!(approx(pa.pos.x, -50.25));
        assert!(approx(pb.pos.x, -48.25));
        assert!(approx(pa.velocity().x, -3.5));
        assert!(approx(pb.velocity().x, 3.5));
        assert!(approx(pa.speed(), 3.5));
        assert!(overlap_depth(&world, &a, &b) < 1e-4);
    }

    #[test]
    fn rotated_overlap_separates_within_two_passes() {
        let mut world = World::new();
        let a = add_player(&mut world, "a", Some(Team::Blue), Vec2::new(60.0, 0.0));
        let b = add_player(&mut world, "b", Some(Team::Blue), Vec2::new(61.2, 0.7));
        world.players.get_mut(&b).unwrap().yaw = FRAC_PI_4;

        CollisionSystem::resolve_all(&mut world, 0.0);
        CollisionSystem::resolve_all(&mut world, 0.0);

        assert!(overlap_depth(&world, &a, &b) < 1e-3);
    }

    #[test]
    fn separating_pair_keeps_velocity() {
        let (va, vb) = CollisionSystem::exchange_impulse(
            Vec2::new(-5.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(1.0, 0.0),
        );
        assert_eq!(va, Vec2::new(-5.0, 0.0));
        assert_eq!(vb, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn tangential_motion_is_damped() {
        let (va, vb) = CollisionSystem::exchange_impulse(
            Vec2::new(0.0, 10.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
        );
        // relative tangential speed shrinks by the friction factor
        let before = -10.0;
        let after = (vb - va).dot(Vec2::new(0.0, 1.0));
        assert!(approx(after, before * PLAYER_FRICTION));
    }

    #[test]
    fn spawn_locked_players_are_ignored() {
        let mut world = World::new();
        let a = add_player(&mut world, "a", Some(Team::Red), Vec2::new(-50.0, 0.0));
        let b = add_player(&mut world, "b", Some(Team::Red), Vec2::new(-49.0, 0.0));
        world.players.get_mut(&b).unwrap().spawn_lock_until = 5.0;

        CollisionSystem::resolve_all(&mut world, 1.0);

        assert_eq!(world.players[&a].pos, Vec2::new(-50.0, 0.0));
        assert_eq!(world.players[&b].pos, Vec2::new(-49.0, 0.0));
    }

    #[test]
    fn teamless_and_unspawned_players_are_ignored() {
        let mut world = World::new();
        let a = add_player(&mut world, "a", None, Vec2::new(-50.0, 0.0));
        let b = add_player(&mut world, "b", Some(Team::Red), Vec2::new(-49.0, 0.0));
        let c = add_player(&mut world, "c", Some(Team::Red), Vec2::new(-49.5, 0.5));
        world.players.get_mut(&c).unwrap().spawned = false;

        CollisionSystem::resolve_all(&mut world, 1.0);

        assert_eq!(world.players[&a].pos, Vec2::new(-50.0, 0.0));
        assert_eq!(world.players[&b].pos, Vec2::new(-49.0, 0.0));
        assert_eq!(world.players[&c].pos, Vec2::new(-49.5, 0.5));
    }

    #[test]
    fn close_runner_is_tagged_before_contact() {
        let mut world = World::new();
        let blue = add_player(&mut world, "blue", Some(Team::Blue), Vec2::new(-10.0, 0.0));
        let red = add_player(&mut world, "red", Some(Team::Red), Vec2::new(-12.2, 0.0));

        CollisionSystem::resolve_all(&mut world, 1.0);

        assert_eq!(world.players[&red].kills, 1);
        assert_eq!(world.players[&blue].pos, Team::Blue.spawn().pos);
        assert_eq!(world.players[&blue].speed(), 0.0);
        assert_eq!(world.players[&blue].kills, 0);
    }

    #[test]
    fn tagger_separated_onto_enemy_half_is_tagged_back() {
        let mut world = World::new();
        let blue = add_player(&mut world, "a", Some(Team::Blue), Vec2::new(-1.5, 0.0));
        let red = add_player(&mut world, "b", Some(Team::Red), Vec2::new(-0.05, 0.0));

        CollisionSystem::resolve_all(&mut world, 1.0);

        // blue is caught on the red half first
        assert_eq!(world.players[&red].kills, 1);
        assert_eq!(world.players[&blue].pos, Team::Blue.spawn().pos);

        // red still takes its half of the 0.55 overlap, lands at x = 0.225
        // and is caught on the blue half
        assert_eq!(world.players[&blue].kills, 1);
        let tagger = &world.players[&red];
        assert_eq!(tagger.pos, Team::Red.spawn().pos);
        assert!(tagger.is_spawn_locked(1.0));
    }

    #[test]
    fn tagger_keeps_separation_and_impulse_after_pre_contact_tag() {
        let mut world = World::new();
        let blue = add_player(&mut world, "a", Some(Team::Blue), Vec2::new(-11.5, 0.0));
        let red = add_player(&mut world, "b", Some(Team::Red), Vec2::new(-10.0, 0.0));
        world.players.get_mut(&red).unwrap().set_velocity(Vec2::new(-10.0, 0.0));

        CollisionSystem::resolve_all(&mut world, 1.0);

        assert_eq!(world.players[&red].kills, 1);
        assert_eq!(world.players[&blue].pos, Team::Blue.spawn().pos);
        assert_eq!(world.players[&blue].speed(), 0.0);

        // red is pushed by half the 0.5 overlap and bounced off the old contact
        let tagger = &world.players[&red];
        assert!(approx(tagger.pos.x, -9.75));
        assert!(approx(tagger.velocity().x, -10.0 + 6.75));
        assert_eq!(world.players[&blue].kills, 0);
    }

    #[test]
    fn corner_contact_outside_tag_radius_tags_after_separation() {
        let mut world = World::new();
        let blue = add_player(&mut world, "blue", Some(Team::Blue), Vec2::new(-10.0, 0.0));
        let red = add_player(&mut world, "red", Some(Team::Red), Vec2::new(-12.4, 0.0));
        world.players.get_mut(&blue).unwrap().yaw = FRAC_PI_4;
        world.players.get_mut(&blue).unwrap().set_velocity(Vec2::new(-20.0, 0.0));

        CollisionSystem::resolve_all(&mut world, 1.0);

        assert_eq!(world.players[&red].kills, 1);
        let runner = &world.players[&blue];
        assert_eq!(runner.pos, Team::Blue.spawn().pos);
        assert_eq!(runner.speed(), 0.0);
        assert!(runner.is_spawn_locked(1.0));
    }

    #[test]
    fn runner_in_end_zone_only_bounces() {
        let mut world = World::new();
        let blue = add_player(&mut world, "blue", Some(Team::Blue), Vec2::new(-235.0, 0.0));
        let red = add_player(&mut world, "red", Some(Team::Red), Vec2::new(-233.5, 0.0));

        CollisionSystem::resolve_all(&mut world, 1.0);

        assert_eq!(world.players[&red].kills, 0);
        assert!(approx(world.players[&blue].pos.x, -235.25));
        assert!(approx(world.players[&red].pos.x, -233.25));
    }
}
