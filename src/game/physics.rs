//! Vehicle movement: wish-direction acceleration, drag, dash and speed caps

use glam::Vec2;
use tracing::debug;

use super::field::{Team, PLAY_BOUND};
use super::math::{forward_from_yaw, right_from_yaw};
use super::world::Player;

/// Movement constants shared by every vehicle
#[derive(Debug, Clone, Copy)]
pub struct MovementTuning {
    /// Acceleration along the wish direction
    pub acceleration: f32,
    /// Speed cap on the player's own half
    pub max_speed_home: f32,
    /// Speed cap while attacking on the enemy half
    pub max_speed_away: f32,
    /// Exponential drag coefficient (per second)
    pub drag: f32,
    /// Velocity components smaller than this snap to zero
    pub stop_epsilon: f32,
    /// Fraction of the normal velocity reflected off a wall
    pub wall_bounce: f32,
    /// Multiplier applied to both velocity components on wall contact
    pub wall_friction: f32,
}

pub const MOVEMENT: MovementTuning = MovementTuning {
    acceleration: 105.0,
    max_speed_home: 75.0,
    max_speed_away: 50.0,
    drag: 1.5,
    stop_epsilon: 0.02,
    wall_bounce: 1.0,
    wall_friction: 0.9,
};

/// Dash ability constants
#[derive(Debug, Clone, Copy)]
pub struct DashTuning {
    pub cooldown: f64,
    pub duration: f64,
    /// Instant velocity added along the facing direction
    pub impulse: f32,
    /// Relaxed speed cap while a dash is active
    pub max_speed: f32,
}

pub const DASH: DashTuning = DashTuning {
    cooldown: 5.0,
    duration: 0.5,
    impulse: 80.0,
    max_speed: 100.0,
};

/// Physics system for advancing vehicles one sub-step
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Speed cap for a player of `team` at `x`
    pub fn speed_cap(team: Team, x: f32, dashing: bool) -> f32 {
        let cap = if team.on_home_half(x) {
            MOVEMENT.max_speed_home
        } else {
            MOVEMENT.max_speed_away
        };

        if dashing {
            cap.max(DASH.max_speed)
        } else {
            cap
        }
    }

    /// Advance one player by a sub-step of `h` seconds at time `now`.
    ///
    /// Teamless and unspawned players are left untouched; spawn-locked
    /// players are held still.
    pub fn integrate(player: &mut Player, h: f32, now: f64) {
        let Some(team) = player.team else {
            return;
        };
        if !player.spawned {
            return;
        }
        if player.is_spawn_locked(now) {
            player.stop();
            return;
        }

        let mut vel = player.velocity();

        // Wish direction in the player's yaw frame
        let forward = forward_from_yaw(player.yaw);
        let right = right_from_yaw(player.yaw);
        let wish = forward * player.input.forward_axis() + right * player.input.strafe_axis();
        let wish = wish.normalize_or_zero();
        if wish != Vec2::ZERO {
            vel += wish * (MOVEMENT.acceleration * h);
        }

        vel = vel * (-MOVEMENT.drag * h).exp();

        if player.input.dash && !player.is_dashing(now) && Self::can_dash(player, team, now) {
            player.last_dash_at = now;
            player.dash_until = now + DASH.duration;
            vel += forward * DASH.impulse;
            debug!(player_id = %player.id, "Dash");
        }

        let cap = Self::speed_cap(team, player.pos.x, player.is_dashing(now));
        let speed = vel.length();
        if speed > cap {
            vel = vel * (cap / speed);
        }

        if vel.x.abs() < MOVEMENT.stop_epsilon {
            vel.x = 0.0;
        }
        if vel.y.abs() < MOVEMENT.stop_epsilon {
            vel.y = 0.0;
        }

        let (pos, vel) = Self::clamp_to_walls(player.pos + vel * h, vel);
        player.pos = pos;
        player.set_velocity(vel);
    }

    fn can_dash(player: &Player, team: Team, now: f64) -> bool {
        now - player.last_dash_at >= DASH.cooldown && team.strictly_on_home_half(player.pos.x)
    }

    /// Keep a vehicle centre inside the walls, bouncing the velocity on contact
    fn clamp_to_walls(mut pos: Vec2, mut vel: Vec2) -> (Vec2, Vec2) {
        let mut hit = false;

        if pos.x < -PLAY_BOUND || pos.x > PLAY_BOUND {
            pos.x = pos.x.clamp(-PLAY_BOUND, PLAY_BOUND);
            vel.x = -vel.x * MOVEMENT.wall_bounce;
            hit = true;
        }
        if pos.y < -PLAY_BOUND || pos.y > PLAY_BOUND {
            pos.y = pos.y.clamp(-PLAY_BOUND, PLAY_BOUND);
            vel.y = -vel.y * MOVEMENT.wall_bounce;
            hit = true;
        }

        if hit {
            vel = vel * MOVEMENT.wall_friction;
        }
        (pos, vel)
    }
}
