//! Flag pickup, carry and capture

use tracing::info;

use super::field::{Team, CAR_RADIUS, CHECK_HALF};
use super::world::{PlayerId, World};

/// Half-extent of the square a stealer must enter to pick up a flag
pub const PICKUP_HALF: f32 = CHECK_HALF + CAR_RADIUS;
/// Distance from one's own base that counts as bringing a flag home
pub const CAPTURE_RADIUS: f32 = 3.2;

/// A resolved capture
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub carrier: PlayerId,
    pub team: Team,
    /// Base team of the flag that was brought home
    pub flag: Team,
}

pub struct FlagSystem;

impl FlagSystem {
    /// Run pickup, then carry-follow and capture. Returns the capture if one
    /// resolved this tick; at most one can.
    pub fn update(world: &mut World, now: f64) -> Option<Capture> {
        Self::pickup(world);
        Self::carry_and_capture(world, now)
    }

    /// Hand uncarried flags to any eligible stealer standing on them
    pub fn pickup(world: &mut World) {
        let World { players, flags, .. } = world;

        for player in players.values_mut() {
            let Some(team) = player.team else {
                continue;
            };
            if !player.spawned {
                continue;
            }

            for flag in flags.iter_mut() {
                if flag.carrier.is_some() || flag.steal_team != team {
                    continue;
                }
                if (player.pos.x - flag.pos.x).abs() > PICKUP_HALF
                    || (player.pos.y - flag.pos.y).abs() > PICKUP_HALF
                {
                    continue;
                }

                flag.carrier = Some(player.id.clone());
                player.captures += 1;
                info!(player_id = %player.id, flag = %flag.base_team, "Flag picked up");
            }
        }
    }

    /// Move carried flags onto their carriers and score any that reached home.
    ///
    /// A flag whose carrier vanished or lost their team goes home. The first
    /// capture resets the round and ends flag processing for the tick.
    pub fn carry_and_capture(world: &mut World, now: f64) -> Option<Capture> {
        for base_team in Team::ALL {
            let Some(carrier_id) = world.flag(base_team).carrier.clone() else {
                continue;
            };

            let carrier = world
                .players
                .get(&carrier_id)
                .and_then(|p| p.team.map(|team| (team, p.pos)));
            let Some((team, pos)) = carrier else {
                world.flag_mut(base_team).reset();
                continue;
            };

            world.flag_mut(base_team).pos = pos;

            if base_team == team {
                continue;
            }
            let home = team.flag_home();
            if pos.distance_squared(home) > CAPTURE_RADIUS * CAPTURE_RADIUS {
                continue;
            }

            world.scores.award(team);
            if let Some(p) = world.players.get_mut(&carrier_id) {
                p.points += 1;
            }
            info!(
                player_id = %carrier_id,
                team = %team,
                red = world.scores.red,
                blue = world.scores.blue,
                "Flag captured"
            );

            world.reset_round(now);
            return Some(Capture {
                carrier: carrier_id,
                team,
                flag: base_team,
            });
        }
        None
    }
}
