//! Field layout: teams, halves, end zones, spawn points and flag bases
//!
//! The field is a square centred on the origin. Red defends the negative-x
//! half, blue the positive-x half; the midline is x = 0.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use serde::{Deserialize, Serialize};


pub const FIELD_SIZE: f32 = 500.0;
pub const HALF: f32 = FIELD_SIZE / 2.0;
pub const WALL_THICK: f32 = 4.0;

/// Vehicle collision half-extents (right, forward)
pub const CAR_HALF_X: f32 = 1.0;
pub const CAR_HALF_Z: f32 = 1.0;
pub const CAR_RADIUS: f32 = 1.0;

/// Width of the protected strip at each end of the field
pub const ZONE_WIDTH: f32 = 25.0;
/// Tolerance around the protected-strip line when deciding tags
pub const TAG_EPS: f32 = 0.75;

pub const RED_SAFE_X: f32 = -HALF + ZONE_WIDTH;
pub const BLUE_SAFE_X: f32 = HALF - ZONE_WIDTH;

const YELLOW_DEPTH: f32 = 50.0;
/// Distance from the end strip to the checkerboard base
const FRONT_OFFSET: f32 = 5.0;
/// Distance from the checkerboard toward the midline where players spawn
const SPAWN_OFFSET: f32 = 30.0;

const RED_BASE_X: f32 = -(HALF - YELLOW_DEPTH) + FRONT_OFFSET;
const BLUE_BASE_X: f32 = (HALF - YELLOW_DEPTH) - FRONT_OFFSET;

/// Half-extent of the checkerboard a flag sits on
pub const CHECK_HALF: f32 = 2.5;

/// Inner playable bound on each axis for a vehicle centre (the car is square,
/// so either half-extent works as the margin)
pub const PLAY_BOUND: f32 = HALF - WALL_THICK / 2.0 - CAR_HALF_X;

/// Where a player is parked before they are placed on the field
pub const PLACEHOLDER_POS: Vec2 = Vec2::new(-200.0, 0.0);
pub const PLACEHOLDER_YAW: f32 = FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
}

/// A spawn point with facing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub pos: Vec2,
    pub yaw: f32,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Parse a client-supplied team name; anything else means "no team"
    pub fn parse(name: &str) -> Option<Team> {
        match name {
            "red" => Some(Team::Red),
            "blue" => Some(Team::Blue),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Team::Red => "red",
            Team::Blue => "blue",
        }
    }

    /// Checkerboard where this team's flag lives and where it scores
    pub fn flag_home(self) -> Vec2 {
        match self {
            Team::Red => Vec2::new(RED_BASE_X, 0.0),
            Team::Blue => Vec2::new(BLUE_BASE_X, 0.0),
        }
    }

    /// Spawn point, facing the midline
    pub fn spawn(self) -> SpawnPoint {
        match self {
            Team::Red => SpawnPoint {
                pos: Vec2::new(RED_BASE_X + SPAWN_OFFSET, 0.0),
                yaw: FRAC_PI_2,
            },
            Team::Blue => SpawnPoint {
                pos: Vec2::new(BLUE_BASE_X - SPAWN_OFFSET, 0.0),
                yaw: -FRAC_PI_2,
            },
        }
    }

    /// Own half for speed caps; the midline itself counts as home
    pub fn on_home_half(self, x: f32) -> bool {
        match self {
            Team::Red => x <= 0.0,
            Team::Blue => x >= 0.0,
        }
    }

    /// Own half for dash eligibility; strictly off the midline
    pub fn strictly_on_home_half(self, x: f32) -> bool {
        match self {
            Team::Red => x < 0.0,
            Team::Blue => x > 0.0,
        }
    }

    /// Whether a player of this team standing at `x` may be tagged: on the
    /// enemy half and clear of the enemy's end strip (plus tolerance).
    pub fn is_taggable_at(self, x: f32) -> bool {
        match self {
            Team::Blue => x < 0.0 && x > RED_SAFE_X + TAG_EPS,
            Team::Red => x > 0.0 && x < BLUE_SAFE_X - TAG_EPS,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_constants() {
        assert_eq!(RED_SAFE_X, -225.0);
        assert_eq!(BLUE_SAFE_X, 225.0);
        assert_eq!(PLAY_BOUND, 247.0);
        assert_eq!(Team::Red.flag_home(), Vec2::new(-195.0, 0.0));
        assert_eq!(Team::Blue.flag_home(), Vec2::new(195.0, 0.0));
        assert_eq!(Team::Red.spawn().pos, Vec2::new(-165.0, 0.0));
        assert_eq!(Team::Blue.spawn().pos, Vec2::new(165.0, 0.0));
    }

    #[test]
    fn spawns_face_midline() {
        assert!(Team::Red.spawn().yaw.sin() > 0.0);
        assert!(Team::Blue.spawn().yaw.sin() < 0.0);
    }

    #[test]
    fn blue_runner_in_open_red_half_is_taggable() {
        assert!(Team::Blue.is_taggable_at(-10.0));
        assert!(Team::Blue.is_taggable_at(-224.0));
    }

    #[test]
    fn blue_runner_in_red_end_zone_is_safe() {
        assert!(!Team::Blue.is_taggable_at(RED_SAFE_X));
        assert!(!Team::Blue.is_taggable_at(RED_SAFE_X + TAG_EPS));
        assert!(!Team::Blue.is_taggable_at(-240.0));
    }

    #[test]
    fn nobody_is_taggable_on_their_own_half() {
        assert!(!Team::Blue.is_taggable_at(10.0));
        assert!(!Team::Red.is_taggable_at(-10.0));
        assert!(!Team::Red.is_taggable_at(0.0));
    }

    #[test]
    fn red_runner_mirrors_blue() {
        assert!(Team::Red.is_taggable_at(10.0));
        assert!(!Team::Red.is_taggable_at(BLUE_SAFE_X - TAG_EPS));
    }

    #[test]
    fn midline_is_home_for_caps_but_not_for_dash() {
        assert!(Team::Red.on_home_half(0.0));
        assert!(Team::Blue.on_home_half(0.0));
        assert!(!Team::Red.strictly_on_home_half(0.0));
        assert!(!Team::Blue.strictly_on_home_half(0.0));
    }

    #[test]
    fn team_parse() {
        assert_eq!(Team::parse("red"), Some(Team::Red));
        assert_eq!(Team::parse("blue"), Some(Team::Blue));
        assert_eq!(Team::parse("green"), None);
        assert_eq!(Team::Red.opponent(), Team::Blue);
    }
}
