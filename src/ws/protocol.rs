//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::game::field::Team;
use crate::game::world::{PlayerId, TeamScores};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Introduce the player: display name and team choice
    Hello {
        #[serde(default)]
        name: Option<String>,
        /// "red", "blue", or anything else for no team
        #[serde(default)]
        team: Option<String>,
    },

    /// Toggle lobby readiness
    Ready {
        #[serde(default)]
        ready: bool,
    },

    /// Ask to be placed on the field while the match is running
    Spawn,

    /// Current movement intent and facing
    Input {
        /// Forward
        #[serde(default)]
        w: bool,
        /// Strafe left
        #[serde(default)]
        a: bool,
        /// Back
        #[serde(default)]
        s: bool,
        /// Strafe right
        #[serde(default)]
        d: bool,
        /// Dash
        #[serde(default)]
        r: bool,
        /// Facing angle in radians
        #[serde(default)]
        yaw: Option<f32>,
    },

    /// Any message type this server does not understand
    #[serde(other)]
    Unknown,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Sent once after the connection is accepted
    Welcome { id: PlayerId, name: String },

    /// World snapshot, broadcast every tick
    State(StateSnapshot),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// "lobby" or "running"
    pub phase: &'static str,
    /// Whole seconds left before the match starts (0 when not counting down)
    pub lobby_countdown: u32,
    pub roster: Vec<RosterEntry>,
    pub leaders: Leaderboards,
    pub scores: TeamScores,
    pub flags: Vec<FlagSnapshot>,
    /// Server wall-clock time in unix seconds
    pub t: f64,
    /// Spawned players; empty unless the match is running
    pub players: Vec<PlayerSnapshot>,
}

/// Lobby roster line
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
    pub ready: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Leaderboards {
    pub kills: Vec<LeaderEntry>,
    pub captures: Vec<LeaderEntry>,
    pub points: Vec<LeaderEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderEntry {
    pub name: String,
    pub team: Team,
    pub value: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagSnapshot {
    pub base_team: Team,
    pub x: f32,
    pub z: f32,
    pub carrier: Option<PlayerId>,
}

/// Live transform of a spawned player
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
    pub x: f32,
    pub z: f32,
    pub yaw: f32,
    pub speed: f32,
    /// Seconds of spawn lock remaining
    pub lock: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_input_with_defaults() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"input","w":true,"yaw":1.5}"#).unwrap();
        assert_eq!(
            msg,
            ClientMsg::Input {
                w: true,
                a: false,
                s: false,
                d: false,
                r: false,
                yaw: Some(1.5),
            }
        );
    }

    #[test]
    fn parses_hello_with_null_team() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"hello","name":"Ace","team":null}"#).unwrap();
        assert_eq!(
            msg,
            ClientMsg::Hello {
                name: Some("Ace".to_string()),
                team: None,
            }
        );
    }

    #[test]
    fn unit_message_tolerates_extra_fields() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"spawn","extra":1}"#).unwrap();
        assert_eq!(msg, ClientMsg::Spawn);
    }

    #[test]
    fn unknown_type_falls_through() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"emote","id":3}"#).unwrap();
        assert_eq!(msg, ClientMsg::Unknown);
    }

    #[test]
    fn malformed_frames_fail_to_parse() {
        assert!(serde_json::from_str::<ClientMsg>("not json").is_err());
        assert!(serde_json::from_str::<ClientMsg>(r#"{"w":true}"#).is_err());
        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"ready","ready":"yes"}"#).is_err());
    }

    #[test]
    fn welcome_wire_shape() {
        let msg = ServerMsg::Welcome {
            id: PlayerId::from("abc"),
            name: "Player".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "welcome");
        assert_eq!(json["id"], "abc");
        assert_eq!(json["name"], "Player");
    }

    #[test]
    fn flag_snapshot_uses_camel_case() {
        let flag = FlagSnapshot {
            base_team: Team::Red,
            x: -195.0,
            z: 0.0,
            carrier: None,
        };
        let json = serde_json::to_value(&flag).unwrap();
        assert_eq!(json["baseTeam"], "red");
        assert!(json["carrier"].is_null());
    }
}
