//! Game simulation modules

pub mod collision;
pub mod combat;
pub mod field;
pub mod flag;
pub mod math;
pub mod r#match;
pub mod phase;
pub mod physics;
pub mod session;
pub mod snapshot;
pub mod world;

pub use r#match::{GameMatch, MatchHandle};
pub use world::PlayerId;

use tokio::sync::oneshot;

use crate::ws::protocol::ClientMsg;

/// Connection events queued for the match driver, applied at the next tick
#[derive(Debug)]
pub enum SessionEvent {
    /// A connection was accepted. Firing `kick` asks the session to close.
    Connected {
        player_id: PlayerId,
        kick: oneshot::Sender<()>,
    },
    /// A parsed client message
    Message { player_id: PlayerId, msg: ClientMsg },
    /// The connection closed, errored, or failed its heartbeat
    Disconnected { player_id: PlayerId },
}
