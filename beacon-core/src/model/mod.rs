mod peer;
mod room;
mod signaling;

pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{ClientMessage, ServerMessage};
