
pub use test_peer::*;
pub use ws_client::*;
