use clap::Parser;
use std::net::SocketAddr;

/// Room-based WebRTC signaling relay.
#[derive(Debug, Parser)]
#[command(name = "beacon-server", version)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "BEACON_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,
}
