pub mod config;
pub mod directory;
pub mod relay;

pub use config::*;
pub use directory::*;
pub use relay::*;
