pub mod backends;
pub mod cli;
pub mod commands;
pub mod daemon;
pub mod handler;
pub mod rotation;
pub mod server;
pub mod utils;

pub use daemon::DaemonError;
pub use handler::Handler;
pub use rotation::RotationState;
pub use server::Server;
