//! Core wiring: configuration and client state

pub mod config;
pub mod state;

pub use config::Config;
pub use state::ClientState;
