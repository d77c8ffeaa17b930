// Raffle deployment tooling
// Deploys the raffle, verifies it on a block explorer, runs the staging
// check and keeps the front end's constant files current

pub mod chain;
pub mod config;
pub mod deploy;
pub mod error;
pub mod front_end;
pub mod idl;
pub mod listener;
pub mod staging;
pub mod verify;

pub use error::{DeployError, Result};

/// Install the `env_logger` backend; `RUST_LOG` overrides the `info` default
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();
}
