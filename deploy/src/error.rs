use solana_client::{client_error::ClientError, pubsub_client::PubsubClientError};
use solana_program::program_error::ProgramError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by deployment, verification and the test harnesses
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("keypair error: {0}")]
    Keypair(String),

    #[error("rpc error: {0}")]
    Rpc(#[from] ClientError),

    #[error("subscription error: {0}")]
    Pubsub(#[from] PubsubClientError),

    #[error("program error: {0}")]
    Program(#[from] ProgramError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("verification failed: {0}")]
    Verification(String),

    #[error("no {event} event within {timeout:?}")]
    EventTimeout { event: &'static str, timeout: Duration },

    #[error("log subscription closed before {event} arrived")]
    SubscriptionClosed { event: &'static str },

    #[error("staging check failed: {0}")]
    Assertion(String),
}

pub type Result<T> = std::result::Result<T, DeployError>;
