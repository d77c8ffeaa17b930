// One-shot raffle event listener over a websocket log subscription
use crossbeam_channel::Receiver;
use log::{debug, warn};
use raffle::events::RaffleEvent;
use solana_client::{
    pubsub_client::{LogsSubscription, PubsubClient},
    rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter},
    rpc_response::{Response, RpcLogsResponse},
};
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::CommitmentConfig;
use std::time::{Duration, Instant};

use crate::error::{DeployError, Result};

/// Owns a log subscription mentioning one account; unsubscribes on drop
pub struct EventListener {
    logs: LogsSubscription,
    closed: bool,
}

impl EventListener {
    pub fn subscribe(ws_url: &str, address: &Pubkey) -> Result<Self> {
        let logs = PubsubClient::logs_subscribe(
            ws_url,
            RpcTransactionLogsFilter::Mentions(vec![address.to_string()]),
            RpcTransactionLogsConfig {
                commitment: Some(CommitmentConfig::confirmed()),
            },
        )?;
        debug!("Listening for logs mentioning {}", address);

        Ok(Self {
            logs,
            closed: false,
        })
    }

    /// Block until an event satisfying `matches` arrives or `timeout` elapses
    pub fn wait_for<F>(
        &self,
        event: &'static str,
        timeout: Duration,
        matches: F,
    ) -> Result<RaffleEvent>
    where
        F: Fn(&RaffleEvent) -> bool,
    {
        wait_for_event(&self.logs.1, event, timeout, matches)
    }

    /// Close the subscription now
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.logs.0.shutdown().is_err() {
            warn!("Log subscription thread panicked during shutdown");
        }
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Wait on a stream of log notifications for an event satisfying `matches`.
/// Logs of failed transactions are skipped.
pub fn wait_for_event<F>(
    receiver: &Receiver<Response<RpcLogsResponse>>,
    event: &'static str,
    timeout: Duration,
    matches: F,
) -> Result<RaffleEvent>
where
    F: Fn(&RaffleEvent) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(DeployError::EventTimeout { event, timeout });
        }

        let response = match receiver.recv_timeout(remaining) {
            Ok(response) => response.value,
            Err(err) if err.is_timeout() => {
                return Err(DeployError::EventTimeout { event, timeout })
            }
            Err(_) => return Err(DeployError::SubscriptionClosed { event }),
        };

        if response.err.is_some() {
            debug!("Skipping failed transaction {}", response.signature);
            continue;
        }
        if let Some(found) = RaffleEvent::from_logs(&response.logs)
            .into_iter()
            .find(|candidate| matches(candidate))
        {
            return Ok(found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raffle::events::WINNER_PICKED;
    use solana_sdk::transaction::TransactionError;

    const TIMEOUT: Duration = Duration::from_millis(50);

    fn notification(err: Option<TransactionError>, logs: &[String]) -> Response<RpcLogsResponse> {
        Response {
            context: serde_json::from_value(serde_json::json!({ "slot": 1 })).unwrap(),
            value: RpcLogsResponse {
                signature: "5ig".to_string(),
                err,
                logs: logs.to_vec(),
            },
        }
    }

    fn winner_log(winner: &Pubkey) -> String {
        format!("Program log: {} winner={}", WINNER_PICKED, winner)
    }

    fn is_winner(event: &RaffleEvent) -> bool {
        matches!(event, RaffleEvent::WinnerPicked { .. })
    }

    #[test]
    fn times_out_without_notifications() {
        let (_sender, receiver) = crossbeam_channel::unbounded();
        let started = Instant::now();

        let err = wait_for_event(&receiver, WINNER_PICKED, TIMEOUT, is_winner).unwrap_err();

        assert!(matches!(err, DeployError::EventTimeout { event, .. } if event == WINNER_PICKED));
        assert!(started.elapsed() >= TIMEOUT);
    }

    #[test]
    fn reports_closed_subscription() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        drop(sender);

        let err = wait_for_event(&receiver, WINNER_PICKED, TIMEOUT, is_winner).unwrap_err();

        assert!(matches!(err, DeployError::SubscriptionClosed { .. }));
    }

    #[test]
    fn skips_failed_transactions_and_other_events() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let loser = Pubkey::new_unique();
        let winner = Pubkey::new_unique();
        sender
            .send(notification(
                Some(TransactionError::AccountNotFound),
                &[winner_log(&loser)],
            ))
            .unwrap();
        sender
            .send(notification(
                None,
                &[format!("Program log: RaffleEnter player={}", loser)],
            ))
            .unwrap();
        sender
            .send(notification(None, &[winner_log(&winner)]))
            .unwrap();

        let found = wait_for_event(&receiver, WINNER_PICKED, TIMEOUT, is_winner).unwrap();

        assert_eq!(found, RaffleEvent::WinnerPicked { winner });
    }
}
