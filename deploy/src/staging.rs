// Live-network check: one entry, then wait for the draw
use log::info;
use raffle::{
    events::{RaffleEvent, WINNER_PICKED},
    instruction,
    state::{find_raffle_address, RaffleState},
};
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};
use solana_sdk::signature::{Keypair, Signer};

use crate::chain::ChainClient;
use crate::config::Settings;
use crate::error::{DeployError, Result};
use crate::listener::EventListener;

/// Observations of one staging round
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagingOutcome {
    pub player: Pubkey,
    pub winner: Pubkey,
    pub entrance_fee: u64,
    pub players_after: usize,
    pub state_after: RaffleState,
    pub starting_timestamp: UnixTimestamp,
    pub ending_timestamp: UnixTimestamp,
    pub winner_starting_balance: u64,
    pub winner_ending_balance: u64,
}

impl StagingOutcome {
    pub fn check(&self) -> Result<()> {
        if self.winner != self.player {
            return Err(DeployError::Assertion(format!(
                "winner {} is not the only entrant {}",
                self.winner, self.player
            )));
        }
        if self.players_after != 0 {
            return Err(DeployError::Assertion(format!(
                "{} players left after the draw",
                self.players_after
            )));
        }
        if self.state_after != RaffleState::Open {
            return Err(DeployError::Assertion(format!(
                "raffle is {:?} after the draw",
                self.state_after
            )));
        }
        let expected = self.winner_starting_balance.saturating_add(self.entrance_fee);
        if self.winner_ending_balance != expected {
            return Err(DeployError::Assertion(format!(
                "winner balance is {}, expected {}",
                self.winner_ending_balance, expected
            )));
        }
        if self.ending_timestamp <= self.starting_timestamp {
            return Err(DeployError::Assertion(
                "last timestamp did not advance".to_string(),
            ));
        }
        Ok(())
    }
}

/// Enter the deployed raffle with `player` and wait for it to pick a winner.
///
/// The draw itself is triggered by the network's upkeep automation.
pub fn run_staging(
    chain: &ChainClient,
    settings: &Settings,
    player: &Keypair,
) -> Result<StagingOutcome> {
    if settings.network.is_development() {
        return Err(DeployError::Config(format!(
            "staging runs against live networks, not {}",
            settings.network
        )));
    }

    let (raffle_address, _) = find_raffle_address(&settings.raffle_program_id);
    let raffle = chain.raffle(&raffle_address)?;
    let starting_timestamp = raffle.last_timestamp;
    let entrance_fee = raffle.entrance_fee;

    info!("Setting up listener...");
    let listener = EventListener::subscribe(&settings.ws_url, &raffle_address)?;

    info!("Entering raffle...");
    chain.send(
        &[instruction::enter_raffle(
            &settings.raffle_program_id,
            &player.pubkey(),
            entrance_fee,
        )],
        &[player],
    )?;
    let winner_starting_balance = chain.balance(&player.pubkey())?;

    info!("Waiting for {}...", WINNER_PICKED);
    let event = listener.wait_for(WINNER_PICKED, settings.event_timeout, |event| {
        matches!(event, RaffleEvent::WinnerPicked { .. })
    })?;
    listener.cancel();

    let winner = match event {
        RaffleEvent::WinnerPicked { winner } => winner,
        other => {
            return Err(DeployError::Assertion(format!("unexpected event {:?}", other)));
        }
    };
    info!("{} found, winner {}", WINNER_PICKED, winner);

    let raffle = chain.raffle(&raffle_address)?;
    Ok(StagingOutcome {
        player: player.pubkey(),
        winner,
        entrance_fee,
        players_after: raffle.number_of_players(),
        state_after: raffle.state,
        starting_timestamp,
        ending_timestamp: raffle.last_timestamp,
        winner_starting_balance,
        winner_ending_balance: chain.balance(&winner)?,
    })
}
