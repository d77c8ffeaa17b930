// Raffle Program - Events
//
// Events are program log lines of the form `<Name> <key>=<value>`.
use solana_program::{msg, pubkey::Pubkey};
use std::str::FromStr;

const PROGRAM_LOG_PREFIX: &str = "Program log: ";

pub const RAFFLE_ENTER: &str = "RaffleEnter";
pub const REQUESTED_RAFFLE_WINNER: &str = "RequestedRaffleWinner";
pub const WINNER_PICKED: &str = "WinnerPicked";
pub const UPKEEP_CHECKED: &str = "UpkeepChecked";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// A player entered the current round
    RaffleEnter { player: Pubkey },
    /// Upkeep asked the coordinator for randomness
    RequestedRaffleWinner { request_id: u64 },
    /// Randomness arrived and the pot was paid out
    WinnerPicked { winner: Pubkey },
    /// Result of the eligibility check
    UpkeepChecked { upkeep_needed: bool },
}

impl RaffleEvent {
    /// Write the event to the program log
    pub fn emit(&self) {
        match self {
            RaffleEvent::RaffleEnter { player } => msg!("{} player={}", RAFFLE_ENTER, player),
            RaffleEvent::RequestedRaffleWinner { request_id } => {
                msg!("{} request_id={}", REQUESTED_RAFFLE_WINNER, request_id)
            }
            RaffleEvent::WinnerPicked { winner } => msg!("{} winner={}", WINNER_PICKED, winner),
            RaffleEvent::UpkeepChecked { upkeep_needed } => {
                msg!("{} upkeep_needed={}", UPKEEP_CHECKED, upkeep_needed)
            }
        }
    }

    /// Parse a log line, with or without the runtime's `Program log: ` prefix.
    /// Lines that are not raffle events yield `None`.
    pub fn from_log(line: &str) -> Option<Self> {
        let line = line.strip_prefix(PROGRAM_LOG_PREFIX).unwrap_or(line);
        let (name, field) = line.split_once(' ')?;
        let (key, value) = field.split_once('=')?;
        match (name, key) {
            (RAFFLE_ENTER, "player") => Some(RaffleEvent::RaffleEnter {
                player: Pubkey::from_str(value).ok()?,
            }),
            (REQUESTED_RAFFLE_WINNER, "request_id") => Some(RaffleEvent::RequestedRaffleWinner {
                request_id: value.parse().ok()?,
            }),
            (WINNER_PICKED, "winner") => Some(RaffleEvent::WinnerPicked {
                winner: Pubkey::from_str(value).ok()?,
            }),
            (UPKEEP_CHECKED, "upkeep_needed") => Some(RaffleEvent::UpkeepChecked {
                upkeep_needed: value.parse().ok()?,
            }),
            _ => None,
        }
    }

    /// Every event found in a transaction's log messages, in order
    pub fn from_logs<S: AsRef<str>>(logs: &[S]) -> Vec<Self> {
        logs.iter()
            .filter_map(|line| Self::from_log(line.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_runtime_log_lines() {
        let player = Pubkey::new_unique();
        let logs = vec![
            "Program 11111111111111111111111111111111 invoke [2]".to_string(),
            format!("Program log: RaffleEnter player={}", player),
            "Program log: RequestedRaffleWinner request_id=3".to_string(),
            "Program log: UpkeepChecked upkeep_needed=false".to_string(),
        ];

        assert_eq!(
            RaffleEvent::from_logs(&logs),
            vec![
                RaffleEvent::RaffleEnter { player },
                RaffleEvent::RequestedRaffleWinner { request_id: 3 },
                RaffleEvent::UpkeepChecked { upkeep_needed: false },
            ]
        );
    }

    #[test]
    fn ignores_malformed_events() {
        assert_eq!(RaffleEvent::from_log("Program log: WinnerPicked winner=nope"), None);
        assert_eq!(RaffleEvent::from_log("Program log: WinnerPicked"), None);
        assert_eq!(RaffleEvent::from_log("Program log: Instruction: Enter Raffle"), None);
    }
}
