// Raffle Program - Errors
use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError,
    program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the Raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Entry payment is below the entrance fee
    #[error("Not enough SOL entered")]
    NotEnoughEntered,

    /// Raffle is calculating a winner and does not accept entries
    #[error("Raffle is not open")]
    NotOpen,

    /// Upkeep was triggered while the eligibility check is false
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// No room left in the players list
    #[error("Raffle is full")]
    RaffleFull,

    /// Coordinator program does not match the configured one
    #[error("Invalid VRF coordinator")]
    InvalidCoordinator,

    /// Fulfilment was not signed by the configured coordinator
    #[error("Only the VRF coordinator can fulfill")]
    UnauthorizedCoordinator,

    /// Winner account was not passed to the fulfilment
    #[error("Winner account missing")]
    WinnerAccountMissing,

    /// Fulfilment carried no random words
    #[error("No random words supplied")]
    NoRandomWords,

    /// Lamport arithmetic overflowed
    #[error("Amount overflow")]
    AmountOverflow,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

impl RaffleError {
    /// Every variant, in discriminant order.
    pub const ALL: [RaffleError; 10] = [
        RaffleError::InvalidInstructionData,
        RaffleError::NotEnoughEntered,
        RaffleError::NotOpen,
        RaffleError::UpkeepNotNeeded,
        RaffleError::RaffleFull,
        RaffleError::InvalidCoordinator,
        RaffleError::UnauthorizedCoordinator,
        RaffleError::WinnerAccountMissing,
        RaffleError::NoRandomWords,
        RaffleError::AmountOverflow,
    ];

    /// Identifier used in the interface description.
    pub fn name(&self) -> &'static str {
        match self {
            RaffleError::InvalidInstructionData => "InvalidInstructionData",
            RaffleError::NotEnoughEntered => "NotEnoughEntered",
            RaffleError::NotOpen => "NotOpen",
            RaffleError::UpkeepNotNeeded => "UpkeepNotNeeded",
            RaffleError::RaffleFull => "RaffleFull",
            RaffleError::InvalidCoordinator => "InvalidCoordinator",
            RaffleError::UnauthorizedCoordinator => "UnauthorizedCoordinator",
            RaffleError::WinnerAccountMissing => "WinnerAccountMissing",
            RaffleError::NoRandomWords => "NoRandomWords",
            RaffleError::AmountOverflow => "AmountOverflow",
        }
    }
}
