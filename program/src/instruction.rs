use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::{TryFrom, TryInto};

use crate::{error::RaffleError, state::find_raffle_address};

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the raffle state account and open the first round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The authority, pays for the raffle account
    /// 1. `[writable]` The raffle account (PDA, seeds `["raffle"]`)
    /// 2. `[]` The VRF coordinator program
    /// 3. `[]` The system program
    InitializeRaffle {
        /// Minimum entry payment in lamports
        entrance_fee: u64,
        /// Key hash of the oracle lane
        gas_lane: [u8; 32],
        /// Coordinator subscription paying for randomness
        subscription_id: u64,
        /// Compute budget of the fulfilment callback
        callback_gas_limit: u32,
        /// Seconds between draws
        interval: u64,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player, pays `amount`
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Log whether upkeep is needed
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep,

    /// Close the round and request randomness from the coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The VRF coordinator program
    /// 3. `[writable]` The coordinator state account
    PerformUpkeep,

    /// Deliver randomness, pick the winner and pay out the pot
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator state account
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The winner drawn by the first random word
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<u64>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (gas_lane, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, rest) = Self::unpack_u32(rest)?;
                let (interval, _) = Self::unpack_u64(rest)?;
                Self::InitializeRaffle {
                    entrance_fee,
                    gas_lane,
                    subscription_id,
                    callback_gas_limit,
                    interval,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { amount }
            }
            2 => Self::CheckUpkeep,
            3 => Self::PerformUpkeep,
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (count, mut rest) = rest
                    .split_first()
                    .ok_or(RaffleError::InvalidInstructionData)?;
                let mut random_words = Vec::with_capacity(*count as usize);
                for _ in 0..*count {
                    let (word, tail) = Self::unpack_u64(rest)?;
                    random_words.push(word);
                    rest = tail;
                }
                Self::FulfillRandomWords {
                    request_id,
                    random_words,
                }
            }
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::InitializeRaffle {
                entrance_fee,
                gas_lane,
                subscription_id,
                callback_gas_limit,
                interval,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(gas_lane);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
            }
            Self::EnterRaffle { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(2),
            Self::PerformUpkeep => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                // One count byte; the coordinator never delivers more than MAX_NUM_WORDS
                let count = u8::try_from(random_words.len()).unwrap_or(u8::MAX);
                buf.push(count);
                for word in random_words.iter().take(count as usize) {
                    buf.extend_from_slice(&word.to_le_bytes());
                }
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(N);
        let bytes = bytes
            .try_into()
            .map_err(|_| ProgramError::from(RaffleError::InvalidInstructionData))?;
        Ok((bytes, rest))
    }
}

/// Create initialize_raffle instruction
#[allow(clippy::too_many_arguments)]
pub fn initialize_raffle(
    program_id: &Pubkey,
    authority: &Pubkey,
    vrf_coordinator: &Pubkey,
    entrance_fee: u64,
    gas_lane: [u8; 32],
    subscription_id: u64,
    callback_gas_limit: u32,
    interval: u64,
) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id);
    let data = RaffleInstruction::InitializeRaffle {
        entrance_fee,
        gas_lane,
        subscription_id,
        callback_gas_limit,
        interval,
    }
    .pack();

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(*vrf_coordinator, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(program_id: &Pubkey, player: &Pubkey, amount: u64) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*player, true),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::EnterRaffle { amount }.pack(),
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(raffle, false)],
        data: RaffleInstruction::CheckUpkeep.pack(),
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    vrf_coordinator: &Pubkey,
) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id);
    let (coordinator_state, _) = crate::vrf::find_coordinator_address(vrf_coordinator);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(*vrf_coordinator, false),
            AccountMeta::new(coordinator_state, false),
        ],
        data: RaffleInstruction::PerformUpkeep.pack(),
    }
}

/// Create the fulfilment callback a coordinator invokes on a consumer.
/// For the raffle `callback_accounts` holds the single winner account.
pub fn fulfill_random_words(
    program_id: &Pubkey,
    coordinator_state: &Pubkey,
    raffle: &Pubkey,
    callback_accounts: &[Pubkey],
    request_id: u64,
    random_words: Vec<u64>,
) -> Instruction {
    let mut accounts = vec![
        AccountMeta::new_readonly(*coordinator_state, true),
        AccountMeta::new(*raffle, false),
    ];
    accounts.extend(
        callback_accounts
            .iter()
            .map(|account| AccountMeta::new(*account, false)),
    );

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::FulfillRandomWords {
            request_id,
            random_words,
        }
        .pack(),
    }
}
