use crate::error::RaffleError;
use crate::events::RaffleEvent;
use crate::instruction::RaffleInstruction;
use crate::state::{find_raffle_address, Raffle, RaffleState, MAX_PLAYERS, RAFFLE_SEED};
use crate::{utils, vrf};

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

/// Number of random words a draw needs
const NUM_WORDS: u32 = 1;

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                gas_lane,
                subscription_id,
                callback_gas_limit,
                interval,
            } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(
                    accounts,
                    entrance_fee,
                    gas_lane,
                    subscription_id,
                    callback_gas_limit,
                    interval,
                    program_id,
                )
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        entrance_fee: u64,
        gas_lane: [u8; 32],
        subscription_id: u64,
        callback_gas_limit: u32,
        interval: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_program_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_raffle, bump) = find_raffle_address(program_id);
        if *raffle_info.key != expected_raffle {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidArgument);
        }

        if raffle_info.owner == program_id {
            msg!("Raffle account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let rent = Rent::get()?;
        invoke_signed(
            &system_instruction::create_account(
                authority_info.key,
                raffle_info.key,
                rent.minimum_balance(Raffle::LEN),
                Raffle::LEN as u64,
                program_id,
            ),
            &[
                authority_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
            &[&[RAFFLE_SEED, &[bump]]],
        )?;

        let now = Clock::get()?.unix_timestamp;
        let raffle = Raffle {
            is_initialized: true,
            authority: *authority_info.key,
            vrf_coordinator: *coordinator_program_info.key,
            entrance_fee,
            gas_lane,
            subscription_id,
            callback_gas_limit,
            interval,
            state: RaffleState::Open,
            last_timestamp: now,
            recent_winner: Pubkey::default(),
            pot: 0,
            last_request_id: 0,
            bump,
            player_count: 0,
            players: [Pubkey::default(); MAX_PLAYERS],
        };
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: EntranceFee={}, Interval={}s, Coordinator={}, Subscription={}",
            entrance_fee,
            interval,
            coordinator_program_info.key,
            subscription_id
        );
        Ok(())
    }

    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        if amount < raffle.entrance_fee {
            msg!("Entered {} lamports, entrance fee is {}", amount, raffle.entrance_fee);
            return Err(RaffleError::NotEnoughEntered.into());
        }
        if raffle.state != RaffleState::Open {
            return Err(RaffleError::NotOpen.into());
        }

        raffle.add_player(*player_info.key)?;
        raffle.pot = raffle
            .pot
            .checked_add(amount)
            .ok_or(RaffleError::AmountOverflow)?;

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;
        RaffleEvent::RaffleEnter {
            player: *player_info.key,
        }
        .emit();
        Ok(())
    }

    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(raffle_info, program_id)?;
        let upkeep_needed = raffle.check_upkeep(Clock::get()?.unix_timestamp);

        set_return_data(&[upkeep_needed as u8]);
        RaffleEvent::UpkeepChecked { upkeep_needed }.emit();
        Ok(())
    }

    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_program_info = next_account_info(account_info_iter)?;
        let coordinator_state_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        if *coordinator_program_info.key != raffle.vrf_coordinator {
            msg!("Expected coordinator {}", raffle.vrf_coordinator);
            return Err(RaffleError::InvalidCoordinator.into());
        }

        if !raffle.check_upkeep(Clock::get()?.unix_timestamp) {
            msg!(
                "Upkeep not needed: balance={}, players={}, state={:?}",
                raffle.pot,
                raffle.player_count,
                raffle.state
            );
            return Err(RaffleError::UpkeepNotNeeded.into());
        }

        raffle.state = RaffleState::Calculating;

        invoke_signed(
            &vrf::request_random_words(
                coordinator_program_info.key,
                raffle_info.key,
                raffle.gas_lane,
                raffle.subscription_id,
                raffle.callback_gas_limit,
                NUM_WORDS,
            ),
            &[
                raffle_info.clone(),
                coordinator_state_info.clone(),
                coordinator_program_info.clone(),
            ],
            &[&[RAFFLE_SEED, &[raffle.bump]]],
        )?;

        let request_id = vrf::Coordinator::load(&coordinator_state_info.data.borrow())?
            .last_request_id()
            .ok_or(ProgramError::InvalidAccountData)?;
        raffle.last_request_id = request_id;

        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;
        RaffleEvent::RequestedRaffleWinner { request_id }.emit();
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[u64],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let coordinator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        let (expected_coordinator, _) = vrf::find_coordinator_address(&raffle.vrf_coordinator);
        if !coordinator_info.is_signer || *coordinator_info.key != expected_coordinator {
            return Err(RaffleError::UnauthorizedCoordinator.into());
        }
        if raffle.state != RaffleState::Calculating {
            return Err(RaffleError::NotOpen.into());
        }

        let word = random_words.first().ok_or(RaffleError::NoRandomWords)?;
        let winner = *raffle
            .winner_for(*word)
            .ok_or(RaffleError::WinnerAccountMissing)?;
        let winner_info = account_info_iter
            .next()
            .ok_or(RaffleError::WinnerAccountMissing)?;
        if *winner_info.key != winner {
            msg!("Expected winner account {}", winner);
            return Err(RaffleError::WinnerAccountMissing.into());
        }

        let prize = raffle.pot;
        let raffle_lamports = raffle_info
            .lamports()
            .checked_sub(prize)
            .ok_or(RaffleError::AmountOverflow)?;
        let winner_lamports = winner_info
            .lamports()
            .checked_add(prize)
            .ok_or(RaffleError::AmountOverflow)?;
        **raffle_info.try_borrow_mut_lamports()? = raffle_lamports;
        **winner_info.try_borrow_mut_lamports()? = winner_lamports;

        raffle.recent_winner = winner;
        raffle.reset_players();
        raffle.pot = 0;
        raffle.state = RaffleState::Open;
        raffle.last_timestamp = Clock::get()?.unix_timestamp;
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        msg!(
            "Request {} paid {} SOL to {}",
            request_id,
            utils::lamports_to_sol(prize),
            winner
        );
        RaffleEvent::WinnerPicked { winner }.emit();
        Ok(())
    }

    fn load_raffle(
        raffle_info: &AccountInfo,
        program_id: &Pubkey,
    ) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        Raffle::unpack(&raffle_info.data.borrow())
    }
}
