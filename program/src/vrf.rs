// Mock VRF coordinator used by local deployments and tests.
//
// Mirrors the subscription model of a hosted randomness oracle: a
// subscription is created and funded, consumers are registered on it, a
// consumer requests random words and anyone can later fulfil the request,
// which calls back into the consumer program with the words.
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    decode_error::DecodeError,
    entrypoint::ProgramResult,
    hash::hashv,
    instruction::{AccountMeta, Instruction},
    msg,
    program::invoke_signed,
    program_error::{PrintProgramError, ProgramError},
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};
use std::convert::TryInto;
use thiserror::Error;

/// Seed of the coordinator state account, which also signs callbacks
pub const COORDINATOR_SEED: &[u8] = b"coordinator";

/// First id handed out for subscriptions and requests
pub const FIRST_SUBSCRIPTION_ID: u64 = 1;
pub const FIRST_REQUEST_ID: u64 = 1;

pub const MAX_SUBSCRIPTIONS: usize = 4;
pub const MAX_CONSUMERS: usize = 4;
pub const MAX_PENDING_REQUESTS: usize = 8;
pub const MAX_NUM_WORDS: u32 = 8;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum VrfCoordinatorError {
    #[error("Invalid coordinator instruction")]
    InvalidInstruction = 100,

    #[error("Nonexistent request")]
    NonexistentRequest,

    #[error("Invalid subscription")]
    InvalidSubscription,

    #[error("Invalid consumer")]
    InvalidConsumer,

    #[error("Insufficient subscription balance")]
    InsufficientBalance,

    #[error("Too many consumers")]
    TooManyConsumers,

    #[error("Too many subscriptions")]
    TooManySubscriptions,

    #[error("Too many pending requests")]
    TooManyRequests,

    #[error("Consumer does not match the request")]
    ConsumerMismatch,
}

impl From<VrfCoordinatorError> for ProgramError {
    fn from(e: VrfCoordinatorError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for VrfCoordinatorError {
    fn type_of() -> &'static str {
        "VRF Coordinator Error"
    }
}

impl PrintProgramError for VrfCoordinatorError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub struct Subscription {
    pub id: u64,
    pub owner: Pubkey,
    pub balance: u64,
    pub consumers: Vec<Pubkey>,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub struct PendingRequest {
    pub id: u64,
    pub subscription_id: u64,
    pub consumer: Pubkey,
    pub num_words: u32,
    pub callback_gas_limit: u32,
}

/// Coordinator state account
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub struct Coordinator {
    pub is_initialized: bool,
    /// Flat fee charged per fulfilment
    pub base_fee: u64,
    /// Fee charged per delivered word
    pub gas_price: u64,
    pub next_subscription_id: u64,
    pub next_request_id: u64,
    pub subscriptions: Vec<Subscription>,
    pub requests: Vec<PendingRequest>,
}

impl Coordinator {
    const SUBSCRIPTION_LEN: usize = 8 + 32 + 8 + 4 + 32 * MAX_CONSUMERS;
    const REQUEST_LEN: usize = 8 + 8 + 32 + 4 + 4;

    /// Space reserved for the account, sized for full capacity
    pub const LEN: usize = 1
        + 8
        + 8
        + 8
        + 8
        + 4
        + Self::SUBSCRIPTION_LEN * MAX_SUBSCRIPTIONS
        + 4
        + Self::REQUEST_LEN * MAX_PENDING_REQUESTS;

    pub fn new(base_fee: u64, gas_price: u64) -> Self {
        Self {
            is_initialized: true,
            base_fee,
            gas_price,
            next_subscription_id: FIRST_SUBSCRIPTION_ID,
            next_request_id: FIRST_REQUEST_ID,
            subscriptions: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn load(data: &[u8]) -> Result<Self, ProgramError> {
        let coordinator: Self = solana_program::borsh::try_from_slice_unchecked(data)
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        if !coordinator.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(coordinator)
    }

    pub fn save(&self, data: &mut [u8]) -> ProgramResult {
        self.serialize(&mut &mut data[..])
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }

    pub fn subscription_mut(&mut self, id: u64) -> Result<&mut Subscription, VrfCoordinatorError> {
        self.subscriptions
            .iter_mut()
            .find(|sub| sub.id == id)
            .ok_or(VrfCoordinatorError::InvalidSubscription)
    }

    /// Id of the most recently issued request, if any
    pub fn last_request_id(&self) -> Option<u64> {
        self.next_request_id
            .checked_sub(1)
            .filter(|id| *id >= FIRST_REQUEST_ID)
    }

    /// Price of fulfilling a request for `num_words` words
    pub fn payment(&self, num_words: u32) -> u64 {
        self.base_fee
            .saturating_add(self.gas_price.saturating_mul(num_words as u64))
    }
}

/// Deterministic random words for a request
pub fn random_words(request_id: u64, num_words: u32) -> Vec<u64> {
    (0..num_words)
        .map(|index| {
            let digest = hashv(&[&request_id.to_le_bytes(), &index.to_le_bytes()]);
            let mut word = [0u8; 8];
            word.copy_from_slice(&digest.as_ref()[..8]);
            u64::from_le_bytes(word)
        })
        .collect()
}

pub fn find_coordinator_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COORDINATOR_SEED], program_id)
}

#[derive(Clone, Debug, PartialEq)]
pub enum CoordinatorInstruction {
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer
    /// 1. `[writable]` Coordinator state (PDA, seeds `["coordinator"]`)
    /// 2. `[]` System program
    Initialize { base_fee: u64, gas_price: u64 },

    /// Accounts expected:
    /// 0. `[signer]` Subscription owner
    /// 1. `[writable]` Coordinator state
    CreateSubscription,

    /// Accounts expected:
    /// 0. `[signer]` Funder
    /// 1. `[writable]` Coordinator state
    FundSubscription { subscription_id: u64, amount: u64 },

    /// Accounts expected:
    /// 0. `[signer]` Subscription owner
    /// 1. `[writable]` Coordinator state
    /// 2. `[]` Consumer account
    AddConsumer { subscription_id: u64 },

    /// Accounts expected:
    /// 0. `[signer]` Consumer account
    /// 1. `[writable]` Coordinator state
    RequestRandomWords {
        key_hash: [u8; 32],
        subscription_id: u64,
        minimum_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    },

    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[writable]` Coordinator state
    /// 2. `[]` Consumer program
    /// 3. `[writable]` Consumer account
    /// 4.. Accounts forwarded to the consumer callback
    FulfillRandomWords { request_id: u64 },
}

impl CoordinatorInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(VrfCoordinatorError::InvalidInstruction)?;

        Ok(match tag {
            0 => Self::Initialize {
                base_fee: read_u64(rest, 0)?,
                gas_price: read_u64(rest, 8)?,
            },
            1 => Self::CreateSubscription,
            2 => Self::FundSubscription {
                subscription_id: read_u64(rest, 0)?,
                amount: read_u64(rest, 8)?,
            },
            3 => Self::AddConsumer {
                subscription_id: read_u64(rest, 0)?,
            },
            4 => {
                let key_hash = rest
                    .get(..32)
                    .and_then(|bytes| bytes.try_into().ok())
                    .ok_or(VrfCoordinatorError::InvalidInstruction)?;
                let minimum_confirmations = rest
                    .get(40..42)
                    .and_then(|bytes| bytes.try_into().ok())
                    .map(u16::from_le_bytes)
                    .ok_or(VrfCoordinatorError::InvalidInstruction)?;
                Self::RequestRandomWords {
                    key_hash,
                    subscription_id: read_u64(rest, 32)?,
                    minimum_confirmations,
                    callback_gas_limit: read_u32(rest, 42)?,
                    num_words: read_u32(rest, 46)?,
                }
            }
            5 => Self::FulfillRandomWords {
                request_id: read_u64(rest, 0)?,
            },
            _ => return Err(VrfCoordinatorError::InvalidInstruction.into()),
        })
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::Initialize { base_fee, gas_price } => {
                buf.push(0);
                buf.extend_from_slice(&base_fee.to_le_bytes());
                buf.extend_from_slice(&gas_price.to_le_bytes());
            }
            Self::CreateSubscription => buf.push(1),
            Self::FundSubscription {
                subscription_id,
                amount,
            } => {
                buf.push(2);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::AddConsumer { subscription_id } => {
                buf.push(3);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
            }
            Self::RequestRandomWords {
                key_hash,
                subscription_id,
                minimum_confirmations,
                callback_gas_limit,
                num_words,
            } => {
                buf.push(4);
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&minimum_confirmations.to_le_bytes());
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
                buf.extend_from_slice(&num_words.to_le_bytes());
            }
            Self::FulfillRandomWords { request_id } => {
                buf.push(5);
                buf.extend_from_slice(&request_id.to_le_bytes());
            }
        }
        buf
    }
}

fn read_u64(input: &[u8], offset: usize) -> Result<u64, ProgramError> {
    input
        .get(offset..offset + 8)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| VrfCoordinatorError::InvalidInstruction.into())
}

fn read_u32(input: &[u8], offset: usize) -> Result<u32, ProgramError> {
    input
        .get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| VrfCoordinatorError::InvalidInstruction.into())
}

pub fn initialize(
    program_id: &Pubkey,
    payer: &Pubkey,
    base_fee: u64,
    gas_price: u64,
) -> Instruction {
    let (state, _) = find_coordinator_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(state, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: CoordinatorInstruction::Initialize { base_fee, gas_price }.pack(),
    }
}

pub fn create_subscription(program_id: &Pubkey, owner: &Pubkey) -> Instruction {
    let (state, _) = find_coordinator_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*owner, true),
            AccountMeta::new(state, false),
        ],
        data: CoordinatorInstruction::CreateSubscription.pack(),
    }
}

pub fn fund_subscription(
    program_id: &Pubkey,
    funder: &Pubkey,
    subscription_id: u64,
    amount: u64,
) -> Instruction {
    let (state, _) = find_coordinator_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*funder, true),
            AccountMeta::new(state, false),
        ],
        data: CoordinatorInstruction::FundSubscription {
            subscription_id,
            amount,
        }
        .pack(),
    }
}

pub fn add_consumer(
    program_id: &Pubkey,
    owner: &Pubkey,
    subscription_id: u64,
    consumer: &Pubkey,
) -> Instruction {
    let (state, _) = find_coordinator_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*owner, true),
            AccountMeta::new(state, false),
            AccountMeta::new_readonly(*consumer, false),
        ],
        data: CoordinatorInstruction::AddConsumer { subscription_id }.pack(),
    }
}

pub fn request_random_words(
    program_id: &Pubkey,
    consumer: &Pubkey,
    key_hash: [u8; 32],
    subscription_id: u64,
    callback_gas_limit: u32,
    num_words: u32,
) -> Instruction {
    let (state, _) = find_coordinator_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*consumer, true),
            AccountMeta::new(state, false),
        ],
        data: CoordinatorInstruction::RequestRandomWords {
            key_hash,
            subscription_id,
            minimum_confirmations: 3,
            callback_gas_limit,
            num_words,
        }
        .pack(),
    }
}

/// Fulfil `request_id`, forwarding `callback_accounts` to the consumer
pub fn fulfill_random_words(
    program_id: &Pubkey,
    caller: &Pubkey,
    request_id: u64,
    consumer_program: &Pubkey,
    consumer: &Pubkey,
    callback_accounts: &[Pubkey],
) -> Instruction {
    let (state, _) = find_coordinator_address(program_id);
    let mut accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(state, false),
        AccountMeta::new_readonly(*consumer_program, false),
        AccountMeta::new(*consumer, false),
    ];
    accounts.extend(callback_accounts.iter().map(|key| AccountMeta::new(*key, false)));

    Instruction {
        program_id: *program_id,
        accounts,
        data: CoordinatorInstruction::FulfillRandomWords { request_id }.pack(),
    }
}

/// Entry point of the mock coordinator program
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = CoordinatorInstruction::unpack(instruction_data)?;

    match instruction {
        CoordinatorInstruction::Initialize { base_fee, gas_price } => {
            msg!("Instruction: Initialize Coordinator");
            process_initialize(program_id, accounts, base_fee, gas_price)
        }
        CoordinatorInstruction::CreateSubscription => {
            msg!("Instruction: Create Subscription");
            process_create_subscription(program_id, accounts)
        }
        CoordinatorInstruction::FundSubscription {
            subscription_id,
            amount,
        } => {
            msg!("Instruction: Fund Subscription");
            process_fund_subscription(program_id, accounts, subscription_id, amount)
        }
        CoordinatorInstruction::AddConsumer { subscription_id } => {
            msg!("Instruction: Add Consumer");
            process_add_consumer(program_id, accounts, subscription_id)
        }
        CoordinatorInstruction::RequestRandomWords {
            subscription_id,
            minimum_confirmations,
            callback_gas_limit,
            num_words,
            ..
        } => {
            msg!("Instruction: Request Random Words");
            process_request_random_words(
                program_id,
                accounts,
                subscription_id,
                minimum_confirmations,
                callback_gas_limit,
                num_words,
            )
        }
        CoordinatorInstruction::FulfillRandomWords { request_id } => {
            msg!("Instruction: Fulfill Random Words");
            process_fulfill_random_words(program_id, accounts, request_id)
        }
    }
}

fn check_state_account(program_id: &Pubkey, state_info: &AccountInfo) -> Result<u8, ProgramError> {
    let (expected, bump) = find_coordinator_address(program_id);
    if *state_info.key != expected {
        msg!("Invalid coordinator state account");
        return Err(ProgramError::InvalidArgument);
    }
    if state_info.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(bump)
}

fn process_initialize(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    base_fee: u64,
    gas_price: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let payer_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let system_program_info = next_account_info(account_info_iter)?;

    if !payer_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let (expected, bump) = find_coordinator_address(program_id);
    if *state_info.key != expected {
        msg!("Invalid coordinator state account");
        return Err(ProgramError::InvalidArgument);
    }
    if state_info.owner == program_id {
        msg!("Coordinator already initialized");
        return Err(ProgramError::AccountAlreadyInitialized);
    }

    let rent = Rent::get()?;
    invoke_signed(
        &system_instruction::create_account(
            payer_info.key,
            state_info.key,
            rent.minimum_balance(Coordinator::LEN),
            Coordinator::LEN as u64,
            program_id,
        ),
        &[payer_info.clone(), state_info.clone(), system_program_info.clone()],
        &[&[COORDINATOR_SEED, &[bump]]],
    )?;

    Coordinator::new(base_fee, gas_price).save(&mut state_info.data.borrow_mut())?;
    msg!("Coordinator initialized: base_fee={}, gas_price={}", base_fee, gas_price);
    Ok(())
}

fn process_create_subscription(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let owner_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;

    if !owner_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    check_state_account(program_id, state_info)?;

    let mut coordinator = Coordinator::load(&state_info.data.borrow())?;
    if coordinator.subscriptions.len() >= MAX_SUBSCRIPTIONS {
        return Err(VrfCoordinatorError::TooManySubscriptions.into());
    }

    let id = coordinator.next_subscription_id;
    coordinator.next_subscription_id += 1;
    coordinator.subscriptions.push(Subscription {
        id,
        owner: *owner_info.key,
        balance: 0,
        consumers: Vec::new(),
    });
    coordinator.save(&mut state_info.data.borrow_mut())?;

    msg!("SubscriptionCreated subscription_id={} owner={}", id, owner_info.key);
    Ok(())
}

fn process_fund_subscription(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    subscription_id: u64,
    amount: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let funder_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;

    if !funder_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    check_state_account(program_id, state_info)?;

    let mut coordinator = Coordinator::load(&state_info.data.borrow())?;
    let subscription = coordinator.subscription_mut(subscription_id)?;
    let old_balance = subscription.balance;
    subscription.balance = old_balance
        .checked_add(amount)
        .ok_or(ProgramError::InvalidArgument)?;
    let new_balance = subscription.balance;
    coordinator.save(&mut state_info.data.borrow_mut())?;

    msg!(
        "SubscriptionFunded subscription_id={} old_balance={} new_balance={}",
        subscription_id,
        old_balance,
        new_balance
    );
    Ok(())
}

fn process_add_consumer(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    subscription_id: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let owner_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let consumer_info = next_account_info(account_info_iter)?;

    if !owner_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    check_state_account(program_id, state_info)?;

    let mut coordinator = Coordinator::load(&state_info.data.borrow())?;
    let subscription = coordinator.subscription_mut(subscription_id)?;
    if subscription.owner != *owner_info.key {
        msg!("Only the subscription owner can add consumers");
        return Err(ProgramError::IllegalOwner);
    }
    if !subscription.consumers.contains(consumer_info.key) {
        if subscription.consumers.len() >= MAX_CONSUMERS {
            return Err(VrfCoordinatorError::TooManyConsumers.into());
        }
        subscription.consumers.push(*consumer_info.key);
    }
    coordinator.save(&mut state_info.data.borrow_mut())?;

    msg!("ConsumerAdded subscription_id={} consumer={}", subscription_id, consumer_info.key);
    Ok(())
}

fn process_request_random_words(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    subscription_id: u64,
    minimum_confirmations: u16,
    callback_gas_limit: u32,
    num_words: u32,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let consumer_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;

    if !consumer_info.is_signer {
        msg!("Consumer must sign the request");
        return Err(ProgramError::MissingRequiredSignature);
    }
    check_state_account(program_id, state_info)?;
    if num_words == 0 || num_words > MAX_NUM_WORDS {
        return Err(ProgramError::InvalidArgument);
    }

    let mut coordinator = Coordinator::load(&state_info.data.borrow())?;
    let subscription = coordinator.subscription_mut(subscription_id)?;
    if !subscription.consumers.contains(consumer_info.key) {
        return Err(VrfCoordinatorError::InvalidConsumer.into());
    }
    if coordinator.requests.len() >= MAX_PENDING_REQUESTS {
        return Err(VrfCoordinatorError::TooManyRequests.into());
    }

    let request_id = coordinator.next_request_id;
    coordinator.next_request_id += 1;
    coordinator.requests.push(PendingRequest {
        id: request_id,
        subscription_id,
        consumer: *consumer_info.key,
        num_words,
        callback_gas_limit,
    });
    coordinator.save(&mut state_info.data.borrow_mut())?;

    msg!(
        "RandomWordsRequested request_id={} subscription_id={} confirmations={} consumer={}",
        request_id,
        subscription_id,
        minimum_confirmations,
        consumer_info.key
    );
    Ok(())
}

fn process_fulfill_random_words(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    request_id: u64,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let caller_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let consumer_program_info = next_account_info(account_info_iter)?;
    let consumer_info = next_account_info(account_info_iter)?;
    let callback_infos: Vec<AccountInfo> = account_info_iter.cloned().collect();

    if !caller_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    let bump = check_state_account(program_id, state_info)?;

    let mut coordinator = Coordinator::load(&state_info.data.borrow())?;
    let position = coordinator
        .requests
        .iter()
        .position(|request| request.id == request_id)
        .ok_or(VrfCoordinatorError::NonexistentRequest)?;
    let request = coordinator.requests[position].clone();

    if request.consumer != *consumer_info.key || consumer_info.owner != consumer_program_info.key {
        return Err(VrfCoordinatorError::ConsumerMismatch.into());
    }

    let payment = coordinator.payment(request.num_words);
    let subscription = coordinator.subscription_mut(request.subscription_id)?;
    subscription.balance = subscription
        .balance
        .checked_sub(payment)
        .ok_or(VrfCoordinatorError::InsufficientBalance)?;

    coordinator.requests.remove(position);
    coordinator.save(&mut state_info.data.borrow_mut())?;

    let words = random_words(request_id, request.num_words);
    let callback_keys: Vec<Pubkey> = callback_infos.iter().map(|info| *info.key).collect();
    let callback = crate::instruction::fulfill_random_words(
        consumer_program_info.key,
        state_info.key,
        consumer_info.key,
        &callback_keys,
        request_id,
        words,
    );

    let mut invoke_infos = vec![
        state_info.clone(),
        consumer_info.clone(),
        consumer_program_info.clone(),
    ];
    invoke_infos.extend(callback_infos);
    invoke_signed(&callback, &invoke_infos, &[&[COORDINATOR_SEED, &[bump]]])?;

    msg!(
        "RandomWordsFulfilled request_id={} payment={} consumer={}",
        request_id,
        payment,
        consumer_info.key
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_words_are_deterministic_per_request() {
        assert_eq!(random_words(1, 2), random_words(1, 2));
        assert_ne!(random_words(1, 1), random_words(2, 1));
        assert_eq!(random_words(4, 3).len(), 3);
    }

    #[test]
    fn last_request_id_is_none_before_first_request() {
        let mut coordinator = Coordinator::new(250_000, 1_000);
        assert_eq!(coordinator.last_request_id(), None);
        coordinator.next_request_id += 1;
        assert_eq!(coordinator.last_request_id(), Some(FIRST_REQUEST_ID));
    }

    #[test]
    fn full_state_fits_reserved_space() {
        let mut coordinator = Coordinator::new(1, 1);
        for id in 0..MAX_SUBSCRIPTIONS as u64 {
            coordinator.subscriptions.push(Subscription {
                id,
                owner: Pubkey::new_unique(),
                balance: u64::MAX,
                consumers: vec![Pubkey::new_unique(); MAX_CONSUMERS],
            });
        }
        for id in 0..MAX_PENDING_REQUESTS as u64 {
            coordinator.requests.push(PendingRequest {
                id,
                subscription_id: 1,
                consumer: Pubkey::new_unique(),
                num_words: 1,
                callback_gas_limit: 500_000,
            });
        }

        let mut data = vec![0u8; Coordinator::LEN];
        coordinator.save(&mut data).unwrap();
        assert_eq!(Coordinator::load(&data).unwrap(), coordinator);
    }

    #[test]
    fn unpacks_request_layout() {
        let ix = CoordinatorInstruction::RequestRandomWords {
            key_hash: [3; 32],
            subscription_id: 1,
            minimum_confirmations: 3,
            callback_gas_limit: 500_000,
            num_words: 1,
        };
        assert_eq!(CoordinatorInstruction::unpack(&ix.pack()).unwrap(), ix);
    }
}
