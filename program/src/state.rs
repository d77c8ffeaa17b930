use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::{Pubkey, PUBKEY_BYTES},
};
use std::convert::TryFrom;

/// Seed of the raffle state account
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Capacity of the players list
pub const MAX_PLAYERS: usize = 32;

const PLAYERS_LEN: usize = PUBKEY_BYTES * MAX_PLAYERS;

/// Lifecycle state of a raffle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Waiting for the coordinator to deliver randomness
    Calculating,
}

impl TryFrom<u8> for RaffleState {
    type Error = ProgramError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RaffleState::Open),
            1 => Ok(RaffleState::Calculating),
            _ => Err(ProgramError::InvalidAccountData),
        }
    }
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        match state {
            RaffleState::Open => 0,
            RaffleState::Calculating => 1,
        }
    }
}

/// Raffle account data
#[derive(Debug, Clone, PartialEq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Account that initialized the raffle
    pub authority: Pubkey,
    /// VRF coordinator program serving this raffle
    pub vrf_coordinator: Pubkey,
    /// Minimum entry payment in lamports
    pub entrance_fee: u64,
    /// Key hash of the oracle lane randomness is requested on
    pub gas_lane: [u8; 32],
    /// Coordinator subscription paying for requests
    pub subscription_id: u64,
    /// Compute budget granted to the fulfilment callback
    pub callback_gas_limit: u32,
    /// Seconds that must elapse between draws
    pub interval: u64,
    pub state: RaffleState,
    /// Time the current round started
    pub last_timestamp: UnixTimestamp,
    /// Winner of the previous round (default key before the first draw)
    pub recent_winner: Pubkey,
    /// Lamports collected from entries in the current round
    pub pot: u64,
    /// Id of the latest randomness request (0 before the first one)
    pub last_request_id: u64,
    /// Bump of the raffle address
    pub bump: u8,
    /// Number of valid entries in `players`
    pub player_count: u8,
    pub players: [Pubkey; MAX_PLAYERS],
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    /// Players of the current round, in entry order
    pub fn players(&self) -> &[Pubkey] {
        &self.players[..self.player_count as usize]
    }

    /// Player at `index`, if that many players entered
    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.players().get(index)
    }

    pub fn number_of_players(&self) -> usize {
        self.player_count as usize
    }

    /// Append a player to the current round
    pub fn add_player(&mut self, player: Pubkey) -> Result<(), crate::error::RaffleError> {
        let index = self.player_count as usize;
        if index >= MAX_PLAYERS {
            return Err(crate::error::RaffleError::RaffleFull);
        }
        self.players[index] = player;
        self.player_count += 1;
        Ok(())
    }

    /// Player the coordinator's `random_word` selects from the current round
    pub fn winner_for(&self, random_word: u64) -> Option<&Pubkey> {
        self.player(crate::utils::winner_index(random_word, self.number_of_players()))
    }

    /// Forget every player of the current round
    pub fn reset_players(&mut self) {
        self.players = [Pubkey::default(); MAX_PLAYERS];
        self.player_count = 0;
    }

    /// Upkeep is needed once the interval has elapsed while the raffle is
    /// open and holds both funds and players.
    pub fn check_upkeep(&self, now: UnixTimestamp) -> bool {
        let time_passed = now.saturating_sub(self.last_timestamp) >= self.interval as i64;
        let is_open = self.state == RaffleState::Open;
        let has_balance = self.pot > 0;
        let has_players = self.player_count > 0;
        time_passed && is_open && has_balance && has_players
    }
}

impl Pack for Raffle {
    const LEN: usize = 1 + 32 + 32 + 8 + 32 + 8 + 4 + 8 + 1 + 8 + 32 + 8 + 8 + 1 + 1 + PLAYERS_LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Raffle::LEN];
        let (
            is_initialized,
            authority,
            vrf_coordinator,
            entrance_fee,
            gas_lane,
            subscription_id,
            callback_gas_limit,
            interval,
            state,
            last_timestamp,
            recent_winner,
            pot,
            last_request_id,
            bump,
            player_count,
            players_src,
        ) = array_refs![src, 1, 32, 32, 8, 32, 8, 4, 8, 1, 8, 32, 8, 8, 1, 1, PLAYERS_LEN];

        let player_count = player_count[0];
        if player_count as usize > MAX_PLAYERS {
            return Err(ProgramError::InvalidAccountData);
        }

        let mut players = [Pubkey::default(); MAX_PLAYERS];
        for (player, chunk) in players.iter_mut().zip(players_src.chunks_exact(PUBKEY_BYTES)) {
            let mut bytes = [0u8; PUBKEY_BYTES];
            bytes.copy_from_slice(chunk);
            *player = Pubkey::new_from_array(bytes);
        }

        Ok(Raffle {
            is_initialized: is_initialized[0] != 0,
            authority: Pubkey::new_from_array(*authority),
            vrf_coordinator: Pubkey::new_from_array(*vrf_coordinator),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            gas_lane: *gas_lane,
            subscription_id: u64::from_le_bytes(*subscription_id),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            interval: u64::from_le_bytes(*interval),
            state: RaffleState::try_from(state[0])?,
            last_timestamp: UnixTimestamp::from_le_bytes(*last_timestamp),
            recent_winner: Pubkey::new_from_array(*recent_winner),
            pot: u64::from_le_bytes(*pot),
            last_request_id: u64::from_le_bytes(*last_request_id),
            bump: bump[0],
            player_count,
            players,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Raffle::LEN];
        let (
            is_initialized_dst,
            authority_dst,
            vrf_coordinator_dst,
            entrance_fee_dst,
            gas_lane_dst,
            subscription_id_dst,
            callback_gas_limit_dst,
            interval_dst,
            state_dst,
            last_timestamp_dst,
            recent_winner_dst,
            pot_dst,
            last_request_id_dst,
            bump_dst,
            player_count_dst,
            players_dst,
        ) = mut_array_refs![dst, 1, 32, 32, 8, 32, 8, 4, 8, 1, 8, 32, 8, 8, 1, 1, PLAYERS_LEN];

        is_initialized_dst[0] = self.is_initialized as u8;
        authority_dst.copy_from_slice(self.authority.as_ref());
        vrf_coordinator_dst.copy_from_slice(self.vrf_coordinator.as_ref());
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        gas_lane_dst.copy_from_slice(&self.gas_lane);
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        state_dst[0] = self.state.into();
        *last_timestamp_dst = self.last_timestamp.to_le_bytes();
        recent_winner_dst.copy_from_slice(self.recent_winner.as_ref());
        *pot_dst = self.pot.to_le_bytes();
        *last_request_id_dst = self.last_request_id.to_le_bytes();
        bump_dst[0] = self.bump;
        player_count_dst[0] = self.player_count;
        for (chunk, player) in players_dst.chunks_exact_mut(PUBKEY_BYTES).zip(self.players.iter()) {
            chunk.copy_from_slice(player.as_ref());
        }
    }
}

/// Find the program derived address holding the raffle state
pub fn find_raffle_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED], program_id)
}
