// Raffle Program - Utility Functions

/// Index of the winning player for a random word
pub fn winner_index(random_word: u64, player_count: usize) -> usize {
    if player_count == 0 {
        return 0;
    }
    (random_word % player_count as u64) as usize
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}
