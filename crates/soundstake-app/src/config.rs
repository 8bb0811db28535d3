//! Configuration constants for soundstake app services

/// Session rules
pub mod session {
    use crate::session::turn::Trial;

    /// Starting balance for both teams
    pub const INITIAL_BALANCE: i32 = 30;

    /// Reward-side cap on a team's balance
    pub const BALANCE_CAP: i32 = 30;

    /// Flat cost of the once-per-team skip, independent of the ladder
    pub const SKIP_PENALTY: i32 = 5;

    /// The trial ladder: clip length grows with each wrong guess, and so
    /// does the penalty for the next one. Only the first rung pays a reward.
    pub const TRIALS: [Trial; 5] = [
        Trial { duration_secs: 1, penalty: 1, reward: 2 },
        Trial { duration_secs: 5, penalty: 3, reward: 0 },
        Trial { duration_secs: 10, penalty: 5, reward: 0 },
        Trial { duration_secs: 20, penalty: 10, reward: 0 },
        Trial { duration_secs: 30, penalty: 15, reward: 0 },
    ];
}

/// Provider-related configuration
pub mod providers {
    /// Default Deezer API server
    pub const DEEZER_DEFAULT_SERVER: &str = "https://api.deezer.com";

    /// Default search result limit
    pub const DEFAULT_SEARCH_LIMIT: usize = 25;
}
