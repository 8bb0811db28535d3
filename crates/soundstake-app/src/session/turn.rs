//! Trial/turn state machine
//!
//! Pure game rules: phases, team balances, the trial ladder, and skip flags.
//! No audio lives here — operations return outcome values and the session
//! controller maps them to engine side effects (stopping clips on game over,
//! invalidating the preview cache on turn end, and so on).

use std::fmt;

use crate::config::session::{BALANCE_CAP, INITIAL_BALANCE, SKIP_PENALTY, TRIALS};
use crate::providers::TrackSummary;

/// One rung of the trial ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trial {
    /// Clip length for this rung in seconds
    pub duration_secs: u32,
    /// Points lost on a wrong guess at this rung
    pub penalty: i32,
    /// Points gained on a correct guess at this rung (reward-capped)
    pub reward: i32,
}

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Pre-round screen between turns
    #[default]
    Start,
    /// The DJ team is picking a song
    Choosing,
    /// Search results are on screen
    Results,
    /// The guessing team is working through the ladder
    Guessing,
    /// The track is revealed after a correct guess or a give-up
    Reveal,
    /// A balance hit zero; terminal until reset
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Start => write!(f, "Start"),
            Phase::Choosing => write!(f, "Choosing"),
            Phase::Results => write!(f, "Results"),
            Phase::Guessing => write!(f, "Guessing"),
            Phase::Reveal => write!(f, "Reveal"),
            Phase::GameOver => write!(f, "Game over"),
        }
    }
}

/// A team identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Team {
    #[default]
    A,
    B,
}

impl Team {
    /// The opposing team
    pub fn other(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::A => write!(f, "A"),
            Team::B => write!(f, "B"),
        }
    }
}

/// Result of applying damage to the active team
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Continue,
    GameOver,
}

/// What a guess (or give-up) did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Correct guess (or give-up): the track is revealed
    Reveal,
    /// Wrong guess: advanced to the next rung, still guessing
    NextTrial,
    /// Wrong guess on the last rung: the turn passed to the other team
    TurnEnded,
    /// The damage ended the game
    GameOver,
    /// Operation not valid in the current phase
    Ignored,
}

/// What a skip attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    /// Skip applied: flat penalty paid, turn passed
    TurnEnded,
    /// The flat penalty ended the game
    GameOver,
    /// Skip already used by this team, or wrong phase
    Unavailable,
}

/// The trial/turn state machine
pub struct TurnEngine {
    trials: &'static [Trial],
    phase: Phase,
    active_team: Team,
    balance_a: i32,
    balance_b: i32,
    trial_idx: usize,
    target: Option<TrackSummary>,
    skip_used_a: bool,
    skip_used_b: bool,
}

impl Default for TurnEngine {
    fn default() -> Self {
        Self::with_trials(&TRIALS)
    }
}

impl TurnEngine {
    /// Create an engine with the standard ladder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a custom ladder (for testing)
    ///
    /// The ladder must be non-empty with non-decreasing durations.
    pub fn with_trials(trials: &'static [Trial]) -> Self {
        debug_assert!(!trials.is_empty());
        debug_assert!(trials.windows(2).all(|w| w[0].duration_secs <= w[1].duration_secs));
        Self {
            trials,
            phase: Phase::Start,
            active_team: Team::A,
            balance_a: INITIAL_BALANCE,
            balance_b: INITIAL_BALANCE,
            trial_idx: 0,
            target: None,
            skip_used_a: false,
            skip_used_b: false,
        }
    }

    // =========================================================================
    // Read-only state
    // =========================================================================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_team(&self) -> Team {
        self.active_team
    }

    pub fn balance(&self, team: Team) -> i32 {
        match team {
            Team::A => self.balance_a,
            Team::B => self.balance_b,
        }
    }

    pub fn trial_idx(&self) -> usize {
        self.trial_idx
    }

    /// The full trial ladder
    pub fn trials(&self) -> &[Trial] {
        self.trials
    }

    /// The rung the guessing team is currently on
    pub fn current_trial(&self) -> &Trial {
        &self.trials[self.trial_idx]
    }

    pub fn target(&self) -> Option<&TrackSummary> {
        self.target.as_ref()
    }

    /// Whether the given team still has its skip
    pub fn skip_available(&self, team: Team) -> bool {
        match team {
            Team::A => !self.skip_used_a,
            Team::B => !self.skip_used_b,
        }
    }

    /// The winning team, once the game is over
    pub fn winner(&self) -> Option<Team> {
        if self.phase != Phase::GameOver {
            return None;
        }
        Some(if self.balance_a <= 0 { Team::B } else { Team::A })
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Pre-round screen → song choosing
    pub fn begin_choosing(&mut self) -> bool {
        if self.phase != Phase::Start {
            return false;
        }
        self.phase = Phase::Choosing;
        true
    }

    /// A search completed while choosing; results are on screen
    pub fn results_ready(&mut self) -> bool {
        if self.phase != Phase::Choosing && self.phase != Phase::Results {
            return false;
        }
        self.phase = Phase::Results;
        true
    }

    /// Lock in the song for this round and start guessing.
    ///
    /// Resets the trial index regardless of prior state; refused only after
    /// game over.
    pub fn confirm_song(&mut self, track: TrackSummary) -> bool {
        if self.phase == Phase::GameOver {
            return false;
        }
        self.target = Some(track);
        self.trial_idx = 0;
        self.phase = Phase::Guessing;
        true
    }

    /// Record the verbal verdict for the current clip
    pub fn submit_guess(&mut self, correct: bool) -> GuessOutcome {
        if self.phase != Phase::Guessing {
            return GuessOutcome::Ignored;
        }

        if correct {
            let reward = self.current_trial().reward;
            let balance = self.active_balance_mut();
            *balance = (*balance + reward).min(BALANCE_CAP);
            self.phase = Phase::Reveal;
            return GuessOutcome::Reveal;
        }

        let penalty = self.current_trial().penalty;
        match self.apply_damage(penalty) {
            DamageOutcome::GameOver => GuessOutcome::GameOver,
            DamageOutcome::Continue => {
                if self.trial_idx + 1 < self.trials.len() {
                    self.trial_idx += 1;
                    GuessOutcome::NextTrial
                } else {
                    self.end_turn();
                    GuessOutcome::TurnEnded
                }
            }
        }
    }

    /// Concede the round at the ladder's maximum penalty, whatever the
    /// current rung. The track stays revealed.
    pub fn give_up(&mut self) -> GuessOutcome {
        if self.phase != Phase::Guessing {
            return GuessOutcome::Ignored;
        }
        let max_penalty = self.trials[self.trials.len() - 1].penalty;
        match self.apply_damage(max_penalty) {
            DamageOutcome::GameOver => GuessOutcome::GameOver,
            DamageOutcome::Continue => {
                self.phase = Phase::Reveal;
                GuessOutcome::Reveal
            }
        }
    }

    /// Pass the turn for a flat fee. Usable once per team per game.
    pub fn use_skip(&mut self) -> SkipOutcome {
        if self.phase != Phase::Guessing || !self.skip_available(self.active_team) {
            return SkipOutcome::Unavailable;
        }
        match self.active_team {
            Team::A => self.skip_used_a = true,
            Team::B => self.skip_used_b = true,
        }
        match self.apply_damage(SKIP_PENALTY) {
            DamageOutcome::GameOver => SkipOutcome::GameOver,
            DamageOutcome::Continue => {
                self.end_turn();
                SkipOutcome::TurnEnded
            }
        }
    }

    /// Subtract points from the active team. A balance at or below zero is
    /// terminal: the session enters `GameOver` and the caller must stop all
    /// audio and skip any further transition logic.
    pub fn apply_damage(&mut self, amount: i32) -> DamageOutcome {
        let balance = self.active_balance_mut();
        *balance -= amount;
        if *balance <= 0 {
            self.phase = Phase::GameOver;
            DamageOutcome::GameOver
        } else {
            DamageOutcome::Continue
        }
    }

    /// Hand the song choice to the other team (from reveal or mid-guess)
    pub fn select_another_song(&mut self) -> bool {
        if self.phase != Phase::Reveal && self.phase != Phase::Guessing {
            return false;
        }
        self.active_team = self.active_team.other();
        self.target = None;
        self.trial_idx = 0;
        self.phase = Phase::Choosing;
        true
    }

    /// Restore the initial session state
    pub fn reset(&mut self) {
        *self = Self::with_trials(self.trials);
    }

    fn end_turn(&mut self) {
        self.active_team = self.active_team.other();
        self.trial_idx = 0;
        self.target = None;
        self.phase = Phase::Start;
    }

    fn active_balance_mut(&mut self) -> &mut i32 {
        match self.active_team {
            Team::A => &mut self.balance_a,
            Team::B => &mut self.balance_b,
        }
    }
}
