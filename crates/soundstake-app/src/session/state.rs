//! Shared session state and commands
//!
//! `SessionCommand` is the unified command type sent by any frontend.
//! `SessionSnapshot` is the read-only state frontends render from.

use std::fmt;
use std::sync::Arc;

use crate::config::session::TRIALS;
use crate::providers::TrackSummary;

use super::turn::{Phase, Team};

/// Commands sent by any frontend (plus controller-internal completions)
pub enum SessionCommand {
    // Song selection
    Search(String),
    ConfirmSong(TrackSummary),
    SelectAnotherSong,
    BeginChoosing,

    // Clip playback
    PlayChunk { seconds: f32 },
    Pause,
    Resume,

    // Verdicts
    SubmitGuess { correct: bool },
    GiveUp,
    UseSkip,

    // Session lifecycle
    ResetGame,
    Shutdown,

    // Internal: worker-thread completions (not sent by frontends)
    InternalSearchLoaded {
        generation: u64,
        result: Result<Vec<TrackSummary>, String>,
    },
    InternalPreviewLoaded {
        generation: u64,
        url: String,
        result: Result<Arc<[u8]>, String>,
    },
}

impl fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionCommand::Search(q) => f.debug_tuple("Search").field(q).finish(),
            SessionCommand::ConfirmSong(t) => f.debug_tuple("ConfirmSong").field(&t.title).finish(),
            SessionCommand::SelectAnotherSong => write!(f, "SelectAnotherSong"),
            SessionCommand::BeginChoosing => write!(f, "BeginChoosing"),
            SessionCommand::PlayChunk { seconds } => {
                f.debug_struct("PlayChunk").field("seconds", seconds).finish()
            }
            SessionCommand::Pause => write!(f, "Pause"),
            SessionCommand::Resume => write!(f, "Resume"),
            SessionCommand::SubmitGuess { correct } => {
                f.debug_struct("SubmitGuess").field("correct", correct).finish()
            }
            SessionCommand::GiveUp => write!(f, "GiveUp"),
            SessionCommand::UseSkip => write!(f, "UseSkip"),
            SessionCommand::ResetGame => write!(f, "ResetGame"),
            SessionCommand::Shutdown => write!(f, "Shutdown"),
            SessionCommand::InternalSearchLoaded { generation, result } => f
                .debug_struct("InternalSearchLoaded")
                .field("generation", generation)
                .field("ok", &result.is_ok())
                .finish(),
            SessionCommand::InternalPreviewLoaded {
                generation,
                url,
                result,
            } => f
                .debug_struct("InternalPreviewLoaded")
                .field("generation", generation)
                .field("url", url)
                .field("bytes_len", &result.as_ref().map(|b| b.len()).ok())
                .finish(),
        }
    }
}

/// Snapshot of session state — shared between controller and frontends
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub active_team: Team,
    pub balance_a: i32,
    pub balance_b: i32,
    /// Current rung into the trial ladder
    pub trial_idx: usize,
    /// Clip length of every ladder rung, for the UI's chunk buttons
    pub trial_durations: Vec<u32>,
    pub target_track: Option<TrackSummary>,
    pub search_results: Vec<TrackSummary>,
    /// True while a search or preview fetch is outstanding
    pub loading: bool,
    /// True while a clip is actually audible (playing, not paused)
    pub is_audio_playing: bool,
    /// Whether the active team still has its skip
    pub skip_available: bool,
    /// Last error from search, fetch, or the audio engine
    pub last_error: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::default(),
            active_team: Team::default(),
            balance_a: crate::config::session::INITIAL_BALANCE,
            balance_b: crate::config::session::INITIAL_BALANCE,
            trial_idx: 0,
            trial_durations: TRIALS.iter().map(|t| t.duration_secs).collect(),
            target_track: None,
            search_results: Vec::new(),
            loading: false,
            is_audio_playing: false,
            skip_available: true,
            last_error: None,
        }
    }
}
