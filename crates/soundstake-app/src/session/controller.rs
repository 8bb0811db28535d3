//! Session controller
//!
//! Owns the audio engine, preview cache, turn state machine, and track
//! provider, and processes commands from all frontends through a single
//! crossbeam channel. Asynchronous work (search, preview fetch) runs on
//! worker threads that post completions back on the same channel, tagged
//! with a generation number so stale continuations never touch live state.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use soundstake::audio::{AudioAnalysis, AudioEngine, AudioEvent};
use soundstake::preview::{FetchPlan, PreviewCache, PreviewFetcher};

use crate::config::providers::DEFAULT_SEARCH_LIMIT;
use crate::providers::{TrackProvider, TrackSummary};

use super::events::{SessionBus, SessionEvent};
use super::state::{SessionCommand, SessionSnapshot};
use super::turn::{GuessOutcome, Phase, SkipOutcome, TurnEngine};

/// Controller tick — commands are polled at this cadence
const TICK: Duration = Duration::from_millis(50);

/// A chunk request waiting for its preview fetch. The generation records
/// which request issued it; only the most recent one may start playback.
struct PendingClip {
    generation: u64,
    seconds: f32,
}

pub struct SessionController {
    cmd_rx: Receiver<SessionCommand>,
    cmd_tx: Sender<SessionCommand>,
    shared_state: Arc<Mutex<SessionSnapshot>>,
    bus: Arc<SessionBus>,
    provider: Arc<dyn TrackProvider>,
    engine: Option<AudioEngine>,
    fetcher: Option<PreviewFetcher>,
    turn: TurnEngine,
    cache: PreviewCache,
    /// Monotonically increasing counter invalidating stale preview
    /// continuations; only the most recent request may touch playback
    load_generation: u64,
    /// Same discipline for search completions
    search_generation: u64,
    /// Chunk request awaiting its preview fetch, if any
    pending_clip: Option<PendingClip>,
    /// One-shot channel to send the engine's analysis Arc to the UI thread
    analysis_tx: Option<Sender<Arc<Mutex<AudioAnalysis>>>>,
    /// Reusable buffer for collecting engine events (avoids allocation per poll)
    event_buf: Vec<AudioEvent>,
}

impl SessionController {
    pub fn new(
        cmd_rx: Receiver<SessionCommand>,
        cmd_tx: Sender<SessionCommand>,
        shared_state: Arc<Mutex<SessionSnapshot>>,
        provider: Arc<dyn TrackProvider>,
        bus: Arc<SessionBus>,
        analysis_tx: Sender<Arc<Mutex<AudioAnalysis>>>,
    ) -> Self {
        Self {
            cmd_rx,
            cmd_tx,
            shared_state,
            bus,
            provider,
            engine: None,
            fetcher: None,
            turn: TurnEngine::new(),
            cache: PreviewCache::new(),
            load_generation: 0,
            search_generation: 0,
            pending_clip: None,
            analysis_tx: Some(analysis_tx),
            event_buf: Vec::new(),
        }
    }

    /// Run the controller event loop (blocking, call from a dedicated thread)
    pub fn run(&mut self) {
        match AudioEngine::new() {
            Ok(engine) => {
                // Send analysis Arc to the UI thread before storing the engine
                if let Some(tx) = self.analysis_tx.take() {
                    let _ = tx.send(engine.analysis());
                }
                self.engine = Some(engine);
            }
            Err(e) => {
                eprintln!("Failed to initialize audio engine: {e}");
                return;
            }
        }

        match PreviewFetcher::new() {
            Ok(fetcher) => self.fetcher = Some(fetcher),
            Err(e) => {
                // Without a client every fetch reports unavailable; the
                // session itself keeps working.
                eprintln!("Failed to initialize HTTP client: {e}");
            }
        }

        loop {
            match self.cmd_rx.recv_timeout(TICK) {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        break;
                    }
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }

            self.poll_engine_events();
        }

        if let Some(engine) = self.engine.take() {
            engine.shutdown();
        }
    }

    /// Handle a single command. Returns true if the loop should exit.
    fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Shutdown => return true,

            SessionCommand::Search(query) => self.handle_search(query),
            SessionCommand::ConfirmSong(track) => self.handle_confirm_song(track),
            SessionCommand::PlayChunk { seconds } => self.handle_play_chunk(seconds),

            SessionCommand::Pause => {
                if let Some(engine) = &self.engine {
                    engine.pause();
                }
            }
            SessionCommand::Resume => {
                if let Some(engine) = &self.engine {
                    engine.resume();
                }
            }

            SessionCommand::SubmitGuess { correct } => self.handle_submit_guess(correct),
            SessionCommand::GiveUp => self.handle_give_up(),
            SessionCommand::UseSkip => self.handle_use_skip(),

            SessionCommand::BeginChoosing => {
                if self.turn.begin_choosing() {
                    self.publish_turn_state();
                    self.bus.emit(SessionEvent::PhaseChanged(Phase::Choosing));
                }
            }
            SessionCommand::SelectAnotherSong => {
                if self.turn.select_another_song() {
                    self.teardown_round_audio();
                    self.publish_turn_state();
                    self.bus.emit(SessionEvent::TurnChanged(self.turn.active_team()));
                    self.bus.emit(SessionEvent::PhaseChanged(Phase::Choosing));
                }
            }
            SessionCommand::ResetGame => {
                self.turn.reset();
                self.teardown_round_audio();
                self.search_generation += 1;
                {
                    let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                    *state = SessionSnapshot::default();
                }
                self.bus.emit(SessionEvent::PhaseChanged(Phase::Start));
            }

            SessionCommand::InternalSearchLoaded { generation, result } => {
                self.handle_search_loaded(generation, result);
            }
            SessionCommand::InternalPreviewLoaded {
                generation,
                url,
                result,
            } => {
                self.handle_preview_loaded(generation, url, result);
            }
        }
        false
    }

    /// Search on a worker thread; stale results are discarded by generation.
    fn handle_search(&mut self, query: String) {
        self.search_generation += 1;
        let generation = self.search_generation;

        {
            let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
            state.loading = true;
            state.last_error = None;
        }

        let provider = self.provider.clone();
        let cmd_tx = self.cmd_tx.clone();
        thread::Builder::new()
            .name("track-search".into())
            .spawn(move || {
                let result = provider
                    .search(&query, DEFAULT_SEARCH_LIMIT)
                    .map_err(|e| e.to_string());
                let _ = cmd_tx.send(SessionCommand::InternalSearchLoaded { generation, result });
            })
            .expect("Failed to spawn track-search thread");
    }

    fn handle_search_loaded(
        &mut self,
        generation: u64,
        result: Result<Vec<TrackSummary>, String>,
    ) {
        if generation != self.search_generation {
            // A newer search was issued while this one was in flight — discard.
            return;
        }

        match result {
            Ok(tracks) => {
                self.turn.results_ready();
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                state.loading = false;
                state.search_results = tracks;
                Self::sync_turn(&self.turn, &mut state);
            }
            Err(e) => {
                eprintln!("Track search failed: {e}");
                {
                    let mut state =
                        self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                    state.loading = false;
                    state.search_results.clear();
                    state.last_error = Some(e.clone());
                }
                self.bus.emit(SessionEvent::Error(e));
            }
        }
    }

    /// Lock in the chosen song and prime its preview (fire-and-forget).
    fn handle_confirm_song(&mut self, track: TrackSummary) {
        if !self.turn.confirm_song(track.clone()) {
            return;
        }

        // The previous track's audio, cache, and any in-flight search are
        // dead the moment a new song is confirmed.
        if let Some(engine) = &self.engine {
            engine.stop();
        }
        self.cache.invalidate();
        self.pending_clip = None;
        self.load_generation += 1;
        self.search_generation += 1;
        let generation = self.load_generation;

        if let FetchPlan::Fetch = self.cache.plan(&track.preview_url) {
            self.spawn_fetch(generation, track.preview_url.clone());
        }

        {
            let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
            state.search_results.clear();
            state.last_error = None;
            Self::sync_turn(&self.turn, &mut state);
        }
        self.bus.emit(SessionEvent::PhaseChanged(Phase::Guessing));
    }

    /// Play a bounded chunk of the current track's preview.
    fn handle_play_chunk(&mut self, seconds: f32) {
        let Some(url) = self.turn.target().map(|t| t.preview_url.clone()) else {
            return;
        };

        // Every chunk request supersedes any older in-flight continuation
        self.load_generation += 1;
        let generation = self.load_generation;

        match self.cache.plan(&url) {
            FetchPlan::Ready(bytes) => {
                self.pending_clip = None;
                if let Some(engine) = &self.engine {
                    engine.play_clip(bytes, seconds);
                }
            }
            FetchPlan::Pending => {
                self.pending_clip = Some(PendingClip { generation, seconds });
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                state.loading = true;
            }
            FetchPlan::Fetch => {
                self.pending_clip = Some(PendingClip { generation, seconds });
                self.spawn_fetch(generation, url);
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                state.loading = true;
            }
        }
    }

    fn handle_preview_loaded(
        &mut self,
        _generation: u64,
        url: String,
        result: Result<Arc<[u8]>, String>,
    ) {
        let bytes = match result {
            Ok(b) => Some(b),
            Err(e) => {
                eprintln!("Preview fetch failed: {e}");
                None
            }
        };

        // The cache takes the result even when the requesting operation was
        // superseded — a completed fetch for the still-wanted URL stays
        // useful. A track change invalidated the in-flight mark, in which
        // case the whole completion is discarded here.
        let applied = self.cache.complete(&url, bytes.clone());
        if !applied {
            return;
        }

        {
            let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
            state.loading = false;
            if bytes.is_none() {
                state.last_error = Some("Preview unavailable".to_string());
            }
        }

        match bytes {
            Some(bytes) => {
                // Only the most recently issued chunk request may start
                // playback; older continuations died when the generation moved.
                let wanted = self
                    .pending_clip
                    .as_ref()
                    .is_some_and(|p| p.generation == self.load_generation);
                if !wanted {
                    return;
                }
                let pending = self.pending_clip.take().unwrap();
                let current = self
                    .turn
                    .target()
                    .map(|t| t.preview_url == url)
                    .unwrap_or(false);
                if current {
                    if let Some(engine) = &self.engine {
                        engine.play_clip(bytes, pending.seconds);
                    }
                }
            }
            None => {
                self.pending_clip = None;
                self.bus
                    .emit(SessionEvent::Error("Preview unavailable".to_string()));
            }
        }
    }

    fn handle_submit_guess(&mut self, correct: bool) {
        match self.turn.submit_guess(correct) {
            GuessOutcome::Reveal => {
                self.publish_turn_state();
                self.emit_balances();
                self.bus.emit(SessionEvent::PhaseChanged(Phase::Reveal));
            }
            GuessOutcome::NextTrial => {
                self.publish_turn_state();
                self.emit_balances();
            }
            GuessOutcome::TurnEnded => {
                self.teardown_round_audio();
                self.publish_turn_state();
                self.emit_balances();
                self.bus.emit(SessionEvent::TurnChanged(self.turn.active_team()));
            }
            GuessOutcome::GameOver => self.finish_game(),
            GuessOutcome::Ignored => {}
        }
    }

    fn handle_give_up(&mut self) {
        match self.turn.give_up() {
            GuessOutcome::Reveal => {
                self.publish_turn_state();
                self.emit_balances();
                self.bus.emit(SessionEvent::PhaseChanged(Phase::Reveal));
            }
            GuessOutcome::GameOver => self.finish_game(),
            _ => {}
        }
    }

    fn handle_use_skip(&mut self) {
        match self.turn.use_skip() {
            SkipOutcome::TurnEnded => {
                self.teardown_round_audio();
                self.publish_turn_state();
                self.emit_balances();
                self.bus.emit(SessionEvent::TurnChanged(self.turn.active_team()));
            }
            SkipOutcome::GameOver => self.finish_game(),
            SkipOutcome::Unavailable => {}
        }
    }

    /// Game over: stop all audio, invalidate pending work, announce the winner.
    fn finish_game(&mut self) {
        if let Some(engine) = &self.engine {
            engine.stop();
        }
        self.pending_clip = None;
        self.load_generation += 1;
        {
            let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
            state.loading = false;
            state.is_audio_playing = false;
        }
        self.publish_turn_state();
        self.emit_balances();
        if let Some(winner) = self.turn.winner() {
            self.bus.emit(SessionEvent::GameOver { winner });
        }
        self.bus.emit(SessionEvent::PhaseChanged(Phase::GameOver));
    }

    /// Stop audio and drop everything tied to the outgoing track
    fn teardown_round_audio(&mut self) {
        if let Some(engine) = &self.engine {
            engine.stop();
        }
        self.cache.invalidate();
        self.pending_clip = None;
        self.load_generation += 1;
        self.search_generation += 1;
        let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
        state.loading = false;
        state.is_audio_playing = false;
    }

    fn spawn_fetch(&self, generation: u64, url: String) {
        let Some(fetcher) = self.fetcher.clone() else {
            let _ = self.cmd_tx.send(SessionCommand::InternalPreviewLoaded {
                generation,
                url,
                result: Err("HTTP client unavailable".to_string()),
            });
            return;
        };
        let cmd_tx = self.cmd_tx.clone();
        thread::Builder::new()
            .name("preview-fetch".into())
            .spawn(move || {
                let result = fetcher.fetch(&url).map_err(|e| e.to_string());
                let _ = cmd_tx.send(SessionCommand::InternalPreviewLoaded {
                    generation,
                    url,
                    result,
                });
            })
            .expect("Failed to spawn preview-fetch thread");
    }

    /// Poll audio engine events into the snapshot
    fn poll_engine_events(&mut self) {
        // Collect events into a reusable buffer to avoid borrow conflict with self
        self.event_buf.clear();
        if let Some(engine) = &self.engine {
            while let Some(event) = engine.try_recv_event() {
                self.event_buf.push(event);
            }
        } else {
            return;
        }

        let mut buf = std::mem::take(&mut self.event_buf);
        for event in buf.drain(..) {
            self.handle_engine_event(event);
        }
        self.event_buf = buf; // put back (empty but retains capacity)
    }

    fn handle_engine_event(&mut self, event: AudioEvent) {
        match event {
            AudioEvent::Playing(_) => {
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                state.is_audio_playing = true;
                state.loading = false;
            }
            AudioEvent::ClipEnded | AudioEvent::Stopped | AudioEvent::Paused => {
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                state.is_audio_playing = false;
            }
            AudioEvent::Resumed => {
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                state.is_audio_playing = true;
            }
            AudioEvent::Error(e) => {
                // Playback failure is recovered locally: nothing audible
                // happened and the session state is untouched.
                eprintln!("Engine error: {e}");
                {
                    let mut state =
                        self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                    state.is_audio_playing = false;
                    state.loading = false;
                    state.last_error = Some(e.clone());
                }
                self.bus.emit(SessionEvent::Error(e));
            }
        }
    }

    /// Copy the turn engine's state into the shared snapshot
    fn publish_turn_state(&self) {
        let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
        Self::sync_turn(&self.turn, &mut state);
    }

    fn sync_turn(turn: &TurnEngine, state: &mut SessionSnapshot) {
        state.phase = turn.phase();
        state.active_team = turn.active_team();
        state.balance_a = turn.balance(super::turn::Team::A);
        state.balance_b = turn.balance(super::turn::Team::B);
        state.trial_idx = turn.trial_idx();
        state.target_track = turn.target().cloned();
        state.skip_available = turn.skip_available(turn.active_team());
    }

    fn emit_balances(&self) {
        self.bus.emit(SessionEvent::BalancesChanged {
            a: self.turn.balance(super::turn::Team::A),
            b: self.turn.balance(super::turn::Team::B),
        });
    }
}
