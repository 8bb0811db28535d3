//! Audio engine
//!
//! Runs clip playback on a dedicated thread, accepting commands via
//! crossbeam channels and emitting events back. Exactly one decoded source
//! is attached to the sink at any instant; the previous one is torn down
//! synchronously before a new one starts. Clip boundaries are enforced by
//! the engine tick, independent of the sink's own end-of-media signal, so a
//! single decoded preview serves every trial length.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use rodio::{Decoder, DeviceSinkBuilder, Player, Source};

use crate::config::playback::{SHORT_CLIP_MAX_SECS, SHORT_CLIP_PADDING_SECS, TICK_MS};
use crate::error::EngineError;

use super::analyzer::AnalyzingSource;
use super::types::{AudioAnalysis, AudioCommand, AudioEvent, ClipInfo, PlaybackState};

/// The decoded resource currently attached to the sink
struct CurrentClip {
    bytes: Arc<[u8]>,
    channels: u16,
    sample_rate: u32,
}

/// Audio engine that manages clip playback on a dedicated thread
pub struct AudioEngine {
    cmd_tx: Sender<AudioCommand>,
    event_rx: Receiver<AudioEvent>,
    analysis: Arc<Mutex<AudioAnalysis>>,
    thread: Option<JoinHandle<()>>,
}

impl AudioEngine {
    /// Create a new audio engine, spawning the engine thread.
    ///
    /// Blocks until the audio output stream is initialized (or fails).
    pub fn new() -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = bounded::<AudioCommand>(16);
        let (event_tx, event_rx) = bounded::<AudioEvent>(64);
        let (init_tx, init_rx) = bounded::<Result<(), String>>(1);

        let analysis = Arc::new(Mutex::new(AudioAnalysis::default()));
        let analysis_thread = analysis.clone();

        let thread = thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                Self::run(cmd_rx, event_tx, init_tx, analysis_thread);
            })
            .map_err(|e| EngineError::Audio(format!("Failed to spawn audio thread: {}", e)))?;

        // Wait for initialization
        let init_result = init_rx
            .recv()
            .map_err(|_| EngineError::Audio("Audio thread terminated during init".to_string()))?;

        init_result.map_err(EngineError::Audio)?;

        Ok(Self {
            cmd_tx,
            event_rx,
            analysis,
            thread: Some(thread),
        })
    }

    /// Send a command to the engine
    pub fn send(&self, cmd: AudioCommand) {
        let _ = self.cmd_tx.send(cmd);
    }

    /// Play a bounded excerpt of the given fully-buffered track bytes
    pub fn play_clip(&self, bytes: Arc<[u8]>, limit_secs: f32) {
        self.send(AudioCommand::PlayClip { bytes, limit_secs });
    }

    /// Stop playback and release the decoded resource
    pub fn stop(&self) {
        self.send(AudioCommand::Stop);
    }

    /// Pause playback (no-op unless playing)
    pub fn pause(&self) {
        self.send(AudioCommand::Pause);
    }

    /// Resume playback (no-op unless paused)
    pub fn resume(&self) {
        self.send(AudioCommand::Resume);
    }

    /// Set volume (clamped to 0.0..=2.0)
    pub fn set_volume(&self, volume: f32) {
        self.send(AudioCommand::SetVolume(volume));
    }

    /// Non-blocking poll for the next event
    pub fn try_recv_event(&self) -> Option<AudioEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Get a reference to the event receiver for use with `select!`
    pub fn event_receiver(&self) -> &Receiver<AudioEvent> {
        &self.event_rx
    }

    /// Get a handle to the shared analysis data
    pub fn analysis(&self) -> Arc<Mutex<AudioAnalysis>> {
        self.analysis.clone()
    }

    /// Graceful shutdown (consumes self)
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    /// The engine's main loop, running on the dedicated thread
    fn run(
        cmd_rx: Receiver<AudioCommand>,
        event_tx: Sender<AudioEvent>,
        init_tx: Sender<Result<(), String>>,
        analysis: Arc<Mutex<AudioAnalysis>>,
    ) {
        // Create audio output on this thread (cpal streams may be !Send)
        let mut stream = match DeviceSinkBuilder::open_default_sink() {
            Ok(s) => s,
            Err(e) => {
                let _ = init_tx.send(Err(format!("Failed to open audio output: {}", e)));
                return;
            }
        };
        stream.log_on_drop(false);

        // `stream` must be declared before `sink` so Rust drops sink first
        let sink = Player::connect_new(stream.mixer());

        let _ = init_tx.send(Ok(()));

        let mut state = PlaybackState::Stopped;
        let mut current_volume: f32 = 1.0;
        let mut clip_boundary: Option<Duration> = None;
        let mut current_clip: Option<CurrentClip> = None;

        loop {
            match cmd_rx.recv_timeout(Duration::from_millis(TICK_MS)) {
                Ok(cmd) => match cmd {
                    AudioCommand::PlayClip { bytes, limit_secs } => {
                        // Reuse the attached resource when the bytes are the
                        // same buffer and it can rewind; otherwise tear down
                        // and decode fresh.
                        let reusable = current_clip
                            .as_ref()
                            .is_some_and(|c| Arc::ptr_eq(&c.bytes, &bytes))
                            && !sink.empty()
                            && sink.try_seek(Duration::ZERO).is_ok();

                        if let Ok(mut data) = analysis.lock() {
                            data.reset();
                        }

                        if reusable {
                            let clip = current_clip.as_ref().unwrap();
                            let info = ClipInfo {
                                channels: clip.channels,
                                sample_rate: clip.sample_rate,
                                limit_secs,
                            };
                            clip_boundary = Some(clip_limit(limit_secs));
                            sink.set_volume(current_volume);
                            sink.play();
                            state = PlaybackState::Playing;
                            let _ = event_tx.send(AudioEvent::Playing(info));
                        } else {
                            // Full teardown before attaching a new source
                            sink.stop();
                            clip_boundary = None;
                            current_clip = None;

                            match Decoder::new(Cursor::new(bytes.clone())) {
                                Ok(source) => {
                                    let info = ClipInfo {
                                        channels: source.channels().get(),
                                        sample_rate: source.sample_rate().get(),
                                        limit_secs,
                                    };
                                    let analyzing =
                                        AnalyzingSource::new(source, analysis.clone());
                                    sink.append(analyzing);
                                    sink.set_volume(current_volume);
                                    sink.play();
                                    clip_boundary = Some(clip_limit(limit_secs));
                                    current_clip = Some(CurrentClip {
                                        bytes,
                                        channels: info.channels,
                                        sample_rate: info.sample_rate,
                                    });
                                    state = PlaybackState::Playing;
                                    let _ = event_tx.send(AudioEvent::Playing(info));
                                }
                                Err(e) => {
                                    state = PlaybackState::Stopped;
                                    let _ = event_tx
                                        .send(AudioEvent::Error(format!("Decode error: {}", e)));
                                }
                            }
                        }
                    }
                    AudioCommand::Stop => {
                        sink.stop();
                        if let Ok(mut data) = analysis.lock() {
                            data.reset();
                        }
                        clip_boundary = None;
                        current_clip = None;
                        if state != PlaybackState::Stopped {
                            state = PlaybackState::Stopped;
                            let _ = event_tx.send(AudioEvent::Stopped);
                        }
                    }
                    AudioCommand::Pause => {
                        if state == PlaybackState::Playing {
                            sink.pause();
                            state = PlaybackState::Paused;
                            let _ = event_tx.send(AudioEvent::Paused);
                        }
                    }
                    AudioCommand::Resume => {
                        if state == PlaybackState::Paused {
                            sink.play();
                            state = PlaybackState::Playing;
                            let _ = event_tx.send(AudioEvent::Resumed);
                        }
                    }
                    AudioCommand::SetVolume(vol) => {
                        current_volume = vol.clamp(0.0, 2.0);
                        sink.set_volume(current_volume);
                    }
                    AudioCommand::Shutdown => {
                        sink.stop();
                        break;
                    }
                },
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    if state != PlaybackState::Playing {
                        continue;
                    }

                    // Clip boundary check — the decoded resource keeps playing
                    // past the boundary otherwise, since it holds the full preview.
                    if let Some(boundary) = clip_boundary {
                        if sink.get_pos() >= boundary {
                            sink.pause();
                            if sink.try_seek(Duration::ZERO).is_err() {
                                // Can't rewind this source; drop it so the
                                // next clip decodes fresh from the bytes.
                                sink.stop();
                                current_clip = None;
                            }
                            if let Ok(mut data) = analysis.lock() {
                                data.reset();
                            }
                            clip_boundary = None;
                            state = PlaybackState::Stopped;
                            let _ = event_tx.send(AudioEvent::ClipEnded);
                            continue;
                        }
                    }

                    // True end of media (preview shorter than the requested clip)
                    if sink.empty() {
                        if let Ok(mut data) = analysis.lock() {
                            data.reset();
                        }
                        clip_boundary = None;
                        current_clip = None;
                        state = PlaybackState::Stopped;
                        let _ = event_tx.send(AudioEvent::Stopped);
                    }
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    break;
                }
            }
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

/// Boundary for a clip of the requested length. Short clips get a small
/// fixed padding so truncation doesn't cut off a note's attack.
fn clip_limit(limit_secs: f32) -> Duration {
    if !limit_secs.is_finite() || limit_secs <= 0.0 {
        return Duration::ZERO;
    }
    let secs = if limit_secs <= SHORT_CLIP_MAX_SECS {
        limit_secs + SHORT_CLIP_PADDING_SECS
    } else {
        limit_secs
    };
    Duration::from_secs_f32(secs)
}
