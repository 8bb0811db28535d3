//! Shared audio types
//!
//! Pure data types used across the audio subsystem.

use std::fmt;
use std::sync::Arc;

use super::meter::SpectralMeter;

/// Current playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "Stopped"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
        }
    }
}

/// Properties of the clip that just started playing
#[derive(Debug, Clone)]
pub struct ClipInfo {
    pub channels: u16,
    pub sample_rate: u32,
    /// Requested clip length in seconds (before any boundary padding)
    pub limit_secs: f32,
}

impl fmt::Display for ClipInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channel_str = if self.channels == 1 { "Mono" } else { "Stereo" };
        write!(
            f,
            "{}s clip · {} Hz · {}",
            self.limit_secs, self.sample_rate, channel_str
        )
    }
}

/// Commands sent to the audio engine
pub enum AudioCommand {
    /// Play a bounded excerpt of the given fully-buffered track bytes
    PlayClip {
        bytes: Arc<[u8]>,
        limit_secs: f32,
    },
    /// Stop playback and release the decoded resource
    Stop,
    /// Pause playback
    Pause,
    /// Resume playback
    Resume,
    /// Set volume (0.0..=2.0)
    SetVolume(f32),
    /// Shut down the engine thread
    Shutdown,
}

impl fmt::Debug for AudioCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioCommand::PlayClip { bytes, limit_secs } => f
                .debug_struct("PlayClip")
                .field("bytes_len", &bytes.len())
                .field("limit_secs", limit_secs)
                .finish(),
            AudioCommand::Stop => write!(f, "Stop"),
            AudioCommand::Pause => write!(f, "Pause"),
            AudioCommand::Resume => write!(f, "Resume"),
            AudioCommand::SetVolume(v) => write!(f, "SetVolume({})", v),
            AudioCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Events emitted by the audio engine
#[derive(Debug, Clone)]
pub enum AudioEvent {
    /// Clip playback started
    Playing(ClipInfo),
    /// The clip reached its boundary; position was reset to zero
    ClipEnded,
    /// Playback stopped (explicit stop or true end of media)
    Stopped,
    /// Playback paused
    Paused,
    /// Playback resumed
    Resumed,
    /// An error occurred; the engine stays usable
    Error(String),
}

/// Shared analysis state for visualization (onset meter + bands)
#[derive(Clone, Default)]
pub struct AudioAnalysis {
    pub meter: SpectralMeter,
    pub sample_count: u64,
}

impl AudioAnalysis {
    /// Reset meter state and counters to zero
    pub fn reset(&mut self) {
        self.meter.reset();
        self.sample_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- PlaybackState ---

    #[test]
    fn playback_state_default_is_stopped() {
        assert_eq!(PlaybackState::default(), PlaybackState::Stopped);
    }

    #[test]
    fn playback_state_display() {
        assert_eq!(PlaybackState::Stopped.to_string(), "Stopped");
        assert_eq!(PlaybackState::Playing.to_string(), "Playing");
        assert_eq!(PlaybackState::Paused.to_string(), "Paused");
    }

    // --- ClipInfo ---

    #[test]
    fn clip_info_display_stereo() {
        let info = ClipInfo {
            channels: 2,
            sample_rate: 44100,
            limit_secs: 5.0,
        };
        assert_eq!(info.to_string(), "5s clip · 44100 Hz · Stereo");
    }

    #[test]
    fn clip_info_display_mono() {
        let info = ClipInfo {
            channels: 1,
            sample_rate: 22050,
            limit_secs: 1.0,
        };
        assert!(info.to_string().contains("Mono"));
    }

    // --- AudioCommand ---

    #[test]
    fn audio_command_debug() {
        assert_eq!(format!("{:?}", AudioCommand::Stop), "Stop");
        assert_eq!(format!("{:?}", AudioCommand::Pause), "Pause");
        assert_eq!(format!("{:?}", AudioCommand::Resume), "Resume");
        assert_eq!(format!("{:?}", AudioCommand::SetVolume(0.5)), "SetVolume(0.5)");
        assert_eq!(format!("{:?}", AudioCommand::Shutdown), "Shutdown");
    }

    #[test]
    fn play_clip_debug_hides_bytes() {
        let cmd = AudioCommand::PlayClip {
            bytes: Arc::from(vec![0u8; 1234].as_slice()),
            limit_secs: 10.0,
        };
        let debug = format!("{:?}", cmd);
        assert!(debug.contains("PlayClip"));
        assert!(debug.contains("1234"));
        assert!(debug.contains("10.0"));
    }

    // --- AudioEvent ---

    #[test]
    fn audio_event_clone_and_debug() {
        let evt = AudioEvent::Error("test error".to_string());
        let cloned = evt.clone();
        assert!(format!("{:?}", cloned).contains("test error"));
        assert!(format!("{:?}", AudioEvent::ClipEnded).contains("ClipEnded"));
    }

    // --- AudioAnalysis ---

    #[test]
    fn analysis_default_is_zero() {
        let analysis = AudioAnalysis::default();
        assert_eq!(analysis.meter.onset(), 0.0);
        assert!(analysis.meter.bands().iter().all(|&b| b == 0.0));
        assert_eq!(analysis.sample_count, 0);
    }

    #[test]
    fn analysis_reset() {
        let mut analysis = AudioAnalysis::default();
        analysis.sample_count = 42;
        analysis
            .meter
            .process_frame(&[0.8; crate::config::audio::SPECTRUM_BINS]);
        analysis.reset();
        assert_eq!(analysis.sample_count, 0);
        assert_eq!(analysis.meter.onset(), 0.0);
        assert!(analysis.meter.bands().iter().all(|&b| b == 0.0));
    }
}
