//! Configuration constants for the soundstake engine

/// Audio analysis configuration
pub mod audio {
    /// FFT window size for the onset meter
    pub const FFT_SIZE: usize = 512;

    /// Frequency bins per analysis frame (half the FFT window)
    pub const SPECTRUM_BINS: usize = FFT_SIZE / 2;

    /// First bin of the analyzed sub-band (skips DC and near-DC rumble)
    pub const SUB_BAND_LOW: usize = 4;

    /// One past the last analyzed bin (drops the near-Nyquist tail)
    pub const SUB_BAND_HIGH: usize = 196;

    /// Width of the analyzed sub-band in bins
    pub const SUB_BAND_WIDTH: usize = SUB_BAND_HIGH - SUB_BAND_LOW;

    /// Number of visualization bands the sub-band is split into
    pub const METER_BANDS: usize = 12;

    /// Per-frame retain factor of the global energy baseline EMA
    pub const ENERGY_BASELINE_DECAY: f32 = 0.92;

    /// Per-frame retain factor of each band's baseline EMA
    pub const BAND_BASELINE_DECAY: f32 = 0.94;

    /// Gain on energy rises above baseline in the onset sum
    pub const ONSET_ENERGY_GAIN: f32 = 4.0;

    /// Gain on spectral flux in the onset sum
    pub const ONSET_FLUX_GAIN: f32 = 2.5;

    /// Retain factor smoothing the exposed onset value across frames
    pub const ONSET_SMOOTHING: f32 = 0.62;

    /// Gain on per-band rises above their own baseline
    pub const BAND_GAIN: f32 = 5.5;

    /// Retain factor smoothing each band value across frames
    pub const BAND_SMOOTHING: f32 = 0.58;

    /// Scale applied to raw FFT magnitudes before sqrt compression
    pub const BIN_GAIN: f32 = 8.0;
}

/// Playback configuration
pub mod playback {
    /// Engine tick in milliseconds — clip boundaries are checked at this cadence
    pub const TICK_MS: u64 = 50;

    /// Clips at or below this length get boundary padding (seconds)
    pub const SHORT_CLIP_MAX_SECS: f32 = 2.0;

    /// Padding added to short clips so a note's attack isn't truncated (seconds)
    pub const SHORT_CLIP_PADDING_SECS: f32 = 0.3;
}

/// Network configuration
pub mod network {
    /// User agent for HTTP requests
    pub const USER_AGENT: &str = concat!("Soundstake/", env!("CARGO_PKG_VERSION"));

    /// Connection timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Read timeout in seconds
    pub const READ_TIMEOUT_SECS: u64 = 30;
}
