//! Shared provider types

/// A playable track as returned by a search provider
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    /// Provider-specific track ID
    pub id: u64,
    /// Track title
    pub title: String,
    /// Artist display name
    pub artist: String,
    /// URL of the full preview audio
    pub preview_url: String,
    /// Album art URL, if the provider has one
    pub cover_url: Option<String>,
}

impl TrackSummary {
    /// Create a track summary without album art
    pub fn new(
        id: u64,
        title: impl Into<String>,
        artist: impl Into<String>,
        preview_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            preview_url: preview_url.into(),
            cover_url: None,
        }
    }

    /// Attach an album art URL
    pub fn with_cover(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_creation() {
        let track = TrackSummary::new(42, "Mi Mujer", "Nicolas Jaar", "https://cdn/p.mp3");
        assert_eq!(track.id, 42);
        assert_eq!(track.title, "Mi Mujer");
        assert_eq!(track.artist, "Nicolas Jaar");
        assert_eq!(track.preview_url, "https://cdn/p.mp3");
        assert_eq!(track.cover_url, None);
    }

    #[test]
    fn test_track_with_cover() {
        let track = TrackSummary::new(1, "Song", "Artist", "https://cdn/p.mp3")
            .with_cover("https://cdn/cover.jpg");
        assert_eq!(track.cover_url.as_deref(), Some("https://cdn/cover.jpg"));
    }

    #[test]
    fn test_track_clone_and_eq() {
        let track = TrackSummary::new(7, "A", "B", "https://cdn/a.mp3");
        let cloned = track.clone();
        assert_eq!(track, cloned);
    }
}
