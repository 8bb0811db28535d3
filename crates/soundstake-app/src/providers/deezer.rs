//! Deezer API provider
//!
//! Implementation of `TrackProvider` for the Deezer public search API
//! (<https://developers.deezer.com/api/search>).

use crate::config::providers::DEEZER_DEFAULT_SERVER;
use crate::error::Result;
use crate::network::HttpClient;

use super::traits::TrackProvider;
use super::types::TrackSummary;

use serde::Deserialize;

// =============================================================================
// Internal API response types (serde)
// =============================================================================

#[derive(Debug, Deserialize)]
struct DzSearchResponse {
    #[serde(default)]
    data: Vec<DzTrack>,
}

#[derive(Debug, Deserialize)]
struct DzTrack {
    id: u64,
    title: String,
    #[serde(default)]
    preview: String,
    artist: DzArtist,
    #[serde(default)]
    album: Option<DzAlbum>,
}

#[derive(Debug, Deserialize)]
struct DzArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DzAlbum {
    #[serde(default)]
    cover_medium: String,
}

/// Convert an empty string to None
fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl From<DzTrack> for TrackSummary {
    fn from(dz: DzTrack) -> Self {
        let cover = dz
            .album
            .as_ref()
            .and_then(|album| non_empty(&album.cover_medium));

        Self {
            id: dz.id,
            title: dz.title,
            artist: dz.artist.name,
            preview_url: dz.preview,
            cover_url: cover,
        }
    }
}

// =============================================================================
// DeezerProvider
// =============================================================================

/// Deezer search provider
pub struct DeezerProvider {
    client: HttpClient,
    base_url: String,
}

impl DeezerProvider {
    /// Create a provider using the default server
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: DEEZER_DEFAULT_SERVER.to_string(),
        })
    }

    /// Create a provider with a custom base URL (for testing or proxies)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.into(),
        })
    }

    /// Build a full API URL from an endpoint path
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl TrackProvider for DeezerProvider {
    fn name(&self) -> &'static str {
        "Deezer"
    }

    fn id(&self) -> &'static str {
        "deezer"
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackSummary>> {
        let limit_str = limit.to_string();
        let resp: DzSearchResponse = self
            .client
            .get_json_query(&self.url("/search"), &[("q", query), ("limit", &limit_str)])?;

        // Tracks without a preview can't be played — drop them here so the
        // session never confirms an unplayable song.
        let tracks = resp
            .data
            .into_iter()
            .filter(|t| !t.preview.is_empty())
            .map(TrackSummary::from)
            .collect();

        Ok(tracks)
    }
}
