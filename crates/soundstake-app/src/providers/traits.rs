//! Track provider trait
//!
//! Defines the interface that all track search backends must implement.

use crate::error::Result;

use super::types::TrackSummary;

/// A source of playable track listings
///
/// Implementations resolve a text query against a specific catalog service.
/// Providers are called from worker threads, hence the `Send + Sync` bound.
pub trait TrackProvider: Send + Sync {
    /// Display name for the provider (e.g., "Deezer")
    fn name(&self) -> &'static str;

    /// Machine-readable identifier (e.g., "deezer")
    fn id(&self) -> &'static str;

    /// Search for tracks by text query.
    ///
    /// Returns only tracks with a playable preview; a failed lookup yields
    /// an error, never a partial result.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackSummary>>;
}
