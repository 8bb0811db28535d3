//! Preview acquisition
//!
//! Fetching and caching of raw preview bytes for the current track.

pub mod cache;
pub mod fetcher;

pub use cache::{FetchPlan, PreviewCache};
pub use fetcher::PreviewFetcher;
