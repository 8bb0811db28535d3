//! Preview fetching
//!
//! Blocking HTTP download of a track's full preview bytes.

use std::sync::Arc;
use std::time::Duration;

use crate::config::network::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, USER_AGENT};
use crate::error::{EngineError, Result};

/// Downloads preview audio with standard client configuration
#[derive(Clone)]
pub struct PreviewFetcher {
    client: reqwest::blocking::Client,
}

impl PreviewFetcher {
    /// Create a new fetcher with default Soundstake settings
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Fetch the full preview bytes for `url`.
    ///
    /// This is a blocking operation — call it from a worker thread.
    pub fn fetch(&self, url: &str) -> Result<Arc<[u8]>> {
        if url.is_empty() {
            return Err(EngineError::Unavailable("empty preview URL".to_string()));
        }
        let resp = self.client.get(url).send()?;
        if !resp.status().is_success() {
            return Err(EngineError::Unavailable(format!(
                "HTTP {} for {}",
                resp.status(),
                url
            )));
        }
        let bytes = resp.bytes()?;
        if bytes.is_empty() {
            return Err(EngineError::Unavailable(format!("empty body for {}", url)));
        }
        Ok(Arc::from(bytes.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetcher_creation() {
        let fetcher = PreviewFetcher::new();
        assert!(fetcher.is_ok());
    }

    #[test]
    fn empty_url_is_unavailable() {
        let fetcher = PreviewFetcher::new().unwrap();
        let result = fetcher.fetch("");
        assert!(matches!(result, Err(EngineError::Unavailable(_))));
    }

    #[test]
    fn unreachable_host_errors() {
        let fetcher = PreviewFetcher::new().unwrap();
        let result = fetcher.fetch("http://invalid.invalid.invalid/preview.mp3");
        assert!(result.is_err());
    }

    #[test]
    fn fetcher_is_cloneable() {
        let fetcher = PreviewFetcher::new().unwrap();
        let _clone = fetcher.clone();
    }
}
