//! Error types for the soundstake engine
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for the soundstake engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{}", friendly_network_error(.0))]
    Network(#[from] reqwest::Error),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Preview unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the soundstake engine
pub type Result<T> = std::result::Result<T, EngineError>;

fn friendly_network_error(e: &reqwest::Error) -> String {
    if e.is_builder() {
        if let Some(url) = e.url() {
            return format!("Invalid URL: {url}");
        }
        return "Invalid URL".to_string();
    }
    if e.is_connect() {
        if let Some(url) = e.url() {
            return format!("Could not connect to {}", url.host_str().unwrap_or("server"));
        }
        return "Could not connect to server".to_string();
    }
    if e.is_timeout() {
        return "Connection timed out".to_string();
    }
    if e.is_status() {
        if let Some(status) = e.status() {
            return format!("Server returned {status}");
        }
    }
    format!("Network error: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_error_display() {
        let e = EngineError::Audio("no output device".to_string());
        assert_eq!(e.to_string(), "Audio error: no output device");
    }

    #[test]
    fn decode_error_display() {
        let e = EngineError::Decode("bad frame".to_string());
        assert_eq!(e.to_string(), "Decode error: bad frame");
    }

    #[test]
    fn unavailable_error_display() {
        let e = EngineError::Unavailable("HTTP 404".to_string());
        assert!(e.to_string().contains("404"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: EngineError = io.into();
        assert!(matches!(e, EngineError::Io(_)));
    }
}
