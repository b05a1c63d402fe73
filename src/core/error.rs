//! Application-wide error types.
//!
//! `AppError` covers everything that can stop the service from starting or
//! keep the HTTP listener from running. Per-request failures have their own
//! types closer to where they happen (matcher, compositor, API).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("image provider error: {0}")]
    Provider(String),

    #[error("server error: {0}")]
    Server(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(e.to_string().starts_with("config error"));
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn catalog_error_display() {
        let e = AppError::Catalog("data/artworks.json: not found".into());
        assert!(e.to_string().contains("artworks.json"));
    }

    #[test]
    fn provider_error_display() {
        let e = AppError::Provider("GEMINI_API_KEY is not set".into());
        assert!(e.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn server_error_display() {
        let e = AppError::Server("cannot bind 127.0.0.1:5000: address in use".into());
        assert!(e.to_string().starts_with("server error"));
        let _: &dyn std::error::Error = &e;
    }
}
