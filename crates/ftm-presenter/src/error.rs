//! Error types for the presenter binary.
//!
//! [`PresenterError`] wraps every failure mode of startup so `main` can
//! propagate with `?`. The event loop itself does not fail.

/// Top-level error for the presenter binary.
#[derive(Debug, thiserror::Error)]
pub enum PresenterError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ftm_core::config::ConfigError,
    },

    /// The investigation source could not be built.
    #[error("source error: {source}")]
    Source {
        /// The underlying source error.
        #[from]
        source: ftm_source::SourceError,
    },

    /// The audio backend failed to start.
    #[error("audio error: {source}")]
    Audio {
        /// The underlying audio error.
        #[from]
        source: ftm_core::audio::AudioError,
    },

    /// The rendering bridge failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: ftm_observer::ServerError,
    },
}
