//! Error types shared across Glide crates.

use std::path::PathBuf;

/// Top-level error type for Glide operations.
#[derive(Debug, thiserror::Error)]
pub enum GlideError {
    #[error("Scroll error: {message}")]
    Scroll { message: String },

    #[error("Input receiver error: {message}")]
    InputReceiver { message: String },

    #[error("Device error: {message}")]
    Device { message: String },

    #[error("Platform error: {message}")]
    Platform { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{component} used before load_manual()")]
    NotInitialized { component: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using GlideError.
pub type GlideResult<T> = Result<T, GlideError>;

impl GlideError {
    pub fn scroll(msg: impl Into<String>) -> Self {
        Self::Scroll {
            message: msg.into(),
        }
    }

    pub fn input_receiver(msg: impl Into<String>) -> Self {
        Self::InputReceiver {
            message: msg.into(),
        }
    }

    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device {
            message: msg.into(),
        }
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn not_initialized(component: impl Into<String>) -> Self {
        Self::NotInitialized {
            component: component.into(),
        }
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Error for a mutex that was poisoned by a panicking holder.
    pub fn poisoned(what: &str) -> Self {
        Self::Scroll {
            message: format!("{what} lock poisoned"),
        }
    }
}
