//! Error types for the thumbnail panel

/// Errors produced while loading or drawing thumbnails
///
/// Cloneable because a single page load is shared by every caller waiting
/// on it, and each of them receives the outcome.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThumbnailError {
    #[error("failed to load page {page}: {message}")]
    PageLoad { page: u32, message: String },

    #[error("failed to render page {page}: {message}")]
    Render { page: u32, message: String },

    #[error("invalid rotation {0}, expected a multiple of 90")]
    InvalidRotation(i32),

    #[error("page {0} is not loaded")]
    NoPage(u32),
}

impl ThumbnailError {
    /// Shorthand for a page load failure
    pub fn page_load(page: u32, message: impl Into<String>) -> Self {
        ThumbnailError::PageLoad {
            page,
            message: message.into(),
        }
    }

    /// Shorthand for a rasterization failure
    pub fn render(page: u32, message: impl Into<String>) -> Self {
        ThumbnailError::Render {
            page,
            message: message.into(),
        }
    }
}

pub type ThumbnailResult<T> = Result<T, ThumbnailError>;

/// Errors that can occur while loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
