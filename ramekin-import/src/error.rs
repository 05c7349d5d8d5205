use thiserror::Error;

use crate::pagination::WalkError;
use crate::types::{ImportPhase, Platform};

/// Failure of a single HTTP exchange with a recipe platform.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Response from {url} too large: {size} bytes (max {max})")]
    TooLarge { url: String, size: usize, max: usize },

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors that abort a whole import run.
///
/// Anything that goes wrong for a single recipe after listing has finished is
/// logged and skipped instead; see [`ItemError`] and [`ImageError`].
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid import request: {0}")]
    InvalidRequest(String),

    #[error("Could not log in to {platform}: {source}")]
    Authentication {
        platform: Platform,
        #[source]
        source: FetchError,
    },

    #[error("Could not list recipes on {platform}: {source}")]
    Listing {
        platform: Platform,
        #[source]
        source: WalkError,
    },

    #[error("Import cancelled while {}", .phase.as_str())]
    Cancelled { phase: ImportPhase },
}

impl ImportError {
    /// The phase the run was in when it failed.
    pub fn phase(&self) -> ImportPhase {
        match self {
            ImportError::InvalidRequest(_) => ImportPhase::Idle,
            ImportError::Authentication { .. } => ImportPhase::Authenticating,
            ImportError::Listing { .. } => ImportPhase::Listing,
            ImportError::Cancelled { phase } => *phase,
        }
    }
}

/// Failure to import one recipe. The item is skipped, the run continues.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Cancelled before the recipe was fetched")]
    Cancelled,
}

/// Failure to relay a recipe's image. The recipe is kept without an image.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Recipe has no image")]
    NoImage,

    #[error("Failed to fetch image: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to upload image: {0}")]
    Upload(#[from] UploadError),
}

/// Error returned by an [`ImageUploader`](crate::ImageUploader).
#[derive(Error, Debug)]
#[error("{0}")]
pub struct UploadError(pub String);

impl UploadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
