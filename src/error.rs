use serde_json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

// Enum for handling various application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError), // Errors raised by the character or item stores.

    #[error("Portrait error: {0}")]
    Portrait(#[from] PortraitError), // Errors from portrait processing or validation.

    #[error("Squad error: {0}")]
    Squad(#[from] SquadError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error), // Errors related to data serialization.

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error), // Input/output errors.

    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("No home directory available")]
    NoHomeDir,

    #[error("No hero loaded")]
    NoHeroLoaded, // Error when an operation needs an active hero.

    #[error("Unknown minion template: {0}")]
    UnknownTemplate(String),

    #[error("Import rejected: {}", .0.join("; "))]
    ImportRejected(Vec<String>), // Import validation produced blocking errors.
}

// Errors specific to the local JSON stores.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {limit} bytes allowed")]
    QuotaExceeded { needed: u64, limit: u64 }, // The write is dropped, nothing is retried.

    #[error("Character not found: {0}")]
    NotFound(String),
}

// Squad operations that refuse to run. Nothing is mutated when one is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SquadError {
    #[error("Squad not found: {0}")]
    NotFound(String),

    #[error("Cannot merge squads of different types")]
    TemplateMismatch,

    #[error("Hero is not a summoner")]
    NotASummoner,
}

// Errors raised while loading or validating a portrait.
#[derive(Debug, Error)]
pub enum PortraitError {
    #[error("Could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Could not encode image: {0}")]
    Encode(String),

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Image load timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Image request failed with status {0}")]
    BadStatus(u16),

    #[error("URL does not point to an image ({0})")]
    NotAnImage(String),
}

impl From<tokio::time::error::Elapsed> for PortraitError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        PortraitError::Timeout
    }
}
