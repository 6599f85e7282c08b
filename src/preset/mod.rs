// Preset module - Export/import of complete metronome setups

pub mod codec;
pub mod types;

pub use codec::{MAX_DECODED_BYTES, decode, encode, try_decode};
pub use types::Preset;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("Preset text is empty")]
    Empty,

    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Compression error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decompressed preset is larger than 1 MiB")]
    TooLarge,

    #[error("Invalid preset JSON: {0}")]
    Json(#[from] serde_json::Error),
}
