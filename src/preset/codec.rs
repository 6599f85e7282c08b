// Preset codec - JSON, gzip, then base64 for sharing as plain text

use super::PresetError;
use super::types::Preset;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};
use tracing::warn;

/// Upper bound on the decompressed JSON size
pub const MAX_DECODED_BYTES: u64 = 1024 * 1024;

pub fn encode(preset: &Preset) -> Result<String, PresetError> {
    let json = serde_json::to_vec(preset)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    Ok(STANDARD.encode(compressed))
}

/// Decode a shared preset, reporting why it failed
pub fn try_decode(text: &str) -> Result<Preset, PresetError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PresetError::Empty);
    }

    let compressed = STANDARD.decode(text)?;

    let mut json = String::new();
    GzDecoder::new(compressed.as_slice())
        .take(MAX_DECODED_BYTES + 1)
        .read_to_string(&mut json)?;
    if json.len() as u64 > MAX_DECODED_BYTES {
        return Err(PresetError::TooLarge);
    }

    Ok(serde_json::from_str(&json)?)
}

/// Decode a shared preset; any failure is logged and yields `None`
pub fn decode(text: &str) -> Option<Preset> {
    match try_decode(text) {
        Ok(preset) => Some(preset),
        Err(e) => {
            warn!(error = %e, "Ignoring undecodable preset");
            None
        }
    }
}
