use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::LiveError;

/// Microphone frames are sent at 16 kHz mono.
pub const INPUT_SAMPLE_RATE: u32 = 16_000;
/// Model audio arrives at 24 kHz mono.
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

const I16_SCALE: f32 = 32768.0;

/// Converts one float sample (nominally `-1.0..=1.0`) to signed 16-bit PCM.
///
/// Out-of-range input saturates; NaN maps to silence.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn f32_to_i16(sample: f32) -> i16 {
    // `as` saturates at the i16 bounds and maps NaN to 0.
    (sample * I16_SCALE) as i16
}

/// f32 samples -> i16 little-endian bytes -> standard base64.
pub fn encode_pcm16(samples: &[f32]) -> String {
    let bytes: Vec<u8> = samples
        .iter()
        .flat_map(|s| f32_to_i16(*s).to_le_bytes())
        .collect();
    STANDARD.encode(bytes)
}

/// A decoded model audio payload, ready to be scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedChunk {
    /// Playback length in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Base64 i16 little-endian mono PCM -> float samples in `-1.0..1.0`.
pub fn decode_pcm16(payload: &str, sample_rate: u32) -> Result<DecodedChunk, LiveError> {
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| LiveError::AudioPayload(format!("invalid base64: {e}")))?;
    if bytes.len() % 2 != 0 {
        return Err(LiveError::AudioPayload(format!(
            "odd PCM16 byte length {}",
            bytes.len()
        )));
    }
    let samples = bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / I16_SCALE)
        .collect();
    Ok(DecodedChunk {
        samples,
        sample_rate,
    })
}

/// Raw f32 little-endian bytes (as posted by the browser capture worklet) -> samples.
pub fn samples_from_f32_le(bytes: &[u8]) -> Result<Vec<f32>, LiveError> {
    if bytes.len() % 4 != 0 {
        return Err(LiveError::Capture(format!(
            "f32 frame length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
