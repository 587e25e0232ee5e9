//! Audio plumbing for the voice session: PCM codec, fixed-size capture
//! framing and gapless playback scheduling.

mod frames;
mod pcm;
mod scheduler;

pub use frames::{CAPTURE_FRAME_SAMPLES, FrameAccumulator};
pub use pcm::{
    DecodedChunk, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE, decode_pcm16, encode_pcm16, f32_to_i16,
    samples_from_f32_le,
};
pub use scheduler::{MonotonicClock, OutputClock, PlaybackScheduler, ScheduledBuffer};
