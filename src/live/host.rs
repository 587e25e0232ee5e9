use async_trait::async_trait;
use nylah_schema::BookingRow;
use tokio::sync::mpsc;

use super::state::SessionSnapshot;
use crate::audio::{DecodedChunk, ScheduledBuffer};
use crate::error::{LiveError, NylahError};
use crate::site::{AppSection, QuoteFields};

/// UI-side effects a session can trigger.
#[async_trait]
pub trait AssistantHost: Send + Sync + 'static {
    async fn navigate(&self, section: AppSection);

    async fn fill_quote_form(&self, fields: QuoteFields);

    /// Persists a booking dictated to the assistant. An error is reported back to the model.
    async fn book_session(&self, booking: BookingRow) -> Result<(), NylahError>;

    /// The session was closed on request and the assistant should be hidden.
    async fn close(&self);

    async fn status_changed(&self, snapshot: SessionSnapshot);

    async fn heard(&self, text: String);
}

/// Microphone capture. Batches may have any length; the session re-frames them.
#[async_trait]
pub trait AudioInput: Send + 'static {
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<f32>>, LiveError>;

    async fn stop(&mut self);
}

/// Speaker output, driven by the session's playback scheduler.
#[async_trait]
pub trait AudioOutput: Send + 'static {
    async fn play(&mut self, buffer: ScheduledBuffer, chunk: DecodedChunk);

    /// Stops the given buffers, whether already playing or still queued.
    async fn stop(&mut self, buffers: Vec<ScheduledBuffer>);
}
