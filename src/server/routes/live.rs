//! Browser bridge for the voice assistant.
//!
//! Each WebSocket gets its own session actor. Text frames carry JSON
//! commands and events; binary frames carry little-endian `f32` microphone
//! samples at 16 kHz.

use crate::audio::{DecodedChunk, MonotonicClock, OutputClock, ScheduledBuffer};
use crate::audio::{encode_pcm16, samples_from_f32_le};
use crate::error::{LiveError, NylahError};
use crate::live::{
    AssistantHost, AudioInput, AudioOutput, SessionArgs, SessionHandle, SessionSettings,
    SessionSnapshot,
};
use crate::server::router::NylahState;
use crate::site::{AppSection, QuoteFields, SnapshotCache};
use crate::store::Store;
use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{Message as AxumMessage, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use nylah_schema::BookingRow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

const EVENT_CAPACITY: usize = 256;
const CAPTURE_CAPACITY: usize = 64;

/// Commands a browser sends as text frames.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeCommand {
    Activate,
    Deactivate,
    /// A click on the hidden admin control.
    HiddenClick,
    KeyCombo {
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        shift: bool,
        key: String,
    },
}

/// Events pushed to the browser as text frames.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BridgeEvent {
    Status(SessionSnapshot),
    Heard {
        text: String,
    },
    Navigate {
        section: AppSection,
    },
    FillQuoteForm(QuoteFields),
    BookSession(BookingRow),
    Close,
    /// PCM16 base64 chunk; `offset` is the delay from now until `start`.
    Play {
        id: u64,
        start: f64,
        duration: f64,
        offset: f64,
        sample_rate: u32,
        data: String,
    },
    Stop {
        ids: Vec<u64>,
    },
    GateArmed,
    AdminPrompt,
    Error {
        message: String,
    },
}

/// Registry of open voice sessions, keyed by connection id.
#[derive(Clone, Default)]
pub struct LiveSessions {
    inner: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl LiveSessions {
    pub async fn insert(&self, id: Uuid, handle: SessionHandle) {
        self.inner.write().await.insert(id, handle);
    }

    pub async fn remove(&self, id: &Uuid) -> Option<SessionHandle> {
        self.inner.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn shutdown_all(&self) {
        for (_, handle) in self.inner.write().await.drain() {
            handle.shutdown();
        }
    }
}

/// Sender slot for microphone frames. Filled while capture runs.
#[derive(Clone, Default)]
pub struct CaptureSlot {
    tx: Arc<Mutex<Option<mpsc::Sender<Vec<f32>>>>>,
}

impl CaptureSlot {
    /// Forwards one frame. Returns `false` when capture is stopped or lagging.
    pub fn push(&self, samples: Vec<f32>) -> bool {
        let tx = match self.tx.lock() {
            Ok(slot) => slot.clone(),
            Err(_) => return false,
        };
        match tx {
            Some(tx) => tx.try_send(samples).is_ok(),
            None => false,
        }
    }

    fn open(&self) -> Option<mpsc::Receiver<Vec<f32>>> {
        let (tx, rx) = mpsc::channel(CAPTURE_CAPACITY);
        let mut slot = self.tx.lock().ok()?;
        *slot = Some(tx);
        Some(rx)
    }

    fn close(&self) {
        if let Ok(mut slot) = self.tx.lock() {
            slot.take();
        }
    }
}

struct ChannelAudioInput {
    slot: CaptureSlot,
}

#[async_trait]
impl AudioInput for ChannelAudioInput {
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<f32>>, LiveError> {
        self.slot
            .open()
            .ok_or_else(|| LiveError::Capture("capture slot poisoned".to_string()))
    }

    async fn stop(&mut self) {
        self.slot.close();
    }
}

struct BridgeAudioOutput {
    events: mpsc::Sender<BridgeEvent>,
    clock: Arc<dyn OutputClock>,
}

#[async_trait]
impl AudioOutput for BridgeAudioOutput {
    async fn play(&mut self, buffer: ScheduledBuffer, chunk: DecodedChunk) {
        let offset = (buffer.start - self.clock.now()).max(0.0);
        let _ = self
            .events
            .send(BridgeEvent::Play {
                id: buffer.id,
                start: buffer.start,
                duration: buffer.duration,
                offset,
                sample_rate: chunk.sample_rate,
                data: encode_pcm16(&chunk.samples),
            })
            .await;
    }

    async fn stop(&mut self, buffers: Vec<ScheduledBuffer>) {
        if buffers.is_empty() {
            return;
        }
        let ids = buffers.iter().map(|b| b.id).collect();
        let _ = self.events.send(BridgeEvent::Stop { ids }).await;
    }
}

struct BridgeHost {
    events: mpsc::Sender<BridgeEvent>,
    store: Store,
    snapshot: SnapshotCache,
}

impl BridgeHost {
    async fn emit(&self, event: BridgeEvent) {
        let _ = self.events.send(event).await;
    }
}

#[async_trait]
impl AssistantHost for BridgeHost {
    async fn navigate(&self, section: AppSection) {
        self.emit(BridgeEvent::Navigate { section }).await;
    }

    async fn fill_quote_form(&self, fields: QuoteFields) {
        self.emit(BridgeEvent::FillQuoteForm(fields)).await;
    }

    async fn book_session(&self, booking: BookingRow) -> Result<(), NylahError> {
        self.store.insert_booking(&booking).await?;
        self.snapshot.invalidate();
        info!(store.table = "bookings", date = %booking.date, time = %booking.time, "[Live] booking saved");
        self.emit(BridgeEvent::BookSession(booking)).await;
        Ok(())
    }

    async fn close(&self) {
        self.emit(BridgeEvent::Close).await;
    }

    async fn status_changed(&self, snapshot: SessionSnapshot) {
        self.emit(BridgeEvent::Status(snapshot)).await;
    }

    async fn heard(&self, text: String) {
        self.emit(BridgeEvent::Heard { text }).await;
    }
}

pub async fn live_ws(State(state): State<NylahState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: NylahState) {
    let session_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (events_tx, mut events_rx) = mpsc::channel::<BridgeEvent>(EVENT_CAPACITY);

    let send_task = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "[Live] failed to encode bridge event");
                    continue;
                }
            };
            if sender.send(AxumMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let snapshot = state.snapshot.get().await;
    let settings =
        SessionSettings::from_config(&state.live_cfg, Some(&snapshot.settings.nylah_instructions));

    let capture = CaptureSlot::default();
    let clock: Arc<dyn OutputClock> = Arc::new(MonotonicClock::default());
    let args = SessionArgs {
        settings,
        connector: state.connector.clone(),
        host: Arc::new(BridgeHost {
            events: events_tx.clone(),
            store: state.store().clone(),
            snapshot: state.snapshot.clone(),
        }),
        audio_in: Box::new(ChannelAudioInput {
            slot: capture.clone(),
        }),
        audio_out: Box::new(BridgeAudioOutput {
            events: events_tx.clone(),
            clock: clock.clone(),
        }),
        clock,
    };

    let handle = match SessionHandle::spawn(args).await {
        Ok(handle) => handle,
        Err(e) => {
            warn!(session.id = %session_id, error = %e, "[Live] session could not start");
            let _ = events_tx
                .send(BridgeEvent::Error {
                    message: "voice assistant unavailable".to_string(),
                })
                .await;
            drop(events_tx);
            let _ = send_task.await;
            return;
        }
    };
    state.live_sessions.insert(session_id, handle.clone()).await;
    info!(session.id = %session_id, channel = "live", "[Live] browser connected");

    let mut gate = state.gate.clone();
    let mut dropped_frames: u64 = 0;

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            AxumMessage::Text(text) => {
                let command = match serde_json::from_str::<BridgeCommand>(text.as_str()) {
                    Ok(command) => command,
                    Err(e) => {
                        debug!(session.id = %session_id, error = %e, "[Live] unreadable command");
                        let _ = events_tx
                            .send(BridgeEvent::Error {
                                message: format!("unreadable command: {e}"),
                            })
                            .await;
                        continue;
                    }
                };
                let result = match command {
                    BridgeCommand::Activate => handle.activate(),
                    BridgeCommand::Deactivate => handle.deactivate(),
                    BridgeCommand::HiddenClick => {
                        if gate.click(Instant::now()) {
                            let _ = events_tx.send(BridgeEvent::GateArmed).await;
                        }
                        Ok(())
                    }
                    BridgeCommand::KeyCombo { ctrl, shift, key } => {
                        if gate.key_combo(ctrl, shift, &key) {
                            let _ = events_tx.send(BridgeEvent::AdminPrompt).await;
                            // The admin panel takes focus in this browser only.
                            handle.deactivate()
                        } else {
                            Ok(())
                        }
                    }
                };
                if let Err(e) = result {
                    warn!(session.id = %session_id, error = %e, "[Live] session command failed");
                }
            }
            AxumMessage::Binary(bytes) => match samples_from_f32_le(&bytes) {
                Ok(samples) => {
                    if !capture.push(samples) {
                        dropped_frames += 1;
                    }
                }
                Err(e) => debug!(session.id = %session_id, error = %e, "[Live] bad capture frame"),
            },
            AxumMessage::Close(_) => break,
            _ => {}
        }
    }

    state.live_sessions.remove(&session_id).await;
    handle.shutdown();
    send_task.abort();
    info!(
        session.id = %session_id,
        channel = "live",
        dropped_frames,
        "[Live] browser disconnected"
    );
}
