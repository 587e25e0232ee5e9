use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use nylah_schema::{ClientMessage, ServerMessage, Setup};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::LiveConfig;
use crate::error::LiveError;

const OUTBOUND_CAPACITY: usize = 64;
const INBOUND_CAPACITY: usize = 64;

/// Both directions of an established session.
///
/// Dropping `outbound` closes the socket; `inbound` yields `Err` once and
/// then ends when the remote side goes away.
pub struct LiveLink {
    pub outbound: mpsc::Sender<ClientMessage>,
    pub inbound: mpsc::Receiver<Result<ServerMessage, LiveError>>,
}

/// Opens a session and completes the setup handshake.
#[async_trait]
pub trait LiveConnector: Send + Sync + 'static {
    async fn connect(&self, setup: Setup) -> Result<LiveLink, LiveError>;
}

/// Gemini Live over WebSocket.
#[derive(Debug, Clone)]
pub struct WsConnector {
    ws_url: Url,
    api_key: String,
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(cfg: &LiveConfig) -> Self {
        Self {
            ws_url: cfg.ws_url.clone(),
            api_key: cfg.api_key.trim().to_string(),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs.max(1)),
        }
    }

    fn endpoint(&self) -> Url {
        let mut url = self.ws_url.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);
        url
    }
}

#[async_trait]
impl LiveConnector for WsConnector {
    async fn connect(&self, setup: Setup) -> Result<LiveLink, LiveError> {
        if self.api_key.is_empty() {
            return Err(LiveError::NoCredential);
        }
        let timeout_secs = self.connect_timeout.as_secs();
        let endpoint = self.endpoint();

        let handshake = async {
            let (ws, _resp) = connect_async(endpoint.as_str()).await?;
            let (mut sink, mut stream) = ws.split();

            let setup_json = serde_json::to_string(&ClientMessage::Setup(setup))?;
            sink.send(Message::Text(setup_json.into())).await?;

            // Everything before `setupComplete` is protocol noise; a close here is a rejection.
            loop {
                let Some(frame) = stream.next().await else {
                    return Err(LiveError::SetupRejected(
                        "stream ended before setupComplete".to_string(),
                    ));
                };
                match decode_frame(frame?) {
                    Frame::Message(msg) if msg.setup_complete.is_some() => break,
                    Frame::Message(_) | Frame::Skip => continue,
                    Frame::Closed(reason) => return Err(LiveError::SetupRejected(reason)),
                    Frame::Invalid(e) => return Err(LiveError::JsonError(e)),
                }
            }
            Ok::<_, LiveError>((sink, stream))
        };

        let (mut sink, mut stream) =
            tokio::time::timeout(self.connect_timeout, handshake)
                .await
                .map_err(|_| LiveError::ConnectTimeout(timeout_secs))??;

        info!(channel = "live", "[Live] session setup complete");

        let (out_tx, mut out_rx) = mpsc::channel::<ClientMessage>(OUTBOUND_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel(INBOUND_CAPACITY);

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let text = match serde_json::to_string(&msg) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(channel = "live", error = %e, "[Live] dropping unserializable frame");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    debug!(channel = "live", error = %e, "[Live] writer stopped");
                    return;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let item = match frame {
                    Err(e) => Err(LiveError::from(e)),
                    Ok(frame) => match decode_frame(frame) {
                        Frame::Message(msg) => Ok(*msg),
                        Frame::Skip => continue,
                        Frame::Closed(reason) => Err(LiveError::Closed(reason)),
                        Frame::Invalid(e) => Err(LiveError::JsonError(e)),
                    },
                };
                let terminal = item.is_err();
                if in_tx.send(item).await.is_err() || terminal {
                    return;
                }
            }
        });

        Ok(LiveLink {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}

enum Frame {
    Message(Box<ServerMessage>),
    Skip,
    Closed(String),
    Invalid(serde_json::Error),
}

/// Server frames carry JSON as either text or binary.
fn decode_frame(frame: Message) -> Frame {
    let parsed = match &frame {
        Message::Text(text) => serde_json::from_str::<ServerMessage>(text.as_str()),
        Message::Binary(bytes) => serde_json::from_slice::<ServerMessage>(bytes),
        Message::Close(close) => {
            return Frame::Closed(
                close.as_ref().map_or_else(
                    || "closed without reason".to_string(),
                    |c| format!("{} {}", u16::from(c.code), c.reason.as_str()),
                ),
            );
        }
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => return Frame::Skip,
    };
    match parsed {
        Ok(msg) => Frame::Message(Box::new(msg)),
        Err(e) => Frame::Invalid(e),
    }
}
