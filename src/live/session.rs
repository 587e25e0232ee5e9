use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use nylah_schema::{
    ClientMessage, Content, FunctionCall, GenerationConfig, ServerContent, ServerMessage, Setup,
    SpeechConfig,
};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::host::{AssistantHost, AudioInput, AudioOutput};
use super::state::{SessionSnapshot, SessionState, SessionStatus};
use super::tools::{self, ToolAction};
use super::transport::{LiveConnector, LiveLink};
use crate::audio::{
    FrameAccumulator, INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE, OutputClock, PlaybackScheduler,
    decode_pcm16, encode_pcm16,
};
use crate::config::LiveConfig;
use crate::error::{IsRetryable, LiveError, NylahError};
use crate::site::AppSection;
use crate::utils::logging::with_pretty_json_debug;

const PLAYBACK_TICK_FLOOR: Duration = Duration::from_millis(5);

/// Per-session knobs, resolved from `LiveConfig` plus the site's instructions.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub model: String,
    pub voice: String,
    pub instructions: String,
    pub greeting: String,
    pub has_credential: bool,
    pub reconnect_max_times: usize,
    pub reconnect_min_delay: Duration,
    pub reconnect_max_delay: Duration,
}

impl SessionSettings {
    pub fn from_config(cfg: &LiveConfig, instructions: Option<&str>) -> Self {
        let instructions = instructions
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(cfg.default_instructions.as_str())
            .to_string();
        Self {
            model: cfg.model.clone(),
            voice: cfg.voice.clone(),
            instructions,
            greeting: cfg.greeting.clone(),
            has_credential: cfg.has_credential(),
            reconnect_max_times: cfg.reconnect_max_times,
            reconnect_min_delay: Duration::from_secs(1),
            reconnect_max_delay: Duration::from_secs(8),
        }
    }

    pub fn setup(&self) -> Setup {
        let model = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        Setup {
            model,
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: Some(SpeechConfig::prebuilt(self.voice.clone())),
            },
            system_instruction: Some(Content::text(self.instructions.clone())),
            tools: vec![tools::tool()],
            input_audio_transcription: Some(BTreeMap::new()),
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBuilder::default()
            .with_min_delay(self.reconnect_min_delay)
            .with_max_delay(self.reconnect_max_delay)
            .with_max_times(self.reconnect_max_times)
            .with_jitter()
            .build()
    }
}

pub struct SessionArgs {
    pub settings: SessionSettings,
    pub connector: Arc<dyn LiveConnector>,
    pub host: Arc<dyn AssistantHost>,
    pub audio_in: Box<dyn AudioInput>,
    pub audio_out: Box<dyn AudioOutput>,
    pub clock: Arc<dyn OutputClock>,
}

pub enum SessionMessage {
    /// User asked for the assistant; opens a fresh session.
    Activate,

    /// Explicit close, or another surface took focus.
    Deactivate,

    Snapshot(RpcReplyPort<SessionSnapshot>),

    // Internal messages, tagged with the link epoch they belong to.
    LinkReady { epoch: u64, link: LiveLink },
    LinkFailed { epoch: u64, error: LiveError },
    Inbound { epoch: u64, message: Box<ServerMessage> },
    LinkClosed { epoch: u64, error: LiveError },
    Reconnect { epoch: u64 },
    PlaybackTick { epoch: u64 },
}

/// Cloneable handle to one session actor.
#[derive(Clone)]
pub struct SessionHandle {
    actor: ActorRef<SessionMessage>,
}

impl SessionHandle {
    pub async fn spawn(args: SessionArgs) -> Result<Self, NylahError> {
        let (actor, _jh) = Actor::spawn(None, SessionActor, args)
            .await
            .map_err(|e| NylahError::RactorError(format!("SessionActor spawn failed: {e}")))?;
        Ok(Self { actor })
    }

    pub fn activate(&self) -> Result<(), NylahError> {
        ractor::cast!(self.actor, SessionMessage::Activate)
            .map_err(|e| NylahError::RactorError(format!("Activate cast failed: {e}")))
    }

    pub fn deactivate(&self) -> Result<(), NylahError> {
        ractor::cast!(self.actor, SessionMessage::Deactivate)
            .map_err(|e| NylahError::RactorError(format!("Deactivate cast failed: {e}")))
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, NylahError> {
        ractor::call!(self.actor, SessionMessage::Snapshot)
            .map_err(|e| NylahError::RactorError(format!("Snapshot RPC failed: {e}")))
    }

    /// Stops the actor; any open link and capture are torn down.
    pub fn shutdown(&self) {
        self.actor.stop(None);
    }
}

struct SessionActorState {
    settings: SessionSettings,
    connector: Arc<dyn LiveConnector>,
    host: Arc<dyn AssistantHost>,
    audio_in: Box<dyn AudioInput>,
    audio_out: Box<dyn AudioOutput>,
    clock: Arc<dyn OutputClock>,

    state: SessionState,
    status: SessionStatus,
    epoch: u64,
    last_heard: Option<String>,
    scheduler: PlaybackScheduler,
    /// Epoch of the pending playback tick, if one is armed.
    playback_tick: Option<u64>,
    backoff: Option<ExponentialBackoff>,

    outbound: Option<mpsc::Sender<ClientMessage>>,
    connect_task: Option<JoinHandle<()>>,
    pump_task: Option<JoinHandle<()>>,
    capture_task: Option<JoinHandle<()>>,
    capture_running: bool,
}

impl SessionActorState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            status: self.status,
            epoch: self.epoch,
            last_heard: self.last_heard.clone(),
            scheduled_buffers: self.scheduler.in_flight(),
        }
    }

    /// Applies a transition and notifies the host. Invalid transitions are ignored.
    async fn enter(&mut self, next: SessionState, status: Option<SessionStatus>) -> bool {
        let status = status.unwrap_or(next.default_status());
        if self.state == next {
            if self.status != status {
                self.status = status;
                self.host.status_changed(self.snapshot()).await;
            }
            return true;
        }
        if !self.state.can_transition_to(next) {
            warn!(
                channel = "live",
                session.epoch = self.epoch,
                from = ?self.state,
                to = ?next,
                "[Live] rejected state transition"
            );
            return false;
        }
        debug!(
            channel = "live",
            session.epoch = self.epoch,
            from = ?self.state,
            to = ?next,
            "[Live] state transition"
        );
        self.state = next;
        self.status = status;
        self.host.status_changed(self.snapshot()).await;
        true
    }

    async fn send(&mut self, msg: ClientMessage) {
        let Some(tx) = self.outbound.as_ref() else {
            return;
        };
        if tx.send(msg).await.is_err() {
            debug!(
                channel = "live",
                session.epoch = self.epoch,
                "[Live] outbound closed; frame dropped"
            );
        }
    }

    /// Stops playback, capture and the link. Bumps the epoch so late events are discarded.
    async fn teardown(&mut self) {
        self.epoch += 1;
        for task in [
            self.connect_task.take(),
            self.pump_task.take(),
            self.capture_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
        self.outbound = None;
        if self.capture_running {
            self.audio_in.stop().await;
            self.capture_running = false;
        }
        self.stop_playback().await;
    }

    /// Arms one tick for when the earliest in-flight buffer ends.
    fn arm_playback_tick(&mut self, myself: &ActorRef<SessionMessage>) {
        if self.playback_tick == Some(self.epoch) {
            return;
        }
        let Some(ends_at) = self.scheduler.next_end() else {
            return;
        };
        let wait = Duration::from_secs_f64((ends_at - self.clock.now()).max(0.0))
            .max(PLAYBACK_TICK_FLOOR);
        let epoch = self.epoch;
        self.playback_tick = Some(epoch);
        let _ = myself.send_after(wait, move || SessionMessage::PlaybackTick { epoch });
    }

    async fn stop_playback(&mut self) {
        let stopped = self.scheduler.interrupt();
        if !stopped.is_empty() {
            self.audio_out.stop(stopped).await;
        }
    }
}

struct SessionActor;

#[ractor::async_trait]
impl Actor for SessionActor {
    type Msg = SessionMessage;
    type State = SessionActorState;
    type Arguments = SessionArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        debug!(
            channel = "live",
            model = %args.settings.model,
            voice = %args.settings.voice,
            reconnect_max_times = args.settings.reconnect_max_times,
            "SessionActor initialized"
        );
        Ok(SessionActorState {
            settings: args.settings,
            connector: args.connector,
            host: args.host,
            audio_in: args.audio_in,
            audio_out: args.audio_out,
            clock: args.clock,
            state: SessionState::Standby,
            status: SessionStatus::Standby,
            epoch: 0,
            last_heard: None,
            scheduler: PlaybackScheduler::new(),
            playback_tick: None,
            backoff: None,
            outbound: None,
            connect_task: None,
            pump_task: None,
            capture_task: None,
            capture_running: false,
        })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.teardown().await;
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SessionMessage::Activate => self.activate(&myself, state).await,
            SessionMessage::Deactivate => self.deactivate(state).await,
            SessionMessage::Snapshot(reply) => {
                let _ = reply.send(state.snapshot());
            }
            SessionMessage::LinkReady { epoch, link } => {
                if epoch != state.epoch || state.state != SessionState::Connecting {
                    debug!(channel = "live", session.epoch = epoch, "[Live] stale link dropped");
                    return Ok(());
                }
                state.connect_task = None;
                self.on_link_ready(&myself, state, link).await;
            }
            SessionMessage::LinkFailed { epoch, error } => {
                if epoch != state.epoch {
                    return Ok(());
                }
                state.connect_task = None;
                self.on_link_error(&myself, state, &error).await;
            }
            SessionMessage::Inbound { epoch, message } => {
                if epoch != state.epoch || !state.state.is_live() {
                    return Ok(());
                }
                self.on_inbound(&myself, state, *message).await;
            }
            SessionMessage::LinkClosed { epoch, error } => {
                if epoch != state.epoch || !state.state.is_live() {
                    return Ok(());
                }
                self.on_link_error(&myself, state, &error).await;
            }
            SessionMessage::Reconnect { epoch } => {
                if epoch != state.epoch || state.state != SessionState::Error {
                    return Ok(());
                }
                self.begin_connect(&myself, state).await;
            }
            SessionMessage::PlaybackTick { epoch } => {
                if epoch != state.epoch {
                    return Ok(());
                }
                state.playback_tick = None;
                let now = state.clock.now();
                state.scheduler.reap(now);
                if !state.scheduler.is_idle() {
                    state.arm_playback_tick(&myself);
                } else if state.state == SessionState::Speaking {
                    state.enter(SessionState::Listening, None).await;
                }
            }
        }
        Ok(())
    }
}

impl SessionActor {
    async fn activate(&self, myself: &ActorRef<SessionMessage>, state: &mut SessionActorState) {
        if state.state.is_live() {
            debug!(channel = "live", session.epoch = state.epoch, "[Live] already active");
            return;
        }
        if !state.settings.has_credential {
            warn!(channel = "live", "[Live] no API key configured; staying offline");
            if state.state == SessionState::Error {
                state.teardown().await;
            }
            state
                .enter(SessionState::Offline, Some(SessionStatus::NoApiKey))
                .await;
            return;
        }
        if state.state == SessionState::Error {
            // A pending retry is superseded by the fresh session.
            state.teardown().await;
            state.enter(SessionState::Offline, None).await;
        }
        state.backoff = Some(state.settings.backoff());
        state.last_heard = None;
        self.begin_connect(myself, state).await;
    }

    async fn begin_connect(&self, myself: &ActorRef<SessionMessage>, state: &mut SessionActorState) {
        state.epoch += 1;
        if !state.enter(SessionState::Connecting, None).await {
            return;
        }
        let epoch = state.epoch;
        info!(channel = "live", session.epoch = epoch, "[Live] connecting");

        let connector = state.connector.clone();
        let setup = state.settings.setup();
        let myself = myself.clone();
        state.connect_task = Some(tokio::spawn(async move {
            let msg = match connector.connect(setup).await {
                Ok(link) => SessionMessage::LinkReady { epoch, link },
                Err(error) => SessionMessage::LinkFailed { epoch, error },
            };
            let _ = myself.cast(msg);
        }));
    }

    async fn on_link_ready(
        &self,
        myself: &ActorRef<SessionMessage>,
        state: &mut SessionActorState,
        link: LiveLink,
    ) {
        let epoch = state.epoch;
        let LiveLink { outbound, inbound } = link;
        state.outbound = Some(outbound.clone());
        state.pump_task = Some(spawn_inbound_pump(myself.clone(), epoch, inbound));
        state.enter(SessionState::Connected, None).await;
        info!(channel = "live", session.epoch = epoch, "[Live] connected");

        if !state.settings.greeting.trim().is_empty() {
            let greeting = ClientMessage::text(state.settings.greeting.clone());
            state.send(greeting).await;
        }

        match state.audio_in.start().await {
            Ok(frames) => {
                state.capture_running = true;
                state.capture_task = Some(spawn_capture_forwarder(epoch, frames, outbound));
                state.enter(SessionState::Listening, None).await;
            }
            Err(e) => {
                error!(
                    channel = "live",
                    session.epoch = epoch,
                    error = %e,
                    "[Live] capture failed to start"
                );
                state.teardown().await;
                state.enter(SessionState::Offline, None).await;
            }
        }
    }

    async fn on_link_error(
        &self,
        myself: &ActorRef<SessionMessage>,
        state: &mut SessionActorState,
        error: &LiveError,
    ) {
        state.teardown().await;

        if matches!(error, LiveError::NoCredential) {
            warn!(channel = "live", "[Live] speech service rejected missing credential");
            state
                .enter(SessionState::Offline, Some(SessionStatus::NoApiKey))
                .await;
            return;
        }

        let delay = if error.is_retryable() {
            state.backoff.as_mut().and_then(|b| b.next())
        } else {
            None
        };

        match delay {
            Some(delay) => {
                warn!(
                    channel = "live",
                    session.epoch = state.epoch,
                    error = %error,
                    retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "[Live] transport error, retrying"
                );
                state.enter(SessionState::Error, None).await;
                let epoch = state.epoch;
                let _ = myself.send_after(delay, move || SessionMessage::Reconnect { epoch });
            }
            None => {
                error!(
                    channel = "live",
                    session.epoch = state.epoch,
                    error = %error,
                    "[Live] session ended"
                );
                state.enter(SessionState::Offline, None).await;
            }
        }
    }

    async fn deactivate(&self, state: &mut SessionActorState) {
        if matches!(state.state, SessionState::Standby | SessionState::Offline) {
            return;
        }
        state.enter(SessionState::Closing, None).await;
        state.teardown().await;
        state.backoff = None;
        state.enter(SessionState::Offline, None).await;
        info!(channel = "live", session.epoch = state.epoch, "[Live] session closed");
        state.host.close().await;
    }

    async fn on_inbound(
        &self,
        myself: &ActorRef<SessionMessage>,
        state: &mut SessionActorState,
        message: ServerMessage,
    ) {
        if message.setup_complete.is_some() {
            debug!(channel = "live", "[Live] duplicate setupComplete ignored");
        }

        if let Some(content) = message.server_content {
            self.on_server_content(myself, state, &content).await;
        }

        if let Some(tool_call) = message.tool_call {
            for call in &tool_call.function_calls {
                self.on_tool_call(state, call).await;
            }
        }

        if let Some(cancel) = message.tool_call_cancellation {
            info!(
                channel = "live",
                ids = ?cancel.ids,
                "[Live] tool calls cancelled by model"
            );
        }

        if let Some(go_away) = message.go_away {
            let reason = format!(
                "goAway (time left: {})",
                go_away.time_left.as_deref().unwrap_or("unknown")
            );
            self.on_link_error(myself, state, &LiveError::Closed(reason))
                .await;
        }
    }

    async fn on_server_content(
        &self,
        myself: &ActorRef<SessionMessage>,
        state: &mut SessionActorState,
        content: &ServerContent,
    ) {
        if let Some(text) = content
            .input_transcription
            .as_ref()
            .map(|t| t.text.trim())
            .filter(|t| !t.is_empty())
        {
            state.last_heard = Some(text.to_string());
            state.host.heard(text.to_string()).await;
        }

        if content.interrupted {
            debug!(channel = "live", session.epoch = state.epoch, "[Live] interrupted");
            state.stop_playback().await;
            if state.state == SessionState::Speaking {
                state.enter(SessionState::Listening, None).await;
            }
        }

        for payload in content.audio_payloads() {
            let chunk = match decode_pcm16(payload, OUTPUT_SAMPLE_RATE) {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(channel = "live", error = %e, "[Live] skipping audio chunk");
                    continue;
                }
            };
            if chunk.samples.is_empty() {
                continue;
            }
            let now = state.clock.now();
            let buffer = state.scheduler.schedule(now, chunk.duration());
            state.audio_out.play(buffer, chunk).await;
            state.arm_playback_tick(myself);

            if state.state == SessionState::Listening {
                state.enter(SessionState::Speaking, None).await;
            }
        }

        if content.turn_complete {
            debug!(channel = "live", session.epoch = state.epoch, "[Live] turn complete");
        }
    }

    /// Exactly one acknowledgement is sent per call, executed or rejected.
    async fn on_tool_call(&self, state: &mut SessionActorState, call: &FunctionCall) {
        with_pretty_json_debug(&call.args, |args| {
            debug!(
                channel = "live",
                tool.name = %call.name,
                tool.id = call.id.as_deref().unwrap_or("-"),
                "[Live] tool call arguments:\n{args}"
            );
        });

        let response = match ToolAction::from_call(call) {
            Err(e) => {
                warn!(
                    channel = "live",
                    tool.name = %call.name,
                    error = %e,
                    "[Live] tool call rejected"
                );
                tools::rejected(call, &e.to_string())
            }
            Ok(action) => match dispatch(state.host.as_ref(), action).await {
                Ok(()) => {
                    info!(channel = "live", tool.name = %call.name, "[Live] tool call executed");
                    tools::executed(call)
                }
                Err(e) => {
                    warn!(
                        channel = "live",
                        tool.name = %call.name,
                        error = %e,
                        "[Live] tool call failed in host"
                    );
                    tools::rejected(call, &e.to_string())
                }
            },
        };
        state.send(ClientMessage::tool_response(response)).await;
    }
}

async fn dispatch(host: &dyn AssistantHost, action: ToolAction) -> Result<(), NylahError> {
    match action {
        ToolAction::Navigate(section) => host.navigate(section).await,
        ToolAction::FillQuoteForm(fields) => {
            host.fill_quote_form(fields).await;
            host.navigate(AppSection::Quote).await;
        }
        ToolAction::BookSession(booking) => {
            host.book_session(booking).await?;
            host.navigate(AppSection::Booking).await;
        }
    }
    Ok(())
}

fn spawn_inbound_pump(
    myself: ActorRef<SessionMessage>,
    epoch: u64,
    mut inbound: mpsc::Receiver<Result<ServerMessage, LiveError>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(item) = inbound.recv().await {
            let msg = match item {
                Ok(message) => SessionMessage::Inbound {
                    epoch,
                    message: Box::new(message),
                },
                Err(error) => {
                    let _ = myself.cast(SessionMessage::LinkClosed { epoch, error });
                    return;
                }
            };
            if myself.cast(msg).is_err() {
                return;
            }
        }
        let _ = myself.cast(SessionMessage::LinkClosed {
            epoch,
            error: LiveError::Closed("stream ended".to_string()),
        });
    })
}

fn spawn_capture_forwarder(
    epoch: u64,
    mut frames: mpsc::Receiver<Vec<f32>>,
    outbound: mpsc::Sender<ClientMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut acc = FrameAccumulator::default();
        while let Some(batch) = frames.recv().await {
            for frame in acc.push(&batch) {
                let msg = ClientMessage::audio(encode_pcm16(&frame), INPUT_SAMPLE_RATE);
                if outbound.send(msg).await.is_err() {
                    debug!(channel = "live", session.epoch = epoch, "[Live] capture forwarder stopped");
                    return;
                }
            }
        }
    })
}
