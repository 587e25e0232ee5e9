//! Wire types for the Gemini Live bidirectional streaming protocol.
//!
//! Client frames are single-key JSON objects (`setup`, `realtimeInput`,
//! `toolResponse`). Server frames carry one or more optional sections; unknown
//! keys are preserved in `extra` so newer server fields never break decoding.

mod client;
mod server;
mod setup;

pub use client::{
    Blob, ClientMessage, FunctionResponse, RealtimeInput, ToolResponse, pcm_mime_type,
};
pub use server::{
    FunctionCall, GoAway, InlineData, ModelTurn, ServerContent, ServerMessage, ToolCall,
    ToolCallCancellation, Transcription, TurnPart,
};
pub use setup::{
    Content, FunctionDeclaration, GenerationConfig, Part, PrebuiltVoiceConfig, Setup,
    SpeechConfig, Tool, VoiceConfig,
};
