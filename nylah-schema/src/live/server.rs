use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A frame received from the remote model.
///
/// Usually exactly one section is present; all are optional so that frames
/// carrying extra metadata (e.g. `usageMetadata`) still decode.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_complete: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_content: Option<ServerContent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_cancellation: Option<ToolCallCancellation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_away: Option<GoAway>,

    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_turn: Option<ModelTurn>,

    #[serde(default)]
    pub turn_complete: bool,

    /// Barge-in: the user spoke over the model; queued playback must stop.
    #[serde(default)]
    pub interrupted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_transcription: Option<Transcription>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_transcription: Option<Transcription>,

    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelTurn {
    #[serde(default)]
    pub parts: Vec<TurnPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TurnPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,

    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Transcription {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,
}

/// One function invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolCallCancellation {
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GoAway {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_left: Option<String>,
}

impl ServerContent {
    /// Base64 audio payloads of this turn, in part order.
    ///
    /// Parts without a MIME type are accepted as audio since the session only
    /// negotiates the AUDIO modality.
    pub fn audio_payloads(&self) -> impl Iterator<Item = &str> {
        self.model_turn
            .iter()
            .flat_map(|turn| turn.parts.iter())
            .filter_map(|part| part.inline_data.as_ref())
            .filter(|data| data.mime_type.is_empty() || data.mime_type.starts_with("audio/"))
            .map(|data| data.data.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_audio_turn_and_keeps_unknown_keys() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "serverContent": {
                "modelTurn": {
                    "parts": [
                        {"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "AAEC"}},
                        {"text": "thinking"},
                        {"inlineData": {"mimeType": "image/png", "data": "zzz"}},
                        {"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "AwQF"}}
                    ]
                }
            },
            "usageMetadata": {"totalTokenCount": 12}
        }))
        .unwrap();

        let content = msg.server_content.as_ref().unwrap();
        let payloads: Vec<&str> = content.audio_payloads().collect();
        assert_eq!(payloads, vec!["AAEC", "AwQF"]);
        assert!(!content.interrupted);
        assert!(msg.extra.contains_key("usageMetadata"));
    }

    #[test]
    fn decodes_tool_call_with_missing_args() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "toolCall": {
                "functionCalls": [
                    {"id": "fc-1", "name": "navigateTo", "args": {"section": "booking"}},
                    {"id": "fc-2", "name": "bookSession"}
                ]
            }
        }))
        .unwrap();

        let calls = &msg.tool_call.unwrap().function_calls;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id.as_deref(), Some("fc-1"));
        assert_eq!(calls[0].args["section"], "booking");
        assert!(calls[1].args.is_empty());
    }

    #[test]
    fn decodes_interruption_and_transcription() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "serverContent": {
                "interrupted": true,
                "inputTranscription": {"text": "wait"}
            }
        }))
        .unwrap();
        let content = msg.server_content.unwrap();
        assert!(content.interrupted);
        assert_eq!(content.input_transcription.unwrap().text, "wait");
        assert_eq!(content.audio_payloads().count(), 0);
    }

    #[test]
    fn decodes_setup_complete_and_go_away() {
        let msg: ServerMessage = serde_json::from_str(r#"{"setupComplete":{}}"#).unwrap();
        assert!(msg.setup_complete.is_some());

        let msg: ServerMessage =
            serde_json::from_str(r#"{"goAway":{"timeLeft":"10s"}}"#).unwrap();
        assert_eq!(msg.go_away.unwrap().time_left.as_deref(), Some("10s"));
    }
}
