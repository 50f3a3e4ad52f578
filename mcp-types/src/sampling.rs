use serde::Deserialize;
use serde::Serialize;

use crate::common::Role;
use crate::mcp_request;
use crate::meta::Meta;
use crate::tools::ContentBlock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingMessage {
    pub role: Role,
    pub content: ContentBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<ModelHint>>,
    #[serde(
        rename = "costPriority",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cost_priority: Option<f64>,
    #[serde(
        rename = "speedPriority",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub speed_priority: Option<f64>,
    #[serde(
        rename = "intelligencePriority",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub intelligence_priority: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMessageRequestParams {
    pub messages: Vec<SamplingMessage>,
    #[serde(
        rename = "modelPreferences",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub model_preferences: Option<ModelPreferences>,
    #[serde(
        rename = "systemPrompt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub system_prompt: Option<String>,
    #[serde(
        rename = "includeContext",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub include_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "maxTokens")]
    pub max_tokens: i64,
    #[serde(
        rename = "stopSequences",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMessageResult {
    pub role: Role,
    pub content: ContentBlock,
    pub model: String,
    #[serde(
        rename = "stopReason",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_reason: Option<String>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

mcp_request!(
    CreateMessageRequest,
    "sampling/createMessage",
    CreateMessageRequestParams,
    CreateMessageResult
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::TextContent;

    #[test]
    fn create_message_params_round_trips_camel_case_aliases() {
        let raw = serde_json::json!({
            "messages": [{"role": "user", "content": {"type": "text", "text": "hi"}}],
            "maxTokens": 256,
            "stopSequences": ["\n\n"],
            "modelPreferences": {"costPriority": 0.3},
        });
        let params: CreateMessageRequestParams = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(params.max_tokens, 256);
        assert_eq!(params.stop_sequences, Some(vec!["\n\n".to_string()]));
        assert_eq!(serde_json::to_value(&params).unwrap(), raw);
    }

    #[test]
    fn create_message_result_omits_absent_stop_reason() {
        let result = CreateMessageResult {
            role: Role::Assistant,
            content: ContentBlock::Text(TextContent {
                text: "hi".into(),
                annotations: None,
            }),
            model: "demo-model".into(),
            stop_reason: None,
            metadata: Meta::default(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("stopReason").is_none());
    }
}
