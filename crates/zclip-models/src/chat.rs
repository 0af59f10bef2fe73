//! Chat assistant message types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Who wrote a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    #[default]
    User,
    #[serde(alias = "ai", alias = "model")]
    Assistant,
}

/// One turn of conversation history as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChatTurn {
    #[serde(default)]
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
}

/// Where the editor workflow stands, as inferred from the user's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    AwaitingUpload,
    AwaitingTemplate,
    AwaitingReferenceVideo,
    AwaitingInstructions,
    Chatting,
}

impl ConversationState {
    /// Keyword groups checked in order; the first hit wins.
    const RULES: &'static [(&'static [&'static str], ConversationState)] = &[
        (&["upload", "video", "footage"], ConversationState::AwaitingUpload),
        (&["template", "style", "viral"], ConversationState::AwaitingTemplate),
        (
            &["reference", "custom", "train"],
            ConversationState::AwaitingReferenceVideo,
        ),
        (
            &["instructions", "edit", "process"],
            ConversationState::AwaitingInstructions,
        ),
    ];

    /// Infer the workflow state from a user message.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        Self::RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(_, state)| *state)
            .unwrap_or(ConversationState::Chatting)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::AwaitingUpload => "awaiting_upload",
            ConversationState::AwaitingTemplate => "awaiting_template",
            ConversationState::AwaitingReferenceVideo => "awaiting_reference_video",
            ConversationState::AwaitingInstructions => "awaiting_instructions",
            ConversationState::Chatting => "chatting",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            ConversationState::classify("How do I upload my footage?"),
            ConversationState::AwaitingUpload
        );
        assert_eq!(
            ConversationState::classify("Which STYLE is best?"),
            ConversationState::AwaitingTemplate
        );
        assert_eq!(
            ConversationState::classify("I want a custom look"),
            ConversationState::AwaitingReferenceVideo
        );
        assert_eq!(
            ConversationState::classify("please edit it"),
            ConversationState::AwaitingInstructions
        );
        assert_eq!(
            ConversationState::classify("good morning"),
            ConversationState::Chatting
        );
    }

    #[test]
    fn test_earlier_rule_wins() {
        // "video" (upload) is checked before "style" (template)
        assert_eq!(
            ConversationState::classify("style my video"),
            ConversationState::AwaitingUpload
        );
    }

    #[test]
    fn test_history_turn_accepts_ai_role() {
        let turn: ChatTurn = serde_json::from_str(r#"{"role":"ai","content":"hi"}"#).unwrap();
        assert_eq!(turn.role, ChatRole::Assistant);
    }
}
