//! Chat assistant.
//!
//! Replies come from Gemini when an API key is configured and the call
//! succeeds; otherwise from keyword-matched canned replies. The Gemini client
//! is built on first use and shared by every request afterwards.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zclip_models::{ChatRole, ChatTurn, ConversationState};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::gemini::{GeminiClient, DEFAULT_API_BASE_URL};

/// Number of history turns included in the prompt.
const MAX_HISTORY_TURNS: usize = 10;

/// Persona prepended to every prompt.
const PERSONA: &str = "You are ZuckClip, an enthusiastic video editing assistant. \
You help users turn raw footage into short viral videos.

Your personality:
- Energetic and creative
- Focused on video editing and content creation
- Helpful with uploads, style templates, and processing
- Uses emojis occasionally

Keep responses concise and focused on video editing. Guide users through the process: \
upload footage, pick a style template, add instructions, then process.";

/// Assistant configuration.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Gemini API key; no key means canned replies only
    pub api_key: Option<String>,
    /// Models tried in order
    pub models: Vec<String>,
    /// Gemini REST base URL
    pub api_base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// JSON file overriding the canned replies
    pub replies_path: Option<PathBuf>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            models: default_models(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(20),
            replies_path: None,
        }
    }
}

fn default_models() -> Vec<String> {
    ["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

impl AssistantConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            models: std::env::var("GEMINI_MODELS")
                .map(|s| {
                    s.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect::<Vec<_>>()
                })
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(default_models),
            api_base_url: std::env::var("GEMINI_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("GEMINI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(20),
            ),
            replies_path: std::env::var("ASSISTANT_REPLIES_PATH").ok().map(PathBuf::from),
        }
    }
}

/// Keyword group and the reply it triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRule {
    pub keywords: Vec<String>,
    pub reply: String,
}

/// Canned replies used when Gemini is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackReplies {
    /// Checked in order; the first rule with a matching keyword wins
    pub rules: Vec<ReplyRule>,
    /// Reply when no rule matches
    pub default: String,
}

impl Default for FallbackReplies {
    fn default() -> Self {
        let rule = |keywords: &[&str], reply: &str| ReplyRule {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            reply: reply.to_string(),
        };

        Self {
            rules: vec![
                rule(
                    &["hello", "hi", "hey"],
                    "Hey there! I'm ZuckClip, your video editing assistant 🎬 \
                     Upload your footage and let's make something viral!",
                ),
                rule(
                    &["upload", "video", "footage"],
                    "Perfect! Upload your raw video using the upload area. \
                     MP4, MOV and AVI work, up to 2GB. Then we'll pick an editing style ✨",
                ),
                rule(
                    &["template", "style", "viral"],
                    "Pick a template:\n\n\
                     ⚡ **Alex Hormozi** - fast cuts, bold captions, high energy\n\
                     🎯 **Iman Gadzhi** - cinematic, smooth transitions\n\
                     🎭 **Gary Vee** - authentic, minimal cuts\n\
                     ✨ **Custom** - upload a reference video to copy its style\n\n\
                     Which one fits your content?",
                ),
                rule(
                    &["edit", "process", "continue"],
                    "Ready when you are! I just need your footage first. \
                     Upload your raw video and we'll turn it into viral-ready content.",
                ),
                rule(
                    &["help", "how", "what"],
                    "Here's how it works:\n\n\
                     1️⃣ **Upload** your raw footage\n\
                     2️⃣ **Choose** a style template\n\
                     3️⃣ **Add** any special instructions\n\
                     4️⃣ **Process** and download your edit\n\n\
                     What would you like to start with?",
                ),
                rule(
                    &["credit", "price", "cost"],
                    "Each video edit uses one credit. The more you create, the more you learn what goes viral 💫",
                ),
            ],
            default: "I'm excited to help you create stunning video content! 🎥 \
                      Upload your raw footage or tell me what you want to make."
                .to_string(),
        }
    }
}

impl FallbackReplies {
    /// Load replies from a JSON file.
    pub fn load(path: &Path) -> ApiResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApiError::internal(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ApiError::internal(format!("Invalid replies file {}: {}", path.display(), e))
        })
    }

    /// Pick the reply for a user message.
    pub fn reply_for(&self, message: &str) -> &str {
        let lower = message.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| lower.contains(&k.to_lowercase())))
            .map(|rule| rule.reply.as_str())
            .unwrap_or(&self.default)
    }
}

/// Assistant answer for one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub conversation_state: ConversationState,
    /// Whether the reply came from the canned set
    pub fallback: bool,
}

/// Chat assistant service.
pub struct AssistantService {
    config: AssistantConfig,
    replies: FallbackReplies,
    client: OnceLock<Option<GeminiClient>>,
}

impl AssistantService {
    /// Create the service. Loads the replies file when one is configured.
    pub fn new(config: AssistantConfig) -> ApiResult<Self> {
        let replies = match &config.replies_path {
            Some(path) => {
                let replies = FallbackReplies::load(path)?;
                info!(path = %path.display(), rules = replies.rules.len(), "Loaded assistant replies");
                replies
            }
            None => FallbackReplies::default(),
        };

        Ok(Self::with_replies(config, replies))
    }

    pub fn with_replies(config: AssistantConfig, replies: FallbackReplies) -> Self {
        Self {
            config,
            replies,
            client: OnceLock::new(),
        }
    }

    /// Shared Gemini client, built on first use. `None` in fallback mode.
    fn client(&self) -> Option<&GeminiClient> {
        self.client
            .get_or_init(|| {
                let api_key = match &self.config.api_key {
                    Some(key) => key,
                    None => {
                        info!("GEMINI_API_KEY not set, chat assistant uses canned replies");
                        return None;
                    }
                };

                match GeminiClient::new(
                    api_key.clone(),
                    self.config.models.clone(),
                    self.config.api_base_url.clone(),
                    self.config.timeout,
                ) {
                    Ok(client) => {
                        info!(models = ?client.models(), "Gemini client initialized");
                        Some(client)
                    }
                    Err(e) => {
                        warn!("Failed to initialize Gemini client: {}", e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Answer a user message.
    pub async fn respond(&self, message: &str, history: &[ChatTurn]) -> ChatReply {
        let conversation_state = ConversationState::classify(message);

        if let Some(client) = self.client() {
            let prompt = build_prompt(message, history);
            match client.generate(&prompt).await {
                Ok(response) => {
                    return ChatReply {
                        response,
                        conversation_state,
                        fallback: false,
                    };
                }
                Err(e) => warn!("Gemini unavailable, using canned reply: {}", e),
            }
        }

        metrics::record_chat_fallback();
        ChatReply {
            response: self.replies.reply_for(message).to_string(),
            conversation_state,
            fallback: true,
        }
    }
}

/// Persona, recent history, then the new message.
pub fn build_prompt(message: &str, history: &[ChatTurn]) -> String {
    let mut prompt = String::from(PERSONA);
    prompt.push_str("\n\n");

    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    for turn in history[start..].iter().filter(|t| !t.content.trim().is_empty()) {
        let speaker = match turn.role {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        };
        prompt.push_str(&format!("{}: {}\n", speaker, turn.content.trim()));
    }

    prompt.push_str(&format!("User: {}\nAssistant:", message.trim()));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn turn(role: ChatRole, content: &str) -> ChatTurn {
        ChatTurn {
            role,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_fallback_reply_order() {
        let replies = FallbackReplies::default();
        assert!(replies.reply_for("Hello!").contains("Hey there"));
        assert!(replies.reply_for("where do I put my footage").contains("Upload your raw video"));
        assert!(replies.reply_for("show me a template").contains("Alex Hormozi"));
        assert!(replies.reply_for("Let's edit").contains("footage first"));
        assert!(replies.reply_for("what now").contains("Here's how it works"));
        assert!(replies.reply_for("price list").contains("credit"));
        assert_eq!(replies.reply_for("bonjour"), replies.default);
    }

    #[test]
    fn test_replies_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replies.json");
        std::fs::write(
            &path,
            r#"{"rules":[{"keywords":["Cat"],"reply":"meow"}],"default":"..."}"#,
        )
        .unwrap();

        let replies = FallbackReplies::load(&path).unwrap();
        assert_eq!(replies.reply_for("my CAT video"), "meow");
        assert_eq!(replies.reply_for("dog"), "...");

        assert!(FallbackReplies::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_build_prompt() {
        let history = vec![
            turn(ChatRole::User, "hi"),
            turn(ChatRole::Assistant, "Hey! Upload a video."),
            turn(ChatRole::User, "   "),
        ];
        let prompt = build_prompt("Which style?", &history);

        assert!(prompt.starts_with(PERSONA));
        assert!(prompt.contains("User: hi\nAssistant: Hey! Upload a video.\n"));
        assert!(prompt.ends_with("User: Which style?\nAssistant:"));
    }

    #[test]
    fn test_build_prompt_keeps_recent_history() {
        let history: Vec<ChatTurn> = (0..25)
            .map(|i| turn(ChatRole::User, &format!("message {}", i)))
            .collect();
        let prompt = build_prompt("latest", &history);

        assert!(!prompt.contains("message 14\n"));
        assert!(prompt.contains("message 15\n"));
        assert!(prompt.contains("message 24\n"));
    }

    #[tokio::test]
    async fn test_without_key_uses_fallback() {
        let assistant = AssistantService::with_replies(AssistantConfig::default(), FallbackReplies::default());
        assert!(assistant.client().is_none());

        let reply = assistant.respond("How do I upload my footage?", &[]).await;
        assert!(reply.fallback);
        assert_eq!(reply.conversation_state, ConversationState::AwaitingUpload);
        assert!(reply.response.contains("Upload your raw video"));
    }

    #[tokio::test]
    async fn test_model_reply_and_fallback_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "Go with Gary Vee!" }] } }]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let assistant = AssistantService::with_replies(
            AssistantConfig {
                api_key: Some("key".into()),
                models: vec!["gemini-2.0-flash".into()],
                api_base_url: server.uri(),
                ..AssistantConfig::default()
            },
            FallbackReplies::default(),
        );

        let reply = assistant.respond("Which viral style?", &[]).await;
        assert!(!reply.fallback);
        assert_eq!(reply.response, "Go with Gary Vee!");
        assert_eq!(reply.conversation_state, ConversationState::AwaitingTemplate);

        let reply = assistant.respond("hey", &[]).await;
        assert!(reply.fallback);
        assert!(reply.response.contains("Hey there"));
    }
}
