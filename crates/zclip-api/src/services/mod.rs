//! Business logic services.

pub mod assistant;
pub mod gemini;

pub use assistant::{AssistantConfig, AssistantService, ChatReply, FallbackReplies, ReplyRule};
pub use gemini::GeminiClient;
