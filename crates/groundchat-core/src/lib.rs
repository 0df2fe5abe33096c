pub mod ai;
pub mod config;
pub mod conversation;
pub mod error;
pub mod models;
pub mod prompt;
pub mod query;
pub mod state;

// Re-export main types for convenience
pub use ai::{Connector, GeminiClient, GeminiConnector, ModelBackend, ModelResponse, QueryConfig, TextStream};
pub use config::{Config, Settings, Temperature};
pub use conversation::{ConversationUpdater, Submission};
pub use error::{ChatError, ErrorKind};
pub use models::{is_known_model, ModelOption};
pub use prompt::{build_prompt, PromptTurn, SpeakerLabel};
pub use query::{QueryReply, SearchAssistant, SearchResults};
pub use state::{ChatLog, ChatMessage, ChatRole};
