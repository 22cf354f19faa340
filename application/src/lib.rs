//! Application layer for llm-council
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod health_store;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::BehaviorConfig;
pub use health_store::HealthStore;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    progress::{CouncilEvent, ProgressEmitter, StageError, progress_channel},
    worker_gateway::{
        ChatMessage, ChatRequest, GatewayError, SynthesisRequest, WorkerGateway, WorkerReply,
    },
};
pub use use_cases::generate_title::{FALLBACK_TITLE, GenerateTitleUseCase};
pub use use_cases::health_monitor::HealthMonitor;
pub use use_cases::run_council::{RunCouncilError, RunCouncilUseCase};
