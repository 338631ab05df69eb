//! Application layer for cluster-relay
//!
//! This crate contains use cases, port definitions, the context store and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod context_store;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::RelayParams;
pub use context_store::{ContextStore, ExchangeLease};
pub use ports::{
    agent_gateway::{
        AgentCard, AgentGateway, AgentSkill, ExchangeError, ExchangeReply, ExchangeRequest,
    },
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    planner::{PlanRequest, PlanResponse, PlannerError, PlanningOracle},
    progress::{NoProgress, ProgressNotifier},
};
pub use use_cases::manage_context::{
    ContextOutcome, ContextStatus, ManageContextError, ManageContextUseCase,
};
pub use use_cases::orchestrate::{
    OrchestrateError, OrchestrateInput, OrchestrateUseCase, RelayReply, ReplyKind,
};
