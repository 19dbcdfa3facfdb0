//! # agent-core
//!
//! Single-turn agent orchestration: provider failover, tool dispatch and the
//! turn state machine. No HTTP lives here; concrete providers and tool
//! handlers come from `agent-runtime`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         AgentLoop                            │
//! │  ┌──────────────┐  ┌────────────────┐  ┌──────────────────┐  │
//! │  │ Conversation │  │ ToolDispatcher │  │ ProviderGateway  │  │
//! │  │   (Session)  │──│  + Registry    │──│ real ─▶ simulated│  │
//! │  └──────────────┘  └────────────────┘  └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod dispatch;
pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod tool;

pub use dispatch::{ToolDispatcher, ToolHandlers};
pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use provider::{
    GatewayReply, GenerationOptions, LlmProvider, ProviderGateway, ProviderReply, ReplySource,
};
pub use reasoning::{AgentLoop, TurnReport, TurnState};
pub use session::{BusyFlag, ProviderKind, Session, SessionConfig};
pub use tool::{ToolCall, ToolDescriptor, ToolHandler, ToolKind, ToolRegistry, ToolResult};
