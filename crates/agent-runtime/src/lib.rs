//! # agent-runtime
//!
//! Concrete providers and tool handlers for the agent.
//!
//! ## Providers
//!
//! - **OpenAI-compatible**: `POST {base_url}/chat/completions` with tool calling
//! - **Simulated**: rule-based stand-in used without a credential or after a failure
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{config, AgentBuilder};
//!
//! let session_config = config::from_env()?;
//! let agent = AgentBuilder::new(&session_config).build();
//! let mut session = Session::new(session_config);
//! let report = agent.run_turn(&mut session, "search for rust ownership").await?;
//! ```

pub mod config;
pub mod openai;
pub mod simulated;
pub mod svckit;

pub use openai::{ChatCompletionsClient, OpenAiProvider};
pub use simulated::SimulatedProvider;

// Re-export core types for convenience
pub use agent_core::{
    AgentError, AgentLoop, LlmProvider, Message, Result, Role, Session, SessionConfig, TurnReport,
};

use std::sync::Arc;

use agent_core::{ProviderGateway, ToolDispatcher, ToolRegistry};

/// Wires a [`SessionConfig`] into an [`AgentLoop`]
pub struct AgentBuilder<'a> {
    config: &'a SessionConfig,
    seed: Option<u64>,
}

impl<'a> AgentBuilder<'a> {
    pub fn new(config: &'a SessionConfig) -> Self {
        Self { config, seed: None }
    }

    /// Pin the simulator's random source
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> AgentLoop {
        let simulated: Arc<dyn LlmProvider> = Arc::new(match self.seed {
            Some(seed) => SimulatedProvider::with_seed(seed),
            None => SimulatedProvider::new(),
        });

        let real = self.config.is_real_capable().then(|| {
            Arc::new(OpenAiProvider::from_session(self.config)) as Arc<dyn LlmProvider>
        });

        tracing::debug!(
            real = real.is_some(),
            kind = ?self.config.provider_kind,
            "Building agent"
        );

        AgentLoop::new(
            ProviderGateway::new(real, simulated),
            ToolDispatcher::new(svckit::handlers(self.config)),
            ToolRegistry::new(),
        )
    }
}
