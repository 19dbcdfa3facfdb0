//! LLM Provider Strategy Pattern
//!
//! Common interface for the HTTP-backed provider and the rule-based simulator,
//! plus the gateway that picks between them and fails over.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::ProviderGateway;
//!
//! let gateway = ProviderGateway::new(Some(real), simulated);
//! let reply = gateway.query(&conversation.snapshot(), registry.describe()).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::{ToolCall, ToolDescriptor};

/// Configuration for chat-completion requests
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier
    pub model: String,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// What a provider answered for one query
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderReply {
    /// Assistant text, if any
    pub output_text: Option<String>,

    /// Requested tool calls, in emission order
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ProviderReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            output_text: Some(text.into()),
            tool_calls: None,
        }
    }

    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.get_or_insert_with(Vec::new).push(call);
        self
    }

    /// Tool calls, treating absent and empty alike
    pub fn calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

/// Strategy trait for providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Answer the conversation, optionally requesting tool calls
    async fn query(&self, messages: &[Message], tools: &[ToolDescriptor]) -> Result<ProviderReply>;
}

/// Which provider produced a reply
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplySource {
    /// The real provider answered
    Real,
    /// Simulation mode was configured
    Simulated,
    /// The real provider failed this turn; the simulator answered
    Fallback { reason: String },
}

/// Reply plus where it came from
#[derive(Clone, Debug)]
pub struct GatewayReply {
    pub reply: ProviderReply,
    pub source: ReplySource,
}

/// Selects the real provider when configured and falls back to simulation
///
/// One attempt at the real provider per query, then one fallback for
/// transport, status and format failures. No retries; any other error and a
/// simulator failure are returned as-is.
#[derive(Clone)]
pub struct ProviderGateway {
    real: Option<Arc<dyn LlmProvider>>,
    simulated: Arc<dyn LlmProvider>,
}

impl ProviderGateway {
    pub fn new(real: Option<Arc<dyn LlmProvider>>, simulated: Arc<dyn LlmProvider>) -> Self {
        Self { real, simulated }
    }

    /// Gateway that only ever simulates
    pub fn simulated_only(simulated: Arc<dyn LlmProvider>) -> Self {
        Self::new(None, simulated)
    }

    /// Whether a real provider will be tried first
    pub fn has_real_provider(&self) -> bool {
        self.real.is_some()
    }

    pub async fn query(
        &self,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<GatewayReply> {
        let Some(real) = &self.real else {
            let reply = self.simulated.query(messages, tools).await?;
            return Ok(GatewayReply { reply, source: ReplySource::Simulated });
        };

        match real.query(messages, tools).await {
            Ok(reply) => Ok(GatewayReply { reply, source: ReplySource::Real }),
            Err(e) if e.is_provider_failure() => {
                tracing::warn!(
                    provider = real.name(),
                    error = %e,
                    "Real provider failed, falling back to simulation for this turn"
                );
                let reply = self.simulated.query(messages, tools).await?;
                Ok(GatewayReply {
                    reply,
                    source: ReplySource::Fallback { reason: e.to_string() },
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AgentError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed reply (or a fixed failure) and counts calls
    pub(crate) struct Scripted {
        pub reply: Option<ProviderReply>,
        pub failure: fn() -> AgentError,
        pub calls: AtomicUsize,
    }

    fn unavailable() -> AgentError {
        AgentError::Http {
            status: 503,
            body: "unavailable".into(),
        }
    }

    impl Scripted {
        pub fn ok(reply: ProviderReply) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply),
                failure: unavailable,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn failing() -> Arc<Self> {
            Self::failing_with(unavailable)
        }

        pub fn failing_with(failure: fn() -> AgentError) -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                failure,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn query(
            &self,
            _messages: &[Message],
            _tools: &[ToolDescriptor],
        ) -> Result<ProviderReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().ok_or_else(self.failure)
        }
    }

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.max_tokens, 1000);
        assert_eq!(opts.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_real_success_skips_simulator() {
        let real = Scripted::ok(ProviderReply::text("real"));
        let sim = Scripted::ok(ProviderReply::text("sim"));
        let gateway = ProviderGateway::new(Some(real.clone()), sim.clone());

        let out = gateway.query(&[], &[]).await.unwrap();
        assert_eq!(out.source, ReplySource::Real);
        assert_eq!(out.reply.output_text.as_deref(), Some("real"));
        assert_eq!(sim.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_single_fallback_on_failure() {
        let real = Scripted::failing();
        let sim = Scripted::ok(ProviderReply::text("sim"));
        let gateway = ProviderGateway::new(Some(real.clone()), sim.clone());

        let out = gateway.query(&[], &[]).await.unwrap();
        assert!(matches!(out.source, ReplySource::Fallback { .. }));
        assert_eq!(real.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sim.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_format_failure_falls_back() {
        let real = Scripted::failing_with(|| AgentError::Format("missing content".into()));
        let sim = Scripted::ok(ProviderReply::text("sim"));
        let gateway = ProviderGateway::new(Some(real), sim.clone());

        let out = gateway.query(&[], &[]).await.unwrap();
        assert!(matches!(out.source, ReplySource::Fallback { .. }));
        assert_eq!(sim.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unexpected_error_is_not_masked() {
        let real = Scripted::failing_with(|| AgentError::Config("bad base url".into()));
        let sim = Scripted::ok(ProviderReply::text("sim"));
        let gateway = ProviderGateway::new(Some(real), sim.clone());

        let err = gateway.query(&[], &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
        assert_eq!(sim.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_simulator_failure_propagates() {
        let gateway = ProviderGateway::new(Some(Scripted::failing()), Scripted::failing());
        assert!(gateway.query(&[], &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_no_real_provider_goes_straight_to_simulation() {
        let sim = Scripted::ok(ProviderReply::text("sim"));
        let gateway = ProviderGateway::simulated_only(sim);
        let out = gateway.query(&[], &[]).await.unwrap();
        assert_eq!(out.source, ReplySource::Simulated);
    }
}
