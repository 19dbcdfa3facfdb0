//! Turn Loop
//!
//! Runs one user turn: query the provider, run any requested tools
//! concurrently, fold their results back in, and close with a synthesized
//! reply. At most one round of tool calls happens per turn.
//!
//! ```text
//! Idle ─▶ AwaitingProvider ─┬─────────────────────────────────────▶ Done
//!                           └─▶ DispatchingTools ─▶ Synthesizing ─▶ Done
//! ```

use serde::Serialize;

use crate::dispatch::ToolDispatcher;
use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{ProviderGateway, ReplySource};
use crate::session::Session;
use crate::tool::{ToolRegistry, ToolResult};

/// Substrings tool handlers put in their output so the closing reply can be chosen
pub mod markers {
    pub const WORKFLOW_COMPLETED: &str = "Workflow Completed";
    pub const SEARCH_RESULTS: &str = "Search Results";
    pub const CODE_EXECUTED: &str = "Code Executed Successfully";
}

const WORKFLOW_CLOSING: &str = "Your AI Pipe workflow has finished. The processed output is above. \
     Let me know if you want to adjust a step or run another pipeline.";
const SEARCH_CLOSING: &str = "Those are the most relevant results I found. \
     Want me to dig deeper into any of them or search for something related?";
const CODE_CLOSING: &str = "The code ran successfully and the result is shown above. \
     I can modify it or run another snippet if you like.";
const GENERIC_CLOSING: &str = "I've finished running the requested tools. \
     Let me know if there's anything else you need.";

/// Turn states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Idle,
    AwaitingProvider,
    DispatchingTools,
    Synthesizing,
    Done,
}

/// Summary of a finished turn
#[derive(Clone, Debug, Serialize)]
pub struct TurnReport {
    /// Terminal state (always `Done` for a returned report)
    pub state: TurnState,

    /// Which provider answered
    pub source: ReplySource,

    /// Tool results appended this turn
    pub tool_results: usize,

    /// Last assistant text appended this turn
    pub reply: Option<String>,

    /// Things the user should be told (e.g. simulation fallback)
    pub notices: Vec<String>,
}

/// Single-turn orchestrator
#[derive(Clone)]
pub struct AgentLoop {
    gateway: ProviderGateway,
    dispatcher: ToolDispatcher,
    registry: ToolRegistry,
}

impl AgentLoop {
    pub fn new(
        gateway: ProviderGateway,
        dispatcher: ToolDispatcher,
        registry: ToolRegistry,
    ) -> Self {
        Self {
            gateway,
            dispatcher,
            registry,
        }
    }

    /// Run one turn against `session`
    ///
    /// Fails with [`AgentError::Auth`] before touching the conversation if no
    /// provider is usable, and with [`AgentError::Busy`] if a turn is already
    /// running. The busy flag is released on every exit path.
    pub async fn run_turn(&self, session: &mut Session, input: &str) -> Result<TurnReport> {
        session.config.ensure_usable()?;

        let input = input.trim();
        if input.is_empty() {
            return Err(AgentError::Other("message is empty".into()));
        }

        let _guard = session.begin_turn()?;
        let mut state = TurnState::Idle;

        session.conversation.append(Message::user(input));
        session.touch();
        transition(&mut state, TurnState::AwaitingProvider);

        let answer = self
            .gateway
            .query(&session.conversation.snapshot(), self.registry.describe())
            .await?;

        let mut notices = Vec::new();
        if let ReplySource::Fallback { reason } = &answer.source {
            notices.push(format!(
                "The AI service was unavailable ({reason}). Answered in simulation mode."
            ));
        }

        let calls = answer.reply.calls().to_vec();
        let mut reply = None;

        if let Some(text) = answer.reply.output_text {
            session
                .conversation
                .append(Message::assistant(&text).with_tool_calls(calls.clone()));
            reply = Some(text);
        }

        if calls.is_empty() {
            transition(&mut state, TurnState::Done);
            tracing::info!(source = ?answer.source, "Turn finished without tools");
            return Ok(TurnReport {
                state,
                source: answer.source,
                tool_results: 0,
                reply,
                notices,
            });
        }

        transition(&mut state, TurnState::DispatchingTools);
        let results = self.dispatcher.dispatch_all(&calls).await;
        for result in &results {
            session
                .conversation
                .append(Message::tool(&result.content, &result.tool_call_id));
        }

        transition(&mut state, TurnState::Synthesizing);
        let closing = synthesize(&results);
        session.conversation.append(Message::assistant(closing));
        session.touch();

        transition(&mut state, TurnState::Done);
        tracing::info!(source = ?answer.source, tools = results.len(), "Turn finished");

        Ok(TurnReport {
            state,
            source: answer.source,
            tool_results: results.len(),
            reply: Some(closing.to_string()),
            notices,
        })
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn gateway(&self) -> &ProviderGateway {
        &self.gateway
    }
}

fn transition(state: &mut TurnState, next: TurnState) {
    tracing::debug!(from = ?*state, to = ?next, "Turn state");
    *state = next;
}

/// Closing text chosen from the first tool result
pub fn synthesize(results: &[ToolResult]) -> &'static str {
    let Some(first) = results.first() else {
        return GENERIC_CLOSING;
    };

    if first.content.contains(markers::WORKFLOW_COMPLETED) {
        WORKFLOW_CLOSING
    } else if first.content.contains(markers::SEARCH_RESULTS) {
        SEARCH_CLOSING
    } else if first.content.contains(markers::CODE_EXECUTED) {
        CODE_CLOSING
    } else {
        GENERIC_CLOSING
    }
}
