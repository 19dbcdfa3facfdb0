//! Tool Dispatch
//!
//! Exhaustive handler table over [`ToolKind`]. Dispatch never fails: unknown
//! tools and handler errors come back as error-content results so the turn can
//! still reach synthesis.

use std::sync::Arc;

use futures::future::join_all;

use crate::error::AgentError;
use crate::tool::{ToolCall, ToolHandler, ToolKind, ToolResult};

/// One handler per tool kind
#[derive(Clone)]
pub struct ToolHandlers {
    pub google_search: Arc<dyn ToolHandler>,
    pub ai_pipe: Arc<dyn ToolHandler>,
    pub execute_js: Arc<dyn ToolHandler>,
}

impl ToolHandlers {
    fn handler(&self, kind: ToolKind) -> &Arc<dyn ToolHandler> {
        match kind {
            ToolKind::GoogleSearch => &self.google_search,
            ToolKind::AiPipe => &self.ai_pipe,
            ToolKind::ExecuteJs => &self.execute_js,
        }
    }
}

/// Routes provider tool calls to their handlers
#[derive(Clone)]
pub struct ToolDispatcher {
    handlers: ToolHandlers,
}

impl ToolDispatcher {
    pub fn new(handlers: ToolHandlers) -> Self {
        Self { handlers }
    }

    /// Execute a single tool call
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(kind) = ToolKind::from_name(&call.name) else {
            tracing::warn!(tool = %call.name, "Provider requested an unknown tool");
            return error_result(call, &AgentError::UnknownTool(call.name.clone()));
        };

        tracing::debug!(tool = %kind, id = %call.id, "Executing tool");

        match self.handlers.handler(kind).execute(call).await {
            Ok(content) => ToolResult::new(&call.id, content),
            Err(e) => {
                tracing::warn!(tool = %kind, error = %e, "Tool execution failed");
                error_result(call, &e)
            }
        }
    }

    /// Execute all calls concurrently; results come back in call order
    pub async fn dispatch_all(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        join_all(calls.iter().map(|call| self.dispatch(call))).await
    }
}

fn error_result(call: &ToolCall, err: &AgentError) -> ToolResult {
    let err = match err {
        AgentError::UnknownTool(_) | AgentError::Execution(_) => err.to_string(),
        other => AgentError::Execution(other.to_string()).to_string(),
    };
    ToolResult::new(&call.id, format!("Error running {}: {err}", call.name))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Echoes its tool name after a fixed delay
    pub(crate) struct DelayedEcho {
        pub label: &'static str,
        pub delay: Duration,
    }

    #[async_trait]
    impl ToolHandler for DelayedEcho {
        async fn execute(&self, _call: &ToolCall) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            Ok(format!("{} done", self.label))
        }
    }

    struct Failing;

    #[async_trait]
    impl ToolHandler for Failing {
        async fn execute(&self, _call: &ToolCall) -> Result<String> {
            Err(AgentError::Execution("boom".into()))
        }
    }

    fn echo(label: &'static str, ms: u64) -> Arc<dyn ToolHandler> {
        Arc::new(DelayedEcho {
            label,
            delay: Duration::from_millis(ms),
        })
    }

    pub(crate) fn echo_handlers(search_ms: u64, pipe_ms: u64, js_ms: u64) -> ToolHandlers {
        ToolHandlers {
            google_search: echo("search", search_ms),
            ai_pipe: echo("pipe", pipe_ms),
            execute_js: echo("js", js_ms),
        }
    }

    #[tokio::test]
    async fn test_results_keep_call_order_when_completion_is_reversed() {
        // First call finishes last, last call finishes first.
        let dispatcher = ToolDispatcher::new(echo_handlers(60, 30, 0));
        let calls = vec![
            ToolCall::new("a", "google_search"),
            ToolCall::new("b", "ai_pipe"),
            ToolCall::new("c", "execute_js"),
        ];

        let results = dispatcher.dispatch_all(&calls).await;

        let ids: Vec<&str> = results.iter().map(|r| r.tool_call_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(results[0].content, "search done");
        assert_eq!(results[2].content, "js done");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_fatal() {
        let dispatcher = ToolDispatcher::new(echo_handlers(0, 0, 0));
        let result = dispatcher.dispatch(&ToolCall::new("x", "delete_everything")).await;

        assert_eq!(result.tool_call_id, "x");
        assert!(result.content.contains("delete_everything"));
        assert!(result.content.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_handler_error_becomes_content() {
        let mut handlers = echo_handlers(0, 0, 0);
        handlers.execute_js = Arc::new(Failing);
        let dispatcher = ToolDispatcher::new(handlers);

        let result = dispatcher.dispatch(&ToolCall::new("j", "execute_js")).await;
        assert!(result.content.starts_with("Error running execute_js"));
        assert!(result.content.contains("boom"));
    }
}
