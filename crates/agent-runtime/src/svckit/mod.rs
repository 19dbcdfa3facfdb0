//! Service Kit - Agent Tools
//!
//! Handlers for the three built-in tools and the table wiring them to
//! [`ToolKind`](agent_core::ToolKind)s.

mod js;
mod pipe;
mod search;

pub use js::{evaluate, ExecuteJsTool, SandboxLimits};
pub use pipe::AiPipeTool;
pub use search::GoogleSearchTool;

use std::sync::Arc;

use agent_core::{dispatch::ToolHandlers, provider::GenerationOptions, session::SessionConfig};

use crate::openai::ChatCompletionsClient;

/// Handler table for a session
pub fn handlers(config: &SessionConfig) -> ToolHandlers {
    let workflow_client = config
        .credential
        .as_ref()
        .map(|key| ChatCompletionsClient::new(&config.base_url, Some(key.clone())));

    ToolHandlers {
        google_search: Arc::new(GoogleSearchTool::new(
            &config.search_url,
            config.credential.clone(),
        )),
        ai_pipe: Arc::new(AiPipeTool::new(
            workflow_client,
            GenerationOptions {
                model: config.model.clone(),
                max_tokens: config.max_tokens,
            },
            config.workflow_delay,
        )),
        execute_js: Arc::new(ExecuteJsTool::default()),
    }
}
