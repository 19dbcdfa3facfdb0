//! AI Pipe Tool
//!
//! Sends the workflow description through a chat completion when a credential
//! is available. Otherwise waits a fixed delay and returns a canned summary.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use agent_core::{
    error::Result,
    provider::GenerationOptions,
    reasoning::markers,
    tool::{ToolCall, ToolHandler},
};

use crate::openai::ChatCompletionsClient;

const WORKFLOW_PREAMBLE: &str = "You are an AI Pipe workflow processor. Treat the user's text as a \
    text-processing workflow: break it into steps, carry out each step, and report the processed \
    output concisely.";

const MOCK_CONFIDENCE: u8 = 94;

/// Tool for running text-processing workflows
pub struct AiPipeTool {
    client: Option<ChatCompletionsClient>,
    options: GenerationOptions,
    delay: Duration,
}

impl AiPipeTool {
    /// `client` is `None` when no credential is configured
    pub fn new(
        client: Option<ChatCompletionsClient>,
        options: GenerationOptions,
        delay: Duration,
    ) -> Self {
        Self { client, options, delay }
    }

    async fn run_remote(&self, client: &ChatCompletionsClient, workflow: &str) -> Result<String> {
        let body = json!({
            "model": self.options.model,
            "messages": [
                { "role": "system", "content": WORKFLOW_PREAMBLE },
                { "role": "user", "content": workflow },
            ],
            "max_tokens": self.options.max_tokens,
        });

        let message = client.send(&body).await?;
        let content = message.text()?;
        Ok(format!("{}\n\n{content}", header(workflow)))
    }

    async fn run_mock(&self, workflow: &str) -> String {
        tokio::time::sleep(self.delay).await;
        format!(
            "{}\n\n\
             Steps executed:\n\
             1. Input parsed and normalized\n\
             2. Text analyzed for entities, intent and sentiment\n\
             3. Transformations applied\n\
             4. Output validated and formatted\n\n\
             Confidence: {MOCK_CONFIDENCE}%",
            header(workflow)
        )
    }
}

fn header(workflow: &str) -> String {
    format!("**AI Pipe {}**\n\nWorkflow: {workflow}", markers::WORKFLOW_COMPLETED)
}

#[async_trait]
impl ToolHandler for AiPipeTool {
    async fn execute(&self, call: &ToolCall) -> Result<String> {
        let workflow = call.str_arg("workflow")?;

        if let Some(client) = &self.client {
            match self.run_remote(client, workflow).await {
                Ok(content) => return Ok(content),
                Err(e) => tracing::warn!(error = %e, "Workflow call failed, using canned summary"),
            }
        }

        Ok(self.run_mock(workflow).await)
    }
}
