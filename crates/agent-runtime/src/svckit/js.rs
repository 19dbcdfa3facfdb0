//! Execute JS Tool
//!
//! Evaluates JavaScript in an embedded interpreter with no host bindings:
//! no console, filesystem, network or process access. Each evaluation gets
//! its own runtime with a heap cap, a stack cap and an interrupt deadline,
//! so runaway code is stopped inside the interpreter rather than abandoned.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rquickjs::{CatchResultExt, Coerced, Context, Runtime, Value};

use agent_core::{
    error::{AgentError, Result},
    reasoning::markers,
    tool::{ToolCall, ToolHandler},
};

/// Resource limits for one evaluation
#[derive(Clone, Debug)]
pub struct SandboxLimits {
    /// Heap ceiling for the interpreter
    pub memory_bytes: usize,
    /// Interpreter stack ceiling, bounds recursion depth
    pub stack_bytes: usize,
    /// Wall-clock budget; the interpreter is interrupted once it passes
    pub timeout: Duration,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            memory_bytes: 32 * 1024 * 1024,
            stack_bytes: 256 * 1024,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Tool for sandboxed JavaScript evaluation
#[derive(Default)]
pub struct ExecuteJsTool {
    limits: SandboxLimits,
}

impl ExecuteJsTool {
    pub fn new(limits: SandboxLimits) -> Self {
        Self { limits }
    }
}

fn sandbox_error(err: rquickjs::Error) -> AgentError {
    AgentError::Execution(err.to_string())
}

/// Evaluate `code` and serialize the completion value
///
/// Objects and arrays come back as JSON; an `undefined` result is reported
/// literally. Values JSON cannot represent fall back to their string form.
/// Returns once the deadline passes even if the script never yields.
pub fn evaluate(code: &str, limits: &SandboxLimits) -> Result<String> {
    let runtime = Runtime::new().map_err(sandbox_error)?;
    runtime.set_memory_limit(limits.memory_bytes);
    runtime.set_max_stack_size(limits.stack_bytes);

    let deadline = Instant::now() + limits.timeout;
    runtime.set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline)));

    let context = Context::full(&runtime).map_err(sandbox_error)?;
    let timed_out = || {
        AgentError::Execution(format!("timed out after {}ms", limits.timeout.as_millis()))
    };

    context.with(|ctx| {
        let value: Value = ctx.eval(code).catch(&ctx).map_err(|e| {
            if Instant::now() >= deadline {
                timed_out()
            } else {
                AgentError::Execution(e.to_string())
            }
        })?;

        if value.is_undefined() {
            return Ok("undefined".into());
        }

        let json = ctx
            .json_stringify(value.clone())
            .catch(&ctx)
            .map_err(|e| AgentError::Execution(e.to_string()))?;

        match json {
            Some(text) => text.to_string().map_err(sandbox_error),
            None => value
                .get::<Coerced<String>>()
                .map(|text| text.0)
                .map_err(sandbox_error),
        }
    })
}

#[async_trait]
impl ToolHandler for ExecuteJsTool {
    async fn execute(&self, call: &ToolCall) -> Result<String> {
        let code = call.str_arg("code")?.to_string();
        let limits = self.limits.clone();
        let source = code.clone();

        let value = tokio::task::spawn_blocking(move || evaluate(&source, &limits))
            .await
            .map_err(|e| AgentError::Execution(format!("sandbox aborted: {e}")))??;

        Ok(format!(
            "**{}**\n\n```javascript\n{code}\n```\n\nResult: {value}",
            markers::CODE_EXECUTED
        ))
    }
}
