//! Environment Configuration
//!
//! Builds a [`SessionConfig`] from `AGENT_*` environment variables.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    session::{ProviderKind, SessionConfig},
};

/// Read the session configuration from the process environment
pub fn from_env() -> Result<SessionConfig> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a configuration from an arbitrary key lookup
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<SessionConfig> {
    let defaults = SessionConfig::default();
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let credential = var("AGENT_API_KEY");

    let provider_kind = match var("AGENT_PROVIDER") {
        Some(kind) => kind.parse()?,
        None if credential.is_some() => ProviderKind::Real,
        None => ProviderKind::Simulated,
    };

    let base_url = var("AGENT_BASE_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or(defaults.base_url);
    let search_url = var("AGENT_SEARCH_URL").unwrap_or_else(|| format!("{base_url}/search"));

    let max_tokens = match var("AGENT_MAX_TOKENS") {
        Some(raw) => raw
            .parse()
            .map_err(|_| AgentError::Config(format!("AGENT_MAX_TOKENS is not a number: {raw}")))?,
        None => defaults.max_tokens,
    };

    let workflow_delay = match var("AGENT_WORKFLOW_DELAY_MS") {
        Some(raw) => Duration::from_millis(raw.parse().map_err(|_| {
            AgentError::Config(format!("AGENT_WORKFLOW_DELAY_MS is not a number: {raw}"))
        })?),
        None => defaults.workflow_delay,
    };

    Ok(SessionConfig {
        provider_kind,
        credential,
        base_url,
        search_url,
        model: var("AGENT_MODEL").unwrap_or(defaults.model),
        max_tokens,
        workflow_delay,
    })
}
