//! Session Management
//!
//! A session owns the conversation, the provider configuration and the busy
//! flag that keeps turns from interleaving.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::Conversation;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the session reaches a model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Direct chat-completion endpoint; needs a credential
    Real,
    /// Proxy-integrated endpoint that handles credentials itself
    Proxy,
    /// Rule-based simulation only
    Simulated,
}

impl std::str::FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "real" | "openai" => Ok(Self::Real),
            "proxy" => Ok(Self::Proxy),
            "simulated" | "simulation" | "sim" => Ok(Self::Simulated),
            other => Err(AgentError::Config(format!("unknown provider kind '{other}'"))),
        }
    }
}

/// Provider and tool configuration for one session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    pub provider_kind: ProviderKind,

    /// Bearer credential for the provider, search proxy and workflow calls
    #[serde(default, skip_serializing)]
    pub credential: Option<String>,

    /// Chat-completion base URL (without `/chat/completions`)
    pub base_url: String,

    /// Search proxy URL
    pub search_url: String,

    pub model: String,

    pub max_tokens: u32,

    /// Artificial delay before the mock workflow summary
    #[serde(with = "duration_millis")]
    pub workflow_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let base_url = "https://api.openai.com/v1".to_string();
        Self {
            provider_kind: ProviderKind::Simulated,
            credential: None,
            search_url: format!("{base_url}/search"),
            base_url,
            model: "gpt-4o-mini".into(),
            max_tokens: 1000,
            workflow_delay: Duration::from_millis(1500),
        }
    }
}

impl SessionConfig {
    /// Simulation-only configuration with no artificial delays
    pub fn simulated() -> Self {
        Self {
            workflow_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Whether the real provider should be tried before simulating
    pub fn is_real_capable(&self) -> bool {
        self.credential.is_some() || self.provider_kind == ProviderKind::Proxy
    }

    /// Fail if nothing can answer a turn
    pub fn ensure_usable(&self) -> Result<()> {
        if self.provider_kind == ProviderKind::Real && self.credential.is_none() {
            return Err(AgentError::Auth(
                "provider kind 'real' requires a credential".into(),
            ));
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Externally visible "turn in flight" flag
#[derive(Clone, Debug, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Mark busy, or return `None` if a turn already holds the flag
    pub fn try_acquire(&self) -> Option<TurnGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| TurnGuard { flag: self.clone() })
    }
}

/// Clears the busy flag when dropped
#[derive(Debug)]
pub struct TurnGuard {
    flag: BusyFlag,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.flag.0.store(false, Ordering::SeqCst);
    }
}

/// A complete agent session
#[derive(Debug)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Conversation history
    pub conversation: Conversation,

    /// Provider configuration
    pub config: SessionConfig,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,

    busy: BusyFlag,
}

impl Session {
    /// Create a new session
    pub fn new(config: SessionConfig) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            conversation: Conversation::new(),
            config,
            created_at: now,
            updated_at: now,
            busy: BusyFlag::new(),
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Handle for observing the busy state from outside the session
    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Start a turn; rejected while another turn is in flight
    pub fn begin_turn(&self) -> Result<TurnGuard> {
        self.busy.try_acquire().ok_or(AgentError::Busy)
    }

    /// Whole-session reset of the conversation
    pub fn clear(&mut self) {
        self.conversation.clear();
        self.touch();
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
