//! Application State

use std::sync::Arc;

use tokio::sync::Mutex;

use agent_core::{AgentLoop, BusyFlag, ProviderKind, Session, SessionConfig};
use agent_runtime::AgentBuilder;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Turn orchestrator built from the session config
    pub agent: Arc<AgentLoop>,

    /// The single chat session served by this process
    pub session: Arc<Mutex<Session>>,

    /// Observable busy flag of `session`, readable without the lock
    pub busy: BusyFlag,

    pub provider_kind: ProviderKind,
}

impl AppState {
    pub fn new(config: SessionConfig) -> Self {
        let agent = AgentBuilder::new(&config).build();
        let provider_kind = config.provider_kind;
        let session = Session::new(config);

        Self {
            agent: Arc::new(agent),
            busy: session.busy_flag(),
            session: Arc::new(Mutex::new(session)),
            provider_kind,
        }
    }
}
