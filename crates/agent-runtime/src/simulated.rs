//! Simulated Provider
//!
//! Rule-based stand-in for a model, used when no credential is configured or
//! the real provider fails. Classifies the latest user message and answers
//! with text and at most one tool call. Only the final acknowledgement branch
//! uses randomness, and the random source is seedable.

use std::sync::Mutex;

use agent_core::{
    error::Result,
    message::Message,
    provider::{LlmProvider, ProviderReply},
    tool::{ToolCall, ToolDescriptor, ToolKind},
};
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use uuid::Uuid;

/// Substrings that disqualify a message from the implicit-search rule
const EXPLICIT_MARKERS: &[&str] = &[
    "search",
    "run",
    "calculate",
    "pipeline",
    "workflow",
    "what can you do",
];
const PIPELINE_MARKERS: &[&str] = &["pipeline", "workflow", "text processing", "ai pipe"];
const SEARCH_MARKERS: &[&str] = &["search", "find", "look up", "information about"];
const CODE_MARKERS: &[&str] = &["fibonacci", "calculate", "math", "run"];
const HELP_MARKERS: &[&str] = &["what can you do", "capabilities", "help"];

const STOP_WORDS: &[&str] = &[
    "search", "find", "look", "up", "for", "about", "the", "a", "an", "information", "me", "please",
];

const DEFAULT_QUERY: &str = "general information";

const CAPABILITIES: &str = "I'm running in simulation mode and can help with:\n\n\
    - **Web search**: ask me to search for or find information about a topic\n\
    - **AI Pipe workflows**: describe a text-processing pipeline or workflow\n\
    - **JavaScript execution**: ask me to calculate something, run a demo, or generate a fibonacci sequence\n\n\
    Add an API key to talk to a real model.";

const ACKNOWLEDGEMENTS: &[&str] = &[
    "I understand. Could you tell me a bit more about what you'd like to do?",
    "Got it. I can search the web, run workflows, or execute code if that would help.",
    "Interesting! Let me know if you'd like me to look something up or run a calculation.",
    "Thanks for the message. Try asking me to search for a topic or calculate something.",
];

pub const FIBONACCI_SNIPPET: &str = r"function fibonacci(n) {
  const sequence = [0, 1];
  for (let i = 2; i < n; i++) {
    sequence.push(sequence[i - 1] + sequence[i - 2]);
  }
  return sequence.slice(0, n);
}
fibonacci(10);";

pub const ARITHMETIC_SNIPPET: &str = r"const numbers = [12, 7, 25, 3, 18, 31];
const isPrime = (n) => {
  if (n < 2) return false;
  for (let i = 2; i * i <= n; i++) {
    if (n % i === 0) return false;
  }
  return true;
};
const sum = numbers.reduce((a, b) => a + b, 0);
({ sum, average: sum / numbers.length, max: Math.max(...numbers), primes: numbers.filter(isPrime) });";

pub const DATETIME_SNIPPET: &str = r#"const now = new Date();
const days = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];
({ iso: now.toISOString(), year: now.getFullYear(), weekday: days[now.getDay()] });"#;

pub const GENERIC_SNIPPET: &str = r#"const words = ["agent", "tools", "sandbox", "rust"];
({ count: words.length, upper: words.map((w) => w.toUpperCase()), joined: words.join(" + ") });"#;

/// Rule-based provider
pub struct SimulatedProvider {
    rng: Mutex<StdRng>,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedProvider {
    /// Acknowledgement choice seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic acknowledgement choice
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Classify one user message
    pub fn respond(&self, text: &str) -> ProviderReply {
        let lower = text.to_lowercase();
        let contains_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

        if text.split_whitespace().count() >= 2 && !contains_any(EXPLICIT_MARKERS) {
            return ProviderReply::text(format!("I'll search for information about \"{text}\"."))
                .with_tool_call(sim_call(ToolKind::GoogleSearch).with_arg("query", text));
        }

        if contains_any(PIPELINE_MARKERS) {
            return ProviderReply::text("I'll run that through an AI Pipe workflow.")
                .with_tool_call(sim_call(ToolKind::AiPipe).with_arg("workflow", lower.as_str()));
        }

        if contains_any(SEARCH_MARKERS) {
            let query = extract_search_query(text);
            return ProviderReply::text(format!("Let me search for \"{query}\"."))
                .with_tool_call(sim_call(ToolKind::GoogleSearch).with_arg("query", query));
        }

        if contains_any(CODE_MARKERS) {
            let (snippet, description) = choose_snippet(&lower);
            return ProviderReply::text(description)
                .with_tool_call(sim_call(ToolKind::ExecuteJs).with_arg("code", snippet));
        }

        if contains_any(HELP_MARKERS) {
            return ProviderReply::text(CAPABILITIES);
        }

        ProviderReply::text(self.acknowledgement())
    }

    fn acknowledgement(&self) -> &'static str {
        let index = match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..ACKNOWLEDGEMENTS.len()),
            Err(_) => 0,
        };
        ACKNOWLEDGEMENTS[index]
    }
}

fn sim_call(kind: ToolKind) -> ToolCall {
    ToolCall::new(format!("sim_{}", Uuid::new_v4().simple()), kind.name())
}

/// Pick a demo snippet by message content
fn choose_snippet(lower: &str) -> (&'static str, &'static str) {
    if lower.contains("fibonacci") {
        (FIBONACCI_SNIPPET, "I'll generate the first 10 Fibonacci numbers with JavaScript.")
    } else if ["math", "calculate", "prime"].iter().any(|m| lower.contains(m)) {
        (ARITHMETIC_SNIPPET, "I'll run some arithmetic and find the primes in a sample list.")
    } else if ["date", "time"].iter().any(|m| lower.contains(m)) {
        (DATETIME_SNIPPET, "I'll run a snippet that reports the current date and time.")
    } else {
        (GENERIC_SNIPPET, "I'll run a short JavaScript demo.")
    }
}

/// Strip search phrasing and stop words from a request
pub fn extract_search_query(text: &str) -> String {
    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .filter(|w| !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();

    if words.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        words.join(" ")
    }
}

#[async_trait]
impl LlmProvider for SimulatedProvider {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn query(
        &self,
        messages: &[Message],
        _tools: &[ToolDescriptor],
    ) -> Result<ProviderReply> {
        let latest = messages
            .iter()
            .rev()
            .find(|m| m.role == agent_core::Role::User);

        Ok(match latest {
            Some(message) => self.respond(&message.content),
            None => ProviderReply::text(ACKNOWLEDGEMENTS[0]),
        })
    }
}
