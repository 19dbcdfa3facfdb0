//! End-to-end turns through the runtime wiring.

use agent_core::{AgentError, ProviderKind, ReplySource, Role, Session, SessionConfig, TurnState};
use agent_runtime::simulated::FIBONACCI_SNIPPET;
use agent_runtime::AgentBuilder;
use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn tool_messages(session: &Session) -> Vec<&agent_core::Message> {
    session
        .conversation
        .messages()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .collect()
}

#[tokio::test]
async fn search_turn_in_simulation_mode() {
    let config = SessionConfig::simulated();
    let agent = AgentBuilder::new(&config).seed(7).build();
    let mut session = Session::new(config);

    let report = agent.run_turn(&mut session, "search for rust ownership").await.unwrap();

    assert_eq!(report.state, TurnState::Done);
    assert_eq!(report.source, ReplySource::Simulated);
    assert_eq!(report.tool_results, 1);

    let messages = session.conversation.messages();
    let announced = &messages[1].tool_calls;
    assert_eq!(announced.len(), 1);
    assert_eq!(announced[0].name, "google_search");
    assert_eq!(announced[0].str_arg("query").unwrap(), "rust ownership");

    let tools = tool_messages(&session);
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].tool_call_id.as_deref(), Some(announced[0].id.as_str()));
    assert_eq!(tools[0].content.lines().filter(|l| l.starts_with("- **")).count(), 3);

    let closing = &messages.last().unwrap().content;
    assert!(closing.starts_with("Those are the most relevant results"));
}

#[tokio::test]
async fn fibonacci_turn_runs_in_sandbox() {
    let config = SessionConfig::simulated();
    let agent = AgentBuilder::new(&config).seed(7).build();
    let mut session = Session::new(config);

    agent.run_turn(&mut session, "calculate fibonacci").await.unwrap();

    let messages = session.conversation.messages();
    assert_eq!(messages[1].tool_calls[0].name, "execute_js");
    assert_eq!(messages[1].tool_calls[0].str_arg("code").unwrap(), FIBONACCI_SNIPPET);

    let tools = tool_messages(&session);
    let result = tools[0]
        .content
        .lines()
        .find_map(|l| l.strip_prefix("Result: "))
        .unwrap();
    let sequence: Vec<f64> = serde_json::from_str(result).unwrap();
    assert_eq!(sequence, vec![0.0, 1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0]);

    assert!(messages.last().unwrap().content.starts_with("The code ran successfully"));
}

#[tokio::test]
async fn plain_message_adds_one_assistant_reply() {
    let config = SessionConfig::simulated();
    let agent = AgentBuilder::new(&config).seed(3).build();
    let mut session = Session::new(config);

    agent.run_turn(&mut session, "hello").await.unwrap();

    let roles: Vec<Role> = session.conversation.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
}

#[tokio::test]
async fn workflow_turn_closes_with_workflow_text() {
    let config = SessionConfig::simulated();
    let agent = AgentBuilder::new(&config).build();
    let mut session = Session::new(config);

    agent.run_turn(&mut session, "start a text processing workflow").await.unwrap();

    let tools = tool_messages(&session);
    assert!(tools[0].content.contains("Workflow: start a text processing workflow"));
    let closing = &session.conversation.messages().last().unwrap().content;
    assert!(closing.starts_with("Your AI Pipe workflow has finished"));
}

#[tokio::test]
async fn failing_real_provider_falls_back_to_simulation() {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
    );
    let base = serve(app).await;
    let config = SessionConfig {
        provider_kind: ProviderKind::Proxy,
        base_url: base.clone(),
        search_url: format!("{base}/search"),
        ..SessionConfig::simulated()
    };
    let agent = AgentBuilder::new(&config).build();
    let mut session = Session::new(config);

    let report = agent.run_turn(&mut session, "search for tokio").await.unwrap();

    assert!(matches!(report.source, ReplySource::Fallback { .. }));
    assert_eq!(report.notices.len(), 1);
    assert_eq!(report.tool_results, 1);
    assert!(!session.is_busy());
}

#[tokio::test]
async fn null_content_reply_falls_back_to_simulation() {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async {
            Json(json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_real",
                            "type": "function",
                            "function": { "name": "execute_js", "arguments": "{\"code\":\"1+1\"}" }
                        }]
                    }
                }]
            }))
        }),
    );
    let base = serve(app).await;
    let config = SessionConfig {
        provider_kind: ProviderKind::Real,
        credential: Some("sk-test".into()),
        base_url: base.clone(),
        search_url: format!("{base}/search"),
        ..SessionConfig::simulated()
    };
    let agent = AgentBuilder::new(&config).build();
    let mut session = Session::new(config);

    let report = agent.run_turn(&mut session, "search for tokio").await.unwrap();

    match &report.source {
        ReplySource::Fallback { reason } => assert!(reason.contains("Format error")),
        other => panic!("unexpected source: {other:?}"),
    }
    assert_eq!(report.notices.len(), 1);

    let announced = &session.conversation.messages()[1].tool_calls;
    assert_eq!(announced.len(), 1);
    assert_eq!(announced[0].name, "google_search");
    assert_ne!(announced[0].id, "call_real");
    assert!(!session.is_busy());
}

#[tokio::test]
async fn real_provider_tool_calls_are_dispatched() {
    let app = Router::new().route(
        "/chat/completions",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["model"], "gpt-4o-mini");
            Json(json!({
                "choices": [{
                    "message": {
                        "content": "Running two snippets",
                        "tool_calls": [
                            {
                                "id": "call_a",
                                "type": "function",
                                "function": { "name": "execute_js", "arguments": "{\"code\":\"1+1\"}" }
                            },
                            {
                                "id": "call_b",
                                "type": "function",
                                "function": { "name": "summon_dragon", "arguments": "{}" }
                            }
                        ]
                    }
                }]
            }))
        }),
    );
    let base = serve(app).await;
    let config = SessionConfig {
        provider_kind: ProviderKind::Real,
        credential: Some("sk-test".into()),
        base_url: base.clone(),
        search_url: format!("{base}/search"),
        ..SessionConfig::simulated()
    };
    let agent = AgentBuilder::new(&config).build();
    let mut session = Session::new(config);

    let report = agent.run_turn(&mut session, "do things").await.unwrap();
    assert_eq!(report.source, ReplySource::Real);

    let tools = tool_messages(&session);
    let ids: Vec<&str> = tools.iter().filter_map(|m| m.tool_call_id.as_deref()).collect();
    assert_eq!(ids, vec!["call_a", "call_b"]);
    assert!(tools[0].content.contains("Code Executed Successfully"));
    assert!(tools[1].content.contains("summon_dragon"));
    let closing = &session.conversation.messages().last().unwrap().content;
    assert!(closing.starts_with("The code ran successfully"));
}

#[tokio::test]
async fn real_kind_without_key_is_rejected() {
    let config = SessionConfig {
        provider_kind: ProviderKind::Real,
        ..SessionConfig::simulated()
    };
    let agent = AgentBuilder::new(&config).build();
    let mut session = Session::new(config);

    let err = agent.run_turn(&mut session, "hello").await.unwrap_err();
    assert!(matches!(err, AgentError::Auth(_)));
    assert!(session.conversation.is_empty());
}
