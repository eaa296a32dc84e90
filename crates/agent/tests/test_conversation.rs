//! Chat session tests against a scripted engine

use async_trait::async_trait;
use mockall::{mock, Sequence};
use monitask_agent::{
    AgentError, ChatSession, ContextBuilder, SessionSettings, Selection, ToolState, Update,
};
use monitask_provider::{
    event_stream, ChatParams, ChatResponse, EventStream, Provider, ProviderError, StreamEvent,
    Usage,
};
use serde_json::{json, Value};
use tempfile::TempDir;

mock! {
    pub Engine {}

    #[async_trait]
    impl Provider for Engine {
        async fn chat(&self, params: ChatParams) -> Result<ChatResponse, ProviderError>;
        async fn chat_stream(&self, params: ChatParams) -> Result<EventStream, ProviderError>;
        fn default_model(&self) -> String;
        fn is_configured(&self) -> bool;
    }
}

fn tool_turn(calls: &[(&str, &str, Value)]) -> Vec<Result<StreamEvent, ProviderError>> {
    let mut events = Vec::new();
    for (id, name, input) in calls {
        events.push(Ok(StreamEvent::ToolInputStart {
            id: id.to_string(),
            name: name.to_string(),
        }));
        events.push(Ok(StreamEvent::ToolInputComplete {
            id: id.to_string(),
            name: name.to_string(),
            input: input.clone(),
        }));
    }
    events.push(Ok(StreamEvent::MessageComplete {
        finish_reason: "tool_calls".into(),
        usage: Usage::default(),
    }));
    events
}

fn text_turn(text: &str) -> Vec<Result<StreamEvent, ProviderError>> {
    vec![
        Ok(StreamEvent::TextDelta { text: text.into() }),
        Ok(StreamEvent::MessageComplete {
            finish_reason: "stop".into(),
            usage: Usage::default(),
        }),
    ]
}

fn session(engine: MockEngine, dir: &TempDir) -> ChatSession<MockEngine> {
    ChatSession::with_defaults(
        engine,
        ContextBuilder::new(dir.path()),
        SessionSettings {
            model: "test-model".into(),
            ..SessionSettings::default()
        },
    )
}

#[tokio::test]
async fn test_server_tools_auto_continue_until_text() {
    let dir = TempDir::new().unwrap();
    let mut engine = MockEngine::new();
    let mut seq = Sequence::new();

    engine
        .expect_chat_stream()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|p| p.model == "test-model" && p.tools.len() == 4)
        .returning(|_| {
            Ok(event_stream(tool_turn(&[
                (
                    "call_1",
                    "update-scope",
                    json!({"topic": "Tesla", "keywords": ["stock"]}),
                ),
                ("call_2", "add-sources", json!({"bundle": "financial-news"})),
            ])))
        });
    engine
        .expect_chat_stream()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|p| p.messages.iter().filter(|m| m.role == "tool").count() == 2)
        .returning(|_| Ok(event_stream(text_turn("Tesla is set up with financial news."))));

    let mut session = session(engine, &dir);
    let mut texts = Vec::new();
    let outcome = session
        .send("I want to monitor Tesla stock", |u| {
            if let Update::Text(t) = u {
                texts.push(t.clone());
            }
        })
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 2);
    assert_eq!(outcome.pending_prompts, 0);
    assert_eq!(texts, vec!["Tesla is set up with financial news."]);

    let store = session.reconciler().store();
    assert!(store.is_ready());
    assert_eq!(store.task().sources.len(), 3);
}

#[tokio::test]
async fn test_client_prompt_pauses_then_submit_resumes() {
    let dir = TempDir::new().unwrap();
    let mut engine = MockEngine::new();
    let mut seq = Sequence::new();

    engine
        .expect_chat_stream()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(event_stream(tool_turn(&[(
                "ask_1",
                "present-options",
                json!({
                    "question": "Which aspect?",
                    "options": [{"id": "a", "label": "Price"}, {"id": "b", "label": "Earnings"}],
                    "allowMultiple": false
                }),
            )])))
        });
    engine
        .expect_chat_stream()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|p| {
            p.messages
                .iter()
                .any(|m| m.role == "tool" && m.content.as_deref() == Some("{\"selectedIds\":[\"a\"]}"))
        })
        .returning(|_| Ok(event_stream(text_turn("Price it is."))));

    let mut session = session(engine, &dir);

    let outcome = session.send("Monitor Tesla", |_| {}).await.unwrap();
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.pending_prompts, 1);
    let prompt_id = session.reconciler().pending_prompts()[0].id.clone();

    let mut states = Vec::new();
    let (output, outcome) = session
        .submit(&prompt_id, Selection::ids(["a"]), |u| {
            if let Update::Tool { state, .. } = u {
                states.push(*state);
            }
        })
        .await
        .unwrap();

    assert_eq!(output, json!({"selectedIds": ["a"]}));
    assert_eq!(outcome.rounds, 1);
    assert!(states.is_empty());
    assert_eq!(
        session.reconciler().invocation(&prompt_id).unwrap().state,
        ToolState::Resolved
    );
}

#[tokio::test]
async fn test_stream_error_fails_turn_but_keeps_applied_state() {
    let dir = TempDir::new().unwrap();
    let mut engine = MockEngine::new();

    engine.expect_chat_stream().times(1).returning(|_| {
        let mut events = tool_turn(&[("call_1", "update-scope", json!({"topic": "Tesla"}))]);
        events.pop();
        events.push(Ok(StreamEvent::ToolInputStart {
            id: "call_2".into(),
            name: "add-sources".into(),
        }));
        events.push(Err(ProviderError::StreamInterrupted("reset by peer".into())));
        Ok(event_stream(events))
    });

    let mut session = session(engine, &dir);
    let result = session.send("Monitor Tesla", |_| {}).await;

    assert!(matches!(result, Err(AgentError::Provider(_))));
    let reconciler = session.reconciler();
    assert!(reconciler.failure().is_some());
    assert_eq!(reconciler.store().task().scope.topic.as_deref(), Some("Tesla"));
    assert!(reconciler.invocation("call_2").is_none());
    assert!(reconciler.store().task().sources.is_empty());
}

#[tokio::test]
async fn test_request_error_is_recoverable() {
    let dir = TempDir::new().unwrap();
    let mut engine = MockEngine::new();
    let mut seq = Sequence::new();

    engine
        .expect_chat_stream()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(ProviderError::RateLimited));
    engine
        .expect_chat_stream()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(event_stream(text_turn("Back again."))));

    let mut session = session(engine, &dir);
    assert!(session.send("Hello", |_| {}).await.is_err());

    let outcome = session.send("Hello again", |_| {}).await.unwrap();
    assert_eq!(outcome.rounds, 1);
    assert!(session.reconciler().failure().is_none());
}

#[tokio::test]
async fn test_max_rounds_bounds_tool_loops() {
    let dir = TempDir::new().unwrap();
    let mut engine = MockEngine::new();
    let mut n = 0;

    engine
        .expect_default_model()
        .returning(|| "engine-default".to_string());
    engine.expect_chat_stream().times(2).returning(move |_| {
        n += 1;
        let id = format!("call_{}", n);
        Ok(event_stream(tool_turn(&[(
            id.as_str(),
            "update-scope",
            json!({"keywords": ["stock"]}),
        )])))
    });

    let mut session = ChatSession::with_defaults(
        engine,
        ContextBuilder::new(dir.path()),
        SessionSettings {
            max_rounds: 2,
            ..SessionSettings::default()
        },
    );

    let result = session.send("Loop forever", |_| {}).await;
    assert!(matches!(result, Err(AgentError::MaxIterations)));
}

#[tokio::test]
async fn test_empty_model_falls_back_to_provider_default() {
    let dir = TempDir::new().unwrap();
    let mut engine = MockEngine::new();

    engine
        .expect_default_model()
        .returning(|| "engine-default".to_string());
    engine
        .expect_chat_stream()
        .times(1)
        .withf(|p| p.model == "engine-default" && p.messages[0].role == "system")
        .returning(|_| Ok(event_stream(text_turn("Hi"))));

    let mut session = ChatSession::with_defaults(
        engine,
        ContextBuilder::new(dir.path()),
        SessionSettings::default(),
    );
    session.send("Hi", |_| {}).await.unwrap();
}
