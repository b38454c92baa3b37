//! End-to-end session runs against the scripted model and real built-in tools

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tempfile::tempdir;
use tinyagent_core::{
    register_builtin_tools, Logger, ModelResponse, NoOpLogger, ScriptedModelClient, Session, SessionEvent,
    SessionIo, SessionSettings, SessionState, ToolCallRequest, ToolErrorKind, ToolExecutor, ToolRegistry,
    ToolSettings, Turn, TurnRole,
};

struct ScriptedIo {
    lines: VecDeque<String>,
    events: Vec<SessionEvent>,
}

impl ScriptedIo {
    fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            events: Vec::new(),
        }
    }
}

#[async_trait]
impl SessionIo for ScriptedIo {
    async fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    fn emit(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }
}

fn workspace_session(
    root: &std::path::Path,
    model: Arc<ScriptedModelClient>,
    parallel: bool,
) -> Session {
    let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
    let registry = Arc::new(ToolRegistry::new(logger.clone()));
    let settings = ToolSettings {
        workspace: Some(root.to_path_buf()),
        ..Default::default()
    };
    register_builtin_tools(&registry, &settings).unwrap();

    let executor = ToolExecutor::new(registry, logger.clone()).with_parallel(parallel);
    let session_settings = SessionSettings {
        parallel_tools: parallel,
        ..Default::default()
    };
    Session::new(model, executor, session_settings, logger).with_workspace(root)
}

#[tokio::test]
async fn test_edit_file_through_the_loop() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("greeting.txt"), "hello world\n").unwrap();

    let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
    let model = Arc::new(ScriptedModelClient::scripted(
        vec![
            Ok(ModelResponse::tool_calls(vec![ToolCallRequest::new(
                "view",
                "str_replace_editor",
                json!({ "command": "view", "path": "greeting.txt" }),
            )])),
            Ok(ModelResponse::TextWithToolCalls {
                text: "Replacing the greeting".to_string(),
                calls: vec![ToolCallRequest::new(
                    "edit",
                    "str_replace_editor",
                    json!({ "command": "str_replace", "path": "greeting.txt", "old_str": "world", "new_str": "agent" }),
                )],
            }),
            Ok(ModelResponse::final_answer("Updated greeting.txt")),
        ],
        logger,
    ));
    let mut session = workspace_session(dir.path(), model.clone(), false);
    let mut io = ScriptedIo::new(&["change world to agent in greeting.txt", "exit"]);

    session.run(&mut io).await;

    assert_eq!(session.state(), SessionState::Terminated);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("greeting.txt")).unwrap(),
        "hello agent\n"
    );

    let roles: Vec<TurnRole> = session.conversation().snapshot().iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![
            TurnRole::User,
            TurnRole::Model,
            TurnRole::Tool,
            TurnRole::Model,
            TurnRole::Tool,
            TurnRole::Model
        ]
    );

    // The view result reached the model before it asked for the edit
    let second = &model.requests()[1];
    let viewed = second.turns.last().and_then(Turn::tool_result_ref).unwrap();
    assert!(viewed.output.contains("hello world"));

    assert!(io
        .events
        .iter()
        .any(|e| matches!(e, SessionEvent::ModelText { text } if text == "Replacing the greeting")));
}

#[tokio::test]
async fn test_every_call_gets_one_result_in_order() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src").join("lib.rs"), "").unwrap();

    let calls = vec![
        ToolCallRequest::new("c1", "list_files", json!({ "path": "src" })),
        ToolCallRequest::new("c2", "no_such_tool", json!({})),
        ToolCallRequest::new("c3", "list_files", json!({ "recursive": "yes" })),
        ToolCallRequest::new("c4", "list_files", json!(null)),
    ];
    let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
    let model = Arc::new(ScriptedModelClient::scripted(
        vec![
            Ok(ModelResponse::tool_calls(calls)),
            Ok(ModelResponse::final_answer("done")),
        ],
        logger,
    ));

    let mut session = workspace_session(dir.path(), model.clone(), true);
    let mut io = ScriptedIo::new(&["inspect the project"]);
    session.run(&mut io).await;

    let results: Vec<_> = session
        .conversation()
        .snapshot()
        .iter()
        .filter_map(Turn::tool_result_ref)
        .collect();
    let ids: Vec<&str> = results.iter().map(|r| r.call_id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3", "c4"]);

    assert!(results[0].success);
    assert!(results[0].output.contains("lib.rs"));
    assert_eq!(results[1].error_kind, Some(ToolErrorKind::UnknownTool));
    assert_eq!(results[2].error_kind, Some(ToolErrorKind::Validation));
    assert!(results[3].success);
    assert!(results[3].output.contains("src/"));
}

#[tokio::test]
async fn test_echo_model_without_tools() {
    let dir = tempdir().unwrap();
    let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
    let model = Arc::new(ScriptedModelClient::echo(logger));
    let mut session = workspace_session(dir.path(), model, false);
    let mut io = ScriptedIo::new(&["ping", "usage", "QUIT"]);

    session.run(&mut io).await;

    let answers: Vec<&str> = io
        .events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Answer { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(answers, vec!["Echo: ping"]);
    assert!(matches!(io.events.last(), Some(SessionEvent::StateChanged { to: SessionState::Terminated, .. })));
    assert_eq!(session.usage().estimate.turns, 2);
}
