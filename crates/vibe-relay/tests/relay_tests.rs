use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use vibe_core::rules::RULES;
use vibe_core::storage::AssistantSettings;
use vibe_relay::{
    build_edit_prompt, relay_edit_request, Assistant, CommandAssistant, RelayError,
};

#[derive(Default)]
struct Recorder {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl Assistant for Recorder {
    async fn open_chat(&self, query: &str) -> Result<(), RelayError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(())
    }
}

#[test]
fn prompt_embeds_rules_request_and_current_text() {
    let current = "# SYSTEM ARCHITECTURE SPECIFICATION\n\n## 1. ARCHITECTURE OVERVIEW\n\n### [Api]\n- **Type:** backend\n";
    let prompt = build_edit_prompt("  Add a Redis cache in front of the API  ", current);

    assert!(prompt.contains(RULES));
    assert!(prompt.contains("### [Api]\n- **Type:** backend"));
    assert!(prompt.contains("**User Request:**\nAdd a Redis cache in front of the API\n"));
    assert!(prompt.contains("Update the `copilot-instructions.md` file"));
    // The example structure is only used when there is nothing on disk yet.
    assert!(!prompt.contains("Students meeting app"));
}

#[test]
fn prompt_falls_back_to_example_for_blank_document() {
    let prompt = build_edit_prompt("Make it a chat app", "   \n");
    assert!(prompt.contains("The file is empty or does not exist"));
    assert!(prompt.contains("### [Main DB]"));
    assert!(prompt.contains("## 3. INSTRUCTIONS"));
}

#[tokio::test]
async fn relay_wraps_request_before_handing_off() {
    let recorder = Recorder::default();
    relay_edit_request(&recorder, "ARCHITECTURE.md", "Rename Backend to Api", "### [Backend]\n")
        .await
        .unwrap();

    let queries = recorder.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].contains("The user wants to update the `ARCHITECTURE.md` file."));
    assert!(queries[0].contains("Rename Backend to Api"));
}

#[test]
fn unknown_program_is_reported() {
    let settings = AssistantSettings {
        program: Some("vibe-architect-no-such-assistant".to_string()),
        args: vec![],
    };
    assert!(matches!(
        CommandAssistant::from_settings(&settings),
        Err(RelayError::ProgramNotFound(name)) if name == "vibe-architect-no-such-assistant"
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn command_assistant_receives_query_on_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let assistant = CommandAssistant::new("sh", vec!["-c".to_string(), "cat > received.txt".to_string()])
        .in_dir(dir.path());

    assistant.open_chat("add a queue").await.unwrap();

    let out = dir.path().join("received.txt");
    let mut received = String::new();
    for _ in 0..50 {
        received = std::fs::read_to_string(&out).unwrap_or_default();
        if received == "add a queue" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(received, "add a queue");
}

#[tokio::test]
async fn missing_binary_fails_to_spawn() {
    let assistant = CommandAssistant::new("/nonexistent/vibe-assistant", vec![]);
    assert!(matches!(
        assistant.open_chat("hi").await,
        Err(RelayError::Spawn { .. })
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn agent_that_refuses_stdin_is_stopped() {
    // Closes its stdin and idles; the prompt is far larger than a pipe buffer.
    let assistant = CommandAssistant::new("sh", vec!["-c".to_string(), "exec 0<&-; sleep 30".to_string()]);
    let query = "x".repeat(4 * 1024 * 1024);

    let result = tokio::time::timeout(Duration::from_secs(10), assistant.open_chat(&query))
        .await
        .expect("relay hung on a dead pipe");
    assert!(matches!(result, Err(RelayError::Stdin { .. })));
}
