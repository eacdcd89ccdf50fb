// ABOUTME: Scenario tests for DirectCli backend session management
// ABOUTME: Tests is_new_session logic, event parsing, and process handling

use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Scenario 1: New session should NOT use --resume flag
/// Given: is_new_session = true
/// When: CLI arguments are constructed
/// Then: --resume should NOT be present in args
#[tokio::test]
async fn scenario_new_session_no_resume_flag() {
    // Simulate the argument construction logic from direct_cli.rs
    let is_new_session = true;
    let session_id = "test-session-123";

    let mut args = vec![
        "--print".to_string(),
        "--output-format".to_string(),
        "stream-json".to_string(),
        "--verbose".to_string(),
        "--dangerously-skip-permissions".to_string(),
    ];

    // This is the logic we're testing
    if !is_new_session {
        args.push("--resume".to_string());
        args.push(session_id.to_string());
    }

    args.push("hello".to_string());

    // Verify --resume is NOT in args for new sessions
    assert!(!args.contains(&"--resume".to_string()),
        "New sessions should NOT have --resume flag");
    assert!(!args.contains(&session_id.to_string()),
        "New sessions should NOT have session_id in args");
}

/// Scenario 2: Existing session SHOULD use --resume flag
/// Given: is_new_session = false
/// When: CLI arguments are constructed
/// Then: --resume <session_id> should be present
#[tokio::test]
async fn scenario_existing_session_uses_resume_flag() {
    let is_new_session = false;
    let session_id = "test-session-456";

    let mut args = vec![
        "--print".to_string(),
        "--output-format".to_string(),
        "stream-json".to_string(),
        "--verbose".to_string(),
        "--dangerously-skip-permissions".to_string(),
    ];

    if !is_new_session {
        args.push("--resume".to_string());
        args.push(session_id.to_string());
    }

    args.push("hello".to_string());

    // Verify --resume IS in args for existing sessions
    let resume_idx = args.iter().position(|a| a == "--resume");
    assert!(resume_idx.is_some(), "Existing sessions MUST have --resume flag");

    // Verify session_id follows --resume
    let resume_idx = resume_idx.unwrap();
    assert_eq!(args[resume_idx + 1], session_id,
        "Session ID must follow --resume flag");
}

/// Scenario 3: Parse SessionInit from real CLI JSON output
/// Given: A system init event JSON from Claude CLI
/// When: Parsed by parse_cli_event
/// Then: Should extract session_id correctly
#[tokio::test]
async fn scenario_parse_session_init_event() {
    use serde_json::{json, Value};

    // Real format from Claude CLI
    let init_json = json!({
        "type": "system",
        "subtype": "init",
        "session_id": "abc123-real-session-id",
        "tools": [],
        "model": "claude-sonnet-4-20250514"
    });

    // Extract session_id using the same logic as parse_cli_event
    let event_type = init_json.get("type").and_then(|t| t.as_str());
    assert_eq!(event_type, Some("system"));

    let subtype = init_json.get("subtype").and_then(|s| s.as_str());
    assert_eq!(subtype, Some("init"));

    let session_id = init_json.get("session_id").and_then(|s| s.as_str());
    assert_eq!(session_id, Some("abc123-real-session-id"),
        "Should extract session_id from init event");
}

/// Scenario 4: Detect orphaned session from stderr
/// Given: stderr contains "No conversation found with session ID"
/// When: stderr is parsed
/// Then: Should detect orphan condition
#[tokio::test]
async fn scenario_detect_orphaned_session() {
    let stderr_lines = vec![
        "Some debug output",
        "Error: No conversation found with session ID abc123",
        "More output",
    ];

    let mut orphan_detected = false;

    for line in stderr_lines {
        if line.contains("No conversation found with session ID") {
            orphan_detected = true;
        }
    }

    assert!(orphan_detected, "Should detect orphaned session from stderr");
}

/// Scenario 5: Parse assistant text event from CLI JSON
/// Given: An assistant message with text content
/// When: Parsed
/// Then: Should extract text correctly
#[tokio::test]
async fn scenario_parse_assistant_text_event() {
    use serde_json::json;

    let assistant_json = json!({
        "type": "assistant",
        "message": {
            "content": [
                {
                    "type": "text",
                    "text": "Hello! How can I help you today?"
                }
            ]
        }
    });

    let content = assistant_json
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_array());

    assert!(content.is_some(), "Should have content array");

    let content = content.unwrap();
    let text_item = &content[0];
    let item_type = text_item.get("type").and_then(|t| t.as_str());
    assert_eq!(item_type, Some("text"));

    let text = text_item.get("text").and_then(|t| t.as_str());
    assert_eq!(text, Some("Hello! How can I help you today?"));
}

/// Scenario 6: Parse tool_use event from CLI JSON
/// Given: An assistant message with tool_use content
/// When: Parsed
/// Then: Should extract tool name, id, and input
#[tokio::test]
async fn scenario_parse_tool_use_event() {
    use serde_json::json;

    let tool_json = json!({
        "type": "assistant",
        "message": {
            "content": [
                {
                    "type": "tool_use",
                    "id": "toolu_abc123",
                    "name": "Read",
                    "input": {
                        "file_path": "/tmp/test.txt"
                    }
                }
            ]
        }
    });

    let content = tool_json
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_array())
        .unwrap();

    let tool_item = &content[0];
    assert_eq!(tool_item.get("type").and_then(|t| t.as_str()), Some("tool_use"));
    assert_eq!(tool_item.get("id").and_then(|i| i.as_str()), Some("toolu_abc123"));
    assert_eq!(tool_item.get("name").and_then(|n| n.as_str()), Some("Read"));

    let input = tool_item.get("input");
    assert!(input.is_some(), "Should have input object");
}

/// Scenario 7: Parse result event (success)
/// Given: A result event with is_error = false
/// When: Parsed
/// Then: Should indicate success
#[tokio::test]
async fn scenario_parse_result_success() {
    use serde_json::json;

    let result_json = json!({
        "type": "result",
        "is_error": false,
        "result": "Task completed successfully"
    });

    let is_error = result_json
        .get("is_error")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    assert!(!is_error, "Result should not be an error");
}

/// Scenario 8: Parse result event (error)
/// Given: A result event with is_error = true
/// When: Parsed
/// Then: Should indicate error with message
#[tokio::test]
async fn scenario_parse_result_error() {
    use serde_json::json;

    let result_json = json!({
        "type": "result",
        "is_error": true,
        "error": "Something went wrong"
    });

    let is_error = result_json
        .get("is_error")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    assert!(is_error, "Result should be an error");

    let error_msg = result_json.get("error").and_then(|e| e.as_str());
    assert_eq!(error_msg, Some("Something went wrong"));
}

/// Scenario 9: Timeout should allow process kill
/// Given: A child process handle
/// When: Timeout occurs
/// Then: Process should be killable
#[tokio::test]
async fn scenario_timeout_process_kill() {
    // Spawn a simple sleep process to simulate long-running CLI
    let mut child = Command::new("sleep")
        .arg("10")
        .spawn()
        .expect("Failed to spawn sleep");

    // Simulate timeout by killing immediately
    let kill_result = child.kill().await;
    assert!(kill_result.is_ok(), "Should be able to kill process on timeout");

    // Verify process is terminated
    let status = child.wait().await;
    assert!(status.is_ok(), "Should get exit status after kill");
}

/// Scenario 10: Atomic flag for orphan detection
/// Given: AtomicBool flag
/// When: Set from one task and read from another
/// Then: Should communicate correctly
#[tokio::test]
async fn scenario_atomic_orphan_flag() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    let orphan_detected = Arc::new(AtomicBool::new(false));
    let orphan_clone = orphan_detected.clone();

    // Simulate stderr task setting the flag
    let handle = tokio::spawn(async move {
        // Simulate finding orphan error
        orphan_clone.store(true, Ordering::SeqCst);
    });

    // Wait for task to complete (like stderr_handle.await)
    handle.await.unwrap();

    // Now check the flag (like main task does)
    assert!(orphan_detected.load(Ordering::SeqCst),
        "Should detect orphan flag set by other task");
}

fn main() {
    println!("Run with: cargo test --test test_direct_cli_scenarios");
}
