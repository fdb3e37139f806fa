//! CLI tests for the debugger binary.
//!
//! Spawns the binary over a tempdir of trace logs and verifies exit codes
//! and transcripts for queries and full scripted debugging sessions.

use std::io::Write;
use std::process::{Command, Stdio};

use debugger::exit_codes;
use debugger::test_support::{LogDir, sample_log};

fn run_with_verdicts(logs: &LogDir, args: &[&str], verdicts: &str) -> (i32, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_debugger"))
        .arg("--folder")
        .arg(logs.path())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn debugger");
    child
        .stdin
        .as_mut()
        .expect("stdin")
        .write_all(verdicts.as_bytes())
        .expect("write verdicts");
    let output = child.wait_with_output().expect("wait for debugger");
    (
        output.status.code().expect("exit code"),
        String::from_utf8(output.stdout).expect("utf8 stdout"),
    )
}

#[test]
fn agents_lists_log_stems() {
    let logs = LogDir::new();
    logs.add_agent("bob", &sample_log());
    logs.add_agent("alice", &sample_log());

    let (code, stdout) = run_with_verdicts(&logs, &["agents"], "");
    assert_eq!(code, exit_codes::OK);
    assert_eq!(stdout, "alice\nbob\n");
}

#[test]
fn state_reports_reconstructed_beliefs() {
    let logs = LogDir::new();
    logs.add_agent("bob", &sample_log());

    let (code, stdout) = run_with_verdicts(&logs, &["state", "bob", "6"], "");
    assert_eq!(code, exit_codes::OK);
    assert!(stdout.contains("prepared"));
    assert!(stdout.contains("ready"));
}

#[test]
fn debug_session_localizes_the_buggy_instruction() {
    let logs = LogDir::new();
    logs.add_agent("bob", &sample_log());

    // Root invalid, first child valid, second child invalid (a leaf), then
    // instruction verdicts: .print(go) expected, launch_rocket not.
    let (code, stdout) = run_with_verdicts(
        &logs,
        &["debug", "bob", "--root", "100"],
        "i\nv\ni\ny\nn\n",
    );
    assert_eq!(code, exit_codes::OK);
    assert!(stdout.contains("faulty goal-expansion: +!launch"));
    assert!(stdout.contains("buggy instruction: launch_rocket at bob.asl:22"));
}

#[test]
fn debug_session_with_valid_root_finds_no_bug() {
    let logs = LogDir::new();
    logs.add_agent("bob", &sample_log());

    let (code, stdout) = run_with_verdicts(&logs, &["debug", "bob", "--plan", "p0"], "v\n");
    assert_eq!(code, exit_codes::NO_BUG);
    assert!(stdout.contains("no bug found in this tree"));
}

#[test]
fn corrupt_trace_fails_with_invalid() {
    let logs = LogDir::new();
    logs.add_agent(
        "bad",
        "{\"agent\":\"bad\",\"plans\":{}}\n{\"nr\":2}\n{\"nr\":1}\n",
    );

    let (code, _) = run_with_verdicts(&logs, &["state", "bad", "1"], "");
    assert_eq!(code, exit_codes::INVALID);
}
