//! Integration tests for the ticket binary

use std::io::Write;
use std::process::{Command, Output};

const SECRET: &str = "cli-integration-site-secret-value";

fn ticket(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ticket"))
        .args(args)
        .env_remove("TICKET_CONFIG")
        .env_remove("TICKET_SITE_SECRET")
        .env_remove("RUST_LOG")
        .env("LANG", "en_US.UTF-8")
        .output()
        .expect("failed to run ticket binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_issue_then_decode() {
    let issued = ticket(&[
        "issue",
        "--secret",
        SECRET,
        "--username",
        "jdoe",
        "--url",
        "https://lms.example.com/course/view.php?id=2",
        "--reason",
        "welcome",
    ]);
    assert!(issued.status.success(), "{:?}", issued);
    let encoded = stdout(&issued).trim().to_string();
    assert!(!encoded.is_empty());

    let decoded = ticket(&["decode", "--secret", SECRET, &encoded, "--check-expiry"]);
    assert!(decoded.status.success(), "{:?}", decoded);

    let out = stdout(&decoded);
    assert!(out.contains("\"username\": \"jdoe\""));
    assert!(out.contains("\"wantsurl\": \"https://lms.example.com/course/view.php?id=2\""));
    assert!(out.contains("valid under a 7200s time guard"));
}

#[test]
fn test_decode_garbage_fails_with_localized_message() {
    let output = Command::new(env!("CARGO_BIN_EXE_ticket"))
        .args(["decode", "--secret", SECRET, "--lang", "fr_FR", "bm90LWEtdGlja2V0"])
        .env_remove("TICKET_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run ticket binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("n'a pas pu être décodé"), "{}", stderr);
}

#[test]
fn test_short_secret_rejected() {
    let output = ticket(&["issue", "--secret", "short", "-u", "jdoe", "--url", "https://x/"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid ticket configuration"));
}

#[test]
fn test_timeguard_from_config_file() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "site_secret: {}", SECRET).unwrap();
    writeln!(config, "time_guard_seconds: 1800").unwrap();

    let output = ticket(&["timeguard", "--config", config.path().to_str().unwrap()]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(stdout(&output).trim(), "1800");
}

#[test]
fn test_timeguard_needs_no_secret() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "time_guard_seconds: 900").unwrap();

    let output = ticket(&["timeguard", "--config", config.path().to_str().unwrap()]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(stdout(&output).trim(), "900");

    let defaults = ticket(&["timeguard"]);
    assert!(defaults.status.success(), "{:?}", defaults);
    assert_eq!(stdout(&defaults).trim(), "7200");
}

#[test]
fn test_timeguard_out_of_range_rejected() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "time_guard_seconds: 40000000").unwrap();

    let output = ticket(&["timeguard", "--config", config.path().to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn test_notify_renders_ticket_into_html_only() {
    let mut html = tempfile::NamedTempFile::new().unwrap();
    write!(
        html,
        r#"<a href="https://lms.example.com/login/?ticket=<%%TICKET%%>">Open</a>"#
    )
    .unwrap();
    let mut text = tempfile::NamedTempFile::new().unwrap();
    write!(text, "Open the course: <%%TICKET%%>").unwrap();

    let output = ticket(&[
        "notify",
        "--secret",
        SECRET,
        "--username",
        "jdoe",
        "--email",
        "jdoe@example.com",
        "--html",
        html.path().to_str().unwrap(),
        "--text",
        text.path().to_str().unwrap(),
        "--url",
        "https://lms.example.com/",
    ]);
    assert!(output.status.success(), "{:?}", output);

    let out = stdout(&output);
    assert!(!out.contains("<%%TICKET%%>"));
    assert!(out.contains("Open the course: \n"));
    assert!(!out.contains("?ticket=\""));
}
