#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use tempfile::TempDir;

/// Serves every request with `status` and an empty body until the test exits.
fn spawn_stub_server(status: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("stub server should bind");
    let addr = listener.local_addr().expect("stub server should have an address");
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || answer(stream, status));
        }
    });
    addr.to_string()
}

fn answer(mut stream: TcpStream, status: &str) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let response =
        format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
    let _ = stream.write_all(response.as_bytes());
}

fn benchdriver(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("benchdriver").expect("binary should compile");
    cmd.env("HOME", home.path())
        .env_remove("RUST_LOG")
        .current_dir(home.path());
    cmd
}

#[test]
fn unreachable_target_scores_zero_and_fails() {
    let home = TempDir::new().expect("temp dir should be created");
    benchdriver(&home)
        .args(["--target-host", "127.0.0.1:1", "--load-duration", "1s"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("POST /initialize request failed"))
        .stdout(predicate::str::contains("error: 1"))
        .stdout(predicate::str::contains("score: 0"))
        .stderr(predicate::str::contains("[ADMIN]"))
        .stderr(predicate::str::contains("kind=prepare"));
}

#[test]
fn zero_score_passes_when_exit_on_fail_is_disabled() {
    let home = TempDir::new().expect("temp dir should be created");
    benchdriver(&home)
        .args([
            "--target-host",
            "127.0.0.1:1",
            "--load-duration",
            "1s",
            "--exit-error-on-fail",
            "false",
        ])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("score: 0"));
}

#[test]
fn config_file_in_working_directory_is_applied() {
    let home = TempDir::new().expect("temp dir should be created");
    std::fs::write(
        home.path().join("benchdriver.toml"),
        r#"
target_host = "127.0.0.1:1"
load_duration = "1s"
exit_error_on_fail = false
"#,
    )
    .expect("config should write");

    benchdriver(&home)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("score: 0"))
        .stderr(predicate::str::contains("target_host=127.0.0.1:1"));
}

#[test]
fn healthy_target_scores_every_tag() {
    let home = TempDir::new().expect("temp dir should be created");
    let host = spawn_stub_server("200 OK");
    let result_path = home.path().join("result.json");

    benchdriver(&home)
        .args(["--target-host", host.as_str(), "--load-duration", "1s", "--parallelism", "4"])
        .arg("--result-json")
        .arg(&result_path)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("GETRoot: "))
        .stdout(predicate::str::contains("GETLogin: "))
        .stdout(predicate::str::contains("POSTLogin: "))
        .stdout(predicate::str::contains("POSTRoot: "))
        .stdout(predicate::str::is_match(r"score: [1-9][0-9]*").expect("valid regex"));

    let written = std::fs::read_to_string(&result_path).expect("result json should be written");
    let value: serde_json::Value = serde_json::from_str(&written).expect("valid json");
    assert!(value["summary"]["score"].as_u64().unwrap_or(0) > 0);
    assert_eq!(value["options"]["target_host"], host.as_str());
}

#[test]
fn failing_initialize_skips_load() {
    let home = TempDir::new().expect("temp dir should be created");
    let host = spawn_stub_server("500 Internal Server Error");

    benchdriver(&home)
        .args(["--target-host", host.as_str(), "--load-duration", "1s"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("unexpected status 500"))
        .stdout(predicate::str::contains("GETRoot").not())
        .stdout(predicate::str::contains("error: 1"))
        .stdout(predicate::str::contains("score: 0"));
}
