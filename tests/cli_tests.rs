//! CLI integration tests

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCUMENTS_PATH: &str = "/v1/projects/demo/databases/(default)/documents/audio";

/// Binary with config and credentials isolated from the host
fn nivelver_bin(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nivelver-admin").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("NIVELVER_PROJECT_ID")
        .env_remove("NIVELVER_API_KEY")
        .env_remove("NIVELVER_AUTH_TOKEN")
        .env_remove("NIVELVER_BUCKET")
        .env_remove("FIRESTORE_EMULATOR_HOST")
        .env_remove("FIREBASE_STORAGE_EMULATOR_HOST");
    cmd
}

fn write_config(config_home: &Path, content: &str) {
    let dir = config_home.join("nivelver-admin");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), content).unwrap();
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    nivelver_bin(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("audio"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn audio_new_help_lists_sources() {
    let home = TempDir::new().unwrap();
    nivelver_bin(home.path())
        .args(["audio", "new", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--record"))
        .stdout(predicate::str::contains("--file"))
        .stdout(predicate::str::contains("--url"))
        .stdout(predicate::str::contains("--preview"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    nivelver_bin(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nivelver-admin"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_command() {
    let home = TempDir::new().unwrap();
    nivelver_bin(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nivelver-admin"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    nivelver_bin(home.path())
        .args(["config", "set", "default_level", "b1"])
        .assert()
        .success();

    nivelver_bin(home.path())
        .args(["config", "get", "default_level"])
        .assert()
        .success()
        .stdout(predicate::str::diff("B1\n"));
}

#[test]
fn config_list_masks_secrets() {
    let home = TempDir::new().unwrap();
    write_config(
        home.path(),
        "[firebase]\nproject_id = \"demo\"\napi_key = \"AIzaSyExampleKey1234\"\n",
    );

    nivelver_bin(home.path())
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("AIza...1234"))
        .stdout(predicate::str::contains("AIzaSyExampleKey1234").not());
}

#[test]
fn sources_conflict() {
    let home = TempDir::new().unwrap();
    nivelver_bin(home.path())
        .args(["audio", "new", "--record", "--url", "https://cdn.example/a.mp3"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn missing_project_fails_fast() {
    let home = TempDir::new().unwrap();
    nivelver_bin(home.path())
        .args(["audio", "new", "--url", "https://cdn.example/a.mp3"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("project id"));
}

#[tokio::test(flavor = "multi_thread")]
async fn incomplete_item_lists_every_problem() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    nivelver_bin(home.path())
        .env("NIVELVER_PROJECT_ID", "demo")
        .env("FIRESTORE_EMULATOR_HOST", server.address().to_string())
        .args(["audio", "new", "-o", "Pan", "-o", ""])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Audio"))
        .stderr(predicate::str::contains("Question"))
        .stderr(predicate::str::contains("Option 2 text"))
        .stderr(predicate::str::contains("Exactly one option"));
}

#[tokio::test(flavor = "multi_thread")]
async fn file_upload_to_local_storage_is_saved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DOCUMENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "projects/demo/databases/(default)/documents/audio/new123",
            "fields": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let storage = TempDir::new().unwrap();
    let clip = home.path().join("clip.mp3");
    fs::write(&clip, b"ID3 fake mp3 payload").unwrap();

    nivelver_bin(home.path())
        .env("NIVELVER_PROJECT_ID", "demo")
        .env("FIRESTORE_EMULATOR_HOST", server.address().to_string())
        .args(["audio", "new", "--storage", "local", "--yes"])
        .args(["-l", "B1", "-p", "¿Qué compra Luis?"])
        .args(["-o", "Pan", "-o", "Leche", "-c", "1"])
        .arg("--file")
        .arg(&clip)
        .env("XDG_DATA_HOME", storage.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("new123"));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let audio_url = body["fields"]["audioUrl"]["stringValue"].as_str().unwrap();
    assert!(audio_url.starts_with("file://"));
    assert!(audio_url.contains("/audio/B1/"));
    assert!(audio_url.ends_with(".mp3"));
    assert_eq!(body["fields"]["nivel"]["stringValue"], "B1");
}

#[tokio::test(flavor = "multi_thread")]
async fn file_upload_rejects_non_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let notes = home.path().join("notes.txt");
    fs::write(&notes, b"not audio").unwrap();

    nivelver_bin(home.path())
        .env("NIVELVER_PROJECT_ID", "demo")
        .env("FIRESTORE_EMULATOR_HOST", server.address().to_string())
        .env("XDG_DATA_HOME", home.path())
        .args(["audio", "new", "--storage", "local", "--yes", "--file"])
        .arg(&notes)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("text/plain"));
}

#[tokio::test(flavor = "multi_thread")]
async fn edit_of_missing_item_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/ghost", DOCUMENTS_PATH)))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    nivelver_bin(home.path())
        .env("NIVELVER_PROJECT_ID", "demo")
        .env("FIRESTORE_EMULATOR_HOST", server.address().to_string())
        .args(["audio", "edit", "ghost", "-p", "¿Nuevo?"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}
