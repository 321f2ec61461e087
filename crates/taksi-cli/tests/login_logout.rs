//! Integration tests for login/logout/status commands.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "tkn-1234567890abcdef";

fn login_ok_body() -> serde_json::Value {
    serde_json::json!({
        "token": TOKEN,
        "user": {
            "id": 7,
            "phone": "+905551234567",
            "firstName": "Ayşe",
            "lastName": "Yılmaz",
            "email": "ayse@example.com",
        },
    })
}

/// Test: login sends normalized phone, stores both keys, prints the user.
#[tokio::test]
async fn test_login_stores_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .and(body_json(serde_json::json!({
            "phone": "+905551234567",
            "password": "secret123",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .env("TAKSI_API_BASE_URL", server.uri())
        .args(["login", "--phone", "05551234567"])
        .write_stdin("secret123\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Ayşe Yılmaz"));

    let token = fs::read_to_string(temp.path().join("auth_token")).unwrap();
    assert_eq!(token, TOKEN);

    let profile = fs::read_to_string(temp.path().join("user_data")).unwrap();
    assert!(profile.contains("Ayşe"));
}

/// Test: session files have restricted permissions on Unix.
#[cfg(unix)]
#[tokio::test]
async fn test_session_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_ok_body()))
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .env("TAKSI_API_BASE_URL", server.uri())
        .args(["login", "--phone", "05551234567"])
        .write_stdin("secret123\n")
        .assert()
        .success();

    let mode = fs::metadata(temp.path().join("auth_token"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600, "auth_token should have 0600 permissions");
}

/// Test: server rejection surfaces the server message and stores nothing.
#[tokio::test]
async fn test_login_rejected_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .env("TAKSI_API_BASE_URL", server.uri())
        .args(["login", "--phone", "05551234567"])
        .write_stdin("wrong-password\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials"));

    assert!(!temp.path().join("auth_token").exists());
    assert!(!temp.path().join("user_data").exists());
}

/// Test: invalid phone fails before any request reaches the server.
#[tokio::test]
async fn test_login_rejects_short_phone_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_ok_body()))
        .expect(0)
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .env("TAKSI_API_BASE_URL", server.uri())
        .args(["login", "--phone", "123"])
        .write_stdin("secret123\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("valid phone number"));
}

/// Test: empty password is rejected at the prompt.
#[tokio::test]
async fn test_login_rejects_empty_password() {
    let server = MockServer::start().await;

    let temp = tempdir().unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .env("TAKSI_API_BASE_URL", server.uri())
        .args(["login", "--phone", "05551234567"])
        .write_stdin("\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Password must not be empty"));
}

/// Test: logout when not logged in shows message and succeeds.
#[test]
fn test_logout_when_not_logged_in() {
    let temp = tempdir().unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .args(["logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

/// Test: logout clears both stored keys.
#[test]
fn test_logout_clears_session() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("auth_token"), TOKEN).unwrap();
    fs::write(
        temp.path().join("user_data"),
        serde_json::to_string(&login_ok_body()["user"]).unwrap(),
    )
    .unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .args(["logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    assert!(!temp.path().join("auth_token").exists());
    assert!(!temp.path().join("user_data").exists());
}

/// Test: status reflects the stored session.
#[test]
fn test_status_before_and_after_seeding() {
    let temp = tempdir().unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));

    fs::write(temp.path().join("auth_token"), TOKEN).unwrap();
    fs::write(
        temp.path().join("user_data"),
        serde_json::to_string(&login_ok_body()["user"]).unwrap(),
    )
    .unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Ayşe Yılmaz"));
}

/// Test: a token without its profile pair reads as logged out.
#[test]
fn test_status_treats_partial_pair_as_logged_out() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("auth_token"), TOKEN).unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

/// Test: the driver namespace is separate from the rider one.
#[tokio::test]
async fn test_driver_session_is_namespaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_ok_body()))
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .env("TAKSI_API_BASE_URL", server.uri())
        .args(["login", "--driver", "--phone", "05551234567"])
        .write_stdin("secret123\n")
        .assert()
        .success();

    assert!(temp.path().join("driver_auth_token").exists());
    assert!(!temp.path().join("auth_token").exists());

    // Rider surface is still logged out.
    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .args(["status", "--driver"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as"));
}

/// Test: a second login on an existing session is a no-op.
#[test]
fn test_login_when_already_logged_in() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("auth_token"), TOKEN).unwrap();
    fs::write(
        temp.path().join("user_data"),
        serde_json::to_string(&login_ok_body()["user"]).unwrap(),
    )
    .unwrap();

    cargo_bin_cmd!("taksi")
        .env("TAKSI_HOME", temp.path())
        .env("TAKSI_API_BASE_URL", "http://127.0.0.1:9")
        .args(["login", "--phone", "05551234567"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Already logged in as Ayşe Yılmaz"));
}
