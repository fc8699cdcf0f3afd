//! End-to-end tests for the ccrm binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ccrm() -> Command {
    let mut cmd = Command::cargo_bin("ccrm").unwrap();
    cmd.env_remove("CCRM_API_URL")
        .env_remove("NEXT_PUBLIC_API_URL")
        .env_remove("CCRM_ROLE")
        .env("NO_COLOR", "1");
    cmd
}

fn pending_progress(journey: &str) -> serde_json::Value {
    json!({
        "journeyId": journey,
        "timeline": [
            { "phaseId": "ready_to_go", "ordinal": 1, "status": "pending" },
            { "phaseId": "points_a", "ordinal": 2, "status": "pending" },
            { "phaseId": "new_location", "ordinal": 3, "status": "pending" },
            { "phaseId": "back_to_dispatcher", "ordinal": 4, "status": "pending" }
        ]
    })
}

#[test]
fn test_roles_listed_by_level() {
    ccrm()
        .args(["-o", "json", "roles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SUPER_ADMIN"))
        .stdout(predicate::str::contains("STORAGE_MANAGER"));
}

#[test]
fn test_driver_permissions() {
    ccrm()
        .args(["permissions", "driver"])
        .assert()
        .success()
        .stdout(predicate::str::contains("media:upload"))
        .stdout(predicate::str::contains("journey:approve").not());
}

#[test]
fn test_unknown_role_fails() {
    ccrm()
        .args(["permissions", "janitor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown role: janitor"));
}

#[test]
fn test_can_manage() {
    ccrm()
        .args(["-o", "json", "can-manage", "manager", "driver"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"allowed\": true"));

    ccrm()
        .args(["-o", "json", "can-manage", "driver", "driver"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"allowed\": false"));
}

#[test]
fn test_gate_hides_audit_from_movers() {
    ccrm()
        .args(["-o", "json", "gate", "--role", "mover", "-p", "audit:read"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hide\""));
}

#[test]
fn test_steps_for_driver() {
    ccrm()
        .args(["journey", "steps", "--role", "driver"])
        .assert()
        .success()
        .stdout(predicate::str::contains("truckInspection"))
        .stdout(predicate::str::contains("crewConfirmed").not());
}

#[test]
fn test_invalid_step_rejected_before_any_request() {
    ccrm()
        .args([
            "--api-url",
            "http://127.0.0.1:9",
            "journey",
            "start",
            "J-1",
            "9",
            "--role",
            "driver",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown step '9'"));
}

#[test]
fn test_progress_needs_reachable_api() {
    ccrm()
        .args(["--api-url", "http://127.0.0.1:9", "journey", "progress", "J-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Network failure"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_progress_from_api() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/journey-workflow/J-9/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending_progress("J-9")))
        .mount(&server)
        .await;

    ccrm()
        .args(["--api-url", uri.as_str(), "-o", "json", "journey", "progress", "J-9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"journeyId\": \"J-9\""))
        .stdout(predicate::str::contains("\"currentStep\": 1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_driver_starts_first_step() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/journey-workflow/J-10/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending_progress("J-10")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/journey-workflow/J-10/phases/ready_to_go/start"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    ccrm()
        .args([
            "--api-url",
            uri.as_str(),
            "-o",
            "json",
            "journey",
            "start",
            "J-10",
            "ready_to_go",
            "--role",
            "driver",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"in_progress\""))
        .stderr(predicate::str::contains("Ready to Go started"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mover_cannot_approve() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/journey-workflow/J-11/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending_progress("J-11")))
        .mount(&server)
        .await;

    ccrm()
        .args([
            "--api-url",
            uri.as_str(),
            "journey",
            "approve",
            "J-11",
            "1",
            "--role",
            "mover",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Permission denied"));
}
