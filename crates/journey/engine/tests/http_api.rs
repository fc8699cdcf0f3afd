//! HttpJourneyApi against a mock journey API server

use access_types::Role;
use journey_engine::*;
use journey_types::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, token: Option<&str>) -> HttpJourneyApi {
    HttpJourneyApi::new(&ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        bearer_token: token.map(str::to_string),
    })
    .unwrap()
}

fn update(step: StepId) -> PhaseUpdate {
    let mut record = StepRecord::new(step);
    record.started_at = Some(chrono::Utc::now());
    PhaseUpdate {
        request_id: RequestId::generate(),
        actor_role: Role::Driver,
        phase: PhaseProgress::from_record(&record),
    }
}

fn progress_body(journey: &str) -> serde_json::Value {
    json!({
        "journeyId": journey,
        "currentStep": 2,
        "timeline": [
            {
                "phaseId": "ready_to_go",
                "ordinal": 1,
                "status": "completed",
                "completedBy": "DRIVER"
            },
            { "phaseId": "points_a", "ordinal": 2, "status": "in_progress" },
            { "phaseId": "new_location", "ordinal": 3, "status": "pending" },
            { "phaseId": "back_to_dispatcher", "ordinal": 4, "status": "pending" }
        ]
    })
}

#[tokio::test]
async fn test_fetch_progress() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/journey-workflow/J-1/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(progress_body("J-1")))
        .expect(1)
        .mount(&server)
        .await;

    let progress = client(&server, None)
        .fetch_progress(&JourneyId::new("J-1"))
        .await
        .unwrap();

    assert_eq!(progress.journey_id, "J-1");
    assert_eq!(progress.completion_policy, None);
    assert_eq!(progress.timeline.len(), 4);
    assert_eq!(progress.timeline[0].completed_by, Some(FieldRole::Driver));
    assert_eq!(progress.timeline[1].status, StepStatus::InProgress);
}

#[tokio::test]
async fn test_phase_mutations_hit_their_endpoints() {
    let server = MockServer::start().await;
    for action in ["start", "complete", "approve"] {
        Mock::given(method("POST"))
            .and(path(format!("/journey-workflow/J-2/phases/points_a/{}", action)))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("PUT"))
        .and(path("/journey-workflow/J-2/phases/points_a"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, None);
    let journey = JourneyId::new("J-2");
    api.start_phase(&journey, &update(StepId::PointsA)).await.unwrap();
    api.complete_phase(&journey, &update(StepId::PointsA)).await.unwrap();
    api.approve_phase(&journey, &update(StepId::PointsA)).await.unwrap();
    api.save_phase(&journey, &update(StepId::PointsA)).await.unwrap();
}

#[tokio::test]
async fn test_update_carries_token_idempotency_key_and_body() {
    let server = MockServer::start().await;
    let update = update(StepId::ReadyToGo);

    Mock::given(method("POST"))
        .and(path("/journey-workflow/J-3/phases/ready_to_go/start"))
        .and(header("authorization", "Bearer secret"))
        .and(header("Idempotency-Key", update.request_id.to_string().as_str()))
        .and(body_partial_json(json!({
            "actorRole": "DRIVER",
            "phase": { "phaseId": "ready_to_go", "ordinal": 1, "status": "in_progress" }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, Some("secret"))
        .start_phase(&JourneyId::new("J-3"), &update)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/journey-workflow/missing/progress"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/journey-workflow/J-4/phases/ready_to_go/complete"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
        .mount(&server)
        .await;

    let api = client(&server, None);

    let err = api
        .fetch_progress(&JourneyId::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.status(), Some(404));

    let err = api
        .complete_phase(&JourneyId::new("J-4"), &update(StepId::ReadyToGo))
        .await
        .unwrap_err();
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database down");
        }
        other => panic!("expected a status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_progress_is_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/journey-workflow/J-5/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"timeline\": 3"))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .fetch_progress(&JourneyId::new("J-5"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Json(_)));
}

#[tokio::test]
async fn test_controller_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/journey-workflow/J-6/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(progress_body("J-6")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/journey-workflow/J-6/phases/points_a"))
        .and(body_partial_json(json!({ "actorRole": "MOVER" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/journey-workflow/J-6/phases/ready_to_go/approve"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = std::sync::Arc::new(MemoryNotifier::new());
    let controller =
        JourneyWorkflowController::new(JourneyId::new("J-6"), client(&server, None), notifier.clone());

    let instance = controller.load_instance(&JourneyId::new("J-6")).await.unwrap();
    assert_eq!(instance.current_ordinal(), 2);

    let outcome = controller
        .dispatch(ActionRequest::new(
            Actor::new(Role::Mover),
            WorkflowAction::RecordField {
                step: StepId::PointsA,
                field: "damageNotes".into(),
                value: FieldValue::Text("scratched dresser".into()),
            },
        ))
        .await
        .unwrap();
    assert!(outcome.is_persisted());

    let outcome = controller
        .dispatch(ActionRequest::new(
            Actor::new(Role::Manager),
            WorkflowAction::Approve {
                step: StepId::ReadyToGo,
            },
        ))
        .await
        .unwrap();
    assert!(!outcome.is_persisted());
    assert_eq!(
        controller.instance().status(StepId::ReadyToGo),
        StepStatus::Approved
    );
    assert_eq!(
        notifier.last().and_then(|n| n.category),
        Some(ErrorCategory::NetworkFailure)
    );
}

#[tokio::test]
async fn test_journey_ids_are_escaped_in_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/journey-workflow/J%231/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(progress_body("J#1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/journey-workflow/north%2FJ-7/phases/points_a/start"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, None);
    let progress = api.fetch_progress(&JourneyId::new("J#1")).await.unwrap();
    assert_eq!(progress.journey_id, "J#1");

    api.start_phase(&JourneyId::new("north/J-7"), &update(StepId::PointsA))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_phase_in_progress_is_invalid_progress() {
    let server = MockServer::start().await;
    let mut body = progress_body("J-8");
    body["timeline"][3]["phaseId"] = json!("warehouse");
    Mock::given(method("GET"))
        .and(path("/journey-workflow/J-8/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .fetch_progress(&JourneyId::new("J-8"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Json(_)));

    let notifier = std::sync::Arc::new(MemoryNotifier::new());
    let controller =
        JourneyWorkflowController::new(JourneyId::new("J-8"), client(&server, None), notifier)
            .with_config(WorkflowConfig {
                fallback_on_load_failure: false,
                ..WorkflowConfig::default()
            });
    let err = controller
        .load_instance(&JourneyId::new("J-8"))
        .await
        .unwrap_err();
    assert!(matches!(err, JourneyError::InvalidProgress(_)));
    assert_eq!(err.category(), ErrorCategory::ValidationFailure);
}

#[tokio::test]
async fn test_dispatch_while_loading_is_busy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/journey-workflow/J-9/progress"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(progress_body("J-9"))
                .set_delay(std::time::Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/journey-workflow/J-9/phases/ready_to_go/start"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let notifier = std::sync::Arc::new(MemoryNotifier::new());
    let controller = std::sync::Arc::new(JourneyWorkflowController::new(
        JourneyId::new("J-9"),
        client(&server, None),
        notifier,
    ));

    let load = tokio::spawn({
        let controller = controller.clone();
        async move { controller.load_instance(&JourneyId::new("J-9")).await }
    });
    while !controller.is_busy() {
        tokio::task::yield_now().await;
    }

    let start = ActionRequest::new(
        Actor::new(Role::Driver),
        WorkflowAction::Start {
            step: StepId::ReadyToGo,
        },
    );
    let err = controller.dispatch(start.clone()).await.unwrap_err();
    assert!(matches!(err, JourneyError::Busy(_)));

    let loaded = load.await.unwrap().unwrap();
    assert_eq!(loaded.status(StepId::ReadyToGo), StepStatus::Completed);
    assert_eq!(
        controller.instance().status(StepId::ReadyToGo),
        StepStatus::Completed
    );
    assert!(!controller.is_busy());

    // The busy request changed nothing, so it is not treated as a duplicate
    let err = controller.dispatch(start).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::SequenceViolation);
}
