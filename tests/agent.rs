//! Node agent endpoint integration tests

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use netpanel::Capability;
use tower::ServiceExt;

mod common;
use common::{AGENT_TOKEN, RecordingManager, test_agent, test_agent_with};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn authed_post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn bad_credential_never_reaches_the_manager() {
    let (app, manager) = test_agent(&[Capability::Service], &["mopidy.service"]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/service/mopidy.service/restart")
                .header(header::AUTHORIZATION, "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "unauthorized");
    assert_eq!(manager.service_count(), 0);
}

#[tokio::test]
async fn missing_credential_is_rejected() {
    let (app, manager) = test_agent(&[Capability::Power], &[]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/power/reboot")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(manager.power_count(), 0);
}

#[tokio::test]
async fn unit_outside_allow_list_is_rejected_without_side_effects() {
    let (app, manager) = test_agent(&[Capability::Service], &["mopidy.service"]);

    let response = app
        .oneshot(authed_post("/api/service/sshd.service/restart"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "unknown_target");
    assert_eq!(manager.service_count(), 0);
}

#[tokio::test]
async fn invalid_action_name_is_rejected_without_side_effects() {
    let (app, manager) = test_agent(&[Capability::Service], &["mopidy.service"]);

    let response = app
        .oneshot(authed_post("/api/service/mopidy.service/enable"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "unknown_target");
    assert_eq!(manager.service_count(), 0);
}

#[tokio::test]
async fn valid_service_action_runs_and_reports() {
    let (app, manager) = test_agent(&[Capability::Service], &["mopidy.service"]);

    let response = app
        .oneshot(authed_post("/api/service/mopidy.service/restart"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["target"], "mopidy.service");
    assert_eq!(json["action"], "restart");
    assert_eq!(manager.service_count(), 1);
}

#[tokio::test]
async fn power_action_is_acknowledged() {
    let (app, manager) = test_agent(&[Capability::Power], &[]);

    let response = app.oneshot(authed_post("/api/power/reboot")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["target"], "system");
    assert_eq!(manager.power_count(), 1);
}

#[tokio::test]
async fn failed_action_surfaces_as_action_failed() {
    let (app, manager) = test_agent_with(
        RecordingManager::failing(),
        &[Capability::Service],
        &["mopidy.service"],
    );

    let response = app
        .oneshot(authed_post("/api/service/mopidy.service/restart"))
        .await
        .unwrap();

    // The command was accepted and executed; only the execution failed.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "action_failed");
    assert_eq!(manager.service_count(), 1);
}

#[tokio::test]
async fn toggle_round_trips_and_last_write_wins() {
    let (app, _manager) = test_agent(&[Capability::Toggle], &[]);

    for enabled in [true, false, true] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/admin/updates")
                    .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(format!(r#"{{"enabled": {enabled}}}"#)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/updates")
                .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["enabled"], true);
}

#[tokio::test]
async fn malformed_toggle_body_is_rejected_without_state_change() {
    let (app, _manager) = test_agent(&[Capability::Toggle], &[]);

    let write = |body: Body, content_type: Option<&'static str>| {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/admin/updates")
            .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"));
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(body).unwrap()
    };

    // Establish a known value first.
    let response = app
        .clone()
        .oneshot(write(
            Body::from(r#"{"enabled": true}"#),
            Some("application/json"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Non-boolean flag, empty body, and a body with no content type must
    // all be rejected by extraction before the handler runs.
    for req in [
        write(Body::from(r#"{"enabled": "yes"}"#), Some("application/json")),
        write(Body::empty(), Some("application/json")),
        write(Body::from(r#"{"enabled": false}"#), None),
    ] {
        let response = app.clone().oneshot(req).await.unwrap();
        assert!(
            response.status().is_client_error(),
            "expected 4xx, got {}",
            response.status()
        );
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/updates")
                .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["enabled"], true);
}

#[tokio::test]
async fn every_route_class_requires_a_credential() {
    let (app, _manager) = test_agent(
        &[Capability::Service, Capability::Power, Capability::Toggle],
        &["mopidy.service"],
    );

    let status_read = Request::builder()
        .uri("/api/status")
        .header(header::AUTHORIZATION, "Bearer wrong-token")
        .body(Body::empty())
        .unwrap();
    let toggle_read = Request::builder()
        .uri("/api/admin/updates")
        .header(header::AUTHORIZATION, "Bearer wrong-token")
        .body(Body::empty())
        .unwrap();
    let toggle_write = Request::builder()
        .method("POST")
        .uri("/api/admin/updates")
        .header(header::AUTHORIZATION, "Bearer wrong-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"enabled": true}"#))
        .unwrap();

    for req in [status_read, toggle_read, toggle_write] {
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // The rejected write left the flag untouched.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/updates")
                .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["enabled"], false);
}

#[tokio::test]
async fn undeclared_capability_routes_are_not_mounted() {
    // Service-only agent: power and toggle must not exist at all.
    let (app, manager) = test_agent(&[Capability::Service], &["mopidy.service"]);

    let response = app
        .clone()
        .oneshot(authed_post("/api/power/reboot"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(manager.power_count(), 0);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/updates")
                .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_reports_services_and_connectivity() {
    let (app, _manager) = test_agent(
        &[Capability::Service, Capability::Toggle],
        &["mopidy.service", "raspotify.service"],
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .header(header::AUTHORIZATION, format!("Bearer {AGENT_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["services"]["mopidy.service"]["active"], true);
    assert_eq!(json["services"]["raspotify.service"]["unit"], "raspotify.service");
    assert!(json["internet"]["target"].is_string());
    // Toggle owner reports the flag; it starts disabled.
    assert_eq!(json["map_updates"], false);
    assert!(json["server_time"].is_string());
    // No gps capability, so the field is absent entirely.
    assert!(json.get("gps").is_none());
}

#[tokio::test]
async fn healthz_needs_no_credential() {
    let (app, _manager) = test_agent(&[Capability::Service], &[]);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
    assert!(json["version"].is_string());
}
