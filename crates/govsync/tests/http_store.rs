//! `HttpStore` against a mock service.

use std::sync::Arc;
use std::time::Duration;

use govsync::store::ApiErrorPayload;
use govsync::{
    EntityKind, EntityProfile, HttpStore, PatchOperation, ReconcileError, Reconciled, Reconciler,
    RemoteError, RemoteObjectStore, StoreConfig, Value,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store(server: &MockServer) -> HttpStore {
    HttpStore::new(&StoreConfig::new(server.uri()).with_token("t0ken")).unwrap()
}

fn enable() -> Vec<PatchOperation> {
    vec![PatchOperation::Replace {
        path: vec!["enabled".into()],
        value: Value::Bool(true),
    }]
}

#[tokio::test]
async fn get_reads_the_entity_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/roles/r1"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "r1", "name": "A"})))
        .expect(1)
        .mount(&server)
        .await;

    let body = store(&server).get(EntityKind::Role, "r1").await.unwrap();
    assert_eq!(body, json!({"id": "r1", "name": "A"}));
}

#[tokio::test]
async fn patch_sends_a_json_patch_document() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/access-profiles/ap-1"))
        .and(header("content-type", "application/json-patch+json"))
        .and(body_json(json!([{"op": "replace", "path": "/enabled", "value": true}])))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "ap-1", "enabled": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let body = store(&server)
        .patch(EntityKind::AccessProfile, "ap-1", &enable())
        .await
        .unwrap();
    assert_eq!(body["enabled"], json!(true));
}

#[tokio::test]
async fn empty_patch_response_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/roles/r1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let body = store(&server)
        .patch(EntityKind::Role, "r1", &enable())
        .await
        .unwrap();
    assert_eq!(body, serde_json::Value::Null);
}

#[tokio::test]
async fn structured_rejection_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/roles/r1"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"code": 400, "message": "m", "errorCode": 7})),
        )
        .mount(&server)
        .await;

    let err = store(&server)
        .patch(EntityKind::Role, "r1", &enable())
        .await
        .unwrap_err();
    match err {
        RemoteError::Api { status, payload } => {
            assert_eq!(status, 400);
            assert_eq!(payload, ApiErrorPayload::new("m").with_code(400).with_error_code(7));
        }
        other => panic!("expected an api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unstructured_failure_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/roles/r1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = store(&server)
        .patch(EntityKind::Role, "r1", &enable())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Transport { .. }), "{err:?}");
    assert!(err.to_string().contains("502"), "{err}");
    assert!(err.to_string().contains("bad gateway"), "{err}");
}

#[tokio::test]
async fn missing_entity_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/workgroups/g1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "gone"})))
        .mount(&server)
        .await;

    let err = store(&server)
        .get(EntityKind::GovernanceGroup, "g1")
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err:?}");
}

#[tokio::test]
async fn create_posts_to_the_collection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/access-model-metadata/attributes"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"key": "iscPrivacy", "name": "Privacy"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"key": "iscPrivacy", "name": "Privacy"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = store(&server)
        .create(
            EntityKind::MetadataAttribute,
            &json!({"key": "iscPrivacy", "name": "Privacy"}),
        )
        .await
        .unwrap();
    assert_eq!(created["key"], json!("iscPrivacy"));
}

#[tokio::test]
async fn cancellation_interrupts_a_slow_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/roles/r1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "r1"}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let store = Arc::new(store(&server));
    let token = store.cancellation_token();
    let request = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.get(EntityKind::Role, "r1").await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), request)
        .await
        .expect("cancelled promptly")
        .unwrap();
    assert!(matches!(result, Err(RemoteError::Cancelled)), "{result:?}");
}

#[tokio::test]
async fn shared_token_stops_every_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "r1"})))
        .expect(0)
        .mount(&server)
        .await;

    let shutdown = CancellationToken::new();
    let roles = store(&server).with_cancellation(shutdown.clone());
    let groups = store(&server).with_cancellation(shutdown.child_token());
    shutdown.cancel();

    let role = roles.get(EntityKind::Role, "r1").await;
    assert!(matches!(role, Err(RemoteError::Cancelled)), "{role:?}");
    let group = groups.get(EntityKind::GovernanceGroup, "g1").await;
    assert!(matches!(group, Err(RemoteError::Cancelled)), "{group:?}");
    assert!(roles.cancellation_token().is_cancelled());
}

#[tokio::test]
async fn reconcile_rereads_after_bodyless_patch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/roles/r1"))
        .and(body_json(json!([{"op": "replace", "path": "/enabled", "value": true}])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/roles/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "r1", "modified": "2024-02-02T00:00:00Z", "name": "A", "enabled": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = EntityProfile::for_kind(EntityKind::Role);
    let previous = profile
        .parse(&json!({"id": "r1", "name": "A", "enabled": false}))
        .unwrap();
    let desired = profile.parse(&json!({"name": "A", "enabled": true})).unwrap();

    let reconciler = Reconciler::new(Arc::new(store(&server)));
    let reconciled = reconciler.reconcile(&previous, &desired, &profile).await.unwrap();
    let Reconciled::Settled { document, operations } = reconciled else {
        panic!("entity should still exist");
    };
    assert_eq!(operations, enable());
    assert_eq!(document.to_json()["modified"], json!("2024-02-02T00:00:00Z"));
}

#[tokio::test]
async fn reconcile_surfaces_the_service_message() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/roles/r1"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"code": 400, "message": "m", "errorCode": 7})),
        )
        .mount(&server)
        .await;

    let profile = EntityProfile::for_kind(EntityKind::Role);
    let previous = profile
        .parse(&json!({"id": "r1", "name": "A", "enabled": false}))
        .unwrap();
    let desired = profile.parse(&json!({"name": "A", "enabled": true})).unwrap();

    let (report, result) = Reconciler::new(Arc::new(store(&server)))
        .reconcile_with_report(&previous, &desired, &profile)
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, ReconcileError::Api { status: 400, .. }));
    assert_eq!(err.to_string(), "m");
    assert_eq!(report.state(), Some(govsync::ReconcileState::Failed));
}
