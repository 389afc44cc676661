use std::sync::Arc;

use ehrlite_cli::client::Icd10Request;
use ehrlite_cli::{ClientError, EhrClient, MemoryTokenStore, TokenStore};
use ehrlite_storage::{PatientFields, PatientStatus};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_with(server: &MockServer, store: Arc<MemoryTokenStore>) -> EhrClient {
    EhrClient::new(&server.uri(), store)
}

#[tokio::test]
async fn attaches_bearer_token_when_stored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/patients"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Jane Doe", "age": 28}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("abc123"));
    let patients = client_with(&server, store).list_patients().await.unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].id, 1);
    assert_eq!(patients[0].fields.name.as_deref(), Some("Jane Doe"));
}

#[tokio::test]
async fn unauthorized_clears_token_and_requires_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/patients/1"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid or expired token"})),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("stale"));
    let client = client_with(&server, store.clone());
    let err = client.get_patient(1).await.unwrap_err();
    assert!(matches!(err, ClientError::LoginRequired), "{err:?}");
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn api_errors_carry_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/patients/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Patient not found"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/icd10-coding"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = client_with(&server, Arc::new(MemoryTokenStore::default()));
    let fields = PatientFields {
        age: Some(29),
        ..Default::default()
    };
    match client.update_patient(99, &fields).await.unwrap_err() {
        ClientError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Patient not found");
        }
        other => panic!("unexpected {other:?}"),
    }

    let request = Icd10Request {
        clinical_text: "fever".into(),
        top_k: None,
    };
    match client.icd10_codes(&request).await.unwrap_err() {
        ClientError::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream down");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn create_posts_fields_and_parses_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/patients"))
        .and(body_json(json!({"name": "Jane Doe", "status": "active"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Patient added",
            "patient": {"id": 7, "name": "Jane Doe", "status": "active"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, Arc::new(MemoryTokenStore::default()));
    let fields = PatientFields {
        name: Some("Jane Doe".into()),
        status: Some(PatientStatus::Active),
        ..Default::default()
    };
    let created = client.create_patient(&fields).await.unwrap();
    assert_eq!(created.message, "Patient added");
    assert_eq!(created.patient.id, 7);
    assert_eq!(created.patient.fields, fields);
}

#[tokio::test]
async fn transport_failure_is_reported() {
    // Nothing listens on port 9 of the loopback interface.
    let client = EhrClient::new("http://127.0.0.1:9", Arc::new(MemoryTokenStore::default()));
    let err = client.root().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn batch_process_posts_bare_array() {
    let server = MockServer::start().await;
    let visits = vec![
        json!({"patient_info": {"patient_id": "A"}, "diagnosis": "Fever"}),
        json!({"patient_info": {"patient_id": "B"}, "diagnosis": "Cough"}),
    ];
    Mock::given(method("POST"))
        .and(path("/batch-process"))
        .and(body_json(json!(visits)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "processed_count": 2,
            "results": [],
            "timestamp": "2026-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, Arc::new(MemoryTokenStore::default()));
    let resp = client.batch_process(&visits).await.unwrap();
    assert_eq!(resp["processed_count"], 2);
}

#[tokio::test]
async fn visit_errors_surface_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/visit-documentation"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "diagnosis is required"})),
        )
        .mount(&server)
        .await;

    let client = client_with(&server, Arc::new(MemoryTokenStore::default()));
    let visit = json!({"patient_info": {"patient_id": "A"}});
    match client.document_visit(&visit).await.unwrap_err() {
        ClientError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "diagnosis is required");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
