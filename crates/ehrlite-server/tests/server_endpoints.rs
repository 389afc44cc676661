use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use assert_json_diff::assert_json_eq;
use ehrlite_db_memory::InMemoryStorage;
use ehrlite_server::{AppConfig, ServerBuilder, build_app};
use ehrlite_storage::{DynPatientStorage, PatientFields, PatientStorage};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;

async fn start_server(cfg: AppConfig) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let app = build_app(&cfg);

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

#[tokio::test]
async fn health_endpoints_work() {
    let (base, shutdown_tx, handle) = start_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.unwrap();
    assert_json_eq!(body, json!({"message": "Backend running successfully!"}));

    let body: Value = client
        .get(format!("{base}/healthz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");

    let body: Value = client
        .get(format!("{base}/readyz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ready");

    let body: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_str().is_some_and(|t| !t.is_empty()));
    assert_json_eq!(
        body["components"],
        json!({"image_enhancement": true, "clinical_notes": true, "icd10_coding": true})
    );
    assert_eq!(body["storage"]["backend"], "memory");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn create_and_fetch_patient() {
    let (base, shutdown_tx, handle) = start_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/patients"))
        .json(&json!({"name": "Jane Doe", "age": 28}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_json_eq!(
        body,
        json!({"message": "Patient added", "patient": {"id": 1, "name": "Jane Doe", "age": 28}})
    );

    let resp = client
        .get(format!("{base}/patients/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_json_eq!(body, json!({"id": 1, "name": "Jane Doe", "age": 28}));

    let resp = client
        .post(format!("{base}/patients"))
        .json(&json!({"name": "John Roe", "status": "active"}))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["patient"]["id"], 2);

    let list: Vec<Value> = client
        .get(format!("{base}/patients"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<_> = list.iter().map(|p| p["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, [1, 2]);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn update_missing_patient_leaves_store_unchanged() {
    let (base, shutdown_tx, handle) = start_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .put(format!("{base}/patients/99"))
        .json(&json!({"age": 29}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_json_eq!(body, json!({"error": "Patient not found"}));

    let list: Vec<Value> = client
        .get(format!("{base}/patients"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list.is_empty());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn feature_endpoints_follow_backend() {
    let (base, shutdown_tx, handle) = start_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/clinical-notes"))
        .json(&json!({"note_type": "unknown"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_json_eq!(body, json!({"error": "Invalid note type"}));

    let resp = client
        .post(format!("{base}/clinical-notes"))
        .json(&json!({
            "note_type": "discharge",
            "patient_info": {"name": "Jane Doe"},
            "admission_data": {"diagnosis": "Pneumonia"}
        }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    let content = body["content"].as_str().unwrap();
    assert!(content.contains("Patient: Jane Doe"));
    assert!(content.contains("Diagnosis: Pneumonia"));

    let body: Value = client
        .post(format!("{base}/icd10-coding"))
        .json(&json!({"clinical_text": "History of hypertension and diabetes"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let codes: Vec<_> = body["suggested_codes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, ["E11.9", "I10"]);
    assert_eq!(body["total_suggestions"], 2);

    let _ = shutdown_tx.send(());
    let _ = handle.await;

    let mut cfg = AppConfig::default();
    cfg.features.backend = ehrlite_server::FeatureBackend::Disabled;
    let (base, shutdown_tx, handle) = start_server(cfg).await;

    let resp = client
        .post(format!("{base}/image-enhancement"))
        .json(&json!({"image_base64": "AQID"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_IMPLEMENTED);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn bearer_auth_when_enabled() {
    let mut cfg = AppConfig::default();
    cfg.auth.enabled = true;
    cfg.auth.tokens = vec!["s3cret".into()];
    let (base, shutdown_tx, handle) = start_server(cfg).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert!(resp.status().is_success());

    let resp = client.get(format!("{base}/patients")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers()["www-authenticate"], "Bearer");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Authentication required");

    let resp = client
        .get(format!("{base}/patients"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    let resp = client
        .get(format!("{base}/patients"))
        .bearer_auth("s3cret")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn stalled_body_times_out_with_408() {
    let mut cfg = AppConfig::default();
    cfg.server.request_timeout_ms = 50;
    let (base, shutdown_tx, handle) = start_server(cfg).await;
    let addr = base.trim_start_matches("http://");

    // Announce 100 bytes, send a fragment, then stall.
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let head = format!(
        "POST /patients HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{{\"name\": \"Ja"
    );
    stream.write_all(head.as_bytes()).await.unwrap();

    let response = tokio::time::timeout(Duration::from_secs(5), read_response(&mut stream))
        .await
        .expect("server answered before the body arrived");
    assert!(response.starts_with("HTTP/1.1 408"), "{response}");
    assert!(response.ends_with(r#"{"error":"Request timed out"}"#), "{response}");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

/// Reads one small response: headers plus a JSON body.
async fn read_response(stream: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = stream.read(&mut buf).await.unwrap();
        raw.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&raw);
        let complete = text
            .split_once("\r\n\r\n")
            .is_some_and(|(_, body)| body.ends_with('}'));
        if n == 0 || complete {
            return text.into_owned();
        }
    }
}

#[tokio::test]
async fn oversized_body_is_413() {
    let mut cfg = AppConfig::default();
    cfg.server.body_limit_bytes = 64;
    let (base, shutdown_tx, handle) = start_server(cfg).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/patients"))
        .json(&json!({"name": "N".repeat(500)}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    let list: Vec<Value> = client
        .get(format!("{base}/patients"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list.is_empty());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn visit_batch_over_http() {
    let (base, shutdown_tx, handle) = start_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/batch-process"))
        .json(&json!([
            {
                "patient_info": {"patient_id": "P-1", "age": 61, "gender": "F", "visit_date": "2026-04-09"},
                "observations": {"subjective": "Polyuria", "blood_pressure": "145/92"},
                "assessment": "Poorly controlled diabetes",
                "diagnosis": "Type 2 diabetes with hypertension"
            },
            {
                "patient_info": {"patient_id": "P-2"},
                "diagnosis": "Routine check"
            }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["processed_count"], 2);

    let first = &body["results"][0];
    assert_eq!(first["visit_date"], "2026-04-09");
    assert!(
        first["progress_note"]
            .as_str()
            .unwrap()
            .contains("Assessment: Poorly controlled diabetes")
    );
    let codes: Vec<_> = first["icd10_codes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, ["E11.9", "I10"]);
    assert_eq!(body["results"][1]["icd10_codes"][0]["code"], "Z00.00");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

/// Picks a free local port for servers that bind their own listener.
fn free_local_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).unwrap();
    listener.local_addr().unwrap()
}

#[tokio::test]
async fn server_builder_serves_injected_storage() {
    let storage = Arc::new(InMemoryStorage::new());
    storage
        .create(PatientFields {
            name: Some("Seeded".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let shared: DynPatientStorage = storage.clone();

    let addr = free_local_addr();
    let server = ServerBuilder::new()
        .with_config(AppConfig::default())
        .with_addr(addr)
        .with_storage(shared)
        .build();
    assert_eq!(server.addr(), addr);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_until(async move {
        let _ = rx.await;
    }));

    let base = format!("http://{addr}");
    let client = reqwest::Client::new();
    let mut ready = false;
    for _ in 0..50 {
        if client.get(format!("{base}/healthz")).send().await.is_ok() {
            ready = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(ready, "server did not start on {addr}");

    let list: Vec<Value> = client
        .get(format!("{base}/patients"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_json_eq!(json!(list), json!([{"id": 1, "name": "Seeded"}]));

    let resp = client
        .post(format!("{base}/patients"))
        .json(&json!({"name": "Added"}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    assert_eq!(storage.count().await.unwrap(), 2);

    let _ = tx.send(());
    handle.await.unwrap().unwrap();
}
