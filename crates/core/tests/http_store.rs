//! `HttpPatientStore` against an in-process fake FHIR server.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use finder_core::{
    AddPatientDialog, AddPatientForm, AppController, Command, FinderConfig, FinderError,
    HttpPatientStore, IdenticonAvatars, PageQuery, PatientStore,
};
use fhir::{ContactPoint, HumanName, NameUse, PatientData};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One request as the fake server saw it.
#[derive(Clone, Debug)]
struct Seen {
    method: &'static str,
    path: String,
    query: HashMap<String, String>,
    prefer: Option<String>,
    content_type: Option<String>,
    body: Option<Value>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn fhir_json(status: StatusCode, body: Value) -> impl IntoResponse {
    (
        status,
        [(header::CONTENT_TYPE, "application/fhir+json")],
        body.to_string(),
    )
}

async fn search(
    State(log): State<Log>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    log.lock().expect("log lock").push(Seen {
        method: "GET",
        path: "/fhir/Patient".into(),
        query,
        prefer: header_value(&headers, "prefer"),
        content_type: None,
        body: None,
    });

    fhir_json(
        StatusCode::OK,
        json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 23,
            "entry": [
                {"resource": {
                    "resourceType": "Patient",
                    "id": "p1",
                    "name": [{"use": "official", "family": "Doe", "given": ["Jane", "A"]}],
                    "gender": "female",
                    "birthDate": "1980-04-12"
                }},
                {"resource": {"resourceType": "OperationOutcome", "issue": []}},
                {"resource": {
                    "resourceType": "Patient",
                    "id": "p2",
                    "name": [{"family": "Roe"}],
                    "telecom": [{"system": "phone", "value": "555-0100"}]
                }}
            ]
        }),
    )
}

async fn create(State(log): State<Log>, headers: HeaderMap, body: String) -> impl IntoResponse {
    let mut resource: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    log.lock().expect("log lock").push(Seen {
        method: "POST",
        path: "/fhir/Patient".into(),
        query: HashMap::new(),
        prefer: None,
        content_type: header_value(&headers, "content-type"),
        body: Some(resource.clone()),
    });

    resource["id"] = json!("server-1");
    resource["meta"] = json!({"lastUpdated": "2024-06-01T10:00:00Z"});
    fhir_json(StatusCode::CREATED, resource)
}

async fn update(
    State(log): State<Log>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let resource: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    log.lock().expect("log lock").push(Seen {
        method: "PUT",
        path: format!("/fhir/Patient/{id}"),
        query: HashMap::new(),
        prefer: None,
        content_type: header_value(&headers, "content-type"),
        body: Some(resource.clone()),
    });

    if id == "locked" {
        return fhir_json(StatusCode::INTERNAL_SERVER_ERROR, json!({})).into_response();
    }
    fhir_json(StatusCode::OK, resource).into_response()
}

async fn delete(State(log): State<Log>, Path(id): Path<String>) -> StatusCode {
    log.lock().expect("log lock").push(Seen {
        method: "DELETE",
        path: format!("/fhir/Patient/{id}"),
        query: HashMap::new(),
        prefer: None,
        content_type: None,
        body: None,
    });

    if id == "missing" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn spawn_server() -> (SocketAddr, Log) {
    let log = Log::default();
    let app = Router::new()
        .route("/fhir/Patient", get(search).post(create))
        .route("/fhir/Patient/:id", axum::routing::put(update).delete(delete))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake server");
    });

    (addr, log)
}

fn store_for(addr: SocketAddr) -> HttpPatientStore {
    // Trailing slash is stripped by the config.
    let cfg = FinderConfig::new(
        format!("http://{addr}/fhir/"),
        10,
        Some(Duration::from_secs(5)),
        false,
    )
    .expect("valid config");
    HttpPatientStore::new(&cfg).expect("client")
}

fn new_patient() -> PatientData {
    PatientData {
        active: Some(true),
        names: vec![HumanName {
            use_type: Some(NameUse::Official),
            text: Some("Ann Lee".into()),
            family: Some("Lee".into()),
            given: vec!["Ann".into()],
        }],
        birth_date: Some("1990-02-03".into()),
        telecom: vec![ContactPoint::work_phone("555")],
        ..Default::default()
    }
}

#[tokio::test]
async fn search_sends_offset_paging_parameters() {
    let (addr, log) = spawn_server().await;
    let store = store_for(addr);

    let page = store
        .search(&PageQuery::for_page(3, 10))
        .await
        .expect("search");
    assert_eq!(page.total, Some(23));
    assert_eq!(page.patients.len(), 2);
    assert_eq!(page.skipped, 1);

    let seen = log.lock().expect("log lock").clone();
    assert_eq!(seen.len(), 1);
    let query = &seen[0].query;
    assert_eq!(query.get("_sort").map(String::as_str), Some("-_lastUpdated"));
    assert_eq!(query.get("_count").map(String::as_str), Some("10"));
    assert_eq!(query.get("_skip").map(String::as_str), Some("20"));
    assert_eq!(query.get("_total").map(String::as_str), Some("accurate"));
    assert_eq!(seen[0].prefer.as_deref(), Some("pagination=offset-skip"));
}

#[tokio::test]
async fn create_posts_fhir_json_and_returns_server_id() {
    let (addr, log) = spawn_server().await;
    let store = store_for(addr);

    let created = store.create(&new_patient()).await.expect("create");
    assert_eq!(created.id.as_deref(), Some("server-1"));
    assert!(created.last_updated.is_some());

    let seen = log.lock().expect("log lock").clone();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].content_type.as_deref(), Some("application/fhir+json"));
    assert_eq!(
        seen[0].body,
        Some(json!({
            "resourceType": "Patient",
            "active": true,
            "name": [{"use": "official", "text": "Ann Lee", "family": "Lee", "given": ["Ann"]}],
            "telecom": [{"system": "phone", "use": "work", "value": "555"}],
            "birthDate": "1990-02-03"
        }))
    );
}

#[tokio::test]
async fn update_puts_to_instance_url() {
    let (addr, log) = spawn_server().await;
    let store = store_for(addr);

    let mut patient = new_patient();
    patient.id = Some("p1".into());
    let updated = store.update("p1", &patient).await.expect("update");
    assert_eq!(updated.id.as_deref(), Some("p1"));

    let seen = log.lock().expect("log lock").clone();
    assert_eq!(seen[0].method, "PUT");
    assert_eq!(seen[0].path, "/fhir/Patient/p1");
    assert_eq!(seen[0].content_type.as_deref(), Some("application/fhir+json"));
}

#[tokio::test]
async fn non_success_status_becomes_http_error() {
    let (addr, _log) = spawn_server().await;
    let store = store_for(addr);

    let err = store
        .update("locked", &new_patient())
        .await
        .expect_err("server error");
    assert!(matches!(err, FinderError::Http { status: 500 }));
    assert_eq!(err.to_string(), "HTTP error! status: 500");

    let err = store.delete("missing").await.expect_err("not found");
    assert_eq!(err.status(), Some(404));

    store.delete("p1").await.expect("deleted");
}

#[tokio::test]
async fn ids_are_sent_as_a_single_path_segment() {
    let (addr, log) = spawn_server().await;
    let store = store_for(addr);

    store.delete("a/b").await.expect("deleted");

    let seen = log.lock().expect("log lock").clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "DELETE");
    assert_eq!(seen[0].path, "/fhir/Patient/a/b");
}

#[tokio::test]
async fn unreachable_server_is_reported_in_add_dialog() {
    // Bind then drop so nothing is listening on the port.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("local addr")
    };
    let store = store_for(addr);

    let mut dialog = AddPatientDialog::new();
    dialog.open();
    dialog.set_form(AddPatientForm {
        first_name: "Ann".into(),
        last_name: "Lee".into(),
        gender: "female".into(),
        birth_date: "1990-02-03".into(),
        phone_number: "555".into(),
    });

    let err = dialog
        .submit(&store, chrono::Local::now().date_naive())
        .await
        .expect_err("connection refused");
    assert!(matches!(err, FinderError::Transport(_)), "{err:?}");
    let message = dialog.error().unwrap_or_default();
    assert!(message.starts_with("Error adding patient: "), "{message}");
    assert!(dialog.is_open());
}

#[tokio::test]
async fn controller_loads_rows_over_http() {
    let (addr, _log) = spawn_server().await;
    let store = Arc::new(store_for(addr));
    let mut app = AppController::new(store, Arc::new(IdenticonAvatars), 10);

    app.dispatch(Command::Load).await.expect("load");

    let rows = app.state().list.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].first_name, "Jane A");
    assert_eq!(rows[0].family_name, "Doe");
    assert_eq!(rows[0].phone_number, "N/A");
    assert_eq!(rows[1].first_name, "N/A");
    assert_eq!(rows[1].phone_number, "555-0100");
    assert_eq!(
        app.pagination().status_text(),
        "Page 1 of 3 (Total Patients: 23)"
    );
}
