use axum::{
    Router,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use nylah::config::StoreConfig;
use nylah::error::{IsRetryable, StoreError};
use nylah::store::{PostgrestStore, Store};
use nylah_schema::{AdminSettingsRow, QuoteRow};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

#[derive(Debug, Clone)]
struct Captured {
    method: Method,
    path: String,
    query: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

#[derive(Clone, Default)]
struct CaptureState {
    reqs: Arc<Mutex<Vec<Captured>>>,
}

async fn rest_handler(State(state): State<CaptureState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let body = to_bytes(body, usize::MAX)
        .await
        .expect("read request body")
        .to_vec();
    state.reqs.lock().unwrap().push(Captured {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().unwrap_or("").to_string(),
        headers: parts.headers.clone(),
        body,
    });

    match (parts.method, parts.uri.path()) {
        (Method::GET, "/rest/v1/bookings") => (
            StatusCode::OK,
            [("content-type", "application/json")],
            json!([
                {"id": 7, "date": "2026-05-04", "time": "10:00", "name": "Luis", "phone": null,
                 "created_at": "2026-05-01T12:00:00Z"}
            ])
            .to_string(),
        )
            .into_response(),
        (Method::GET, "/rest/v1/quotes") => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "relation \"quotes\" does not exist\n",
        )
            .into_response(),
        (Method::POST, _) => StatusCode::CREATED.into_response(),
        (Method::DELETE, _) => StatusCode::NO_CONTENT.into_response(),
        _ => (StatusCode::NOT_FOUND, Body::empty()).into_response(),
    }
}

async fn spawn_test_server(app: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let base = Url::parse(&format!("http://{}", addr)).expect("valid base url");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    base
}

async fn setup() -> (Store, CaptureState) {
    let state = CaptureState::default();
    let app = Router::new()
        .fallback(rest_handler)
        .with_state(state.clone());
    let base = spawn_test_server(app).await;

    let cfg = StoreConfig {
        url: Some(base),
        api_key: "anon-key".to_string(),
        ..StoreConfig::default()
    };
    let backend = PostgrestStore::new(&cfg).expect("store client");
    (Store::new(Arc::new(backend)), state)
}

fn take(state: &CaptureState) -> Vec<Captured> {
    std::mem::take(&mut *state.reqs.lock().unwrap())
}

#[tokio::test]
async fn select_sends_key_headers_and_ordering() {
    let (store, state) = setup().await;

    let bookings = store.list_bookings().await.expect("list bookings");
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].name, "Luis");
    assert_eq!(bookings[0].phone, "");

    let reqs = take(&state);
    assert_eq!(reqs.len(), 1);
    let req = &reqs[0];
    assert_eq!(req.method, Method::GET);
    assert_eq!(req.path, "/rest/v1/bookings");
    assert_eq!(req.query, "select=*&order=created_at.desc");
    assert_eq!(req.headers["apikey"], "anon-key");
    assert_eq!(req.headers["authorization"], "Bearer anon-key");
    assert!(
        req.headers["user-agent"]
            .to_str()
            .expect("ascii user agent")
            .starts_with("nylah/")
    );
}

#[tokio::test]
async fn writes_use_minimal_return_and_merge_on_conflict() {
    let (store, state) = setup().await;

    store
        .insert_quote(&QuoteRow {
            id: None,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            service_type: "mobile".to_string(),
            description: String::new(),
            created_at: None,
        })
        .await
        .expect("insert quote");

    store
        .upsert_settings(&AdminSettingsRow {
            id: 99,
            whatsapp_number: Some("56911112222".to_string()),
            ..AdminSettingsRow::default()
        })
        .await
        .expect("upsert settings");

    store.delete_all_services().await.expect("delete services");

    let reqs = take(&state);
    assert_eq!(reqs.len(), 3);

    let insert = &reqs[0];
    assert_eq!(insert.method, Method::POST);
    assert_eq!(insert.path, "/rest/v1/quotes");
    assert_eq!(insert.headers["prefer"], "return=minimal");
    let body: Value = serde_json::from_slice(&insert.body).expect("json body");
    assert_eq!(
        body,
        json!([{
            "name": "Ana",
            "email": "ana@example.com",
            "serviceType": "mobile",
            "description": ""
        }])
    );

    let upsert = &reqs[1];
    assert_eq!(upsert.path, "/rest/v1/admin_settings");
    assert_eq!(upsert.query, "on_conflict=id");
    assert_eq!(
        upsert.headers["prefer"],
        "resolution=merge-duplicates,return=minimal"
    );
    let body: Value = serde_json::from_slice(&upsert.body).expect("json body");
    assert_eq!(body[0]["id"], 1, "settings are always written to row 1");

    let delete = &reqs[2];
    assert_eq!(delete.method, Method::DELETE);
    assert_eq!(delete.path, "/rest/v1/services");
    assert_eq!(delete.query, "id=neq.0");
}

#[tokio::test]
async fn non_success_status_becomes_a_store_error() {
    let (store, _state) = setup().await;

    let err = store.list_quotes().await.expect_err("quotes should fail");
    match &err {
        StoreError::Status {
            table,
            status,
            body,
        } => {
            assert_eq!(*table, "quotes");
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "relation \"quotes\" does not exist");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn empty_service_list_skips_the_insert() {
    let (store, state) = setup().await;
    store.insert_services(&[]).await.expect("no-op insert");
    assert!(take(&state).is_empty());
}
