use crate::config::Config;
use crate::live::LiveConnector;
use crate::server::routes::live::LiveSessions;
use crate::server::routes::{admin, live, site};
use crate::site::{AdminCredentials, AdminGate, AdminSessions, SiteSettings, SnapshotCache};
use crate::store::Store;

use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue, Method, StatusCode, Version, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use base64::Engine as _;
use rand::RngCore;
use std::time::Instant;
use std::{sync::Arc, time::Duration};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

#[derive(Clone)]
pub struct NylahState {
    pub snapshot: SnapshotCache,
    pub credentials: Arc<AdminCredentials>,
    pub admin_sessions: AdminSessions,
    /// Unarmed gate cloned for every browser connection.
    pub gate: AdminGate,
    pub live_cfg: Arc<crate::config::LiveConfig>,
    pub connector: Arc<dyn LiveConnector>,
    pub live_sessions: LiveSessions,
    pub cors_origin: Option<HeaderValue>,
}

impl NylahState {
    pub fn new(cfg: &Config, store: Store, connector: Arc<dyn LiveConnector>) -> Self {
        let defaults = SiteSettings::defaults(&cfg.live.default_instructions);
        let snapshot = SnapshotCache::new(
            store,
            defaults,
            Duration::from_secs(cfg.store.cache_ttl_secs),
        );

        let cors_origin = cfg.basic.cors_allow_origin.as_deref().and_then(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| warn!(origin, "ignoring invalid basic.cors_allow_origin"))
                .ok()
        });

        Self {
            snapshot,
            credentials: Arc::new(AdminCredentials::from_config(&cfg.admin)),
            admin_sessions: AdminSessions::new(Duration::from_secs(cfg.admin.session_ttl_secs)),
            gate: AdminGate::from_config(&cfg.admin),
            live_cfg: Arc::new(cfg.live.clone()),
            connector,
            live_sessions: LiveSessions::default(),
            cors_origin,
        }
    }

    pub fn store(&self) -> &Store {
        self.snapshot.store()
    }
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(generate_request_id, str::to_string);

    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let path = uri.path();
    let protocol = format_http_version(version);

    // For the live WebSocket, latency is time-to-upgrade, not the session length.
    if status.is_server_error() {
        error!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else if status.is_client_error() {
        warn!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else {
        info!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    }

    resp
}

fn cors_layer(origin: Option<HeaderValue>) -> Option<CorsLayer> {
    origin.map(|origin| {
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    })
}

pub fn nylah_router(state: NylahState) -> Router {
    let cors = cors_layer(state.cors_origin.clone());

    let router = Router::new()
        .merge(site::router())
        .merge(admin::router(state.clone()))
        .route("/live/ws", get(live::live_ws))
        .fallback(not_found_handler)
        .with_state(state);

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };
    router.layer(middleware::from_fn(access_log))
}
