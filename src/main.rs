use mimalloc::MiMalloc;
use nylah::live::WsConnector;
use nylah::server::{NylahState, nylah_router};
use nylah::store::{PostgrestStore, Store};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &nylah::config::CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    if let Err(reason) = cfg.validate() {
        error!(%reason, "invalid configuration");
        return Err(reason.into());
    }

    info!(
        store_url = %cfg.store.url.as_ref().map_or("<none>", Url::as_str),
        proxy = %cfg.store.proxy.as_ref().map_or("<none>", Url::as_str),
        loglevel = %cfg.basic.loglevel,
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        live_model = %cfg.live.model,
        live_voice = %cfg.live.voice,
        admin_user = %cfg.admin.username,
    );
    if !cfg.live.has_credential() {
        warn!("[Live] no API key configured; the assistant will report NO_API_KEY");
    }

    let store = Store::new(Arc::new(PostgrestStore::new(&cfg.store)?));
    let connector = Arc::new(WsConnector::new(&cfg.live));

    let state = NylahState::new(cfg, store, connector);
    let live_sessions = state.live_sessions.clone();
    let app = nylah_router(state);

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    live_sessions.shutdown_all().await;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
