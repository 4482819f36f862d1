use contentblocks_server::config::ServerConfig;
use contentblocks_server::{router, AppState};
use contentblocks_storage::{ContentProvider, InMemoryProvider, PersistentProvider};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServerConfig::from_env()?;

    let provider: Arc<dyn ContentProvider> = match &cfg.data_dir {
        Some(dir) => match PersistentProvider::open(dir.clone()) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                warn!("persistent open failed, falling back to memory: {}", e);
                Arc::new(InMemoryProvider::new())
            }
        },
        None => Arc::new(InMemoryProvider::new()),
    };
    info!(mode = provider.mode(), "content provider ready");
    if !cfg.admin_ips.is_empty() {
        info!(allowlist = ?cfg.admin_ips, "writes restricted to admin addresses");
    }

    let app = router(AppState::new(provider).with_admin_ips(cfg.admin_ips.clone()))
        .into_make_service_with_connect_info::<SocketAddr>();

    info!("http listening on {}", cfg.http_addr);
    match &cfg.tls {
        Some(tls) => {
            let config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            axum_server::bind_rustls(cfg.http_addr, config)
                .serve(app)
                .await?;
        }
        None => {
            axum_server::bind(cfg.http_addr).serve(app).await?;
        }
    }
    Ok(())
}
