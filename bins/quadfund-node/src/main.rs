//! quadfund node
//!
//! Serves the project, vote and moderation API over HTTP. Projects live in
//! Supabase when configured, in process memory otherwise.

use anyhow::{Context, Result};
use clap::Parser;
use quadfund_server::{build_router, AppState};
use quadfund_store::{create_store, BackendChoice, CircuitBreakerConfig, StoreConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "quadfund-node")]
#[command(about = "quadfund API server - quadratic grant voting")]
struct Args {
    /// Listen address
    #[arg(long, env = "QUADFUND_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(short, long, env = "QUADFUND_PORT", default_value = "3000")]
    port: u16,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    supabase_anon_key: Option<String>,

    /// Preferred over the anon key when both are set
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    supabase_service_role_key: Option<String>,

    /// Project store: auto, supabase or memory
    #[arg(long, env = "STORE_BACKEND", default_value = "auto")]
    store_backend: BackendChoice,

    /// Keep projects in memory only, whatever else is configured
    #[arg(long, env = "DEVELOPMENT_MODE")]
    development_mode: bool,

    /// Timeout for one request to the project store
    #[arg(long, env = "STORE_TIMEOUT_SECS", default_value = "10")]
    store_timeout_secs: u64,

    /// Bearer token for admin routes
    #[arg(long, env = "ADMIN_API_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,quadfund_node=debug".into());
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);
    info!("Starting quadfund node");

    let store_config = StoreConfig {
        backend: args.store_backend,
        supabase_url: args.supabase_url.clone(),
        supabase_key: args
            .supabase_service_role_key
            .clone()
            .or_else(|| args.supabase_anon_key.clone()),
        development_mode: args.development_mode,
        request_timeout: Duration::from_secs(args.store_timeout_secs),
        breaker: CircuitBreakerConfig::default(),
    };
    let store = create_store(&store_config)?;
    info!("Project store: {}", store.backend_tag());

    if args.admin_token.is_none() {
        warn!("ADMIN_API_TOKEN not set: admin routes disabled, approval is open");
    }

    let state = Arc::new(AppState::new(store, args.admin_token.clone()));
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", args.host, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("API: http://{}", addr);
    info!("quadfund node running. Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down...");
        })
        .await?;

    info!("Stopped.");
    Ok(())
}
