//! CodePrep Server - HTTP front end for code execution and grading.

use clap::Parser;
use codeprep::api::{router, AppState};
use codeprep::config::{validate_config, Config};
use codeprep::sandbox::Orchestrator;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

// ---- CLI ----

#[derive(Parser)]
#[command(name = "codeprep-server", version = codeprep::VERSION, about = "CodePrep execution server")]
struct Args {
    /// Bind address (overrides config)
    #[arg(long, env = "CODEPREP_BIND")]
    bind: Option<String>,

    /// Port (overrides config)
    #[arg(long, short, env = "CODEPREP_PORT")]
    port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long, env = "CODEPREP_LOG_JSON")]
    log_json: bool,
}

// ---- Main ----

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,codeprep=debug".into());
    if args.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut config = Config::from_env()?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let validation = validate_config(&config);
    for issue in &validation.warnings {
        warn!("Config: {}", issue);
    }
    if !validation.valid {
        let errors: Vec<String> = validation.errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Invalid configuration: {}", errors.join("; "));
    }

    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
    if orchestrator.has_sandbox() {
        info!("Judge backend enabled with local fallback");
    } else {
        info!("No judge configured; executing locally");
    }

    let app = router(AppState::new(orchestrator.clone(), &config.server));

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    info!("CodePrep listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    orchestrator.shutdown().await;
    Ok(())
}
