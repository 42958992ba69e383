//! Cashout server binary

use anyhow::Context;
use cashout_auth::TokenSigner;
use cashout_gateway::HttpPayoutGateway;
use cashout_server::{create_router, AppConfig, AppState};
use cashout_store::{InMemoryWithdrawalStore, SqliteWithdrawalStore, WithdrawalStore};
use cashout_workflow::WithdrawalWorkflow;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cashout")]
#[command(about = "Withdrawal intake and payout service", long_about = None)]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Listen port, overrides PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
        }
        // A missing ./.env is fine
        None => {
            dotenvy::dotenv().ok();
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cashout=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(port) = cli.port {
        config.app_port = port;
    }

    let store: Arc<dyn WithdrawalStore> = if config.uses_memory_store() {
        tracing::warn!("Using in-memory store; withdrawals are lost on restart");
        Arc::new(InMemoryWithdrawalStore::new())
    } else {
        Arc::new(
            SqliteWithdrawalStore::connect(&config.database_url)
                .await
                .with_context(|| format!("Failed to open {}", config.database_url))?,
        )
    };

    let gateway = HttpPayoutGateway::new(config.gateway.clone())
        .context("Failed to build payout gateway client")?;

    tracing::info!(
        bank_codes = %config.workflow.bank_codes,
        list_scope = %config.workflow.list_scope,
        failure_policy = %config.workflow.failure_policy,
        test_mode = config.workflow.merchant.test_mode,
        "Payout settings"
    );
    for method in config.workflow.bank_codes.unmapped() {
        tracing::warn!(method = %method, "No bank code configured; these withdrawals cannot be paid out");
    }

    let signer = TokenSigner::new(
        &config.auth_secret,
        chrono::Duration::seconds(config.token_ttl_secs),
    )
    .context("Invalid token settings")?;

    let workflow = WithdrawalWorkflow::new(store, Arc::new(gateway), config.workflow.clone());
    let app = create_router(AppState::new(workflow, signer));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Cashout server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
