//! Moni Backend Server
//!
//! Public loan request intake plus the staff administration API. The binary
//! also carries the operational commands for migrations and seeding.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tokio::signal;

use moni_backend::app;
use moni_backend::auth::AuthService;
use moni_backend::config::Config;
use moni_backend::db;
use moni_backend::eligibility::HttpEligibilityChecker;
use moni_backend::loan_service::LoanService;
use moni_backend::routes;
use moni_backend::seed::{self, DefaultAccount, SeedOutcome};
use moni_backend::state::AppState;
use moni_backend::store::{PgLoanStore, PgUserStore};

#[derive(Parser)]
#[command(name = "moni-backend")]
#[command(about = "Loan request backend and administration API", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Default)]
enum Commands {
    /// Run migrations and serve the HTTP API
    #[default]
    Serve,

    /// Apply pending database migrations
    Migrate,

    /// Create the default admin and analyst accounts if missing
    SeedUsers,

    /// Create demo loan requests (local debug deployments only)
    SeedLoans,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Configuration loaded");

    let pool = db::create_pool(&config).await?;

    match cli.command.unwrap_or_default() {
        Commands::Serve => {
            db::run_migrations(&pool).await?;
            serve(config, pool).await?;
        }
        Commands::Migrate => db::run_migrations(&pool).await?,
        Commands::SeedUsers => {
            let users = PgUserStore::new(pool);
            let accounts = DefaultAccount::defaults(
                &config.default_admin_password,
                &config.default_analyst_password,
            );
            let created = seed::seed_default_users(&users, &accounts).await?;
            tracing::info!(created = created.len(), "Default accounts ensured");
        }
        Commands::SeedLoans => {
            let loans = PgLoanStore::new(pool);
            let mut rng = rand::thread_rng();
            match seed::seed_demo_loans(&loans, config.allows_demo_seeding(), &mut rng).await? {
                SeedOutcome::Created(count) => tracing::info!(count, "Demo loans created"),
                outcome => tracing::info!(?outcome, "Demo loans not created"),
            }
        }
    }

    Ok(())
}

async fn serve(config: Config, pool: PgPool) -> anyhow::Result<()> {
    let loan_service = Arc::new(LoanService::new(
        Arc::new(PgLoanStore::new(pool.clone())),
        Arc::new(
            HttpEligibilityChecker::new(&config.eligibility)
                .context("Failed to build the eligibility HTTP client")?,
        ),
    ));
    let auth_service = Arc::new(AuthService::new(
        Arc::new(PgUserStore::new(pool.clone())),
        config.jwt.clone(),
    ));

    let app = app::router(AppState::new(loan_service, auth_service))
        .merge(routes::health_routes(pool))
        .layer(app::configure_cors(config.cors_allowed_origins.as_deref()));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("HOST/PORT do not form a valid socket address")?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
