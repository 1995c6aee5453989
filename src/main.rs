use pasarledger::disbursement::HttpDisburser;
use pasarledger::workflow::{PayoutService, ReconciliationService, SettlementService};
use pasarledger::{api, config::Config, db::init_db, Disburser, Repository};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let disburser: Arc<dyn Disburser> = match HttpDisburser::new(
        config.disbursement_api_url.clone(),
        Duration::from_millis(config.disbursement_timeout_ms),
    ) {
        Ok(d) => Arc::new(d),
        Err(e) => {
            eprintln!("Failed to build disbursement client: {}", e);
            std::process::exit(1);
        }
    };

    let settlement = Arc::new(SettlementService::new(repo.clone()));
    let payout = Arc::new(PayoutService::new(repo.clone(), disburser));
    let reconciliation = Arc::new(ReconciliationService::new(repo.clone()));

    // Create router
    let app = api::create_router(api::AppState {
        repo,
        settlement,
        payout,
        reconciliation,
    });

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
