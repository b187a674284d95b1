use std::sync::Arc;

use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::LevelFilter;

use gigpay::{config::Config, db::db::DBClient, service, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("connected to the database");

            // pool health monitor
            let max_connections = 20;
            let pool_for_monitoring = pool.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
                loop {
                    interval.tick().await;
                    let size = pool_for_monitoring.size();
                    let idle = pool_for_monitoring.num_idle();
                    tracing::debug!(
                        "pool status - active: {}, idle: {}, total: {}",
                        size - idle as u32,
                        idle,
                        size
                    );
                    if size >= max_connections * 8 / 10 {
                        tracing::warn!("connection pool at 80% capacity");
                    }
                }
            });

            pool
        }
        Err(err) => {
            tracing::error!("failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let db_client = DBClient::new(pool);
    let app_state = Arc::new(AppState::new(db_client, config.clone()));

    // scheduled escrow expiry sweep; the same sweep also runs on listing
    // reads
    let escrow_manager = app_state.escrow_manager.clone();
    tokio::spawn(service::background_jobs::start_escrow_expiry_job(
        escrow_manager,
        config.escrow_sweep_interval_secs,
    ));

    tracing::info!(
        "settlement engine running (platform fee {} bps)",
        config.platform_fee_bps
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutting down");
}
