// service/background_jobs.rs
use std::sync::Arc;
use tokio::time::{interval, Duration};

use crate::service::escrow_manager::EscrowManager;

/// Scheduled escrow-expiry sweep. The same sweep also runs opportunistically
/// on listing reads, so neither path is load-bearing on its own.
pub async fn start_escrow_expiry_job(escrow_manager: Arc<EscrowManager>, every_secs: u64) {
    let mut interval = interval(Duration::from_secs(every_secs));

    loop {
        interval.tick().await;

        match escrow_manager.sweep_expired().await {
            Ok(expired) => {
                if !expired.is_empty() {
                    tracing::info!("escrow expiry job: {} escrow(s) expired", expired.len());
                }
            }
            Err(e) => tracing::error!("escrow expiry job failed: {}", e),
        }
    }
}
