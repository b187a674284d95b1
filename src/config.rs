// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Platform cut in basis points (1000 = 10%).
    pub platform_fee_bps: i64,
    /// Interval for the scheduled escrow-expiry sweep.
    pub escrow_sweep_interval_secs: u64,
    /// Notification collaborator endpoint; notifications are dropped when
    /// unset.
    pub notification_webhook_url: Option<String>,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let platform_fee_bps = std::env::var("PLATFORM_FEE_BPS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse::<i64>()
            .expect("PLATFORM_FEE_BPS must be an integer");

        let escrow_sweep_interval_secs = std::env::var("ESCROW_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<u64>()
            .expect("ESCROW_SWEEP_INTERVAL_SECS must be an integer");

        let notification_webhook_url = std::env::var("NOTIFICATION_WEBHOOK_URL").ok();

        Config {
            database_url,
            platform_fee_bps,
            escrow_sweep_interval_secs,
            notification_webhook_url,
        }
    }
}
