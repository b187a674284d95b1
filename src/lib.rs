pub mod config;
pub mod db;
pub mod dtos;
pub mod models;
pub mod service;
pub mod utils;

use std::sync::Arc;

use config::Config;
use db::db::DBClient;
use service::{
    contract_service::ContractService,
    dispute_service::DisputeService,
    escrow_manager::EscrowManager,
    milestone_service::MilestoneService,
    notification_service::NotificationService,
    payment_recorder::PaymentRecorder,
    refund_service::RefundService,
    wallet_ledger::WalletLedger,
};

/// All services wired with one injected datastore handle. No global
/// singletons; collaborators hold the Arc they need.
#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    // Services
    pub wallet_ledger: Arc<WalletLedger>,
    pub escrow_manager: Arc<EscrowManager>,
    pub milestone_service: Arc<MilestoneService>,
    pub contract_service: Arc<ContractService>,
    pub dispute_service: Arc<DisputeService>,
    pub payment_recorder: Arc<PaymentRecorder>,
    pub refund_service: Arc<RefundService>,
    pub notification_service: Arc<NotificationService>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);

        let notification_service = Arc::new(NotificationService::new(
            config.notification_webhook_url.clone(),
        ));
        let wallet_ledger = Arc::new(WalletLedger::new(db_client_arc.clone()));
        let escrow_manager = Arc::new(EscrowManager::new(db_client_arc.clone()));
        let payment_recorder = Arc::new(PaymentRecorder::new(db_client_arc.clone()));
        let contract_service = Arc::new(ContractService::new(db_client_arc.clone()));
        let refund_service = Arc::new(RefundService::new(db_client_arc.clone()));

        let milestone_service = Arc::new(MilestoneService::new(
            db_client_arc.clone(),
            notification_service.clone(),
            config.platform_fee_bps,
        ));

        let dispute_service = Arc::new(DisputeService::new(
            db_client_arc.clone(),
            notification_service.clone(),
        ));

        Self {
            env: config,
            db_client: db_client_arc,
            wallet_ledger,
            escrow_manager,
            milestone_service,
            contract_service,
            dispute_service,
            payment_recorder,
            refund_service,
            notification_service,
        }
    }
}
