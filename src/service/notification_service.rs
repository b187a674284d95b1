// service/notification_service.rs
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Fire-and-forget emission point toward the external notification
/// collaborator. Delivery is never allowed to fail a settlement: every
/// emit spawns a task and only logs the outcome.
#[derive(Debug, Clone)]
pub struct NotificationService {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct NotificationEvent {
    kind: &'static str,
    recipients: Vec<Uuid>,
    payload: JsonValue,
}

impl NotificationService {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    fn emit(&self, kind: &'static str, recipients: Vec<Uuid>, payload: JsonValue) {
        let event = NotificationEvent {
            kind,
            recipients,
            payload,
        };

        let Some(url) = self.webhook_url.clone() else {
            tracing::debug!("notification webhook not configured, dropping {} event", kind);
            return;
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&event).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!("delivered {} notification", event.kind);
                }
                Ok(resp) => {
                    tracing::warn!(
                        "notification collaborator rejected {} event: {}",
                        event.kind,
                        resp.status()
                    );
                }
                Err(e) => {
                    tracing::warn!("failed to deliver {} notification: {}", event.kind, e);
                }
            }
        });
    }

    pub fn notify_dispute_opened(
        &self,
        dispute_id: Uuid,
        contract_id: Uuid,
        raised_by: Uuid,
        counterparty: Uuid,
    ) {
        self.emit(
            "dispute_opened",
            vec![counterparty],
            serde_json::json!({
                "dispute_id": dispute_id,
                "contract_id": contract_id,
                "raised_by": raised_by,
                "notify_admins": true,
            }),
        );
    }

    pub fn notify_dispute_assigned(&self, dispute_id: Uuid, admin_id: Uuid) {
        self.emit(
            "dispute_assigned",
            vec![admin_id],
            serde_json::json!({ "dispute_id": dispute_id }),
        );
    }

    pub fn notify_dispute_resolved(&self, dispute_id: Uuid, parties: Vec<Uuid>) {
        self.emit(
            "dispute_resolved",
            parties,
            serde_json::json!({ "dispute_id": dispute_id }),
        );
    }

    pub fn notify_milestone_approved(
        &self,
        milestone_id: Uuid,
        freelancer_id: Uuid,
        freelancer_amount: i64,
    ) {
        self.emit(
            "milestone_approved",
            vec![freelancer_id],
            serde_json::json!({
                "milestone_id": milestone_id,
                "freelancer_amount": freelancer_amount,
            }),
        );
    }
}
