// models/paymentmodels.rs
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Reversed,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Paid,
    Void,
}

/// Immutable audit record of one fund movement. Funds have already moved by
/// the time this row is written; the row never moves funds itself.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub milestone_id: Option<Uuid>,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub amount: i64,
    pub platform_fee: i64,
    pub freelancer_amount: i64,
    pub reference: String,
    pub status: PaymentStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// A refund reverses this payment entirely only when it claws back the
    /// full net payout. Smaller refunds move their own amount and leave the
    /// payment completed.
    pub fn fully_reversed_by(&self, refund_amount: i64) -> bool {
        refund_amount == self.freelancer_amount
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub payment_id: Uuid,
    pub items: serde_json::Value,
    pub total: i64,
    pub status: InvoiceStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// Calendar-month scope for invoice numbering, e.g. "202608".
pub fn invoice_period(at: DateTime<Utc>) -> String {
    format!("{:04}{:02}", at.year(), at.month())
}

/// Human-readable invoice number: monthly period plus a monotonic suffix
/// handed out by the invoice_counters upsert.
pub fn format_invoice_number(period: &str, seq: i64) -> String {
    format!("INV-{}-{:04}", period, seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_invoice_period() {
        let at = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        assert_eq!(invoice_period(at), "202608");
        let jan = Utc.with_ymd_and_hms(2027, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(invoice_period(jan), "202701");
    }

    fn payment(amount: i64, platform_fee: i64) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            contract_id: Uuid::new_v4(),
            milestone_id: None,
            from_user_id: Uuid::new_v4(),
            to_user_id: Uuid::new_v4(),
            amount,
            platform_fee,
            freelancer_amount: amount - platform_fee,
            reference: "GPY_TEST".to_string(),
            status: PaymentStatus::Completed,
            created_at: None,
        }
    }

    #[test]
    fn test_partial_refund_does_not_reverse_payment() {
        // 400.00 settled at 10% fee nets the freelancer 360.00; a 100.00
        // refund claws back only its own amount
        let p = payment(40_000, 4_000);
        assert!(!p.fully_reversed_by(10_000));
        assert!(!p.fully_reversed_by(35_999));
        assert!(p.fully_reversed_by(36_000));
    }

    #[test]
    fn test_format_invoice_number() {
        assert_eq!(format_invoice_number("202608", 1), "INV-202608-0001");
        assert_eq!(format_invoice_number("202608", 42), "INV-202608-0042");
        assert_eq!(format_invoice_number("202612", 12345), "INV-202612-12345");
    }
}
