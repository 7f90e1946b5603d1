//! Wire types for the payment endpoints. All payloads use camelCase field
//! names to match the web client.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{MentorBooking, ProjectPurchase, TransactionStatus};

fn default_session_duration() -> u32 {
    60
}

/// Request to start a mentor-session booking payment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub mentor_id: String,
    /// Charge amount in the smallest currency unit.
    #[validate(range(min = 1))]
    pub amount: u64,
    pub session_date: Option<String>,
    #[serde(default = "default_session_duration")]
    pub session_duration: u32,
    #[serde(default)]
    pub notes: String,
}

/// Request to start a project purchase.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseRequest {
    pub project_id: String,
    #[validate(range(min = 1))]
    pub amount: u64,
}

/// Everything the client needs to open the gateway checkout UI.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    pub amount: u64,
    pub currency: String,
    pub key_id: String,
    pub item_name: String,
    pub user_email: String,
}

/// Which transaction collection a verification call finalizes.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Booking,
    Purchase,
}

/// Checkout completion claim forwarded by the client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    #[serde(rename = "type")]
    pub kind: PaymentKind,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub status: TransactionStatus,
}

/// Download-gating answer for a project.
#[derive(Debug, Serialize)]
pub struct ProjectAccessResponse {
    pub purchased: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub mentor_id: String,
    pub order_id: String,
    pub amount: u64,
    pub currency: String,
    pub session_date: Option<String>,
    pub session_duration: u32,
    pub status: TransactionStatus,
    pub created_at: String,
}

impl From<MentorBooking> for BookingResponse {
    fn from(b: MentorBooking) -> Self {
        Self {
            id: b.id,
            mentor_id: b.mentor_id,
            order_id: b.order_id,
            amount: b.amount,
            currency: b.currency,
            session_date: b.session_date,
            session_duration: b.session_duration,
            status: b.status,
            created_at: b.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub id: String,
    pub project_id: String,
    pub order_id: String,
    pub amount: u64,
    pub currency: String,
    pub status: TransactionStatus,
    pub created_at: String,
}

impl From<ProjectPurchase> for PurchaseResponse {
    fn from(p: ProjectPurchase) -> Self {
        Self {
            id: p.id,
            project_id: p.project_id,
            order_id: p.order_id,
            amount: p.amount,
            currency: p.currency,
            status: p.status,
            created_at: p.created_at.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn verify_request_uses_type_discriminator() {
        let json = r#"{
            "orderId": "order_1",
            "paymentId": "pay_1",
            "signature": "abc",
            "type": "purchase"
        }"#;
        let req: VerifyPaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.kind, PaymentKind::Purchase);
        assert_eq!(req.order_id, "order_1");
    }

    #[test]
    fn verify_request_rejects_missing_fields() {
        let json = r#"{ "orderId": "order_1", "type": "booking" }"#;
        assert!(serde_json::from_str::<VerifyPaymentRequest>(json).is_err());
    }

    #[test]
    fn booking_request_defaults() {
        let json = r#"{ "mentorId": "m-1", "amount": 7500 }"#;
        let req: CreateBookingRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.session_duration, 60);
        assert_eq!(req.notes, "");
        assert!(req.session_date.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn zero_amount_fails_validation() {
        let json = r#"{ "projectId": "p-1", "amount": 0 }"#;
        let req: CreatePurchaseRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn order_response_is_camel_case() {
        let resp = OrderResponse {
            order_id: "order_1".to_string(),
            amount: 299900,
            currency: "INR".to_string(),
            key_id: "rzp_test_123".to_string(),
            item_name: "E-commerce Platform".to_string(),
            user_email: "student@example.com".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["orderId"], "order_1");
        assert_eq!(json["keyId"], "rzp_test_123");
        assert_eq!(json["userEmail"], "student@example.com");
    }
}
