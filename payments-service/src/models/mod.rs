use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Lifecycle of a booking or purchase.
///
/// `Pending` is the initial state set at order creation. `Paid` is terminal
/// and is only ever set by payment verification after the gateway signature
/// checks out. `Failed` exists for operator tooling; nothing in this service
/// transitions into it, and an abandoned checkout simply stays `Pending`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// Catalog entry for a mentor offering paid sessions. Read-only here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Mentor {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub title: String,
    pub company: String,
    /// Hourly rate in the smallest currency unit.
    pub hourly_rate: u64,
}

/// Catalog entry for a downloadable project. Read-only here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    /// Price in the smallest currency unit.
    pub price: u64,
}

/// One attempt by one user to pay for a mentor session.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MentorBooking {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub mentor_id: String,
    /// Gateway order id; unique across bookings and the verification join key.
    pub order_id: String,
    pub amount: u64,
    pub currency: String,
    pub session_date: Option<String>,
    pub session_duration: u32,
    pub notes: String,
    pub status: TransactionStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    /// Set exactly once, on the pending -> paid transition.
    pub paid_at: Option<DateTime>,
}

/// One attempt by one user to buy a project's source code.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProjectPurchase {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub order_id: String,
    pub amount: u64,
    pub currency: String,
    pub status: TransactionStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub purchased_at: Option<DateTime>,
}
