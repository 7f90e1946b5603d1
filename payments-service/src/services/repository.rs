//! Store access for catalog lookups and transaction state.
//!
//! The pending -> paid transition is expressed as a single conditional
//! `update_one` whose filter requires `status = "pending"`; the caller learns
//! from `matched_count` whether it won the transition. This is the only
//! concurrency control in the service, so no method here ever does a
//! read-then-write pair to change status.

use crate::models::{Mentor, MentorBooking, Project, ProjectPurchase, TransactionStatus};
use anyhow::Result;
use futures::TryStreamExt;
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{bson::doc, Collection, Database, IndexModel};

#[derive(Clone)]
pub struct PaymentsRepository {
    mentors: Collection<Mentor>,
    projects: Collection<Project>,
    bookings: Collection<MentorBooking>,
    purchases: Collection<ProjectPurchase>,
}

impl PaymentsRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            mentors: db.collection("mentors"),
            projects: db.collection("projects"),
            bookings: db.collection("mentor_bookings"),
            purchases: db.collection("project_purchases"),
        }
    }

    /// Create the indexes the payment flow depends on.
    ///
    /// The unique `order_id` indexes back the verification join key. The
    /// partial unique indexes enforce at-most-one-paid per (user, item[,
    /// session]) at the store level, closing the initiation-time
    /// check-then-act window.
    pub async fn init_indexes(&self) -> Result<()> {
        let booking_order_idx = IndexModel::builder()
            .keys(doc! { "order_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("booking_order_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let booking_paid_idx = IndexModel::builder()
            .keys(doc! { "user_id": 1, "mentor_id": 1, "session_date": 1 })
            .options(
                IndexOptions::builder()
                    .name("booking_paid_unique_idx".to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "status": "paid" })
                    .build(),
            )
            .build();

        let booking_user_idx = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("booking_user_idx".to_string())
                    .build(),
            )
            .build();

        self.bookings
            .create_indexes([booking_order_idx, booking_paid_idx, booking_user_idx], None)
            .await?;

        let purchase_order_idx = IndexModel::builder()
            .keys(doc! { "order_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("purchase_order_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let purchase_paid_idx = IndexModel::builder()
            .keys(doc! { "user_id": 1, "project_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("purchase_paid_unique_idx".to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "status": "paid" })
                    .build(),
            )
            .build();

        let purchase_user_idx = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("purchase_user_idx".to_string())
                    .build(),
            )
            .build();

        self.purchases
            .create_indexes(
                [purchase_order_idx, purchase_paid_idx, purchase_user_idx],
                None,
            )
            .await?;

        tracing::info!("Payments service indexes initialized");
        Ok(())
    }

    pub async fn get_mentor(&self, id: &str) -> Result<Option<Mentor>> {
        let mentor = self.mentors.find_one(doc! { "_id": id }, None).await?;
        Ok(mentor)
    }

    pub async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let project = self.projects.find_one(doc! { "_id": id }, None).await?;
        Ok(project)
    }

    /// Single source-of-truth read for "has this user paid for this project".
    ///
    /// Both initiation's duplicate guard and the download-gating endpoint go
    /// through this method.
    pub async fn has_paid_purchase(&self, user_id: &str, project_id: &str) -> Result<bool> {
        let filter = doc! {
            "user_id": user_id,
            "project_id": project_id,
            "status": TransactionStatus::Paid.as_str(),
        };
        let existing = self.purchases.find_one(filter, None).await?;
        Ok(existing.is_some())
    }

    /// Paid-booking lookup scoped to a session date when one was given.
    pub async fn has_paid_booking(
        &self,
        user_id: &str,
        mentor_id: &str,
        session_date: Option<&str>,
    ) -> Result<bool> {
        let mut filter = doc! {
            "user_id": user_id,
            "mentor_id": mentor_id,
            "status": TransactionStatus::Paid.as_str(),
        };
        if let Some(date) = session_date {
            filter.insert("session_date", date);
        }
        let existing = self.bookings.find_one(filter, None).await?;
        Ok(existing.is_some())
    }

    pub async fn create_booking(&self, booking: MentorBooking) -> Result<()> {
        self.bookings.insert_one(booking, None).await?;
        Ok(())
    }

    pub async fn create_purchase(&self, purchase: ProjectPurchase) -> Result<()> {
        self.purchases.insert_one(purchase, None).await?;
        Ok(())
    }

    /// Atomically promote a pending booking to paid.
    ///
    /// Returns `true` only when this call matched the pending row; a repeat
    /// call, an unknown order id, or another user's order all match zero
    /// documents and return `false`.
    pub async fn mark_booking_paid(&self, order_id: &str, user_id: &str) -> Result<bool> {
        let now = mongodb::bson::DateTime::now();
        let filter = doc! {
            "order_id": order_id,
            "user_id": user_id,
            "status": TransactionStatus::Pending.as_str(),
        };
        let update = doc! {
            "$set": {
                "status": TransactionStatus::Paid.as_str(),
                "paid_at": now,
                "updated_at": now,
            }
        };
        let result = self.bookings.update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }

    /// Atomically promote a pending purchase to paid. Same contract as
    /// [`mark_booking_paid`](Self::mark_booking_paid).
    pub async fn mark_purchase_paid(&self, order_id: &str, user_id: &str) -> Result<bool> {
        let now = mongodb::bson::DateTime::now();
        let filter = doc! {
            "order_id": order_id,
            "user_id": user_id,
            "status": TransactionStatus::Pending.as_str(),
        };
        let update = doc! {
            "$set": {
                "status": TransactionStatus::Paid.as_str(),
                "purchased_at": now,
                "updated_at": now,
            }
        };
        let result = self.purchases.update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }

    /// List the caller's bookings, newest first.
    pub async fn list_bookings_for_user(&self, user_id: &str) -> Result<Vec<MentorBooking>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let cursor = self
            .bookings
            .find(doc! { "user_id": user_id }, Some(options))
            .await?;
        let bookings: Vec<MentorBooking> = cursor.try_collect().await?;
        Ok(bookings)
    }

    /// List the caller's purchases, newest first.
    pub async fn list_purchases_for_user(&self, user_id: &str) -> Result<Vec<ProjectPurchase>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let cursor = self
            .purchases
            .find(doc! { "user_id": user_id }, Some(options))
            .await?;
        let purchases: Vec<ProjectPurchase> = cursor.try_collect().await?;
        Ok(purchases)
    }
}
