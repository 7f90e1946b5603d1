//! Mentor-booking payment initiation.
//!
//! Records intent durably (a pending booking row) before the user is sent to
//! the gateway checkout. Nothing is written locally until the gateway order
//! exists, so a pre-gateway failure leaves no orphaned rows.

use axum::extract::State;
use mongodb::bson::DateTime;
use platform_core::{error::AppError, extract::Json};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{BookingResponse, CreateBookingRequest, OrderResponse},
    middleware::AuthUser,
    models::{MentorBooking, TransactionStatus},
    startup::AppState,
};

/// Start a booking payment: catalog lookup, duplicate guard, gateway order,
/// pending row.
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    payload.validate()?;
    let email = user.require_email()?.to_string();

    tracing::info!(
        user_id = %user.id,
        mentor_id = %payload.mentor_id,
        amount = payload.amount,
        "Creating mentor booking order"
    );

    let mentor = state
        .repository
        .get_mentor(&payload.mentor_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Mentor not found")))?;

    // Duplicate guard. Best-effort only: not atomic with the insert below.
    // The paid-uniqueness index and the conditional update at verification
    // time are what actually hold the invariant.
    let already_booked = state
        .repository
        .has_paid_booking(&user.id, &payload.mentor_id, payload.session_date.as_deref())
        .await?;
    if already_booked {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "You already have a booking with this mentor at this time"
        )));
    }

    let receipt = format!(
        "booking_{}_{}",
        payload.mentor_id,
        chrono::Utc::now().timestamp_millis()
    );
    let notes = json!({
        "user_id": user.id.clone(),
        "mentor_id": payload.mentor_id.clone(),
        "mentor_name": mentor.name.clone(),
        "session_date": payload.session_date.clone(),
    });

    let order = state
        .razorpay
        .create_order(payload.amount, "INR", Some(receipt), Some(notes))
        .await
        .map_err(AppError::GatewayError)?;

    let now = DateTime::now();
    let booking = MentorBooking {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        mentor_id: payload.mentor_id,
        order_id: order.id.clone(),
        amount: payload.amount,
        currency: order.currency.clone(),
        session_date: payload.session_date,
        session_duration: payload.session_duration,
        notes: payload.notes,
        status: TransactionStatus::Pending,
        created_at: now,
        updated_at: now,
        paid_at: None,
    };

    state.repository.create_booking(booking).await.map_err(|e| {
        // The gateway order already exists; reconciliation against the
        // gateway's order list is a manual job.
        tracing::error!(
            order_id = %order.id,
            error = %e,
            "Failed to record booking after gateway order creation"
        );
        AppError::InternalError(anyhow::anyhow!("Failed to record booking"))
    })?;

    tracing::info!(order_id = %order.id, "Booking order created");

    Ok(Json(OrderResponse {
        order_id: order.id,
        amount: order.amount,
        currency: order.currency,
        key_id: state.razorpay.key_id().to_string(),
        item_name: mentor.name,
        user_email: email,
    }))
}

/// List the caller's bookings, newest first.
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = state.repository.list_bookings_for_user(&user.id).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}
