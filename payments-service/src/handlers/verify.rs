//! Payment verification: authenticate a checkout completion claim and
//! finalize exactly one transaction.
//!
//! The signature check is the sole authenticity gate; after it passes, the
//! pending -> paid transition is a single conditional update keyed on
//! (order_id, user_id, status = pending). Two concurrent calls for the same
//! order race on that update and only one can match.

use axum::extract::State;
use platform_core::{error::AppError, extract::Json};

use crate::{
    dtos::{PaymentKind, VerifyPaymentRequest, VerifyPaymentResponse},
    middleware::AuthUser,
    models::TransactionStatus,
    services::PaymentVerification,
    startup::AppState,
};

pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, AppError> {
    tracing::info!(
        user_id = %user.id,
        order_id = %payload.order_id,
        payment_id = %payload.payment_id,
        kind = ?payload.kind,
        "Verifying payment"
    );

    let verification = PaymentVerification {
        order_id: payload.order_id.clone(),
        payment_id: payload.payment_id.clone(),
        signature: payload.signature.clone(),
    };

    let is_valid = state
        .razorpay
        .verify_payment_signature(&verification)
        .map_err(|e| {
            tracing::error!(error = %e, "Signature verification error");
            AppError::InternalError(anyhow::anyhow!("Signature verification failed"))
        })?;

    if !is_valid {
        return Err(AppError::InvalidSignature);
    }

    let finalized = match payload.kind {
        PaymentKind::Booking => {
            state
                .repository
                .mark_booking_paid(&payload.order_id, &user.id)
                .await?
        }
        PaymentKind::Purchase => {
            state
                .repository
                .mark_purchase_paid(&payload.order_id, &user.id)
                .await?
        }
    };

    if !finalized {
        // Already paid, unknown order id, or another user's order. The
        // update matched zero rows, so this call must not report success.
        tracing::warn!(
            user_id = %user.id,
            order_id = %payload.order_id,
            kind = ?payload.kind,
            "No matching pending transaction for verified payment"
        );
        return Err(AppError::Conflict(anyhow::anyhow!(
            "No matching pending transaction for this order"
        )));
    }

    tracing::info!(
        order_id = %payload.order_id,
        kind = ?payload.kind,
        "Payment verified and transaction finalized"
    );

    Ok(Json(VerifyPaymentResponse {
        success: true,
        status: TransactionStatus::Paid,
    }))
}
