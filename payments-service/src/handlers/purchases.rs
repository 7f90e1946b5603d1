//! Project-purchase payment initiation and download gating.

use axum::extract::{Path, State};
use mongodb::bson::DateTime;
use platform_core::{error::AppError, extract::Json};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{CreatePurchaseRequest, OrderResponse, ProjectAccessResponse, PurchaseResponse},
    middleware::AuthUser,
    models::{ProjectPurchase, TransactionStatus},
    startup::AppState,
};

/// Start a purchase: catalog lookup, duplicate guard, gateway order, pending
/// row.
pub async fn create_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePurchaseRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    payload.validate()?;
    let email = user.require_email()?.to_string();

    tracing::info!(
        user_id = %user.id,
        project_id = %payload.project_id,
        amount = payload.amount,
        "Creating project purchase order"
    );

    let project = state
        .repository
        .get_project(&payload.project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Project not found")))?;

    let already_purchased = state
        .repository
        .has_paid_purchase(&user.id, &payload.project_id)
        .await?;
    if already_purchased {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Project already purchased"
        )));
    }

    let receipt = format!(
        "project_{}_{}",
        payload.project_id,
        chrono::Utc::now().timestamp_millis()
    );
    let notes = json!({
        "user_id": user.id.clone(),
        "project_id": payload.project_id.clone(),
        "project_title": project.title.clone(),
    });

    let order = state
        .razorpay
        .create_order(payload.amount, "INR", Some(receipt), Some(notes))
        .await
        .map_err(AppError::GatewayError)?;

    let now = DateTime::now();
    let purchase = ProjectPurchase {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        project_id: payload.project_id,
        order_id: order.id.clone(),
        amount: payload.amount,
        currency: order.currency.clone(),
        status: TransactionStatus::Pending,
        created_at: now,
        updated_at: now,
        purchased_at: None,
    };

    state
        .repository
        .create_purchase(purchase)
        .await
        .map_err(|e| {
            tracing::error!(
                order_id = %order.id,
                error = %e,
                "Failed to record purchase after gateway order creation"
            );
            AppError::InternalError(anyhow::anyhow!("Failed to record purchase"))
        })?;

    tracing::info!(order_id = %order.id, "Purchase order created");

    Ok(Json(OrderResponse {
        order_id: order.id,
        amount: order.amount,
        currency: order.currency,
        key_id: state.razorpay.key_id().to_string(),
        item_name: project.title,
        user_email: email,
    }))
}

/// Download gate: has the caller paid for this project?
pub async fn project_access(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectAccessResponse>, AppError> {
    let purchased = state
        .repository
        .has_paid_purchase(&user.id, &project_id)
        .await?;
    Ok(Json(ProjectAccessResponse { purchased }))
}

/// List the caller's purchases, newest first.
pub async fn list_purchases(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<PurchaseResponse>>, AppError> {
    let purchases = state.repository.list_purchases_for_user(&user.id).await?;
    Ok(Json(
        purchases.into_iter().map(PurchaseResponse::from).collect(),
    ))
}
