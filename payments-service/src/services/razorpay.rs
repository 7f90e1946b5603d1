//! Razorpay payment gateway client.
//!
//! Implements the Orders API used at initiation time and the checkout
//! signature check used at verification time. The signature is the sole
//! proof of payment this service consults.

use crate::config::RazorpayConfig;
use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    config: RazorpayConfig,
}

/// Request body for the gateway's order-creation endpoint.
#[derive(Debug, Serialize)]
pub struct GatewayOrderRequest {
    /// Amount in the smallest currency unit.
    pub amount: u64,
    pub currency: String,
    /// Receipt id for reconciliation against the gateway's order list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
    /// Audit payload identifying the user and catalog item, so the order is
    /// attributable even if the local record is lost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<serde_json::Value>,
}

/// Subset of the gateway order entity this service reads.
#[derive(Debug, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct GatewayErrorBody {
    pub error: GatewayErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct GatewayErrorDetail {
    pub code: String,
    pub description: String,
}

/// The `{order_id, payment_id, signature}` triple returned by checkout.
#[derive(Debug)]
pub struct PaymentVerification {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

impl RazorpayClient {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Whether gateway credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.config.key_id.is_empty() && !self.config.key_secret.expose_secret().is_empty()
    }

    /// Public key id handed to the client so it can open the checkout UI.
    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    /// Create a gateway order for `amount` minor units.
    pub async fn create_order(
        &self,
        amount: u64,
        currency: &str,
        receipt: Option<String>,
        notes: Option<serde_json::Value>,
    ) -> Result<GatewayOrder> {
        if !self.is_configured() {
            return Err(anyhow!("Razorpay credentials not configured"));
        }

        let request = GatewayOrderRequest {
            amount,
            currency: currency.to_string(),
            receipt,
            notes,
        };

        let url = format!("{}/orders", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "Razorpay create_order response");

        if status.is_success() {
            let order: GatewayOrder = serde_json::from_str(&body)?;
            tracing::info!(
                order_id = %order.id,
                amount = order.amount,
                currency = %order.currency,
                "Razorpay order created"
            );
            Ok(order)
        } else {
            let error: GatewayErrorBody =
                serde_json::from_str(&body).unwrap_or_else(|_| GatewayErrorBody {
                    error: GatewayErrorDetail {
                        code: "UNKNOWN".to_string(),
                        description: body.clone(),
                    },
                });
            tracing::error!(
                code = %error.error.code,
                description = %error.error.description,
                "Razorpay order creation failed"
            );
            Err(anyhow!(
                "Razorpay error: {} - {}",
                error.error.code,
                error.error.description
            ))
        }
    }

    /// Verify the checkout signature binding `{order_id}|{payment_id}` to the
    /// shared key secret.
    ///
    /// Computed as `HMAC-SHA256(key_secret, order_id + "|" + payment_id)`,
    /// hex-encoded, and compared in constant time.
    pub fn verify_payment_signature(&self, verification: &PaymentVerification) -> Result<bool> {
        let payload = format!("{}|{}", verification.order_id, verification.payment_id);

        let expected =
            compute_signature(self.config.key_secret.expose_secret(), &payload)?;

        let expected_bytes = expected.as_bytes();
        let supplied_bytes = verification.signature.as_bytes();

        if expected_bytes.len() != supplied_bytes.len() {
            return Ok(false);
        }

        let is_valid: bool = expected_bytes.ct_eq(supplied_bytes).into();

        if is_valid {
            tracing::info!(
                order_id = %verification.order_id,
                payment_id = %verification.payment_id,
                "Payment signature verified"
            );
        } else {
            tracing::warn!(
                order_id = %verification.order_id,
                payment_id = %verification.payment_id,
                "Payment signature verification failed"
            );
        }

        Ok(is_valid)
    }
}

/// Hex-encoded HMAC-SHA256 of `payload` under `secret`.
pub fn compute_signature(secret: &str, payload: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| anyhow!("Invalid key length"))?;
    mac.update(payload.as_bytes());
    let result = mac.finalize();
    Ok(hex::encode(result.into_bytes()))
}
