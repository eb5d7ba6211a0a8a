use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Path,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    dtos::payoutdtos::ApiResponse,
    error::{ErrorMessage, HttpError},
    models::paymentmodel::PaymentEvent,
    AppState,
};

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Public gateway callbacks.
pub fn payment_handler() -> Router {
    Router::new().route("/webhook", post(payment_webhook))
}

/// Admin-only payment maintenance.
pub fn admin_payment_handler() -> Router {
    Router::new().route("/:payment_id/replay", post(replay_payment))
}

pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);

    let expected_signature_hex = hex::encode(mac.finalize().into_bytes());

    ConstantTimeEq::ct_eq(
        signature.trim().as_bytes(),
        expected_signature_hex.as_bytes(),
    )
    .into()
}

/// Accepts the gateway's `payload.payment.entity` envelope or a flat event.
pub fn parse_payment_event(body: &[u8]) -> Result<PaymentEvent, HttpError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| HttpError::bad_request(format!("Invalid webhook payload: {}", e)))?;

    let entity = &value["payload"]["payment"]["entity"];
    if entity.is_object() {
        let field = |name: &str| entity[name].as_str().map(str::to_string);
        return Ok(PaymentEvent {
            payment_id: field("id").ok_or_else(|| HttpError::bad_request("Missing payment id"))?,
            order_id: field("order_id").ok_or_else(|| HttpError::bad_request("Missing order id"))?,
            status: field("status").ok_or_else(|| HttpError::bad_request("Missing payment status"))?,
            currency: field("currency"),
            method: field("method"),
        });
    }

    serde_json::from_value(value)
        .map_err(|e| HttpError::bad_request(format!("Invalid payment event: {}", e)))
}

pub async fn payment_webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| HttpError::bad_request("Missing payment signature header"))?;

    if !verify_signature(&body, signature, &app_state.env.payment_webhook_secret) {
        tracing::warn!("Invalid payment webhook signature received");
        return Err(HttpError::unauthorized(
            ErrorMessage::InvalidWebhookSignature.to_string(),
        ));
    }

    let event = parse_payment_event(&body)?;

    tracing::info!(
        "Payment webhook: order {} payment {} status {}",
        event.order_id,
        event.payment_id,
        event.status
    );

    let outcome = app_state.accrual_service.process_payment_event(&event).await?;

    Ok(Json(ApiResponse::success("Payment event processed", outcome)))
}

pub async fn replay_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let report = app_state.accrual_service.replay_payment(payment_id).await?;

    Ok(Json(ApiResponse::success("Payment fulfilment replayed", report)))
}
