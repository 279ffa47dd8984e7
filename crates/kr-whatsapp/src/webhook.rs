//! Webhook endpoint for Kapso notifications
//!
//! The endpoint acknowledges every parseable delivery with `200 OK` so
//! Kapso never redelivers; only a body that is not a JSON object is
//! rejected.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::handler::MessageHandler;
use crate::types::{InboundNotification, SkipReason};

/// Acknowledgment body expected by Kapso
pub const ACK_BODY: &str = "OK";

/// Webhook server state
#[derive(Clone)]
pub struct WebhookState {
    pub handler: Arc<MessageHandler>,
}

/// Create the webhook router with the single POST route at `path`
pub fn create_webhook_router(state: WebhookState, path: &str) -> Router {
    Router::new()
        .route(path, post(handle_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Handle one Kapso webhook delivery
async fn handle_webhook(
    State(state): State<Arc<WebhookState>>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    info!("=== WEBHOOK RECEIVED ===");

    let notification = match parse_notification(&body) {
        Ok(Some(notification)) => notification,
        Ok(None) => {
            info!("Skipping notification: {}", SkipReason::Unrecognized);
            return (StatusCode::OK, ACK_BODY);
        }
        Err(e) => {
            warn!("Rejecting webhook body: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid payload");
        }
    };

    let outcome = state.handler.process_notification(&notification).await;
    debug!("Webhook outcome: {:?}", outcome);

    info!("=== WEBHOOK COMPLETE ===");
    (StatusCode::OK, ACK_BODY)
}

/// Parse the raw body, logging the pretty-printed payload at debug level.
///
/// Anything but a JSON object is an error. An object whose fields have
/// unexpected types yields `None` and is acknowledged without a reply.
fn parse_notification(body: &[u8]) -> crate::Result<Option<InboundNotification>> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| crate::WhatsAppError::InvalidPayload(e.to_string()))?;
    if !value.is_object() {
        return Err(crate::WhatsAppError::InvalidPayload(
            "expected a JSON object".to_string(),
        ));
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        debug!(
            "Payload: {}",
            serde_json::to_string_pretty(&value).unwrap_or_default()
        );
    }

    match serde_json::from_value(value) {
        Ok(notification) => Ok(Some(notification)),
        Err(e) => {
            warn!("Unrecognized notification shape: {}", e);
            Ok(None)
        }
    }
}
