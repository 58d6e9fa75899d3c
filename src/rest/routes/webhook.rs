// rest/routes/webhook.rs — Identity-provider webhook.
//
// Verifies the delivery signature before touching the store; a rejected or
// unverifiable delivery answers 400 and mutates nothing.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::error::ApiError;
use crate::identity::{self, events::WebhookEvent, verify};
use crate::AppContext;

pub async fn identity_webhook(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let Some(secret) = ctx.config.webhook_secret.as_deref() else {
        // Without the shared secret no delivery can be authenticated.
        return Err(ApiError::signature("webhook secret not configured"));
    };

    let sig_headers = verify::SignatureHeaders {
        id: header_str(&headers, "svix-id")?,
        timestamp: header_str(&headers, "svix-timestamp")?,
        signature: header_str(&headers, "svix-signature")?,
    };

    verify::verify(secret, sig_headers, &body).map_err(|e| ApiError::signature(format!("{e:#}")))?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::validation(format!("malformed event payload: {e}")))?;

    identity::apply_event(&ctx.storage, event)
        .await
        .map_err(|e| {
            error!("webhook event sync failed: {e:#}");
            ApiError::store(e)
        })?;

    Ok(Json(json!({ "message": "webhook processed" })))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::validation(format!("missing {name} header")))
}
