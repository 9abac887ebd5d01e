use crate::BoxError;
use crate::notify::Notifier;
use crate::subscribers::SubscriberStore;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use tokio::net::TcpListener;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64 HMAC-SHA256 of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

const GREETING: &str =
    "Thanks for adding the NNI predictor. You will receive a message for every new prediction.";
const ACKNOWLEDGMENT: &str = "Got it. You are on the prediction update list.";

/// Shared state of the webhook listener.
pub struct WebhookState {
    pub channel_secret: String,
    pub subscribers: Arc<SubscriberStore>,
    pub notifier: Notifier,
}

/// Vendor event envelope: a batch of events per delivery.
#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    #[serde(default)]
    events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,

    #[serde(rename = "replyToken", default)]
    reply_token: Option<String>,

    #[serde(default)]
    source: Option<EventSource>,
}

#[derive(Debug, Deserialize)]
struct EventSource {
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
}

/// Verify the vendor signature over the raw body.
///
/// The signature is the base64 encoding of HMAC-SHA256(channel secret, body).
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = BASE64.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Build the webhook router.
pub fn router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/webhook", post(receive_events))
        .with_state(state)
}

/// Run the webhook listener on its own address.
///
/// Spawned at startup as a long-lived background task, sharing the
/// subscriber store with the form request path.
pub async fn run(addr: &str, state: Arc<WebhookState>) -> Result<(), BoxError> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("webhook listener on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn receive_events(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !verify_signature(&state.channel_secret, &body, signature) {
        log::warn!("webhook request rejected: bad signature");
        return (StatusCode::BAD_REQUEST, "bad signature");
    }

    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            log::warn!("webhook request rejected: {}", e);
            return (StatusCode::BAD_REQUEST, "bad payload");
        }
    };

    for event in &envelope.events {
        match event.kind.as_str() {
            "follow" => handle_event(&state, event, GREETING).await,
            "message" => handle_event(&state, event, ACKNOWLEDGMENT).await,
            other => log::debug!("ignoring webhook event type '{}'", other),
        }
    }

    (StatusCode::OK, "OK")
}

/// Register the sender and reply. Both transitions are idempotent: re-adding
/// a known sender is a no-op on the subscriber set.
async fn handle_event(state: &WebhookState, event: &WebhookEvent, reply_text: &str) {
    if let Some(user_id) = event.source.as_ref().and_then(|s| s.user_id.as_deref()) {
        match state.subscribers.add(user_id) {
            Ok(true) => log::info!("new subscriber {}", user_id),
            Ok(false) => {}
            Err(e) => log::error!("could not persist subscriber {}: {}", user_id, e),
        }
    }

    if let Some(reply_token) = &event.reply_token {
        if let Err(e) = state.notifier.reply(reply_token, reply_text).await {
            log::warn!("reply failed: {}", e);
        }
    }
}

/// Compute the signature a vendor would attach to `body`.
pub fn sign_body(channel_secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_body_verifies() {
        let secret = "channel-secret";
        let body = br#"{"events":[]}"#;
        let signature = sign_body(secret, body);
        assert!(verify_signature(secret, body, &signature));
    }

    #[test]
    fn tampered_body_rejected() {
        let secret = "channel-secret";
        let signature = sign_body(secret, b"original");
        assert!(!verify_signature(secret, b"tampered", &signature));
    }

    #[test]
    fn wrong_secret_rejected() {
        let body = b"payload";
        let signature = sign_body("secret-a", body);
        assert!(!verify_signature("secret-b", body, &signature));
    }

    #[test]
    fn garbage_signature_rejected() {
        assert!(!verify_signature("secret", b"payload", "not base64 !!!"));
        assert!(!verify_signature("secret", b"payload", ""));
    }

    #[test]
    fn envelope_parses_vendor_shape() {
        let envelope: WebhookEnvelope = serde_json::from_str(
            r#"{"events":[{"type":"follow","replyToken":"rt-1","source":{"userId":"U1","type":"user"}}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.events.len(), 1);
        assert_eq!(envelope.events[0].kind, "follow");
        assert_eq!(envelope.events[0].reply_token.as_deref(), Some("rt-1"));
        assert_eq!(
            envelope.events[0]
                .source
                .as_ref()
                .unwrap()
                .user_id
                .as_deref(),
            Some("U1")
        );
    }
}
