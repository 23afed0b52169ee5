use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::{
    borrow::Cow,
    collections::HashMap,
    fmt,
    future::{Ready, ready},
    sync::Arc,
};
use tracing::{debug, error, warn};

use crate::{
    EventManager,
    error::Error,
    rest::process::process_payload,
};

#[cfg(feature = "server")]
use crate::{
    Event,
    error::ProcessError,
    event::ReadyEvent,
    server::{Server, ServerBuilder},
};
#[cfg(feature = "server")]
use axum::{Router, routing::post};
#[cfg(feature = "server")]
use tokio::net::TcpListener;
#[cfg(feature = "server")]
use tracing::info;

pub(crate) type Reply = (StatusCode, Cow<'static, str>);

pub(crate) const ACKNOWLEDGED: &str = "Message received";

pub(crate) const INVALID_TOKEN: &str = "invalid token";

const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// App secret used to check `X-Hub-Signature-256`.
#[derive(Clone)]
pub(crate) struct AppSecret(pub(crate) String);

impl fmt::Debug for AppSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppSecret(..)")
    }
}

/// Internal shared state for the webhook logic.
/// This struct is used by both the high-level server and the low-level service.
pub(crate) struct InnerServer {
    pub(crate) events: EventManager,
    pub(crate) app_secret: Option<AppSecret>,
    pub(crate) verify_token: Option<String>,
}

impl InnerServer {
    /// Answers the subscription handshake.
    pub(crate) fn verify(&self, query: &HashMap<String, String>) -> Reply {
        let Some(expected) = &self.verify_token else {
            warn!("rejecting webhook verification: no verify token configured");
            return (StatusCode::BAD_REQUEST, INVALID_TOKEN.into());
        };

        let param = |name: &str| query.get(name).map(String::as_str).unwrap_or_default();

        if param("hub.mode") == "subscribe" && param("hub.verify_token") == expected {
            debug!("webhook verification succeeded");
            (StatusCode::OK, param("hub.challenge").to_owned().into())
        } else {
            warn!(mode = param("hub.mode"), "rejecting webhook verification");
            (StatusCode::BAD_REQUEST, INVALID_TOKEN.into())
        }
    }

    /// Runs a POST body through signature checking and the pipeline.
    pub(crate) fn ingest(&self, headers: &HeaderMap, body: &[u8]) -> Reply {
        if let Some(secret) = &self.app_secret {
            if let Err(reason) = verify_signature(secret, headers, body) {
                warn!(%reason, "rejecting webhook: signature verification failed");
                return (
                    StatusCode::UNAUTHORIZED,
                    "Signature verification failed".into(),
                );
            }
        }

        match process_payload(body, &self.events) {
            Ok(report) => {
                debug!(
                    published = report.published,
                    skipped = report.skipped_changes,
                    dropped_statuses = report.dropped_statuses,
                    change_errors = report.change_errors.len(),
                    "webhook processed"
                );
                (StatusCode::OK, ACKNOWLEDGED.into())
            }
            Err(Error::Payload(err)) => {
                warn!(error = %err, "rejecting webhook payload");
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid webhook payload. Please ensure the body is a valid envelope.".into(),
                )
            }
            Err(err) => {
                error!(error = %err, "webhook processing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process webhook event \
                     due to an internal server error. Check server logs for details."
                        .into(),
                )
            }
        }
    }
}

#[cfg(feature = "server")]
impl Server {
    pub(crate) async fn serve_inner(self, events: EventManager) -> Result<(), Error> {
        let ServerBuilder {
            endpoint,
            route_path,
            shutdown,
            app_secret,
            verify_token,
        } = self.config;

        let listener = TcpListener::bind(&endpoint).await?;
        let address = listener.local_addr()?;

        let state = Arc::new(InnerServer {
            events,
            app_secret,
            verify_token,
        });

        let app = Router::new()
            .route(&route_path, post(handle_webhook).get(handle_verification))
            .with_state(state.clone());

        info!(%address, path = %route_path, "webhook server listening");

        state
            .events
            .publish(&Event::Ready(ReadyEvent::now()))
            .map_err(ProcessError::from)?;

        let served = if let Some(shutdown) = shutdown {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
        } else {
            axum::serve(listener, app).await
        };

        info!(%address, "webhook server stopped");
        served.map_err(|err| Error::Network(err.into()))
    }
}

// Verification handler
pub(crate) fn handle_verification(
    State(state): State<Arc<InnerServer>>,
    Query(query): Query<HashMap<String, String>>,
) -> Ready<Reply> {
    ready(state.verify(&query))
}

// Webhook handler
#[inline]
pub(crate) fn handle_webhook(
    State(state): State<Arc<InnerServer>>,
    headers: HeaderMap,
    body: Bytes,
) -> Ready<Reply> {
    ready(state.ingest(&headers, &body))
}

// Signature verification
fn verify_signature(secret: &AppSecret, headers: &HeaderMap, body: &[u8]) -> Result<(), String> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .ok_or_else(|| "Missing X-Hub-Signature-256 header".to_owned())?
        .to_str()
        .map_err(|_| "Invalid signature header".to_owned())?;

    let expected_signature = sign(secret, body)?;

    // Use constant-time comparison to prevent timing attacks
    if subtle::ConstantTimeEq::ct_eq(signature.as_bytes(), expected_signature.as_bytes()).into() {
        Ok(())
    } else {
        Err(
            "Signature mismatch. This usually indicates an incorrect webhook secret or a tampered payload."
                .to_owned(),
        )
    }
}

/// `sha256=<hex hmac>` of `body`, as the platform sends it.
pub(crate) fn sign(secret: &AppSecret, body: &[u8]) -> Result<String, String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.0.as_bytes())
        .map_err(|_| "Invalid webhook secret".to_owned())?;

    mac.update(body);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}
