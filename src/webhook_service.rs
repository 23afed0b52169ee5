//! For "Bring Your Own Server" (BYOS) integrations.
//!
//! [`WebhookService`] is the endpoint logic without a listener: give it
//! `http` requests, get `http` responses back. It is `Clone`, `Send`, `Sync`
//! and `'static`, so it drops into any router's shared state.
//!
//! For a fully managed server, see the [`crate::server`] module.
//!
//! # Usage Example (with axum)
//!
//! ```rust,no_run
//! use axum::{Router, extract::Request, routing::any};
//! use whatsapp_webhook_rs::{Event, EventManager, EventType, WebhookService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut events = EventManager::new();
//!     events.subscribe(EventType::MessageRead, |event: &Event| {
//!         println!("read: {event:?}");
//!     });
//!
//!     // 1. Build the service
//!     let service = WebhookService::builder()
//!         .verify_token("my_secret_token")
//!         .verify_payload("my_app_secret")
//!         .build(events);
//!
//!     // 2. Mount it on your router (GET and POST on the same path)
//!     let app = Router::new().route(
//!         "/webhook",
//!         any(move |req: Request| async move { service.handle(req).await }),
//!     );
//!
//!     // 3. Run your server
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::Query,
    http::{Method, Request, Response, StatusCode},
    response::IntoResponse,
};
use tracing::warn;

use crate::{
    EventManager,
    rest::server::{AppSecret, InnerServer},
};

pub type Body = axum::body::Body;

/// A builder for creating a [`WebhookService`].
///
/// It does **not** configure server details like endpoint or shutdown signals.
#[derive(Debug, Default, Clone)]
#[must_use]
pub struct WebhookServiceBuilder {
    app_secret: Option<AppSecret>,
    verify_token: Option<String>,
}

impl WebhookServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifies `X-Hub-Signature-256` on POST bodies.
    ///
    /// See [`crate::server::ServerBuilder::verify_payload`] for details.
    pub fn verify_payload(mut self, app_secret: impl Into<String>) -> Self {
        self.app_secret = Some(AppSecret(app_secret.into()));
        self
    }

    /// Sets the verification token for the challenge-response handshake.
    pub fn verify_token(mut self, verify_token: impl Into<String>) -> Self {
        self.verify_token = Some(verify_token.into());
        self
    }

    /// Builds the service. Events from every request go to `events`.
    pub fn build(self, events: EventManager) -> WebhookService {
        WebhookService {
            inner: Arc::new(InnerServer {
                events,
                app_secret: self.app_secret,
                verify_token: self.verify_token,
            }),
        }
    }
}

/// A low-level service to handle WhatsApp webhook requests.
#[derive(Clone)]
pub struct WebhookService {
    inner: Arc<InnerServer>,
}

impl WebhookService {
    pub fn builder() -> WebhookServiceBuilder {
        WebhookServiceBuilder::new()
    }

    /// Handles one request.
    ///
    /// | Request | Response |
    /// |---|---|
    /// | GET, valid handshake | 200, the challenge |
    /// | GET, wrong mode or token, or no token configured | 400, `invalid token` |
    /// | POST, bad signature (when verifying) | 401 |
    /// | POST, unusable envelope | 400 |
    /// | POST, aborted processing | 500 |
    /// | POST, otherwise | 200, `Message received` |
    /// | anything else | 405 |
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Body>
    where
        B: Into<Body>,
    {
        let (parts, body) = req.map(Into::<Body>::into).into_parts();

        match parts.method {
            Method::GET => match Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
                Ok(Query(query)) => self.inner.verify(&query).into_response(),
                Err(rejection) => rejection.into_response(),
            },
            Method::POST => match axum::body::to_bytes(body, usize::MAX).await {
                Ok(body) => self.inner.ingest(&parts.headers, &body).into_response(),
                Err(err) => {
                    warn!(error = %err, "failed to read webhook body");
                    (StatusCode::BAD_REQUEST, "Failed to read request body").into_response()
                }
            },
            _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
        }
    }
}
