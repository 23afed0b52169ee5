//! Managed webhook server.
//!
//! [`Server`] owns the listener, the route and the lifecycle. Hand it an
//! [`EventManager`] with your subscriptions and await it:
//!
//! ```rust,no_run
//! use whatsapp_webhook_rs::{Event, EventManager, EventType, Server, WebhookConfig};
//!
//! # async fn example() -> Result<(), whatsapp_webhook_rs::Error> {
//! let mut events = EventManager::new();
//! events.subscribe(EventType::TextMessage, |event: &Event| {
//!     if let Event::TextMessage(text) = event {
//!         println!("{} says {}", text.sender_name, text.text.body);
//!     }
//! });
//!
//! let config = WebhookConfig::from_env()?;
//! Server::builder()
//!     .from_config(config)
//!     .build()
//!     .serve(events)
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! For embedding into an existing router, see [`crate::webhook_service`].

use std::{
    env, fmt,
    future::Future,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    pin::Pin,
    sync::Arc,
};

use futures::FutureExt as _;
use serde::Deserialize;
use tokio::sync::Notify;

use crate::{EventManager, error::Error, rest::server::AppSecret};

// Default Server configuration...
const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ROUTE_PATH: &str = "/";

type Shutdown = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// WhatsApp webhook server
///
/// Create using [`Server::builder()`] or [`Server::new()`].
#[derive(Default)]
pub struct Server {
    pub(crate) config: ServerBuilder,
}

impl Server {
    /// Create a new server with default settings
    pub fn new() -> Self {
        ServerBuilder::new().build()
    }

    /// Create a server builder for custom configuration
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Prepares the server to publish into `events`.
    ///
    /// Nothing happens until the returned [`Serve`] is awaited. Once the
    /// listener is bound, a single [`Event::Ready`](crate::Event::Ready) is
    /// published before the first request is accepted.
    pub fn serve(self, events: EventManager) -> Serve {
        Serve {
            server: self,
            events,
        }
    }
}

/// A server about to run.
///
/// Implements `IntoFuture`: `.await` it (or call [`Serve::execute`]) to run
/// the server until its shutdown signal fires.
#[must_use = "Serve does nothing unless you `.await` or `.execute().await` it"]
pub struct Serve {
    server: Server,
    events: EventManager,
}

impl Serve {
    /// Returns a future that, when awaited, shuts the server down gracefully.
    ///
    /// Combines with any shutdown future set on the builder: whichever
    /// completes first stops the server.
    pub fn shutdown_trigger(&mut self) -> impl Future<Output = ()> + Send + 'static {
        let shutdown = Arc::new(Notify::new());
        let notified = shutdown.clone();

        let old_shutdown = self.server.config.shutdown.take();
        self.server.config.shutdown = Some(combine_shutdown(old_shutdown, async move {
            notified.notified().await;
        }));

        async move {
            shutdown.notify_one();
        }
    }
}

/// Completes when either future completes.
fn combine_shutdown<F>(old_shutdown: Option<Shutdown>, update_shutdown: F) -> Shutdown
where
    F: Future<Output = ()> + Send + 'static,
{
    match old_shutdown {
        Some(shutdown) => Box::pin(
            futures::future::select(shutdown, Box::pin(update_shutdown)).map(|_| ()),
        ),
        None => Box::pin(update_shutdown),
    }
}

IntoFuture! {
    impl Serve {
        /// Runs the server.
        ///
        /// Fails if the listener cannot be bound, if a subscriber rejects the
        /// ready event, or if the server stops with an error.
        pub fn execute(self) -> impl Future<Output = Result<(), Error>> + 'static {
            self.server.serve_inner(self.events)
        }
    }
}

/// Builder for creating a [`Server`]
///
/// # Example
/// ```rust
/// use whatsapp_webhook_rs::Server;
///
/// let server = Server::builder()
///     .endpoint("127.0.0.1:8080".parse().unwrap())
///     .route("/webhook")
///     .verify_token("my-verify-token")
///     .verify_payload("my-app-secret")
///     .build();
/// ```
#[must_use]
pub struct ServerBuilder {
    pub(crate) endpoint: SocketAddr,
    pub(crate) route_path: String,
    pub(crate) shutdown: Option<Shutdown>,
    pub(crate) app_secret: Option<AppSecret>,
    pub(crate) verify_token: Option<String>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            endpoint: SocketAddr::new(DEFAULT_HOST, DEFAULT_PORT),
            route_path: DEFAULT_ROUTE_PATH.to_owned(),
            shutdown: None,
            app_secret: None,
            verify_token: None,
        }
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("endpoint", &self.endpoint)
            .field("route_path", &self.route_path)
            .field("shutdown", &self.shutdown.is_some())
            .field("app_secret", &self.app_secret)
            .field("verify_token", &self.verify_token.as_ref().map(|_| ".."))
            .finish()
    }
}

impl ServerBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies everything in `config`.
    pub fn from_config(self, config: WebhookConfig) -> Self {
        let builder = self
            .endpoint(config.socket_addr())
            .route(config.path)
            .verify_token(config.verify_token);

        match config.app_secret {
            Some(app_secret) => builder.verify_payload(app_secret),
            None => builder,
        }
    }

    /// Sets the address to listen on. Defaults to `127.0.0.1:8080`.
    pub fn endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the path both handlers are mounted on. Defaults to `/`.
    pub fn route<P: Into<String>>(mut self, path: P) -> Self {
        self.route_path = path.into();
        self
    }

    /// Sets a future that stops the server gracefully when it completes.
    ///
    /// # Example
    /// ```rust,no_run
    /// use whatsapp_webhook_rs::server::ServerBuilder;
    ///
    /// let builder = ServerBuilder::new().shutdown(async {
    ///     let _ = tokio::signal::ctrl_c().await;
    /// });
    /// ```
    pub fn shutdown<F>(mut self, shutdown: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.shutdown = Some(Box::pin(shutdown));
        self
    }

    /// Rejects POST bodies whose `X-Hub-Signature-256` does not match the
    /// HMAC-SHA256 of the body under `app_secret` (HTTP 401).
    pub fn verify_payload(mut self, app_secret: impl Into<String>) -> Self {
        self.app_secret = Some(AppSecret(app_secret.into()));
        self
    }

    /// Sets the token the GET handshake must present.
    ///
    /// Without one, every handshake is rejected with 400.
    pub fn verify_token(mut self, verify_token: impl Into<String>) -> Self {
        self.verify_token = Some(verify_token.into());
        self
    }

    pub fn build(self) -> Server {
        Server { config: self }
    }
}

/// Webhook settings, loadable from the environment or any serde source.
///
/// | Field | Variable | Default |
/// |---|---|---|
/// | `verify_token` | `WHATSAPP_VERIFY_TOKEN` | required |
/// | `path` | `WHATSAPP_WEBHOOK_PATH` | `/` |
/// | `port` | `WHATSAPP_WEBHOOK_PORT` | `8080` |
/// | `host` | `WHATSAPP_WEBHOOK_HOST` | `127.0.0.1` |
/// | `app_secret` | `WHATSAPP_APP_SECRET` | none |
#[derive(Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct WebhookConfig {
    pub verify_token: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default)]
    pub app_secret: Option<String>,
}

fn default_path() -> String {
    DEFAULT_ROUTE_PATH.to_owned()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_host() -> IpAddr {
    DEFAULT_HOST
}

impl WebhookConfig {
    pub fn new(verify_token: impl Into<String>) -> Self {
        Self {
            verify_token: verify_token.into(),
            path: default_path(),
            port: DEFAULT_PORT,
            host: DEFAULT_HOST,
            app_secret: None,
        }
    }

    /// Reads the `WHATSAPP_*` variables.
    ///
    /// Fails with [`Error::Internal`] when the verify token is missing or
    /// empty, or when the port or host does not parse. Empty optional
    /// variables count as unset.
    pub fn from_env() -> Result<Self, Error> {
        let verify_token = var("WHATSAPP_VERIFY_TOKEN")
            .ok_or_else(|| Error::internal("WHATSAPP_VERIFY_TOKEN is not set".into()))?;

        let mut config = Self::new(verify_token);

        if let Some(path) = var("WHATSAPP_WEBHOOK_PATH") {
            config.path = path;
        }

        if let Some(port) = var("WHATSAPP_WEBHOOK_PORT") {
            config.port = port.parse().map_err(|err| {
                Error::internal(format!("Invalid WHATSAPP_WEBHOOK_PORT '{port}': {err}").into())
            })?;
        }

        if let Some(host) = var("WHATSAPP_WEBHOOK_HOST") {
            config.host = host.parse().map_err(|err| {
                Error::internal(format!("Invalid WHATSAPP_WEBHOOK_HOST '{host}': {err}").into())
            })?;
        }

        config.app_secret = var("WHATSAPP_APP_SECRET");

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("verify_token", &"..")
            .field("path", &self.path)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("app_secret", &self.app_secret.as_ref().map(|_| ".."))
            .finish()
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
