//! Outbound requests to the Graph API.
//!
//! The ingestion pipeline never talks to the network. This module only backs
//! the reply/react conveniences on message events:
//!
//! ```rust,no_run
//! use whatsapp_webhook_rs::{Client, Event};
//!
//! # async fn example(event: Event) -> Result<(), whatsapp_webhook_rs::Error> {
//! let client = Client::new("YOUR_ACCESS_TOKEN").await?;
//!
//! if let Event::TextMessage(text) = &event {
//!     text.react(&client, "👍").await?;
//!     text.reply(&client, format!("You said: {}", text.text.body)).await?;
//! }
//! # Ok(()) }
//! ```
//!
//! Anything that implements [`Requester`] can stand in for [`Client`], which
//! is handy in tests.

use std::{future::Future, sync::Arc, time::Duration};

use reqwest::{
    Client as HttpClient, ClientBuilder as HttpClientBuilder, Method, StatusCode,
    header::{HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{Error, ServiceError},
    event::MessageEventBase,
    message::Text,
};

const DEFAULT_API_VERSION: &str = "22.0";

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

const USER_AGENT: &str = "whatsapp-webhook-rs/0.1 (Rust)";

/// Executes raw Graph API requests.
///
/// `path` is relative to the versioned API root (e.g.
/// `"106540352242922/messages"`). The returned bytes are the body of a
/// successful response.
pub trait Requester {
    fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;
}

/// A Graph API client authenticated with a bearer token.
///
/// Cheap to clone.
#[derive(Clone, Debug)]
pub struct Client {
    pub(crate) inner: Arc<InnerClient>,
}

#[derive(Debug)]
pub(crate) struct InnerClient {
    pub(crate) http_client: HttpClient,
    pub(crate) endpoint: Endpoint,
}

impl Client {
    /// Connects with default settings.
    ///
    /// # Example
    /// ```rust,no_run
    /// use whatsapp_webhook_rs::Client;
    ///
    /// # async fn example() {
    /// let client = Client::new("your_access_token").await.unwrap();
    /// # }
    /// ```
    pub async fn new(token: impl AsRef<str>) -> Result<Self, Error> {
        Self::builder().connect(token).await
    }

    /// Starts building a client with custom settings.
    ///
    /// # Example
    /// ```rust,no_run
    /// use std::time::Duration;
    /// use whatsapp_webhook_rs::Client;
    ///
    /// # async fn example() {
    /// let client = Client::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .api_version("v19.0")
    ///     .connect("your_token")
    ///     .await
    ///     .unwrap();
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

/// Builder for [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    http: HttpClientBuilder,
    api_version: String,
    base_url: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            http: HttpClientBuilder::new(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.http = self.http.timeout(duration);
        self
    }

    /// Sets the Graph API version (e.g. `"19.0"`). A leading `v` is ignored.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Overrides `https://graph.facebook.com`.
    ///
    /// Mostly useful to point the client at a mock server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Finishes building the client.
    ///
    /// Fails if the token cannot be used as a header value.
    pub async fn connect(self, token: impl AsRef<str>) -> Result<Client, Error> {
        let mut auth: HeaderValue = format!("Bearer {}", token.as_ref())
            .parse()
            .map_err(|err| Error::internal(format!("Invalid auth: {err}").into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http_client = self.http.default_headers(headers).build()?;
        Ok(Client {
            inner: Arc::new(InnerClient {
                http_client,
                endpoint: Endpoint::new(&self.base_url, &self.api_version),
            }),
        })
    }
}

/// Versioned API root.
#[derive(Clone, Debug)]
pub(crate) struct Endpoint {
    root: String,
}

impl Endpoint {
    fn new(base_url: &str, api_version: &str) -> Self {
        Self {
            root: format!(
                "{}/v{}",
                base_url.trim_end_matches('/'),
                api_version.trim_start_matches('v')
            ),
        }
    }

    pub(crate) fn join(&self, path: &str) -> String {
        format!("{}/{}", self.root, path.trim_start_matches('/'))
    }
}

/// A message accepted by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct SentMessage {
    /// The `wamid` of the new message.
    pub id: String,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    messages: Vec<SentMessageId>,
}

#[derive(Deserialize)]
struct SentMessageId {
    id: String,
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<OutgoingContext<'a>>,
    #[serde(flatten)]
    content: OutgoingContent<'a>,
}

#[derive(Serialize)]
struct OutgoingContext<'a> {
    message_id: &'a str,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OutgoingContent<'a> {
    Text {
        text: &'a Text,
    },
    Reaction {
        reaction: OutgoingReaction<'a>,
    },
}

#[derive(Serialize)]
struct OutgoingReaction<'a> {
    message_id: &'a str,
    emoji: &'a str,
}

impl MessageEventBase {
    /// Replies to this message, quoting it.
    ///
    /// The reply is sent from the business number that received the message
    /// to the user who sent it.
    pub async fn reply<R>(&self, requester: &R, text: impl Into<Text>) -> Result<SentMessage, Error>
    where
        R: Requester + ?Sized,
    {
        let text = text.into();
        let message = OutgoingMessage {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: &self.from,
            context: Some(OutgoingContext {
                message_id: &self.message_id,
            }),
            content: OutgoingContent::Text { text: &text },
        };

        self.send(requester, &message).await
    }

    /// Reacts to this message with `emoji`. An empty emoji removes a
    /// previous reaction.
    pub async fn react<R>(&self, requester: &R, emoji: &str) -> Result<SentMessage, Error>
    where
        R: Requester + ?Sized,
    {
        let message = OutgoingMessage {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: &self.from,
            context: None,
            content: OutgoingContent::Reaction {
                reaction: OutgoingReaction {
                    message_id: &self.message_id,
                    emoji,
                },
            },
        };

        self.send(requester, &message).await
    }

    async fn send<R>(&self, requester: &R, message: &OutgoingMessage<'_>) -> Result<SentMessage, Error>
    where
        R: Requester + ?Sized,
    {
        let path = format!("{}/messages", self.phone_number.id);
        let body = serde_json::to_value(message)
            .map_err(|err| Error::internal(format!("Invalid message: {err}").into()))?;

        let response = requester.execute(Method::POST, &path, Some(body)).await?;

        let parsed: SendMessageResponse = serde_json::from_slice(&response).map_err(|err| {
            ServiceError::parse(err.into(), String::from_utf8_lossy(&response).into_owned())
                .service(path.as_str(), StatusCode::OK)
        })?;

        parsed
            .messages
            .into_iter()
            .next()
            .map(|sent| SentMessage { id: sent.id })
            .ok_or_else(|| {
                ServiceError::parse(
                    "no message in response".into(),
                    String::from_utf8_lossy(&response).into_owned(),
                )
                .service(path, StatusCode::OK)
                .into()
            })
    }
}
