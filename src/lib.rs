#![deny(clippy::future_not_send)]
#![cfg_attr(nightly_rust, feature(impl_trait_in_assoc_type))]

//! # whatsapp_webhook_rs
//!
//! Typed ingestion of WhatsApp Business Platform webhooks.
//!
//! The platform delivers every notification as one polymorphic JSON envelope:
//! a list of account-scoped entries, each carrying a list of changes tagged by a
//! `field` discriminator. This crate turns that envelope into strongly-typed
//! [`Event`]s and fans them out to the callbacks you subscribed on an
//! [`EventManager`].
//!
//! ## ✨ Features
//!
//! - **Envelope decoding** with structural validation ([`payload`]).
//! - **Change classification**: a discriminator → schema table that re-decodes
//!   each change into its precise type, skipping unknown categories so new
//!   platform features never break older integrations ([`change`]).
//! - **Message/status normalization** into one event per delivery update or
//!   inbound message ([`event`]).
//! - **In-process publish/subscribe** with ordered, synchronous fan-out
//!   ([`publisher`]).
//! - **Webhook endpoint**: challenge verification (GET) and ingestion (POST),
//!   either as a managed [`Server`] or as a [`WebhookService`] you mount in your
//!   own router.
//! - **Reply/React helpers** on message events through the [`Requester`]
//!   collaborator ([`Client`] is the HTTP implementation).
//!
//! ## 🚀 Examples
//!
//! ### Subscribe and serve
//! ```rust,no_run
//! use whatsapp_webhook_rs::{Event, EventManager, EventType, Server};
//!
//! # async fn example() -> Result<(), whatsapp_webhook_rs::Error> {
//! let mut events = EventManager::new();
//! events.subscribe(EventType::TextMessage, |event: &Event| {
//!     if let Event::TextMessage(text) = event {
//!         println!("{} says {}", text.base.sender_name, text.text.body);
//!     }
//! });
//!
//! Server::builder()
//!     .endpoint("127.0.0.1:8080".parse().unwrap())
//!     .route("/webhook")
//!     .verify_token("my-verify-token")
//!     .build()
//!     .serve(events)
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! ---
//!
//! ### Process a payload without HTTP
//! ```rust
//! use whatsapp_webhook_rs::{EventManager, process_payload};
//!
//! let body = br#"{"object": "whatsapp_business_account", "entry": []}"#;
//! let report = process_payload(body, &EventManager::new()).unwrap();
//! assert_eq!(report.published, 0);
//! ```

#[macro_use]
mod rest;
pub mod change;
pub mod client;
pub mod error;
pub mod event;
pub mod message;
pub mod payload;
pub mod publisher;
#[cfg(feature = "server")]
pub mod server;
pub mod webhook_service;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub use client::{Client, Requester};
pub use error::Error;
pub use event::{Event, EventType};
pub use publisher::EventManager;
pub use rest::process::{ProcessReport, process_envelope, process_payload};
#[cfg(feature = "server")]
pub use server::{Server, WebhookConfig};
pub use webhook_service::WebhookService;

/// The `object` value every WhatsApp Business Account notification carries.
pub const WHATSAPP_BUSINESS_ACCOUNT: &str = "whatsapp_business_account";

/// Represents an error reported by Meta's platform.
///
/// The same shape shows up in API error responses, in failed delivery statuses
/// and on inbound messages the platform could not render.
///
/// # Example (from a failed status)
/// ```json
/// {
///   "code": 131050,
///   "title": "Unable to deliver the message",
///   "message": "Unable to deliver the message",
///   "error_data": { "details": "The recipient opted out of marketing messages." }
/// }
/// ```
#[derive(thiserror::Error, Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[non_exhaustive]
pub struct MetaError {
    #[serde(default)]
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fbtrace_id: Option<String>,
    #[serde(rename = "href", default, skip_serializing_if = "Option::is_none")]
    pub support: Option<String>,
    #[serde(
        rename = "error_data",
        default,
        skip_serializing_if = "MetaErrorMetadata::is_none"
    )]
    pub error_metadata: MetaErrorMetadata,
}

impl fmt::Display for MetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(code: {})", self.code)?;

        if let Some(title) = &self.title {
            write!(f, " - {title}")?;
        }

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        if let Some(details) = &self.error_metadata.details {
            write!(f, " ({details})")?;
        }

        Ok(())
    }
}

/// Extra detail attached to a [`MetaError`].
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[non_exhaustive]
pub struct MetaErrorMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl MetaErrorMetadata {
    fn is_none(&self) -> bool {
        self.details.is_none()
    }
}

/// A timestamp sent by the WhatsApp Business Platform.
///
/// Webhooks carry UNIX timestamps (seconds since epoch), sometimes as JSON
/// numbers and sometimes as strings. Both encodings decode into this type.
#[derive(Serialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug, Default)]
#[serde(transparent)]
pub struct Timestamp {
    pub(crate) inner: i64,
}

impl Timestamp {
    /// Creates a timestamp from seconds since the UNIX epoch.
    pub const fn from_seconds(seconds: i64) -> Self {
        Self { inner: seconds }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        Self { inner: seconds }
    }

    /// Returns the raw timestamp in seconds.
    pub fn seconds(&self) -> i64 {
        self.inner
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        rest::deserialize_str::<i64, D>(deserializer).map(Timestamp::from_seconds)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<i64> for Timestamp {
    #[inline]
    fn from(seconds: i64) -> Self {
        Self::from_seconds(seconds)
    }
}
