//! Strongly-typed message components.
//!
//! Each inbound message carries exactly one type-specific object on the wire.
//! The types here are what that object becomes once it passed the checks a
//! component cannot exist without (a media id, a document filename, coordinates
//! on the globe). A failed check is a [`BuildError`].

use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::{
    Timestamp,
    error::BuildError,
    payload::{
        ButtonPayload, ButtonReplyPayload, IdentityPayload, ListReplyPayload, LocationPayload,
        MediaPayload, OrderPayload, ProductItemPayload, ReactionPayload, TextPayload,
    },
};

/// Text content
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[non_exhaustive]
pub struct Text {
    /// Message text content
    pub body: String,
}

impl Text {
    #[inline]
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.body
    }
}

impl<S: Into<String>> From<S> for Text {
    #[inline]
    fn from(value: S) -> Self {
        Self::new(value)
    }
}

impl From<TextPayload> for Text {
    fn from(value: TextPayload) -> Self {
        Self { body: value.body }
    }
}

/// Which kind of media a [`Media`] is.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Document,
    Sticker,
}

impl MediaKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Document => "document",
            Self::Sticker => "sticker",
        }
    }
}

/// Media message content.
///
/// Used for images, audio, video, documents, and stickers. The file itself
/// stays on Meta's servers; `id` is what you download it by.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[non_exhaustive]
pub struct Media {
    pub kind: MediaKind,
    /// WhatsApp media id
    pub id: String,
    pub mime_type: String,
    pub sha256: String,
    /// Optional description text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Always present for documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Audio recorded as a voice note
    #[serde(default)]
    pub voice: bool,
    /// Animated sticker
    #[serde(default)]
    pub animated: bool,
}

impl Media {
    /// Builds a media component of `kind` from its wire payload.
    ///
    /// Every media needs an id; documents also need a filename.
    pub fn build(kind: MediaKind, payload: MediaPayload) -> Result<Self, BuildError> {
        if payload.id.is_empty() {
            return Err(BuildError::MissingField {
                kind: kind.as_str(),
                field: "id",
            });
        }

        let filename = payload.filename.filter(|name| !name.is_empty());
        if kind == MediaKind::Document && filename.is_none() {
            return Err(BuildError::MissingField {
                kind: kind.as_str(),
                field: "filename",
            });
        }

        Ok(Self {
            kind,
            id: payload.id,
            mime_type: payload.mime_type,
            sha256: payload.sha256,
            caption: payload.caption,
            filename,
            url: payload.url,
            voice: payload.voice,
            animated: payload.animated,
        })
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        self.kind == MediaKind::Document
    }
}

/// A physical location shared by a user.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[non_exhaustive]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
}

impl Location {
    /// Creates a location, rejecting coordinates that are not on the globe.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, BuildError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(BuildError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
            name: None,
            address: None,
            url: None,
        })
    }

    #[inline]
    pub fn name(mut self, location_name: impl Into<String>) -> Self {
        self.name = Some(location_name.into());
        self
    }

    #[inline]
    pub fn address(mut self, location_address: impl Into<String>) -> Self {
        self.address = Some(location_address.into());
        self
    }
}

impl TryFrom<LocationPayload> for Location {
    type Error = BuildError;

    fn try_from(value: LocationPayload) -> Result<Self, Self::Error> {
        let mut location = Location::new(value.latitude, value.longitude)?;
        location.name = value.name;
        location.address = value.address;
        location.url = value.url;
        Ok(location)
    }
}

/// An emoji reaction to a message the business sent.
///
/// An empty `emoji` means the user removed their reaction.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[non_exhaustive]
pub struct Reaction {
    /// The message reacted to
    pub message_id: String,
    pub emoji: String,
}

impl Reaction {
    #[inline]
    pub fn is_removal(&self) -> bool {
        self.emoji.is_empty()
    }
}

impl TryFrom<ReactionPayload> for Reaction {
    type Error = BuildError;

    fn try_from(value: ReactionPayload) -> Result<Self, Self::Error> {
        if value.message_id.is_empty() {
            return Err(BuildError::MissingField {
                kind: "reaction",
                field: "message_id",
            });
        }

        Ok(Self {
            message_id: value.message_id,
            emoji: value.emoji,
        })
    }
}

/// A tap on a quick-reply button of a template message.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[non_exhaustive]
pub struct QuickReply {
    /// Button label as seen by the user
    pub text: String,
    /// Payload set on the button when the template was sent
    pub payload: String,
}

impl From<ButtonPayload> for QuickReply {
    fn from(value: ButtonPayload) -> Self {
        Self {
            text: value.text,
            payload: value.payload,
        }
    }
}

/// A choice made on an interactive reply-buttons message.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[non_exhaustive]
pub struct ReplyButton {
    /// Callback id set when the button was sent
    pub id: String,
    pub title: String,
}

impl TryFrom<ButtonReplyPayload> for ReplyButton {
    type Error = BuildError;

    fn try_from(value: ButtonReplyPayload) -> Result<Self, Self::Error> {
        if value.id.is_empty() {
            return Err(BuildError::MissingField {
                kind: "interactive",
                field: "button_reply.id",
            });
        }

        Ok(Self {
            id: value.id,
            title: value.title,
        })
    }
}

/// A row picked on an interactive list message.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[non_exhaustive]
pub struct ListReply {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TryFrom<ListReplyPayload> for ListReply {
    type Error = BuildError;

    fn try_from(value: ListReplyPayload) -> Result<Self, Self::Error> {
        if value.id.is_empty() {
            return Err(BuildError::MissingField {
                kind: "interactive",
                field: "list_reply.id",
            });
        }

        Ok(Self {
            id: value.id,
            title: value.title,
            description: value.description,
        })
    }
}

/// Product order message
///
/// Represents a cart sent by a user from a catalog.
#[doc(alias = "Cart")]
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[non_exhaustive]
pub struct Order {
    pub catalog_id: String,
    /// Ordered products
    pub products: Vec<OrderProduct>,
    /// An optional note the user attached to the order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Order {
    /// Sum of `quantity * unit_price` over products with a known price.
    pub fn total(&self) -> f64 {
        self.products
            .iter()
            .filter_map(|p| p.unit_price.map(|price| price * f64::from(p.quantity)))
            .sum()
    }
}

impl TryFrom<OrderPayload> for Order {
    type Error = BuildError;

    fn try_from(value: OrderPayload) -> Result<Self, Self::Error> {
        if value.catalog_id.is_empty() {
            return Err(BuildError::MissingField {
                kind: "order",
                field: "catalog_id",
            });
        }

        Ok(Self {
            catalog_id: value.catalog_id,
            products: value.product_items.into_iter().map(Into::into).collect(),
            note: value.text,
        })
    }
}

/// A single product item within an [`Order`].
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[non_exhaustive]
pub struct OrderProduct {
    pub product_retailer_id: String,
    pub quantity: u32,
    /// Price per unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    /// Currency code (e.g., "USD")
    pub currency: String,
}

impl From<ProductItemPayload> for OrderProduct {
    fn from(value: ProductItemPayload) -> Self {
        Self {
            product_retailer_id: value.product_retailer_id,
            quantity: value.quantity,
            unit_price: value.item_price,
            currency: value.currency,
        }
    }
}

/// Security code change details of a `customer_identity_changed` notice.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[non_exhaustive]
pub struct Identity {
    pub acknowledged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    pub hash: String,
}

impl From<IdentityPayload> for Identity {
    fn from(value: IdentityPayload) -> Self {
        Self {
            acknowledged: value.acknowledged,
            created_at: value.created_timestamp,
            hash: value.hash,
        }
    }
}

/// A contact card shared by a user.
///
/// The same shape is used on the wire and in events.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[non_exhaustive]
pub struct ContactCard {
    #[serde(default)]
    pub name: ContactName,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<ContactPhone>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<ContactEmail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<ContactUrl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<ContactAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<ContactOrg>,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[non_exhaustive]
pub struct ContactName {
    #[serde(default)]
    pub formatted_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[non_exhaustive]
pub struct ContactPhone {
    #[serde(default)]
    pub phone: String,
    /// `CELL`, `MAIN`, `IPHONE`, `HOME` or `WORK`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Set when the number is on WhatsApp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wa_id: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct ContactEmail {
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct ContactUrl {
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[non_exhaustive]
pub struct ContactAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct ContactOrg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}
