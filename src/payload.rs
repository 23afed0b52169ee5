//! Wire schema of WhatsApp Business Account webhooks.
//!
//! The top of the payload is generic: an [`Envelope`] with [`Entry`]s that
//! carry [`Change`]s whose `value` is kept as opaque JSON. The
//! [`change`](crate::change) module re-decodes each value into one of the
//! schemas below, picked by the change's `field`.
//!
//! ```json
//! { "object": "whatsapp_business_account",
//!   "entry": [ { "id": "<account id>", "time": 1731616153,
//!       "changes": [ { "field": "messages", "value": { ... } } ] } ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    MetaError, Timestamp, WHATSAPP_BUSINESS_ACCOUNT,
    error::PayloadError,
    message::ContactCard,
    rest::{deserialize_str, deserialize_str_opt},
};

// --- Envelope ---

/// Top-level inbound payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Envelope {
    pub object: String,
    pub entry: Vec<Entry>,
}

impl Envelope {
    /// Decodes and validates a raw request body.
    ///
    /// Fails if the body is not JSON, if `object` or `entry` is missing, if
    /// `object` is not `whatsapp_business_account`, or if an entry has an
    /// empty account id. An empty `entry` list is valid.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        let envelope: Self = serde_json::from_slice(body)?;
        envelope.validate()?;
        Ok(envelope)
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.object != WHATSAPP_BUSINESS_ACCOUNT {
            return Err(PayloadError::UnexpectedObject(self.object.clone()));
        }

        if let Some(index) = self.entry.iter().position(|e| e.id.trim().is_empty()) {
            return Err(PayloadError::MissingAccountId { index });
        }

        Ok(())
    }
}

/// Notifications for one business account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Entry {
    /// The WhatsApp Business Account id.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Timestamp>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// A discriminator-tagged unit of data. `value` is decoded later.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Change {
    pub field: String,
    #[serde(default)]
    pub value: Value,
}

// --- messages ---

/// `value` of a `messages` change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct MessagesValue {
    #[serde(default)]
    pub messaging_product: String,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<SenderContact>,
    /// Raw [`Status`] objects, decoded one at a time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<Value>,
    /// Raw [`InboundMessage`] objects, decoded one at a time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<MetaError>,
}

impl MessagesValue {
    /// Display name of the first sender profile, or empty.
    pub fn sender_name(&self) -> &str {
        self.contacts
            .first()
            .map(|c| c.profile.name.as_str())
            .unwrap_or_default()
    }
}

/// The business phone number a notification was delivered to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    #[serde(default)]
    pub display_phone_number: String,
    pub phone_number_id: String,
}

/// Profile info about the user who wrote in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SenderContact {
    #[serde(default)]
    pub wa_id: String,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_key_hash: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
}

/// One delivery-lifecycle update for a message the business sent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Status {
    /// Id of the message this status is about.
    pub id: String,
    pub status: StatusKind,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub recipient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_identity_key_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biz_opaque_callback_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<Conversation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Pricing>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<MetaError>,
}

/// The `status` tag of a [`Status`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Sent,
    Delivered,
    Read,
    Failed,
    Undelivered,
    #[serde(untagged)]
    Other(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Conversation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_timestamp: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ConversationOrigin>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConversationOrigin {
    #[serde(rename = "type", default)]
    pub category: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct Pricing {
    #[serde(default)]
    pub billable: bool,
    #[serde(default)]
    pub pricing_model: String,
    #[serde(default)]
    pub category: String,
}

/// One inbound message.
///
/// `kind` tells which of the type-specific fields is populated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct InboundMessage {
    pub id: String,
    pub from: String,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<MessageContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral: Option<Referral>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<MetaError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<MediaPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<MediaPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker: Option<MediaPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<ContactCard>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<ButtonPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<InteractivePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<ReactionPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsupported: Option<UnsupportedPayload>,
}

/// The `type` tag of an [`InboundMessage`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Audio,
    Video,
    Document,
    Location,
    #[serde(alias = "contact")]
    Contacts,
    Sticker,
    Button,
    Interactive,
    Reaction,
    Order,
    System,
    Unsupported,
    Unknown,
    #[serde(untagged)]
    Other(String),
}

impl MessageType {
    /// The wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Document => "document",
            Self::Location => "location",
            Self::Contacts => "contacts",
            Self::Sticker => "sticker",
            Self::Button => "button",
            Self::Interactive => "interactive",
            Self::Reaction => "reaction",
            Self::Order => "order",
            Self::System => "system",
            Self::Unsupported => "unsupported",
            Self::Unknown => "unknown",
            Self::Other(other) => other,
        }
    }
}

/// Reply/forward context of an inbound message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct MessageContext {
    /// Id of the message being replied to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default)]
    pub forwarded: bool,
    #[serde(default)]
    pub frequently_forwarded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_product: Option<ReferredProduct>,
}

/// The product a user asked about from a catalog message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferredProduct {
    #[serde(default)]
    pub catalog_id: String,
    #[serde(default)]
    pub product_retailer_id: String,
}

/// Click-to-WhatsApp ad referral.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct Referral {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctwa_clid: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TextPayload {
    #[serde(default)]
    pub body: String,
}

/// Shared shape of image, audio, video, document and sticker payloads.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct MediaPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub voice: bool,
    #[serde(default)]
    pub animated: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LocationPayload {
    #[serde(deserialize_with = "deserialize_str")]
    pub latitude: f64,
    #[serde(deserialize_with = "deserialize_str")]
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A tap on a quick-reply button of a template message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ButtonPayload {
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct InteractivePayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_reply: Option<ButtonReplyPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_reply: Option<ListReplyPayload>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ButtonReplyPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListReplyPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `emoji` is absent when a reaction is removed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReactionPayload {
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub emoji: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrderPayload {
    #[serde(default)]
    pub catalog_id: String,
    #[serde(default)]
    pub product_items: Vec<ProductItemPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProductItemPayload {
    pub product_retailer_id: String,
    #[serde(deserialize_with = "deserialize_str")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "deserialize_str_opt")]
    pub item_price: Option<f64>,
    #[serde(default)]
    pub currency: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct SystemPayload {
    #[serde(default)]
    pub body: String,
    #[serde(rename = "type", default = "SystemKind::unknown")]
    pub kind: SystemKind,
    /// New WhatsApp id after a number change.
    #[serde(alias = "new_wa_id", default, skip_serializing_if = "Option::is_none")]
    pub wa_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SystemKind {
    UserChangedNumber,
    CustomerIdentityChanged,
    #[serde(untagged)]
    Other(String),
}

impl SystemKind {
    fn unknown() -> Self {
        Self::Other(String::new())
    }
}

/// Security code change details sent with `customer_identity_changed`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentityPayload {
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_timestamp: Option<Timestamp>,
    #[serde(default)]
    pub hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct UnsupportedPayload {
    #[serde(rename = "type", default)]
    pub kind: String,
}

// --- account-scope change values ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AccountAlertsValue {
    #[serde(default)]
    pub entity_type: String,
    pub entity_id: String,
    pub alert_info: AlertInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AlertInfo {
    pub alert_severity: AlertSeverity,
    #[serde(default)]
    pub alert_status: String,
    #[serde(default)]
    pub alert_type: String,
    #[serde(default)]
    pub alert_description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Informational,
    #[serde(untagged)]
    Other(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AccountUpdateValue {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waba_info: Option<WabaInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation_info: Option<ViolationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ban_info: Option<BanInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restriction_info: Option<Vec<RestrictionInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_client_certification_info: Option<PartnerClientCertificationInfo>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct WabaInfo {
    #[serde(default)]
    pub waba_id: String,
    #[serde(default)]
    pub owner_business_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_account_linked: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub solution_partner_business_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ViolationInfo {
    #[serde(default)]
    pub violation_type: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BanInfo {
    #[serde(default)]
    pub waba_ban_state: Vec<String>,
    #[serde(default)]
    pub waba_ban_date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct RestrictionInfo {
    #[serde(default)]
    pub restriction_type: String,
    #[serde(default)]
    pub expiration: Option<Timestamp>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct PartnerClientCertificationInfo {
    #[serde(default)]
    pub client_business_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub rejection_reasons: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountReviewValue {
    pub decision: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TemplateCategoryUpdateValue {
    #[serde(deserialize_with = "deserialize_str")]
    pub message_template_id: u64,
    #[serde(default)]
    pub message_template_name: String,
    #[serde(default)]
    pub message_template_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_category: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TemplateQualityUpdateValue {
    #[serde(deserialize_with = "deserialize_str")]
    pub message_template_id: u64,
    #[serde(default)]
    pub message_template_name: String,
    #[serde(default)]
    pub message_template_language: String,
    #[serde(default)]
    pub previous_quality_score: String,
    pub new_quality_score: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TemplateStatusUpdateValue {
    pub event: TemplateStatus,
    #[serde(deserialize_with = "deserialize_str")]
    pub message_template_id: u64,
    #[serde(default)]
    pub message_template_name: String,
    #[serde(default)]
    pub message_template_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_info: Option<DisableInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_info: Option<OtherInfo>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateStatus {
    Approved,
    Rejected,
    #[serde(alias = "FLAGGED_FOR_DISABLING")]
    Flagged,
    Paused,
    PendingDeletion,
    Disabled,
    Reinstated,
    #[serde(untagged)]
    Other(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct DisableInfo {
    #[serde(default)]
    pub disable_date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct OtherInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TemplateComponentsUpdateValue {
    #[serde(deserialize_with = "deserialize_str")]
    pub message_template_id: u64,
    #[serde(default)]
    pub message_template_name: String,
    #[serde(default)]
    pub message_template_language: String,
    #[serde(default)]
    pub message_template_element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template_footer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub message_template_buttons: Vec<TemplateButton>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateButton {
    #[serde(default)]
    pub message_template_button_type: String,
    #[serde(default)]
    pub message_template_button_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template_button_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template_button_phone_number: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct PhoneNumberNameUpdateValue {
    pub display_phone_number: String,
    pub decision: String,
    #[serde(default)]
    pub requested_verified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct PhoneNumberQualityUpdateValue {
    pub display_phone_number: String,
    pub event: String,
    #[serde(default)]
    pub current_limit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_limit: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct BusinessCapabilityUpdateValue {
    #[serde(default, deserialize_with = "deserialize_str_opt")]
    pub max_daily_conversation_per_phone: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_str_opt")]
    pub max_phone_numbers_per_business: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_str_opt")]
    pub max_phone_numbers_per_waba: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct SecurityValue {
    #[serde(default)]
    pub display_phone_number: String,
    pub event: String,
    #[serde(default)]
    pub requester: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserPreferencesValue {
    #[serde(default)]
    pub messaging_product: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub contacts: Vec<SenderContact>,
    pub user_preferences: Vec<UserPreference>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct UserPreference {
    pub wa_id: String,
    #[serde(default)]
    pub detail: String,
    /// e.g. `marketing_messages`.
    #[serde(default)]
    pub category: String,
    /// e.g. `stop` or `resume`.
    #[serde(default)]
    pub value: String,
    pub timestamp: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct PaymentConfigurationUpdateValue {
    pub configuration_name: String,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub provider_mid: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_timestamp: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_timestamp: Option<Timestamp>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SmbAppStateSyncValue {
    #[serde(default)]
    pub messaging_product: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub state_sync: Vec<StateSync>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct StateSync {
    /// e.g. `contact`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<SyncedContact>,
    /// `add`, `remove` or `update`.
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<StateSyncMetadata>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncedContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct StateSyncMetadata {
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SmbMessageEchoesValue {
    #[serde(default)]
    pub messaging_product: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub message_echoes: Vec<EchoedMessage>,
}

/// A message the business sent from the WhatsApp Business app.
///
/// The type-specific object (`text`, `image`, ...) is kept as raw JSON in
/// `content`, keyed by its name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct EchoedMessage {
    pub from: String,
    pub to: String,
    pub id: String,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryValue {
    #[serde(default)]
    pub messaging_product: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub history: Vec<HistoryChunk>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryChunk {
    #[serde(default)]
    pub metadata: HistoryMetadata,
    #[serde(default)]
    pub threads: Vec<HistoryThread>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryMetadata {
    #[serde(default)]
    pub phase: u32,
    #[serde(default)]
    pub chunk_order: u32,
    #[serde(default)]
    pub progress: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryThread {
    /// The user's phone number.
    pub id: String,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct HistoryMessage {
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub id: String,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_context: Option<HistoryContext>,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryContext {
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_entry_list_is_valid() {
        let envelope =
            Envelope::from_slice(br#"{"object": "whatsapp_business_account", "entry": []}"#)
                .unwrap();
        assert!(envelope.entry.is_empty());
    }

    #[test]
    fn structural_failures() {
        assert!(matches!(
            Envelope::from_slice(b"{not json"),
            Err(PayloadError::Json(_))
        ));
        assert!(matches!(
            Envelope::from_slice(br#"{"object": "whatsapp_business_account"}"#),
            Err(PayloadError::Json(_))
        ));
        assert!(matches!(
            Envelope::from_slice(br#"{"object": "page", "entry": []}"#),
            Err(PayloadError::UnexpectedObject(o)) if o == "page"
        ));
        assert!(matches!(
            Envelope::from_slice(
                br#"{"object": "whatsapp_business_account",
                     "entry": [{"id": "1", "changes": []}, {"id": "", "changes": []}]}"#
            ),
            Err(PayloadError::MissingAccountId { index: 1 })
        ));
    }

    #[test]
    fn change_values_stay_opaque() {
        let envelope = Envelope::from_slice(
            br#"{"object": "whatsapp_business_account", "entry": [{"id": "102290129340398",
                "time": "1731616153",
                "changes": [{"field": "brand_new_field", "value": {"anything": [1, 2, 3]}}]}]}"#,
        )
        .unwrap();

        let entry = &envelope.entry[0];
        assert_eq!(entry.time, Some(Timestamp::from_seconds(1731616153)));
        assert_eq!(entry.changes[0].field, "brand_new_field");
        assert_eq!(entry.changes[0].value, json!({"anything": [1, 2, 3]}));
    }

    #[test]
    fn unknown_tags_fall_back_to_other() {
        let status: StatusKind = serde_json::from_value(json!("deleted")).unwrap();
        assert_eq!(status, StatusKind::Other("deleted".into()));

        let kind: MessageType = serde_json::from_value(json!("contact")).unwrap();
        assert_eq!(kind, MessageType::Contacts);

        let kind: MessageType = serde_json::from_value(json!("request_welcome")).unwrap();
        assert_eq!(kind.as_str(), "request_welcome");
    }

    #[test]
    fn order_prices_accept_strings() {
        let order: OrderPayload = serde_json::from_value(json!({
            "catalog_id": "cat-1",
            "product_items": [
                {"product_retailer_id": "sku-1", "quantity": "2", "item_price": "12.50", "currency": "USD"},
                {"product_retailer_id": "sku-2", "quantity": 1, "item_price": 3, "currency": "USD"}
            ]
        }))
        .unwrap();

        assert_eq!(order.product_items[0].quantity, 2);
        assert_eq!(order.product_items[0].item_price, Some(12.5));
        assert_eq!(order.product_items[1].item_price, Some(3.0));
    }

    #[test]
    fn echoes_keep_type_specific_content() {
        let value: SmbMessageEchoesValue = serde_json::from_value(json!({
            "messaging_product": "whatsapp",
            "metadata": {"display_phone_number": "15550783881", "phone_number_id": "106540352242922"},
            "message_echoes": [{
                "from": "15550783881", "to": "16505551234", "id": "wamid.echo",
                "timestamp": "1739321024", "type": "text", "text": {"body": "hi from the app"}
            }]
        }))
        .unwrap();

        let echo = &value.message_echoes[0];
        assert_eq!(echo.kind, MessageType::Text);
        assert_eq!(echo.content["text"], json!({"body": "hi from the app"}));
    }
}
