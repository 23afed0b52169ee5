//! Normalized domain events.
//!
//! Every inbound notification ends up as exactly one [`Event`]. Events come in
//! three scopes, each with its own base envelope:
//!
//! - **message scope** ([`MessageEventBase`]): something a user sent,
//! - **system scope** ([`SystemEventBase`]): delivery statuses and platform
//!   notices about a conversation,
//! - **account scope** ([`AccountEventBase`]): everything else a business
//!   account is subscribed to (alerts, template reviews, quality updates, ...).
//!
//! Subscribers pick events by [`EventType`].

use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::{
    MetaError, Timestamp,
    message::{
        ContactCard, Identity, ListReply, Location, Media, MediaKind, Order, QuickReply,
        Reaction, ReplyButton, Text,
    },
    payload::{
        AccountAlertsValue, AccountReviewValue, AccountUpdateValue,
        BusinessCapabilityUpdateValue, Conversation, HistoryValue, Metadata,
        PaymentConfigurationUpdateValue, PhoneNumberNameUpdateValue,
        PhoneNumberQualityUpdateValue, Pricing, Referral, ReferredProduct, SecurityValue,
        SmbAppStateSyncValue, SmbMessageEchoesValue, TemplateCategoryUpdateValue,
        TemplateComponentsUpdateValue, TemplateQualityUpdateValue, TemplateStatusUpdateValue,
        UserPreferencesValue,
    },
};

events! {
    /// A normalized webhook notification.
    pub enum Event keyed by EventType {
        /// The managed server is bound and about to serve.
        Ready(ReadyEvent) = "ready",

        MessageSent(StatusEvent) = "message_sent",
        MessageDelivered(StatusEvent) = "message_delivered",
        MessageRead(StatusEvent) = "message_read",
        MessageFailed(StatusFailureEvent) = "message_failed",
        MessageUndelivered(StatusFailureEvent) = "message_undelivered",

        TextMessage(TextMessageEvent) = "text_message",
        ImageMessage(MediaMessageEvent) = "image_message",
        AudioMessage(MediaMessageEvent) = "audio_message",
        VideoMessage(MediaMessageEvent) = "video_message",
        DocumentMessage(MediaMessageEvent) = "document_message",
        StickerMessage(MediaMessageEvent) = "sticker_message",
        LocationMessage(LocationMessageEvent) = "location_message",
        ContactsMessage(ContactsMessageEvent) = "contacts_message",
        /// A quick-reply button of a template was tapped.
        QuickReplyMessage(QuickReplyEvent) = "quick_reply_message",
        ReplyButtonInteraction(ReplyButtonEvent) = "reply_button_interaction",
        ListInteraction(ListInteractionEvent) = "list_interaction",
        ReactionMessage(ReactionEvent) = "reaction_message",
        OrderReceived(OrderEvent) = "order_received",
        /// A message of a type this crate cannot represent, or one the
        /// platform itself could not render.
        UnsupportedMessage(UnsupportedMessageEvent) = "unsupported_message",

        CustomerNumberChanged(CustomerNumberChangedEvent) = "customer_number_changed",
        CustomerIdentityChanged(CustomerIdentityChangedEvent) = "customer_identity_changed",

        AccountAlert(AccountEvent<AccountAlertsValue>) = "account_alert",
        AccountUpdate(AccountEvent<AccountUpdateValue>) = "account_update",
        AccountReview(AccountEvent<AccountReviewValue>) = "account_review",
        TemplateCategoryUpdate(AccountEvent<TemplateCategoryUpdateValue>) = "template_category_update",
        TemplateQualityUpdate(AccountEvent<TemplateQualityUpdateValue>) = "template_quality_update",
        TemplateStatusUpdate(AccountEvent<TemplateStatusUpdateValue>) = "template_status_update",
        TemplateComponentsUpdate(AccountEvent<TemplateComponentsUpdateValue>) = "template_components_update",
        PhoneNumberNameUpdate(AccountEvent<PhoneNumberNameUpdateValue>) = "phone_number_name_update",
        PhoneNumberQualityUpdate(AccountEvent<PhoneNumberQualityUpdateValue>) = "phone_number_quality_update",
        BusinessCapabilityUpdate(AccountEvent<BusinessCapabilityUpdateValue>) = "business_capability_update",
        Security(AccountEvent<SecurityValue>) = "security",
        UserPreferences(AccountEvent<UserPreferencesValue>) = "user_preferences",
        PaymentConfigurationUpdate(AccountEvent<PaymentConfigurationUpdateValue>) = "payment_configuration_update",
        SmbAppStateSync(AccountEvent<SmbAppStateSyncValue>) = "smb_app_state_sync",
        SmbMessageEchoes(AccountEvent<SmbMessageEchoesValue>) = "smb_message_echoes",
        History(AccountEvent<HistoryValue>) = "history",
    }
}

/// Returned when parsing an [`EventType`] from an unknown tag.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown event type '{0}'")]
pub struct UnknownEventType(pub String);

impl Event {
    /// The message-scope envelope, for events a user sent.
    pub fn message_base(&self) -> Option<&MessageEventBase> {
        let base = match self {
            Self::TextMessage(e) => &e.base,
            Self::ImageMessage(e)
            | Self::AudioMessage(e)
            | Self::VideoMessage(e)
            | Self::DocumentMessage(e)
            | Self::StickerMessage(e) => &e.base,
            Self::LocationMessage(e) => &e.base,
            Self::ContactsMessage(e) => &e.base,
            Self::QuickReplyMessage(e) => &e.base,
            Self::ReplyButtonInteraction(e) => &e.base,
            Self::ListInteraction(e) => &e.base,
            Self::ReactionMessage(e) => &e.base,
            Self::OrderReceived(e) => &e.base,
            Self::UnsupportedMessage(e) => &e.base,
            _ => return None,
        };
        Some(base)
    }

    /// When the notified thing happened.
    pub fn timestamp(&self) -> Timestamp {
        if let Some(base) = self.message_base() {
            return base.timestamp;
        }

        match self {
            Self::Ready(e) => e.timestamp,
            Self::MessageSent(e) | Self::MessageDelivered(e) | Self::MessageRead(e) => {
                e.base.timestamp
            }
            Self::MessageFailed(e) | Self::MessageUndelivered(e) => e.status.base.timestamp,
            Self::CustomerNumberChanged(e) => e.base.timestamp,
            Self::CustomerIdentityChanged(e) => e.base.timestamp,
            Self::AccountAlert(e) => e.base.timestamp,
            Self::AccountUpdate(e) => e.base.timestamp,
            Self::AccountReview(e) => e.base.timestamp,
            Self::TemplateCategoryUpdate(e) => e.base.timestamp,
            Self::TemplateQualityUpdate(e) => e.base.timestamp,
            Self::TemplateStatusUpdate(e) => e.base.timestamp,
            Self::TemplateComponentsUpdate(e) => e.base.timestamp,
            Self::PhoneNumberNameUpdate(e) => e.base.timestamp,
            Self::PhoneNumberQualityUpdate(e) => e.base.timestamp,
            Self::BusinessCapabilityUpdate(e) => e.base.timestamp,
            Self::Security(e) => e.base.timestamp,
            Self::UserPreferences(e) => e.base.timestamp,
            Self::PaymentConfigurationUpdate(e) => e.base.timestamp,
            Self::SmbAppStateSync(e) => e.base.timestamp,
            Self::SmbMessageEchoes(e) => e.base.timestamp,
            Self::History(e) => e.base.timestamp,
            // Message-scope variants were handled above.
            _ => Timestamp::default(),
        }
    }
}

// --- base envelopes ---

/// The business phone number a notification was delivered to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BusinessPhoneNumber {
    /// Platform-assigned phone number id. Outbound requests are addressed to it.
    pub id: String,
    pub display_number: String,
}

impl From<&Metadata> for BusinessPhoneNumber {
    fn from(value: &Metadata) -> Self {
        Self {
            id: value.phone_number_id.clone(),
            display_number: value.display_phone_number.clone(),
        }
    }
}

/// Envelope shared by every event about a message a user sent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[non_exhaustive]
pub struct MessageEventBase {
    pub business_account_id: String,
    pub message_id: String,
    pub phone_number: BusinessPhoneNumber,
    pub timestamp: Timestamp,
    /// Sender's WhatsApp id
    pub from: String,
    /// Profile name of the first contact in the batch, empty if there is none
    pub sender_name: String,
    pub is_forwarded: bool,
    pub context: ReplyContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral: Option<Referral>,
}

/// What an inbound message was in reply to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct ReplyContext {
    /// Set only when the user replied to a specific message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replied_to_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_product: Option<ReferredProduct>,
}

/// Envelope of delivery statuses and system notices.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct SystemEventBase {
    pub business_account_id: String,
    pub phone_number: BusinessPhoneNumber,
    pub timestamp: Timestamp,
}

/// Envelope of account-scope events.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct AccountEventBase {
    pub business_account_id: String,
    pub timestamp: Timestamp,
}

/// An account-scope event: the decoded change value plus where it came from.
///
/// Derefs to the value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct AccountEvent<T> {
    pub base: AccountEventBase,
    pub value: T,
}

impl<T> AccountEvent<T> {
    pub fn new(base: AccountEventBase, value: T) -> Self {
        Self { base, value }
    }
}

impl<T> Deref for AccountEvent<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

// --- system scope ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ReadyEvent {
    pub timestamp: Timestamp,
}

impl ReadyEvent {
    pub fn now() -> Self {
        Self {
            timestamp: Timestamp::now(),
        }
    }
}

/// A sent, delivered or read status.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct StatusEvent {
    pub base: SystemEventBase,
    /// The business message this status is about
    pub message_id: String,
    pub recipient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<Conversation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Pricing>,
    /// `biz_opaque_callback_data` set when the message was sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

/// A failed or undelivered status.
///
/// Only the first platform error is kept, even when several were reported.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct StatusFailureEvent {
    #[serde(flatten)]
    pub status: StatusEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StatusFailure>,
}

impl Deref for StatusFailureEvent {
    type Target = StatusEvent;

    fn deref(&self) -> &Self::Target {
        &self.status
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct StatusFailure {
    /// Error title
    pub reason: String,
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&MetaError> for StatusFailure {
    fn from(value: &MetaError) -> Self {
        Self {
            reason: value.title.clone().unwrap_or_default(),
            code: value.code,
            message: value.message.clone().unwrap_or_default(),
            details: value.error_metadata.details.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct CustomerNumberChangedEvent {
    pub base: SystemEventBase,
    pub message_id: String,
    pub old_wa_id: String,
    pub new_wa_id: String,
    /// Human readable description sent by the platform
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct CustomerIdentityChangedEvent {
    pub base: SystemEventBase,
    pub message_id: String,
    /// WhatsApp id of the customer
    pub customer: String,
    pub description: String,
    pub identity: Identity,
}

// --- message scope ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct TextMessageEvent {
    pub base: MessageEventBase,
    pub text: Text,
}

/// An image, audio, video, document or sticker. See [`Media::kind`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct MediaMessageEvent {
    pub base: MessageEventBase,
    pub media: Media,
}

impl MediaMessageEvent {
    /// The event type matching the media kind.
    pub fn event_type(&self) -> EventType {
        match self.media.kind {
            MediaKind::Image => EventType::ImageMessage,
            MediaKind::Audio => EventType::AudioMessage,
            MediaKind::Video => EventType::VideoMessage,
            MediaKind::Document => EventType::DocumentMessage,
            MediaKind::Sticker => EventType::StickerMessage,
        }
    }

    /// Wraps this event into the [`Event`] variant matching the media kind.
    pub fn into_event(self) -> Event {
        match self.media.kind {
            MediaKind::Image => Event::ImageMessage(self),
            MediaKind::Audio => Event::AudioMessage(self),
            MediaKind::Video => Event::VideoMessage(self),
            MediaKind::Document => Event::DocumentMessage(self),
            MediaKind::Sticker => Event::StickerMessage(self),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct LocationMessageEvent {
    pub base: MessageEventBase,
    pub location: Location,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct ContactsMessageEvent {
    pub base: MessageEventBase,
    pub contacts: Vec<ContactCard>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct QuickReplyEvent {
    pub base: MessageEventBase,
    pub button: QuickReply,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct ReplyButtonEvent {
    pub base: MessageEventBase,
    pub reply: ReplyButton,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct ListInteractionEvent {
    pub base: MessageEventBase,
    pub reply: ListReply,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct ReactionEvent {
    pub base: MessageEventBase,
    pub reaction: Reaction,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct OrderEvent {
    pub base: MessageEventBase,
    pub order: Order,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct UnsupportedMessageEvent {
    pub base: MessageEventBase,
    /// The `type` tag as sent by the platform
    pub message_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<MetaError>,
}

macro_rules! message_events {
    ($($event:ident),*) => {
        $(
            impl Deref for $event {
                type Target = MessageEventBase;

                fn deref(&self) -> &Self::Target {
                    &self.base
                }
            }
        )*
    };
}

message_events!(
    TextMessageEvent,
    MediaMessageEvent,
    LocationMessageEvent,
    ContactsMessageEvent,
    QuickReplyEvent,
    ReplyButtonEvent,
    ListInteractionEvent,
    ReactionEvent,
    OrderEvent,
    UnsupportedMessageEvent
);
