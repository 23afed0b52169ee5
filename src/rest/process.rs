//! The ingestion pipeline: decode → classify → normalize → publish.
//!
//! Failure policy, by layer:
//!
//! | Layer | On failure |
//! |---|---|
//! | envelope | whole request rejected, nothing published |
//! | change value | that change dropped, siblings continue |
//! | unknown `field` | skipped silently |
//! | status malformed or with unknown tag | that status dropped |
//! | inbound message decode or build | rest of that message batch aborted, request fails |
//! | subscriber | request fails |
//!
//! The change/message asymmetry is deliberate and callers can rely on it.

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{
    Event, EventManager, Timestamp,
    change::{self, ChangeValue},
    error::{BuildError, ChangeError, Error, ProcessError},
    event::{
        AccountEvent, AccountEventBase, BusinessPhoneNumber, ContactsMessageEvent,
        CustomerIdentityChangedEvent, CustomerNumberChangedEvent, ListInteractionEvent,
        LocationMessageEvent, MediaMessageEvent, MessageEventBase, OrderEvent, QuickReplyEvent,
        ReactionEvent, ReplyButtonEvent, ReplyContext, StatusEvent, StatusFailure,
        StatusFailureEvent, SystemEventBase, TextMessageEvent, UnsupportedMessageEvent,
    },
    message::{Identity, Media, MediaKind},
    payload::{
        Envelope, IdentityPayload, InboundMessage, MediaPayload, MessageType, MessagesValue, Status,
        StatusKind, SystemKind, SystemPayload,
    },
};

/// Outcome of a processed payload.
///
/// Only soft failures end up here; hard failures are returned as errors.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct ProcessReport {
    /// Events delivered to the publisher.
    pub published: usize,
    /// Changes whose `field` is not in the table.
    pub skipped_changes: usize,
    /// Statuses that failed to decode or had an unrecognized tag.
    pub dropped_statuses: usize,
    /// Changes whose value did not match their schema.
    pub change_errors: Vec<ChangeError>,
}

impl ProcessReport {
    /// Whether every change and status was handled.
    pub fn is_clean(&self) -> bool {
        self.change_errors.is_empty() && self.dropped_statuses == 0
    }
}

/// Decodes `body` and runs it through the pipeline.
///
/// Returns [`Error::Payload`] when the envelope is unusable (nothing was
/// published) and [`Error::Process`] when processing was aborted part way
/// (events published before the failure stay published).
pub fn process_payload(body: &[u8], events: &EventManager) -> Result<ProcessReport, Error> {
    let envelope = Envelope::from_slice(body)?;
    Ok(process_envelope(envelope, events)?)
}

/// Runs an already decoded envelope through the pipeline.
///
/// Entries and their changes are processed in array order. Within a
/// `messages` change, statuses are published before inbound messages.
pub fn process_envelope(
    envelope: Envelope,
    events: &EventManager,
) -> Result<ProcessReport, ProcessError> {
    let mut sink = Sink {
        events,
        report: ProcessReport::default(),
    };

    for entry in envelope.entry {
        let received_at = entry.time.unwrap_or_else(Timestamp::now);

        for change in entry.changes {
            let field = change.field.clone();
            let value = match change::classify(change, &entry.id) {
                Ok(Some(value)) => value,
                Ok(None) => {
                    debug!(%field, account_id = %entry.id, "skipping unknown change");
                    sink.report.skipped_changes += 1;
                    continue;
                }
                Err(err) => {
                    warn!(field = %err.field, account_id = %entry.id, error = %err.source, "dropping change");
                    sink.report.change_errors.push(err);
                    continue;
                }
            };

            let base = AccountEventBase {
                business_account_id: entry.id.clone(),
                timestamp: received_at,
            };
            process_change(value, base, &mut sink)?;
        }
    }

    Ok(sink.report)
}

/// Where built events go.
struct Sink<'a> {
    events: &'a EventManager,
    report: ProcessReport,
}

impl Sink<'_> {
    fn publish(&mut self, event: Event) -> Result<(), ProcessError> {
        self.events.publish(&event)?;
        self.report.published += 1;
        Ok(())
    }
}

fn process_change(
    value: ChangeValue,
    base: AccountEventBase,
    sink: &mut Sink<'_>,
) -> Result<(), ProcessError> {
    let event = match value {
        ChangeValue::Messages(messages) => return process_messages(messages, base, sink),
        ChangeValue::AccountAlerts(v) => Event::AccountAlert(AccountEvent::new(base, v)),
        ChangeValue::AccountUpdate(v) => Event::AccountUpdate(AccountEvent::new(base, v)),
        ChangeValue::AccountReview(v) => Event::AccountReview(AccountEvent::new(base, v)),
        ChangeValue::TemplateCategoryUpdate(v) => {
            Event::TemplateCategoryUpdate(AccountEvent::new(base, v))
        }
        ChangeValue::TemplateQuality(v) => Event::TemplateQualityUpdate(AccountEvent::new(base, v)),
        ChangeValue::TemplateStatus(v) => Event::TemplateStatusUpdate(AccountEvent::new(base, v)),
        ChangeValue::TemplateComponentsUpdate(v) => {
            Event::TemplateComponentsUpdate(AccountEvent::new(base, v))
        }
        ChangeValue::PhoneNumberName(v) => Event::PhoneNumberNameUpdate(AccountEvent::new(base, v)),
        ChangeValue::PhoneNumberQuality(v) => {
            Event::PhoneNumberQualityUpdate(AccountEvent::new(base, v))
        }
        ChangeValue::BusinessCapability(v) => {
            Event::BusinessCapabilityUpdate(AccountEvent::new(base, v))
        }
        ChangeValue::Security(v) => Event::Security(AccountEvent::new(base, v)),
        ChangeValue::UserPreferences(v) => Event::UserPreferences(AccountEvent::new(base, v)),
        ChangeValue::PaymentConfigurationUpdate(v) => {
            Event::PaymentConfigurationUpdate(AccountEvent::new(base, v))
        }
        ChangeValue::SmbAppStateSync(v) => Event::SmbAppStateSync(AccountEvent::new(base, v)),
        ChangeValue::SmbMessageEchoes(v) => Event::SmbMessageEchoes(AccountEvent::new(base, v)),
        ChangeValue::History(v) => Event::History(AccountEvent::new(base, v)),
    };

    sink.publish(event)
}

/// Context shared by every event built from one `messages` value.
struct MessagesScope {
    business_account_id: String,
    phone_number: BusinessPhoneNumber,
}

fn process_messages(
    mut value: MessagesValue,
    base: AccountEventBase,
    sink: &mut Sink<'_>,
) -> Result<(), ProcessError> {
    for err in &value.errors {
        warn!(account_id = %base.business_account_id, error = %err, "platform reported an error");
    }

    let scope = MessagesScope {
        business_account_id: base.business_account_id,
        phone_number: BusinessPhoneNumber::from(&value.metadata),
    };

    let statuses = StatusBatch(std::mem::take(&mut value.statuses));
    statuses.build_events(&scope, &value, sink)?;

    let messages = MessageBatch(std::mem::take(&mut value.messages));
    messages.build_events(&scope, &value, sink)
}

/// Raw statuses of one `messages` value.
struct StatusBatch(Vec<Value>);

/// Raw inbound messages of one `messages` value.
struct MessageBatch(Vec<Value>);

/// Turns one batch of a `messages` value into events.
trait EventBuilder {
    fn build_events(
        self,
        scope: &MessagesScope,
        value: &MessagesValue,
        sink: &mut Sink<'_>,
    ) -> Result<(), ProcessError>;
}

impl EventBuilder for StatusBatch {
    fn build_events(
        self,
        scope: &MessagesScope,
        _value: &MessagesValue,
        sink: &mut Sink<'_>,
    ) -> Result<(), ProcessError> {
        for raw in self.0 {
            let status: Status = match serde_json::from_value(raw) {
                Ok(status) => status,
                Err(err) => {
                    warn!(account_id = %scope.business_account_id, error = %err, "dropping malformed status");
                    sink.report.dropped_statuses += 1;
                    continue;
                }
            };
            let kind = status.status.clone();

            let first_error = status.errors.first().map(StatusFailure::from);
            let event = StatusEvent {
                base: SystemEventBase {
                    business_account_id: scope.business_account_id.clone(),
                    phone_number: scope.phone_number.clone(),
                    timestamp: status.timestamp,
                },
                message_id: status.id,
                recipient_id: status.recipient_id,
                conversation: status.conversation,
                pricing: status.pricing,
                callback_data: status.biz_opaque_callback_data,
            };

            let failure = |status| StatusFailureEvent {
                status,
                error: first_error.clone(),
            };

            let event = match kind {
                StatusKind::Sent => Event::MessageSent(event),
                StatusKind::Delivered => Event::MessageDelivered(event),
                StatusKind::Read => Event::MessageRead(event),
                StatusKind::Failed => Event::MessageFailed(failure(event)),
                StatusKind::Undelivered => Event::MessageUndelivered(failure(event)),
                StatusKind::Other(tag) => {
                    debug!(status = %tag, message_id = %event.message_id, "dropping status with unknown tag");
                    sink.report.dropped_statuses += 1;
                    continue;
                }
            };

            sink.publish(event)?;
        }

        Ok(())
    }
}

impl EventBuilder for MessageBatch {
    fn build_events(
        self,
        scope: &MessagesScope,
        value: &MessagesValue,
        sink: &mut Sink<'_>,
    ) -> Result<(), ProcessError> {
        for raw in self.0 {
            let message_id = raw
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();

            let event = serde_json::from_value::<InboundMessage>(raw)
                .map_err(|err| BuildError::Malformed {
                    reason: err.to_string(),
                })
                .and_then(|message| {
                    build_message_event(message, scope, value.sender_name().to_owned())
                })
                .map_err(|source| {
                    error!(%message_id, error = %source, "aborting message batch");
                    ProcessError::Build { message_id, source }
                })?;

            sink.publish(event)?;
        }

        Ok(())
    }
}

fn required<T>(payload: Option<T>, kind: &'static str) -> Result<T, BuildError> {
    payload.ok_or(BuildError::MissingPayload { kind })
}

fn build_message_event(
    mut message: InboundMessage,
    scope: &MessagesScope,
    sender_name: String,
) -> Result<Event, BuildError> {
    let context = message.context.take().unwrap_or_default();

    let base = MessageEventBase {
        business_account_id: scope.business_account_id.clone(),
        message_id: message.id,
        phone_number: scope.phone_number.clone(),
        timestamp: message.timestamp,
        from: message.from,
        sender_name,
        is_forwarded: context.forwarded || context.frequently_forwarded,
        context: ReplyContext {
            replied_to_message_id: context.id.filter(|id| !id.is_empty()),
            referred_product: context.referred_product,
        },
        referral: message.referral,
    };

    let event = match message.kind {
        MessageType::Text => Event::TextMessage(TextMessageEvent {
            text: required(message.text, "text")?.into(),
            base,
        }),
        MessageType::Image => media_event(base, MediaKind::Image, message.image)?,
        MessageType::Audio => media_event(base, MediaKind::Audio, message.audio)?,
        MessageType::Video => media_event(base, MediaKind::Video, message.video)?,
        MessageType::Document => media_event(base, MediaKind::Document, message.document)?,
        MessageType::Sticker => media_event(base, MediaKind::Sticker, message.sticker)?,
        MessageType::Location => Event::LocationMessage(LocationMessageEvent {
            location: required(message.location, "location")?.try_into()?,
            base,
        }),
        MessageType::Contacts => Event::ContactsMessage(ContactsMessageEvent {
            contacts: required(message.contacts, "contacts")?,
            base,
        }),
        MessageType::Button => Event::QuickReplyMessage(QuickReplyEvent {
            button: required(message.button, "button")?.into(),
            base,
        }),
        MessageType::Interactive => {
            let interactive = required(message.interactive, "interactive")?;
            match interactive.kind.as_str() {
                "list_reply" => Event::ListInteraction(ListInteractionEvent {
                    reply: interactive
                        .list_reply
                        .ok_or(BuildError::MissingField {
                            kind: "interactive",
                            field: "list_reply",
                        })?
                        .try_into()?,
                    base,
                }),
                "button_reply" => Event::ReplyButtonInteraction(ReplyButtonEvent {
                    reply: interactive
                        .button_reply
                        .ok_or(BuildError::MissingField {
                            kind: "interactive",
                            field: "button_reply",
                        })?
                        .try_into()?,
                    base,
                }),
                other => Event::UnsupportedMessage(UnsupportedMessageEvent {
                    message_type: format!("interactive.{other}"),
                    errors: message.errors,
                    base,
                }),
            }
        }
        MessageType::Reaction => Event::ReactionMessage(ReactionEvent {
            reaction: required(message.reaction, "reaction")?.try_into()?,
            base,
        }),
        MessageType::Order => Event::OrderReceived(OrderEvent {
            order: required(message.order, "order")?.try_into()?,
            base,
        }),
        MessageType::System => {
            system_event(required(message.system, "system")?, message.identity, base)
        }
        other => {
            let message_type = message
                .unsupported
                .map(|u| u.kind)
                .filter(|kind| !kind.is_empty())
                .unwrap_or_else(|| other.as_str().to_owned());

            Event::UnsupportedMessage(UnsupportedMessageEvent {
                message_type,
                errors: message.errors,
                base,
            })
        }
    };

    Ok(event)
}

fn media_event(
    base: MessageEventBase,
    kind: MediaKind,
    payload: Option<MediaPayload>,
) -> Result<Event, BuildError> {
    let media = Media::build(kind, required(payload, kind.as_str())?)?;
    Ok(MediaMessageEvent { base, media }.into_event())
}

fn system_event(
    system: SystemPayload,
    identity: Option<IdentityPayload>,
    base: MessageEventBase,
) -> Event {
    let system_base = SystemEventBase {
        business_account_id: base.business_account_id,
        phone_number: base.phone_number,
        timestamp: base.timestamp,
    };

    match system.kind {
        SystemKind::CustomerIdentityChanged => {
            let identity = identity.map(Identity::from).unwrap_or_else(|| Identity {
                hash: system.identity.unwrap_or_default(),
                ..Default::default()
            });

            Event::CustomerIdentityChanged(CustomerIdentityChangedEvent {
                base: system_base,
                message_id: base.message_id,
                customer: system.customer.unwrap_or(base.from),
                description: system.body,
                identity,
            })
        }
        SystemKind::UserChangedNumber | SystemKind::Other(_) => {
            Event::CustomerNumberChanged(CustomerNumberChangedEvent {
                base: system_base,
                message_id: base.message_id,
                old_wa_id: system.customer.unwrap_or(base.from),
                new_wa_id: system.wa_id.unwrap_or_default(),
                description: system.body,
            })
        }
    }
}
