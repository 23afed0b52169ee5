mod common;

use common::*;
use serde_json::{Value, json};
use whatsapp_webhook_rs::{
    Event, EventManager, EventType, Timestamp,
    error::{BuildError, Error, ProcessError},
    message::MediaKind,
    payload::{AlertSeverity, TemplateStatus},
    process_payload,
};

/// Runs one `messages` change holding `messages` and returns what came out.
fn publish_messages(messages: Value) -> Vec<Event> {
    let (events, seen) = recorder();
    let payload = envelope(json!([messages_change(json!([]), messages)]));
    process_payload(&body(&payload), &events).unwrap();
    let seen = seen.lock().unwrap();
    seen.clone()
}

fn publish_change(field: &str, value: Value) -> Event {
    let (events, seen) = recorder();
    let payload = envelope(json!([{"field": field, "value": value}]));
    let report = process_payload(&body(&payload), &events).unwrap();
    assert!(report.is_clean(), "{field}: {:?}", report.change_errors);

    let mut seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1, "{field}");
    seen.remove(0)
}

#[test]
fn media_messages_are_keyed_by_kind() {
    let published = publish_messages(json!([
        message("wamid.img", "image", json!({
            "caption": "CAPTION", "mime_type": "image/jpeg", "sha256": "IMAGE_HASH", "id": "ID"
        })),
        message("wamid.aud", "audio", json!({
            "mime_type": "audio/ogg; codecs=opus", "sha256": "HASH", "id": "AUDIO_ID", "voice": true
        })),
        message("wamid.vid", "video", json!({"mime_type": "video/mp4", "sha256": "HASH", "id": "VIDEO_ID"})),
        message("wamid.doc", "document", json!({
            "filename": "invoice.pdf", "mime_type": "application/pdf", "sha256": "HASH", "id": "DOC_ID"
        })),
        message("wamid.stk", "sticker", json!({
            "mime_type": "image/webp", "sha256": "HASH", "id": "STICKER_ID", "animated": false
        }))
    ]));

    let kinds: Vec<_> = published.iter().map(Event::event_type).collect();
    assert_eq!(
        kinds,
        [
            EventType::ImageMessage,
            EventType::AudioMessage,
            EventType::VideoMessage,
            EventType::DocumentMessage,
            EventType::StickerMessage
        ]
    );

    let Event::ImageMessage(image) = &published[0] else { unreachable!() };
    assert_eq!(image.media.kind, MediaKind::Image);
    assert_eq!(image.media.caption.as_deref(), Some("CAPTION"));

    let Event::AudioMessage(audio) = &published[1] else { unreachable!() };
    assert!(audio.media.voice);

    let Event::DocumentMessage(document) = &published[3] else { unreachable!() };
    assert!(document.media.is_document());
    assert_eq!(document.media.filename.as_deref(), Some("invoice.pdf"));
}

#[test]
fn location_accepts_string_coordinates() {
    let published = publish_messages(json!([message(
        "wamid.loc",
        "location",
        json!({
            "address": "1 Hacker Way, Menlo Park, CA 94025",
            "latitude": "37.483307",
            "longitude": -122.148981,
            "name": "Meta Headquarters"
        })
    )]));

    let Event::LocationMessage(location) = &published[0] else {
        panic!("expected a location, got {:?}", published[0]);
    };
    assert!((location.location.latitude - 37.483307).abs() < 1e-9);
    assert!((location.location.longitude + 122.148981).abs() < 1e-9);
    assert_eq!(location.location.name.as_deref(), Some("Meta Headquarters"));
}

#[test]
fn out_of_range_location_aborts_the_batch() {
    let events = EventManager::new();
    let payload = envelope(json!([messages_change(
        json!([]),
        json!([message("wamid.loc", "location", json!({"latitude": 91.0, "longitude": 0.0}))])
    )]));

    let err = process_payload(&body(&payload), &events).unwrap_err();
    assert!(matches!(
        err,
        Error::Process(ProcessError::Build {
            source: BuildError::InvalidCoordinates { .. },
            ..
        })
    ));
}

#[test]
fn contacts_carry_their_cards() {
    let published = publish_messages(json!([message(
        "wamid.contacts",
        "contacts",
        json!([{
            "addresses": [{"city": "Menlo Park", "country": "United States", "type": "WORK"}],
            "birthday": "1999-01-23",
            "emails": [{"email": "bjohnson@example.com", "type": "WORK"}],
            "name": {"first_name": "Barbara", "last_name": "Johnson", "formatted_name": "Barbara J. Johnson"},
            "org": {"company": "Social Tsunami", "title": "Manager"},
            "phones": [{"phone": "+1 (650) 555-1234", "wa_id": "16505551234", "type": "WORK"}],
            "urls": [{"url": "https://www.example.com", "type": "WORK"}]
        }])
    )]));

    let Event::ContactsMessage(contacts) = &published[0] else {
        panic!("expected contacts, got {:?}", published[0]);
    };
    let card = &contacts.contacts[0];
    assert_eq!(card.name.formatted_name, "Barbara J. Johnson");
    assert_eq!(card.phones[0].wa_id.as_deref(), Some("16505551234"));
    assert_eq!(card.birthday.as_deref(), Some("1999-01-23"));
    assert_eq!(
        card.org.as_ref().and_then(|org| org.company.as_deref()),
        Some("Social Tsunami")
    );
}

#[test]
fn quick_reply_and_ad_referral() {
    let mut button = message(
        "wamid.btn",
        "button",
        json!({"payload": "unsubscribe", "text": "Stop promotions"}),
    );
    button["context"] = json!({"from": DISPLAY_NUMBER, "id": "wamid.template"});

    let mut from_ad = text("wamid.ad", "Can I get more info?");
    from_ad["referral"] = json!({
        "source_url": "https://fb.me/2ZulEu42P",
        "source_id": "120226305854810726",
        "source_type": "ad",
        "headline": "Chat with us",
        "body": "We're excited to talk to you!",
        "media_type": "image",
        "image_url": "https://scontent.xx.fbcdn.net/v/t45.1...",
        "ctwa_clid": "ARAkLkA8rmlFeiCktEJQ-QTwRiyYHAFDLMNDBH0CD3qpjd0HR4irJ6LEkR7JwFF4XvnO2E4Nx0-eM-GABDLOPaOdRMXP-Gk"
    });

    let published = publish_messages(json!([button, from_ad]));

    let Event::QuickReplyMessage(quick) = &published[0] else {
        panic!("expected a quick reply, got {:?}", published[0]);
    };
    assert_eq!(quick.button.payload, "unsubscribe");
    assert_eq!(quick.button.text, "Stop promotions");
    assert_eq!(quick.context.replied_to_message_id.as_deref(), Some("wamid.template"));

    let referral = published[1].message_base().unwrap().referral.as_ref().unwrap();
    assert_eq!(referral.source_type, "ad");
    assert_eq!(referral.headline, "Chat with us");
}

#[test]
fn product_enquiries_keep_the_referred_product() {
    let mut enquiry = text("wamid.q", "Is this available in blue?");
    enquiry["context"] = json!({
        "from": DISPLAY_NUMBER,
        "id": "wamid.catalog",
        "referred_product": {"catalog_id": "194836987003835", "product_retailer_id": "di9ozbzfi4"}
    });

    let published = publish_messages(json!([enquiry]));
    let product = published[0]
        .message_base()
        .unwrap()
        .context
        .referred_product
        .as_ref()
        .unwrap();
    assert_eq!(product.product_retailer_id, "di9ozbzfi4");
}

#[test]
fn orders_sum_their_items() {
    let published = publish_messages(json!([message(
        "wamid.order",
        "order",
        json!({
            "catalog_id": "194836987003835",
            "text": "Please deliver before noon",
            "product_items": [
                {"product_retailer_id": "a", "quantity": "2", "item_price": "12.5", "currency": "USD"},
                {"product_retailer_id": "b", "quantity": 1, "item_price": 5, "currency": "USD"}
            ]
        })
    )]));

    let Event::OrderReceived(order) = &published[0] else {
        panic!("expected an order, got {:?}", published[0]);
    };
    assert_eq!(order.order.products.len(), 2);
    assert!((order.order.total() - 30.0).abs() < f64::EPSILON);
    assert_eq!(order.order.note.as_deref(), Some("Please deliver before noon"));
}

#[test]
fn removed_reactions_are_still_reactions() {
    let published = publish_messages(json!([message(
        "wamid.r",
        "reaction",
        json!({"message_id": "wamid.target"})
    )]));

    let Event::ReactionMessage(reaction) = &published[0] else {
        panic!("expected a reaction, got {:?}", published[0]);
    };
    assert!(reaction.reaction.is_removal());
    assert_eq!(reaction.reaction.message_id, "wamid.target");
}

#[test]
fn status_events_carry_conversation_and_pricing() {
    let (events, seen) = recorder();
    let mut sent = status("wamid.s", "sent");
    sent["biz_opaque_callback_data"] = json!("order-42");
    sent["conversation"] = json!({
        "id": "CONVERSATION_ID",
        "expiration_timestamp": "1750350173",
        "origin": {"type": "utility"}
    });
    sent["pricing"] = json!({"billable": true, "pricing_model": "PMP", "category": "utility"});

    let mut failed = status("wamid.f", "failed");
    failed["errors"] = json!([{
        "code": 131049,
        "title": "This message was not delivered to maintain healthy ecosystem engagement.",
        "message": "This message was not delivered to maintain healthy ecosystem engagement.",
        "error_data": {"details": "In order to maintain a healthy ecosystem engagement, the message failed to be delivered."}
    }]);

    let payload = envelope(json!([messages_change(
        json!([sent, failed, status("wamid.u", "undelivered")]),
        json!([])
    )]));
    process_payload(&body(&payload), &events).unwrap();

    let seen = seen.lock().unwrap();

    let Event::MessageSent(sent) = &seen[0] else {
        panic!("expected sent, got {:?}", seen[0]);
    };
    assert_eq!(sent.callback_data.as_deref(), Some("order-42"));
    let conversation = sent.conversation.as_ref().unwrap();
    assert_eq!(conversation.id, "CONVERSATION_ID");
    assert_eq!(conversation.origin.as_ref().unwrap().category, "utility");
    assert!(sent.pricing.as_ref().unwrap().billable);
    assert_eq!(sent.base.phone_number.id, PHONE_ID);
    assert_eq!(sent.base.timestamp, Timestamp::from_seconds(1750263773));

    let Event::MessageFailed(failed) = &seen[1] else {
        panic!("expected failed, got {:?}", seen[1]);
    };
    let error = failed.error.as_ref().unwrap();
    assert_eq!(error.code, 131049);
    assert!(error.details.as_deref().unwrap().starts_with("In order to maintain"));
    assert_eq!(failed.recipient_id, CUSTOMER);

    let Event::MessageUndelivered(undelivered) = &seen[2] else {
        panic!("expected undelivered, got {:?}", seen[2]);
    };
    assert_eq!(undelivered.error, None);
}

#[test]
fn missing_entry_time_falls_back_to_now() {
    let (events, seen) = recorder();
    let payload = json!({
        "object": "whatsapp_business_account",
        "entry": [{"id": ACCOUNT_ID, "changes": [
            {"field": "account_review", "value": {"decision": "APPROVED"}}
        ]}]
    });

    let before = Timestamp::now();
    process_payload(&body(&payload), &events).unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen[0].timestamp() >= before);
}

#[test]
fn account_alerts() {
    let event = publish_change(
        "account_alerts",
        json!({
            "entity_type": "WABA",
            "entity_id": "464105150059935",
            "alert_info": {
                "alert_severity": "WARNING",
                "alert_status": "ACTIVE",
                "alert_type": "OBA_APPROVED",
                "alert_description": "Your request for Official Business Account status was approved."
            }
        }),
    );

    let Event::AccountAlert(alert) = event else {
        panic!("expected an alert, got {event:?}");
    };
    assert_eq!(alert.alert_info.alert_severity, AlertSeverity::Warning);
    assert_eq!(alert.base.business_account_id, ACCOUNT_ID);
    assert_eq!(alert.base.timestamp, Timestamp::from_seconds(ENTRY_TIME));
}

#[test]
fn account_update_with_ban() {
    let event = publish_change(
        "account_update",
        json!({
            "event": "DISABLED_UPDATE",
            "ban_info": {"waba_ban_state": ["SCHEDULE_FOR_DISABLE"], "waba_ban_date": "2024-10-31"}
        }),
    );

    let Event::AccountUpdate(update) = event else {
        panic!("expected an account update, got {event:?}");
    };
    assert_eq!(update.event, "DISABLED_UPDATE");
    assert_eq!(update.ban_info.as_ref().unwrap().waba_ban_date, "2024-10-31");
}

#[test]
fn template_status_update() {
    let event = publish_change(
        "message_template_status",
        json!({
            "event": "REJECTED",
            "message_template_id": "806312974732579",
            "message_template_name": "welcome_template",
            "message_template_language": "en-US",
            "reason": "INCORRECT_CATEGORY"
        }),
    );

    let Event::TemplateStatusUpdate(update) = event else {
        panic!("expected a template status, got {event:?}");
    };
    assert_eq!(update.event, TemplateStatus::Rejected);
    assert_eq!(update.message_template_id, 806312974732579);
    assert_eq!(update.reason.as_deref(), Some("INCORRECT_CATEGORY"));
}

#[test]
fn template_components_update() {
    let event = publish_change(
        "message_template_components_update",
        json!({
            "message_template_id": 12345678,
            "message_template_name": "welcome",
            "message_template_language": "en_US",
            "message_template_element": "Thanks for joining!",
            "message_template_buttons": [{
                "message_template_button_type": "URL",
                "message_template_button_text": "Visit",
                "message_template_button_url": "https://example.com"
            }]
        }),
    );

    let Event::TemplateComponentsUpdate(update) = event else {
        panic!("expected a components update, got {event:?}");
    };
    assert_eq!(update.message_template_buttons[0].message_template_button_type, "URL");
}

#[test]
fn phone_number_updates() {
    let name = publish_change(
        "phone_number_name",
        json!({
            "display_phone_number": DISPLAY_NUMBER,
            "decision": "APPROVED",
            "requested_verified_name": "Lucky Shrub"
        }),
    );
    assert_eq!(name.event_type(), EventType::PhoneNumberNameUpdate);

    let quality = publish_change(
        "phone_number_quality",
        json!({
            "display_phone_number": DISPLAY_NUMBER,
            "event": "UPGRADE",
            "current_limit": "TIER_10K",
            "old_limit": "TIER_1K"
        }),
    );
    let Event::PhoneNumberQualityUpdate(quality) = quality else {
        panic!("expected a quality update, got {quality:?}");
    };
    assert_eq!(quality.current_limit, "TIER_10K");
}

#[test]
fn user_preferences() {
    let event = publish_change(
        "user_preferences",
        json!({
            "messaging_product": "whatsapp",
            "metadata": {"display_phone_number": DISPLAY_NUMBER, "phone_number_id": PHONE_ID},
            "contacts": [{"wa_id": CUSTOMER, "profile": {"name": CUSTOMER_NAME}}],
            "user_preferences": [{
                "wa_id": CUSTOMER,
                "detail": "User requested to stop marketing messages",
                "category": "marketing_messages",
                "value": "stop",
                "timestamp": 1731705721
            }]
        }),
    );

    let Event::UserPreferences(preferences) = event else {
        panic!("expected preferences, got {event:?}");
    };
    assert_eq!(preferences.user_preferences[0].value, "stop");
}

#[test]
fn coexistence_changes() {
    let echoes = publish_change(
        "smb_message_echoes",
        json!({
            "messaging_product": "whatsapp",
            "metadata": {"display_phone_number": DISPLAY_NUMBER, "phone_number_id": PHONE_ID},
            "message_echoes": [{
                "from": DISPLAY_NUMBER,
                "to": CUSTOMER,
                "id": "wamid.echo",
                "timestamp": "1739321024",
                "type": "text",
                "text": {"body": "Sent from the app"}
            }]
        }),
    );
    let Event::SmbMessageEchoes(echoes) = echoes else {
        panic!("expected echoes, got {echoes:?}");
    };
    assert_eq!(echoes.message_echoes[0].content["text"]["body"], "Sent from the app");

    let sync = publish_change(
        "smb_app_state_sync",
        json!({
            "messaging_product": "whatsapp",
            "metadata": {"display_phone_number": DISPLAY_NUMBER, "phone_number_id": PHONE_ID},
            "state_sync": [{
                "type": "contact",
                "contact": {"full_name": "Pablo Morales", "first_name": "Pablo", "phone_number": CUSTOMER},
                "action": "add",
                "metadata": {"timestamp": "1739321024"}
            }]
        }),
    );
    assert_eq!(sync.event_type(), EventType::SmbAppStateSync);

    let history = publish_change(
        "history",
        json!({
            "messaging_product": "whatsapp",
            "metadata": {"display_phone_number": DISPLAY_NUMBER, "phone_number_id": PHONE_ID},
            "history": [{
                "metadata": {"phase": 0, "chunk_order": 1, "progress": 55},
                "threads": [{"id": CUSTOMER, "messages": []}]
            }]
        }),
    );
    assert_eq!(history.event_type(), EventType::History);
}

#[test]
fn payment_configuration_update() {
    let event = publish_change(
        "payment_configuration_update",
        json!({
            "configuration_name": "test-payment-configuration",
            "provider_name": "razorpay",
            "provider_mid": "102290129340398",
            "status": "Needs_Connecting",
            "created_timestamp": 1731705721,
            "updated_timestamp": 1731705721
        }),
    );
    assert_eq!(event.event_type(), EventType::PaymentConfigurationUpdate);
}
