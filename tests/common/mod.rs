use std::sync::{Arc, Mutex};

use axum::http::{Method, Request};
use serde_json::{Value, json};
use whatsapp_webhook_rs::{
    Event, EventManager, EventType,
    webhook_service::{Body, WebhookService},
};

// --- CONSTANTS ---
#[allow(dead_code)]
pub const ACCOUNT_ID: &str = "102290129340398";
#[allow(dead_code)]
pub const PHONE_ID: &str = "106540352242922";
#[allow(dead_code)]
pub const DISPLAY_NUMBER: &str = "15550783881";
#[allow(dead_code)]
pub const CUSTOMER: &str = "16505551234";
#[allow(dead_code)]
pub const CUSTOMER_NAME: &str = "Sheena Nelson";
#[allow(dead_code)]
pub const VERIFY_TOKEN: &str = "meatyhamhock";
#[allow(dead_code)]
pub const APP_SECRET: &str = "a1b2c3d4e5f6";
#[allow(dead_code)]
pub const ACCESS_TOKEN: &str = "EAAD...";
#[allow(dead_code)]
pub const ENTRY_TIME: i64 = 1731616153;

// --- FIXTURES ---

/// A full envelope with one entry for [`ACCOUNT_ID`].
#[allow(dead_code)]
pub fn envelope(changes: Value) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{"id": ACCOUNT_ID, "time": ENTRY_TIME, "changes": changes}]
    })
}

/// A `messages` change from [`CUSTOMER`] to [`PHONE_ID`].
#[allow(dead_code)]
pub fn messages_change(statuses: Value, messages: Value) -> Value {
    json!({
        "field": "messages",
        "value": {
            "messaging_product": "whatsapp",
            "metadata": {"display_phone_number": DISPLAY_NUMBER, "phone_number_id": PHONE_ID},
            "contacts": [{"profile": {"name": CUSTOMER_NAME}, "wa_id": CUSTOMER}],
            "statuses": statuses,
            "messages": messages
        }
    })
}

/// An inbound message of `kind` carrying `payload` under the `kind` key.
#[allow(dead_code)]
pub fn message(id: &str, kind: &str, payload: Value) -> Value {
    let mut message = json!({
        "from": CUSTOMER,
        "id": id,
        "timestamp": "1749416383",
        "type": kind
    });
    message[kind] = payload;
    message
}

#[allow(dead_code)]
pub fn text(id: &str, body: &str) -> Value {
    message(id, "text", json!({"body": body}))
}

#[allow(dead_code)]
pub fn status(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "status": status,
        "timestamp": "1750263773",
        "recipient_id": CUSTOMER
    })
}

#[allow(dead_code)]
pub fn body(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

// --- SUBSCRIBERS ---

/// Subscribes to every event type and records what was published.
#[allow(dead_code)]
pub fn recorder() -> (EventManager, Arc<Mutex<Vec<Event>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut events = EventManager::new();
    for kind in EventType::ALL {
        let seen = seen.clone();
        events.subscribe(*kind, move |event: &Event| {
            seen.lock().unwrap().push(event.clone());
        });
    }
    (events, seen)
}

#[allow(dead_code)]
pub fn kinds(seen: &Mutex<Vec<Event>>) -> Vec<EventType> {
    seen.lock().unwrap().iter().map(Event::event_type).collect()
}

// --- LOGGING ---

/// Routes the crate's `tracing` output to the test harness. `RUST_LOG` picks
/// the level.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// --- HTTP ---

#[allow(dead_code)]
pub fn get(query: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(format!("/webhook?{query}"))
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

/// Sends `request` and returns status and body text.
#[allow(dead_code)]
pub async fn send(service: &WebhookService, request: Request<Body>) -> (u16, String) {
    let response = service.handle(request).await;
    let status = response.status().as_u16();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}
