mod pipeline_benches;
mod service_benches;

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
pub const VERIFY_TOKEN: &str = "meatyhamhock";
#[allow(dead_code)]
pub const APP_SECRET: &str = "a1b2c3d4e5f6";

use criterion::{criterion_group, criterion_main};
use serde_json::{Value, json};

use pipeline_benches::{bench_envelope_batches, bench_mixed_changes};
use service_benches::bench_signed_requests;

/// An envelope with one `messages` change holding `size` text messages and as
/// many delivery statuses.
pub fn messages_envelope(size: usize) -> Vec<u8> {
    let messages: Vec<Value> = (0..size)
        .map(|i| {
            json!({
                "from": CUSTOMER,
                "id": format!("wamid.in.{i}"),
                "timestamp": "1749416383",
                "type": "text",
                "text": {"body": "Hi! Do you deliver on weekends?"}
            })
        })
        .collect();
    let statuses: Vec<Value> = (0..size)
        .map(|i| {
            json!({
                "id": format!("wamid.out.{i}"),
                "status": "delivered",
                "timestamp": "1750263773",
                "recipient_id": CUSTOMER
            })
        })
        .collect();

    serde_json::to_vec(&json!({
        "object": "whatsapp_business_account",
        "entry": [{"id": ACCOUNT_ID, "time": 1731616153, "changes": [{
            "field": "messages",
            "value": {
                "messaging_product": "whatsapp",
                "metadata": {"display_phone_number": DISPLAY_NUMBER, "phone_number_id": PHONE_ID},
                "contacts": [{"profile": {"name": "Sheena Nelson"}, "wa_id": CUSTOMER}],
                "statuses": statuses,
                "messages": messages
            }
        }]}]
    }))
    .unwrap()
}

criterion_group!(
    benches,
    bench_envelope_batches,
    bench_mixed_changes,
    bench_signed_requests
);
criterion_main!(benches);
