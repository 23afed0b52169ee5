use criterion::{BenchmarkId, Criterion, Throughput, black_box};
use serde_json::json;
use whatsapp_webhook_rs::{Event, EventManager, EventType, process_payload};

use crate::{ACCOUNT_ID, DISPLAY_NUMBER, messages_envelope};

/// Subscribes a no-op callback to every event type so fan-out is measured too.
fn subscribed() -> EventManager {
    let mut events = EventManager::new();
    for kind in EventType::ALL {
        events.subscribe(*kind, |event: &Event| {
            black_box(event);
        });
    }
    events
}

pub fn bench_envelope_batches(c: &mut Criterion) {
    let events = subscribed();
    let mut group = c.benchmark_group("Envelope Processing");

    for size in [1, 10, 100] {
        let body = messages_envelope(size);
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::new("messages_and_statuses", size), &body, |b, body| {
            b.iter(|| process_payload(black_box(body), &events).unwrap());
        });
    }

    group.finish();
}

pub fn bench_mixed_changes(c: &mut Criterion) {
    let events = subscribed();
    let body = serde_json::to_vec(&json!({
        "object": "whatsapp_business_account",
        "entry": [{"id": ACCOUNT_ID, "time": 1731616153, "changes": [
            {"field": "account_review", "value": {"decision": "APPROVED"}},
            {"field": "flows", "value": {"event": "FLOW_STATUS_CHANGE"}},
            {"field": "phone_number_quality", "value": {
                "display_phone_number": DISPLAY_NUMBER,
                "event": "UPGRADE",
                "current_limit": "TIER_10K"
            }},
            {"field": "message_template_status", "value": {
                "event": "APPROVED",
                "message_template_id": 806312974732579u64,
                "message_template_name": "welcome_template",
                "message_template_language": "en-US"
            }},
            {"field": "account_alerts", "value": {"entity_type": "WABA"}}
        ]}]
    }))
    .unwrap();

    c.bench_function("classify_mixed_changes", |b| {
        b.iter(|| process_payload(black_box(&body), &events).unwrap());
    });
}
