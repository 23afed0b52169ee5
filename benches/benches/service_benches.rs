use axum::http::{Method, Request};
use criterion::{Criterion, black_box};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::runtime::Runtime;
use whatsapp_webhook_rs::{EventManager, WebhookService, webhook_service::Body};

use crate::{APP_SECRET, VERIFY_TOKEN, messages_envelope};

fn signed(body: &[u8]) -> Request<Body> {
    let mut mac = Hmac::<Sha256>::new_from_slice(APP_SECRET.as_bytes()).unwrap();
    mac.update(body);
    let signature = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));

    Request::builder()
        .method(Method::POST)
        .uri("/webhook")
        .header("x-hub-signature-256", signature)
        .body(Body::from(body.to_vec()))
        .unwrap()
}

// Signature check plus the full pipeline, without a socket.
pub fn bench_signed_requests(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let service = WebhookService::builder()
        .verify_token(VERIFY_TOKEN)
        .verify_payload(APP_SECRET)
        .build(EventManager::new());
    let body = messages_envelope(10);

    let mut group = c.benchmark_group("Webhook Service");

    group.bench_function("signed_post", |b| {
        b.to_async(&rt).iter(|| async {
            let response = service.handle(signed(&body)).await;
            black_box(response.status())
        });
    });

    group.finish();
}
