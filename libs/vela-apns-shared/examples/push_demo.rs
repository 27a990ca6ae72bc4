//! Minimal push walkthrough against the gateway.
//!
//! Expects PEM credential material and a device token in the environment:
//! `PUSH_CERT_PATH`, `PUSH_KEY_PATH`, `PUSH_DEVICE_TOKEN` (hex).
//!
//! The type-2 frame encoder lives here rather than in the library: payload
//! encoding is a collaborator concern, the library only defines the
//! boundary trait.

use std::path::Path;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use vela_apns_shared::{Environment, GatewayClient, Identity, PayloadEncoder, PushNotification};

/// "Enhanced" type-2 frame: command byte 2, frame length, then typed items
/// (device token, payload, identifier, expiration, priority).
struct Type2Encoder;

impl PayloadEncoder for Type2Encoder {
    fn encode(&self, notification: &PushNotification) -> Bytes {
        let mut items = BytesMut::new();
        put_item(&mut items, 1, notification.device_token());
        put_item(&mut items, 2, notification.payload());
        put_item(&mut items, 3, &notification.identifier().to_be_bytes());
        if let Some(expiration) = notification.expiration() {
            put_item(&mut items, 4, &expiration.to_be_bytes());
        }
        put_item(&mut items, 5, &[notification.priority()]);

        let mut frame = BytesMut::with_capacity(items.len() + 5);
        frame.put_u8(2);
        frame.put_u32(items.len() as u32);
        frame.put_slice(&items);
        frame.freeze()
    }
}

fn put_item(buf: &mut BytesMut, item_id: u8, data: &[u8]) {
    buf.put_u8(item_id);
    buf.put_u16(data.len() as u16);
    buf.put_slice(data);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cert_path = std::env::var("PUSH_CERT_PATH")?;
    let key_path = std::env::var("PUSH_KEY_PATH")?;
    let device_token = hex::decode(std::env::var("PUSH_DEVICE_TOKEN")?)?;

    let identity = Identity::from_pem_files(Path::new(&cert_path), Path::new(&key_path))?;

    let client = GatewayClient::new(Arc::new(Type2Encoder));
    client.connect(identity, Environment::Auto).await?;

    let payload = Bytes::from_static(br#"{"aps":{"alert":"Hello from Vela"}}"#);
    let notification = PushNotification::new(payload, device_token, 1).with_priority(10);
    client.push(&notification).await?;

    match client.read_failed_identifier().await {
        Ok(failed) => println!(
            "gateway rejected notification {}: {}",
            failed.identifier, failed.error
        ),
        Err(err) => println!("no failure frame read: {}", err),
    }

    client.disconnect().await;
    Ok(())
}
