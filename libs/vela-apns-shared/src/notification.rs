//! Outbound notification value object and the payload encoder boundary

use bytes::Bytes;

/// An outbound push notification.
///
/// The payload and device token are opaque to this crate: both pass through
/// to the wire encoder unchanged. The identifier is the caller-chosen
/// correlation number the gateway echoes back in asynchronous error-response
/// frames. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct PushNotification {
    payload: Bytes,
    device_token: Bytes,
    identifier: u32,
    expiration: Option<u32>,
    priority: u8,
}

impl PushNotification {
    pub fn new(payload: impl Into<Bytes>, device_token: impl Into<Bytes>, identifier: u32) -> Self {
        Self {
            payload: payload.into(),
            device_token: device_token.into(),
            identifier,
            expiration: None,
            priority: 0,
        }
    }

    /// Set the delivery expiration as a unix timestamp
    pub fn with_expiration(mut self, expiration: u32) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Set the delivery priority byte
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn device_token(&self) -> &Bytes {
        &self.device_token
    }

    pub fn identifier(&self) -> u32 {
        self.identifier
    }

    pub fn expiration(&self) -> Option<u32> {
        self.expiration
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }
}

/// Boundary trait producing the full outbound wire frame for a notification.
///
/// The enhanced binary format's item layout is owned by the implementor; the
/// session writes whatever this returns and checks only the byte count.
pub trait PayloadEncoder: Send + Sync {
    fn encode(&self, notification: &PushNotification) -> Bytes;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let notification = PushNotification::new(&b"{}"[..], &b"\x01\x02"[..], 7);

        assert_eq!(notification.identifier(), 7);
        assert_eq!(notification.expiration(), None);
        assert_eq!(notification.priority(), 0);
    }

    #[test]
    fn test_builder_optionals() {
        let notification = PushNotification::new(&b"{}"[..], &b"\x01"[..], 1)
            .with_expiration(1_700_000_000)
            .with_priority(10);

        assert_eq!(notification.expiration(), Some(1_700_000_000));
        assert_eq!(notification.priority(), 10);
    }
}
