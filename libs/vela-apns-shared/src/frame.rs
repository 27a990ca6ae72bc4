//! Wire-level frame codecs for the binary push protocol
//!
//! Two fixed-size frames cross the boundary: the 6-byte asynchronous
//! error-response frame the gateway may send at any time on the push
//! connection, and the 38-byte token/date record streamed by the feedback
//! service. Both codecs are pure: bytes in, structured value or a taxonomy
//! error out.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use push_error_types::{ErrorKind, PushError, PushResult};

/// Command tag of the asynchronous error-response frame
pub const ERROR_RESPONSE_COMMAND: u8 = 8;
/// Exact size of the error-response frame
pub const ERROR_RESPONSE_LEN: usize = 6;

/// Expected device token length in a feedback record
pub const FEEDBACK_TOKEN_LEN: usize = 32;
/// Exact size of one feedback record: timestamp, token length, token
pub const FEEDBACK_RECORD_LEN: usize = 4 + 2 + FEEDBACK_TOKEN_LEN;

/// Decoded asynchronous error-response frame.
///
/// The identifier echoes the correlation number of the notification the
/// gateway rejected, not the one most recently written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u8,
    pub identifier: u32,
}

impl ErrorResponse {
    /// Decode the fixed 6-byte frame: command, status, big-endian identifier.
    ///
    /// A command byte other than [`ERROR_RESPONSE_COMMAND`] fails with
    /// `PushResponseCommand` carrying the unexpected byte as the reason.
    pub fn decode(mut buf: &[u8]) -> PushResult<ErrorResponse> {
        if buf.len() < ERROR_RESPONSE_LEN {
            return Err(PushError::with_reason(ErrorKind::ReadFail, buf.len() as i64));
        }

        let command = buf.get_u8();
        if command != ERROR_RESPONSE_COMMAND {
            return Err(PushError::with_reason(
                ErrorKind::PushResponseCommand,
                i64::from(command),
            ));
        }

        let status = buf.get_u8();
        let identifier = buf.get_u32();

        Ok(ErrorResponse { status, identifier })
    }

    /// Encode back to the 6-byte wire form.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(ERROR_RESPONSE_LEN);
        buf.put_u8(ERROR_RESPONSE_COMMAND);
        buf.put_u8(self.status);
        buf.put_u32(self.identifier);
        buf.freeze()
    }

    /// Taxonomy kind for the status byte.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::from_status(self.status)
    }
}

/// One feedback-service record: a device token delivery stopped working for,
/// and when the service noticed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRecord {
    /// Unix timestamp of the failed delivery
    pub timestamp: u32,
    /// Raw device token
    pub device_token: Bytes,
}

impl FeedbackRecord {
    /// Decode one fixed 38-byte record.
    pub fn decode(mut buf: &[u8]) -> PushResult<FeedbackRecord> {
        if buf.len() < FEEDBACK_RECORD_LEN {
            return Err(PushError::with_reason(
                ErrorKind::FeedbackLength,
                buf.len() as i64,
            ));
        }

        let timestamp = buf.get_u32();
        let token_len = buf.get_u16() as usize;
        if token_len != FEEDBACK_TOKEN_LEN {
            return Err(PushError::with_reason(
                ErrorKind::FeedbackTokenLength,
                token_len as i64,
            ));
        }

        Ok(FeedbackRecord {
            timestamp,
            device_token: Bytes::copy_from_slice(&buf[..FEEDBACK_TOKEN_LEN]),
        })
    }

    /// Device token rendered as lowercase hex
    pub fn device_token_hex(&self) -> String {
        hex::encode(&self.device_token)
    }
}
