//! Unified error taxonomy for binary push gateway delivery
//!
//! Every failure a push session can surface — gateway status codes, session
//! misuse, socket setup, TLS handshake, stream reads/writes, and credential
//! handling — is one kind in a single flat enum. Callers match on the kind
//! directly to decide between retrying, alerting, and dropping; the
//! description text is stable and suitable for logs.

use thiserror::Error;

/// Result type alias for push gateway operations
pub type PushResult<T> = Result<T, PushError>;

/// Closed set of push delivery failure kinds.
///
/// The gateway status kinds (`Apn*`) carry the meaning of the status byte in
/// the asynchronous error-response frame; the remaining families classify
/// local failures. The set is flat by design: operational responses differ
/// per kind even within one family, so there is no error hierarchy to catch.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Status byte 0, the gateway reported no error
    #[error("No error, that's odd")]
    None,

    #[error("APN processing error")]
    ApnProcessing,

    #[error("APN missing device token")]
    ApnMissingDeviceToken,

    #[error("APN missing topic")]
    ApnMissingTopic,

    #[error("APN missing payload")]
    ApnMissingPayload,

    #[error("APN invalid token size")]
    ApnInvalidTokenSize,

    #[error("APN invalid topic size")]
    ApnInvalidTopicSize,

    #[error("APN invalid payload size")]
    ApnInvalidPayloadSize,

    #[error("APN invalid token")]
    ApnInvalidTokenContent,

    #[error("APN unknown reason")]
    ApnUnknownReason,

    #[error("APN shutdown")]
    ApnShutdown,

    #[error("APN unknown error code")]
    ApnUnknownErrorCode,

    /// The leading byte of an error-response frame was not the expected
    /// command tag
    #[error("Push response command unknown")]
    PushResponseCommand,

    #[error("Push reconnect requires connection")]
    PushNotConnected,

    /// Fewer bytes were written than the encoded notification holds
    #[error("Push not fully sent")]
    PushWriteFail,

    #[error("Feedback data length unexpected")]
    FeedbackLength,

    #[error("Feedback token length unexpected")]
    FeedbackTokenLength,

    #[error("Socket cannot be created")]
    SocketCreate,

    #[error("Socket connecting failed")]
    SocketConnect,

    #[error("Socket host cannot be resolved")]
    SocketResolveHostName,

    #[error("Socket file control failed")]
    SocketFileControl,

    #[error("Socket options cannot be set")]
    SocketOptions,

    #[error("SSL connection cannot be set")]
    SslConnection,

    #[error("SSL context cannot be created")]
    SslContext,

    #[error("SSL callbacks cannot be set")]
    SslIoFuncs,

    #[error("SSL peer domain name cannot be set")]
    SslPeerDomainName,

    #[error("SSL certificate cannot be set")]
    SslCertificate,

    #[error("SSL handshake dropped by server")]
    SslDroppedByServer,

    #[error("SSL handshake authentication failed")]
    SslAuthFailed,

    #[error("SSL handshake failed")]
    SslHandshakeFail,

    #[error("SSL handshake root not a known anchor")]
    SslHandshakeUnknownRootCert,

    #[error("SSL handshake chain not verifiable to root")]
    SslHandshakeNoRootCert,

    #[error("SSL handshake expired certificates")]
    SslHandshakeCertExpired,

    #[error("SSL handshake invalid certificate chain")]
    SslHandshakeXCertChainInvalid,

    #[error("SSL handshake expecting client cert")]
    SslHandshakeClientCertRequested,

    #[error("SSL handshake auth interrupted")]
    SslHandshakeServerAuthCompleted,

    #[error("SSL handshake certificate expired")]
    SslHandshakePeerCertExpired,

    #[error("SSL handshake certificate revoked")]
    SslHandshakePeerCertRevoked,

    #[error("SSL handshake certificate unknown")]
    SslHandshakePeerCertUnknown,

    #[error("SSL handshake internal error")]
    SslHandshakeInternalError,

    #[error("SSL handshake in dark wake")]
    SslInDarkWake,

    #[error("SSL handshake connection closed via error")]
    SslHandshakeClosedAbort,

    #[error("SSL handshake timeout")]
    SslHandshakeTimeout,

    #[error("Read connection dropped by server")]
    ReadDroppedByServer,

    #[error("Read connection error")]
    ReadClosedAbort,

    #[error("Read connection closed")]
    ReadClosedGraceful,

    #[error("Read failed")]
    ReadFail,

    #[error("Write connection dropped by server")]
    WriteDroppedByServer,

    #[error("Write connection error")]
    WriteClosedAbort,

    #[error("Write connection closed")]
    WriteClosedGraceful,

    #[error("Write failed")]
    WriteFail,

    #[error("Identity does not contain certificate")]
    IdentityCopyCertificate,

    #[error("Identity does not contain private key")]
    IdentityCopyPrivateKey,

    #[error("PKCS12 data cannot be imported")]
    Pkcs12Import,

    #[error("PKCS12 data is empty")]
    Pkcs12EmptyData,

    #[error("PKCS12 data cannot be read or is malformed")]
    Pkcs12Decode,

    #[error("PKCS12 data password incorrect")]
    Pkcs12AuthFailed,

    #[error("PKCS12 data wrong password")]
    Pkcs12Password,

    #[error("PKCS12 data password required")]
    Pkcs12PasswordRequired,

    #[error("PKCS12 data contains no identities")]
    Pkcs12NoItems,

    #[error("PKCS12 data contains multiple identities")]
    Pkcs12MultipleItems,

    #[error("Keychain cannot be searched")]
    KeychainCopyMatching,

    #[error("Keychain does not contain private key")]
    KeychainItemNotFound,

    #[error("Keychain does not contain certificate")]
    KeychainCreateIdentity,
}

impl ErrorKind {
    /// Map a gateway status byte to its error kind.
    ///
    /// Total over all 256 byte values: statuses 0-8 and 10 carry documented
    /// meanings, everything else (including the reserved 9) maps to
    /// [`ErrorKind::ApnUnknownErrorCode`].
    pub fn from_status(status: u8) -> ErrorKind {
        match status {
            0 => ErrorKind::None,
            1 => ErrorKind::ApnProcessing,
            2 => ErrorKind::ApnMissingDeviceToken,
            3 => ErrorKind::ApnMissingTopic,
            4 => ErrorKind::ApnMissingPayload,
            5 => ErrorKind::ApnInvalidTokenSize,
            6 => ErrorKind::ApnInvalidTopicSize,
            7 => ErrorKind::ApnInvalidPayloadSize,
            8 => ErrorKind::ApnInvalidTokenContent,
            10 => ErrorKind::ApnShutdown,
            _ => ErrorKind::ApnUnknownErrorCode,
        }
    }

    /// Check if failures of this kind are worth retrying as-is.
    ///
    /// Everything else needs operator action (credentials, certificates) or
    /// a corrected notification before a retry can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::ApnProcessing
                | ErrorKind::ApnShutdown
                | ErrorKind::SocketConnect
                | ErrorKind::SslDroppedByServer
                | ErrorKind::SslHandshakeTimeout
                | ErrorKind::ReadDroppedByServer
                | ErrorKind::WriteDroppedByServer
        )
    }

    /// The complete closed set, in declaration order.
    pub fn all() -> &'static [ErrorKind] {
        const ALL: [ErrorKind; 64] = [
            ErrorKind::None,
            ErrorKind::ApnProcessing,
            ErrorKind::ApnMissingDeviceToken,
            ErrorKind::ApnMissingTopic,
            ErrorKind::ApnMissingPayload,
            ErrorKind::ApnInvalidTokenSize,
            ErrorKind::ApnInvalidTopicSize,
            ErrorKind::ApnInvalidPayloadSize,
            ErrorKind::ApnInvalidTokenContent,
            ErrorKind::ApnUnknownReason,
            ErrorKind::ApnShutdown,
            ErrorKind::ApnUnknownErrorCode,
            ErrorKind::PushResponseCommand,
            ErrorKind::PushNotConnected,
            ErrorKind::PushWriteFail,
            ErrorKind::FeedbackLength,
            ErrorKind::FeedbackTokenLength,
            ErrorKind::SocketCreate,
            ErrorKind::SocketConnect,
            ErrorKind::SocketResolveHostName,
            ErrorKind::SocketFileControl,
            ErrorKind::SocketOptions,
            ErrorKind::SslConnection,
            ErrorKind::SslContext,
            ErrorKind::SslIoFuncs,
            ErrorKind::SslPeerDomainName,
            ErrorKind::SslCertificate,
            ErrorKind::SslDroppedByServer,
            ErrorKind::SslAuthFailed,
            ErrorKind::SslHandshakeFail,
            ErrorKind::SslHandshakeUnknownRootCert,
            ErrorKind::SslHandshakeNoRootCert,
            ErrorKind::SslHandshakeCertExpired,
            ErrorKind::SslHandshakeXCertChainInvalid,
            ErrorKind::SslHandshakeClientCertRequested,
            ErrorKind::SslHandshakeServerAuthCompleted,
            ErrorKind::SslHandshakePeerCertExpired,
            ErrorKind::SslHandshakePeerCertRevoked,
            ErrorKind::SslHandshakePeerCertUnknown,
            ErrorKind::SslHandshakeInternalError,
            ErrorKind::SslInDarkWake,
            ErrorKind::SslHandshakeClosedAbort,
            ErrorKind::SslHandshakeTimeout,
            ErrorKind::ReadDroppedByServer,
            ErrorKind::ReadClosedAbort,
            ErrorKind::ReadClosedGraceful,
            ErrorKind::ReadFail,
            ErrorKind::WriteDroppedByServer,
            ErrorKind::WriteClosedAbort,
            ErrorKind::WriteClosedGraceful,
            ErrorKind::WriteFail,
            ErrorKind::IdentityCopyCertificate,
            ErrorKind::IdentityCopyPrivateKey,
            ErrorKind::Pkcs12Import,
            ErrorKind::Pkcs12EmptyData,
            ErrorKind::Pkcs12Decode,
            ErrorKind::Pkcs12AuthFailed,
            ErrorKind::Pkcs12Password,
            ErrorKind::Pkcs12PasswordRequired,
            ErrorKind::Pkcs12NoItems,
            ErrorKind::Pkcs12MultipleItems,
            ErrorKind::KeychainCopyMatching,
            ErrorKind::KeychainItemNotFound,
            ErrorKind::KeychainCreateIdentity,
        ];
        &ALL
    }
}

/// Structured push error: a taxonomy kind plus an optional numeric reason.
///
/// The reason carries the underlying detail where one exists — the raw status
/// byte, the unexpected command byte, the actual byte count of a short write,
/// or an OS error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushError {
    kind: ErrorKind,
    reason: Option<i64>,
}

impl PushError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, reason: None }
    }

    pub fn with_reason(kind: ErrorKind, reason: i64) -> Self {
        Self {
            kind,
            reason: Some(reason),
        }
    }

    /// The machine-matchable failure kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The underlying numeric detail, where one exists
    pub fn reason(&self) -> Option<i64> {
        self.reason
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl std::fmt::Display for PushError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            Some(reason) => write!(f, "{} (reason {})", self.kind, reason),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for PushError {}

impl From<ErrorKind> for PushError {
    fn from(kind: ErrorKind) -> Self {
        PushError::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_stable_nonempty_description() {
        for kind in ErrorKind::all() {
            let first = kind.to_string();
            assert!(!first.is_empty(), "{:?} has an empty description", kind);
            assert_eq!(first, kind.to_string(), "{:?} description unstable", kind);
        }
    }

    #[test]
    fn test_all_is_the_complete_closed_set() {
        assert_eq!(ErrorKind::all().len(), 64);

        let mut seen = std::collections::HashSet::new();
        for kind in ErrorKind::all() {
            assert!(seen.insert(kind), "{:?} listed twice", kind);
        }
    }

    #[test]
    fn test_documented_status_mapping() {
        assert_eq!(ErrorKind::from_status(0), ErrorKind::None);
        assert_eq!(ErrorKind::from_status(1), ErrorKind::ApnProcessing);
        assert_eq!(ErrorKind::from_status(2), ErrorKind::ApnMissingDeviceToken);
        assert_eq!(ErrorKind::from_status(3), ErrorKind::ApnMissingTopic);
        assert_eq!(ErrorKind::from_status(4), ErrorKind::ApnMissingPayload);
        assert_eq!(ErrorKind::from_status(5), ErrorKind::ApnInvalidTokenSize);
        assert_eq!(ErrorKind::from_status(6), ErrorKind::ApnInvalidTopicSize);
        assert_eq!(ErrorKind::from_status(7), ErrorKind::ApnInvalidPayloadSize);
        assert_eq!(ErrorKind::from_status(8), ErrorKind::ApnInvalidTokenContent);
        assert_eq!(ErrorKind::from_status(10), ErrorKind::ApnShutdown);
    }

    #[test]
    fn test_unlisted_statuses_map_to_unknown() {
        // 9 is reserved and carries no documented meaning
        assert_eq!(ErrorKind::from_status(9), ErrorKind::ApnUnknownErrorCode);

        for status in 11..=255u8 {
            assert_eq!(
                ErrorKind::from_status(status),
                ErrorKind::ApnUnknownErrorCode,
                "status {} must map to the unknown kind",
                status
            );
        }
    }

    #[test]
    fn test_error_display_includes_reason() {
        let err = PushError::with_reason(ErrorKind::PushWriteFail, 50);
        assert_eq!(err.to_string(), "Push not fully sent (reason 50)");

        let err = PushError::new(ErrorKind::PushNotConnected);
        assert_eq!(err.to_string(), "Push reconnect requires connection");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ErrorKind::SslHandshakeTimeout.is_retryable());
        assert!(ErrorKind::ApnShutdown.is_retryable());
        assert!(!ErrorKind::SslHandshakeCertExpired.is_retryable());
        assert!(!ErrorKind::Pkcs12Password.is_retryable());
        assert!(!ErrorKind::PushNotConnected.is_retryable());
    }

    #[test]
    fn test_kind_converts_to_error() {
        let err: PushError = ErrorKind::ReadClosedGraceful.into();
        assert_eq!(err.kind(), ErrorKind::ReadClosedGraceful);
        assert_eq!(err.reason(), None);
    }
}
