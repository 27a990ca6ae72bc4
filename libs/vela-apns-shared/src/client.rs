//! Push session orchestration over the transport boundary

use std::sync::Arc;

use push_error_types::{ErrorKind, PushError, PushResult};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::{Environment, PUSH_PORT};
use crate::credentials::{environment_for, CredentialResolver, Identity};
use crate::frame::{ErrorResponse, ERROR_RESPONSE_LEN};
use crate::notification::{PayloadEncoder, PushNotification};
use crate::transport::{TlsTransportConnector, TransportConnector, TransportSession};

/// A previously-sent notification the gateway rejected.
///
/// The gateway's error channel is asynchronous and batched relative to
/// writes; callers correlate `identifier` against the identifiers of
/// notifications already sent to learn which one failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedNotification {
    /// Correlation identifier of the rejected notification
    pub identifier: u32,
    /// Raw status byte from the error-response frame
    pub status: u8,
    /// Taxonomy kind the status maps to
    pub error: ErrorKind,
}

/// Client for the enhanced binary push gateway protocol.
///
/// Owns at most one transport session. All operations take `&self`, so one
/// task can push continuously while another drains error-response frames
/// from the same connection.
pub struct GatewayClient {
    connector: Arc<dyn TransportConnector>,
    encoder: Arc<dyn PayloadEncoder>,
    session: RwLock<Option<Arc<dyn TransportSession>>>,
    last_connect: Mutex<Option<(Identity, Environment)>>,
}

impl GatewayClient {
    /// Create a client over the TLS transport with the given payload encoder.
    pub fn new(encoder: Arc<dyn PayloadEncoder>) -> Self {
        Self::with_connector(Arc::new(TlsTransportConnector::new()), encoder)
    }

    /// Create a client over a custom transport connector.
    pub fn with_connector(
        connector: Arc<dyn TransportConnector>,
        encoder: Arc<dyn PayloadEncoder>,
    ) -> Self {
        Self {
            connector,
            encoder,
            session: RwLock::new(None),
            last_connect: Mutex::new(None),
        }
    }

    /// Connect to the push gateway with an established identity.
    ///
    /// Any prior session is torn down first. [`Environment::Auto`] resolves
    /// from the identity's embedded entitlement here, once; the resolved
    /// value is what [`GatewayClient::reconnect`] reuses.
    pub async fn connect(&self, identity: Identity, environment: Environment) -> PushResult<()> {
        self.disconnect().await;

        let environment = match environment {
            Environment::Auto => environment_for(&identity)?,
            env => env,
        };
        self.connect_resolved(identity, environment).await
    }

    /// Resolve an identity from PKCS #12 material, then connect.
    ///
    /// Credential resolution happens entirely before any network activity.
    pub async fn connect_with_pkcs12(
        &self,
        resolver: &dyn CredentialResolver,
        data: &[u8],
        password: &str,
        environment: Environment,
    ) -> PushResult<()> {
        let identity = resolver.identity_from_pkcs12(data, password)?;
        self.connect(identity, environment).await
    }

    async fn connect_resolved(
        &self,
        identity: Identity,
        environment: Environment,
    ) -> PushResult<()> {
        self.disconnect().await;

        let host = environment.push_host();
        info!(
            host,
            environment = environment.name(),
            "connecting to push gateway"
        );

        let session = self.connector.connect(host, PUSH_PORT, &identity).await?;

        *self.session.write().await = Some(session);
        *self.last_connect.lock().await = Some((identity, environment));
        Ok(())
    }

    /// Send one notification.
    ///
    /// Fails with `PushNotConnected` when no session is open, and with
    /// `PushWriteFail` carrying the actual byte count when the transport
    /// accepts fewer bytes than the encoded frame holds.
    pub async fn push(&self, notification: &PushNotification) -> PushResult<()> {
        let session = self.current_session().await?;

        let data = self.encoder.encode(notification);
        let written = session.write(&data).await?;
        if written != data.len() {
            warn!(
                identifier = notification.identifier(),
                written,
                expected = data.len(),
                "notification not fully written"
            );
            return Err(PushError::with_reason(
                ErrorKind::PushWriteFail,
                written as i64,
            ));
        }

        debug!(
            identifier = notification.identifier(),
            bytes = written,
            "notification written"
        );
        Ok(())
    }

    /// Drain one pending error-response frame.
    ///
    /// Suspends until the 6-byte frame arrives or the stream reports closure
    /// or error. A leading byte other than the error-response command fails
    /// with `PushResponseCommand` carrying the unexpected byte.
    pub async fn read_failed_identifier(&self) -> PushResult<FailedNotification> {
        let session = self.current_session().await?;

        let data = session.read(ERROR_RESPONSE_LEN).await?;
        let frame = ErrorResponse::decode(&data)?;

        let failed = FailedNotification {
            identifier: frame.identifier,
            status: frame.status,
            error: frame.kind(),
        };
        if failed.error != ErrorKind::None {
            warn!(
                identifier = failed.identifier,
                status = failed.status,
                error = %failed.error,
                "gateway rejected notification"
            );
        }
        Ok(failed)
    }

    /// Re-establish the most recent successful connection.
    ///
    /// Fails with `PushNotConnected` when no prior connect succeeded. The
    /// remembered environment is already concrete, so `Auto` is never
    /// re-resolved here.
    pub async fn reconnect(&self) -> PushResult<()> {
        let last = self.last_connect.lock().await.clone();
        match last {
            Some((identity, environment)) => self.connect_resolved(identity, environment).await,
            None => Err(PushError::new(ErrorKind::PushNotConnected)),
        }
    }

    /// Tear down the current session, if any. Idempotent.
    pub async fn disconnect(&self) {
        let session = self.session.write().await.take();
        if let Some(session) = session {
            session.disconnect().await;
            info!("disconnected from push gateway");
        }
    }

    async fn current_session(&self) -> PushResult<Arc<dyn TransportSession>> {
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| PushError::new(ErrorKind::PushNotConnected))
    }
}
