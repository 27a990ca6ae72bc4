//! Feedback service reader
//!
//! The feedback service streams the device tokens the gateway could not
//! deliver to, usually because the app was removed from the device. Connect
//! periodically, read the batch, and retire those tokens; the server drops
//! the connection once all records are delivered.

use std::sync::Arc;

use push_error_types::{ErrorKind, PushError, PushResult};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{Environment, FEEDBACK_PORT};
use crate::credentials::{environment_for, CredentialResolver, Identity};
use crate::frame::{FeedbackRecord, FEEDBACK_RECORD_LEN};
use crate::transport::{TlsTransportConnector, TransportConnector, TransportSession};

/// Client for the feedback service's token/date stream.
pub struct FeedbackClient {
    connector: Arc<dyn TransportConnector>,
    session: Mutex<Option<Arc<dyn TransportSession>>>,
}

impl FeedbackClient {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(TlsTransportConnector::new()))
    }

    pub fn with_connector(connector: Arc<dyn TransportConnector>) -> Self {
        Self {
            connector,
            session: Mutex::new(None),
        }
    }

    /// Connect to the feedback service with an established identity.
    ///
    /// Environment selection works exactly as for the push gateway,
    /// including `Auto` resolution from the identity's entitlement.
    pub async fn connect(&self, identity: Identity, environment: Environment) -> PushResult<()> {
        self.disconnect().await;

        let environment = match environment {
            Environment::Auto => environment_for(&identity)?,
            env => env,
        };

        let host = environment.feedback_host();
        info!(
            host,
            environment = environment.name(),
            "connecting to feedback service"
        );

        let session = self
            .connector
            .connect(host, FEEDBACK_PORT, &identity)
            .await?;
        *self.session.lock().await = Some(session);
        Ok(())
    }

    /// Resolve an identity from PKCS #12 material, then connect.
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

    /// Read up to `max` token/date records.
    ///
    /// The server closes the stream once every pending record has been
    /// delivered; a clean close ends the batch. A malformed record fails the
    /// whole read.
    pub async fn read_token_date_pairs(&self, max: usize) -> PushResult<Vec<FeedbackRecord>> {
        let session = self
            .session
            .lock()
            .await
            .clone()
            .ok_or_else(|| PushError::new(ErrorKind::PushNotConnected))?;

        let mut records = Vec::new();
        while records.len() < max {
            let data = match session.read(FEEDBACK_RECORD_LEN).await {
                Ok(data) => data,
                Err(err) if err.kind() == ErrorKind::ReadClosedGraceful => break,
                Err(err) => return Err(err),
            };
            records.push(FeedbackRecord::decode(&data)?);
        }

        debug!(count = records.len(), "feedback records read");
        Ok(records)
    }

    /// Tear down the current session, if any. Idempotent.
    pub async fn disconnect(&self) {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            session.disconnect().await;
            info!("disconnected from feedback service");
        }
    }
}

impl Default for FeedbackClient {
    fn default() -> Self {
        Self::new()
    }
}
