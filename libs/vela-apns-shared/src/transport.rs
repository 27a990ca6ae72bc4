//! Transport boundary and the TLS adapter for the push gateway
//!
//! The session traits keep the orchestrators independent of the socket
//! machinery; [`TlsTransportConnector`] is the production adapter that maps
//! every socket, handshake, and stream failure into the unified taxonomy so
//! downstream retry/alerting decisions can match on one kind.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use push_error_types::{ErrorKind, PushError, PushResult};
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::RootCertStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio_rustls::client::TlsStream;
use tracing::{debug, info};

use crate::credentials::Identity;

/// An established, mutually-authenticated byte stream to a gateway.
///
/// Reads and writes lock independently, so one task may sit in an
/// exact-length `read` while another task keeps writing.
#[async_trait]
pub trait TransportSession: Send + Sync {
    /// Write the buffer once, returning the number of bytes accepted.
    async fn write(&self, data: &[u8]) -> PushResult<usize>;

    /// Read exactly `len` bytes, suspending until they arrive or the stream
    /// reports closure or error.
    async fn read(&self, len: usize) -> PushResult<Bytes>;

    /// Tear the stream down. A pending `read` fails promptly.
    async fn disconnect(&self);
}

/// Boundary for establishing transport sessions.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        identity: &Identity,
    ) -> PushResult<Arc<dyn TransportSession>>;
}

/// TLS transport connector backed by rustls.
///
/// Verifies the gateway against the platform trust store by default; extra
/// roots can be added for loopback or staging gateways.
pub struct TlsTransportConnector {
    extra_roots: Vec<CertificateDer<'static>>,
    use_native_roots: bool,
}

impl TlsTransportConnector {
    pub fn new() -> Self {
        Self {
            extra_roots: Vec::new(),
            use_native_roots: true,
        }
    }

    /// Trust an additional root certificate.
    pub fn with_added_root(mut self, root: CertificateDer<'static>) -> Self {
        self.extra_roots.push(root);
        self
    }

    /// Skip the platform trust store and trust only the added roots.
    pub fn with_only_added_roots(mut self) -> Self {
        self.use_native_roots = false;
        self
    }

    fn root_store(&self) -> PushResult<RootCertStore> {
        let mut roots = RootCertStore::empty();

        if self.use_native_roots {
            let native = rustls_native_certs::load_native_certs()
                .map_err(|_| PushError::new(ErrorKind::SslContext))?;
            for cert in native {
                // Unusable platform anchors are skipped, not fatal
                let _ = roots.add(cert);
            }
        }

        for cert in &self.extra_roots {
            roots
                .add(cert.clone())
                .map_err(|_| PushError::new(ErrorKind::SslCertificate))?;
        }

        Ok(roots)
    }
}

impl Default for TlsTransportConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportConnector for TlsTransportConnector {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        identity: &Identity,
    ) -> PushResult<Arc<dyn TransportSession>> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| PushError::new(ErrorKind::SslPeerDomainName))?;

        let addrs: Vec<_> = tokio::net::lookup_host((host, port))
            .await
            .map_err(|_| PushError::new(ErrorKind::SocketResolveHostName))?
            .collect();
        if addrs.is_empty() {
            return Err(PushError::new(ErrorKind::SocketResolveHostName));
        }

        let mut tcp = None;
        let mut last_err = PushError::new(ErrorKind::SocketConnect);
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    tcp = Some(stream);
                    break;
                }
                Err(err) => last_err = map_connect_error(&err),
            }
        }
        let Some(tcp) = tcp else {
            return Err(last_err);
        };

        tcp.set_nodelay(true)
            .map_err(|_| PushError::new(ErrorKind::SocketOptions))?;

        let roots = self.root_store()?;
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_client_auth_cert(identity.certificate_chain(), identity.private_key())
            .map_err(|_| PushError::new(ErrorKind::SslCertificate))?;

        let connector = tokio_rustls::TlsConnector::from(Arc::new(tls_config));
        let stream = connector
            .connect(server_name, tcp)
            .await
            .map_err(|err| map_handshake_error(&err))?;

        info!(host, port, "TLS session established");

        Ok(Arc::new(TlsSession::new(stream)))
    }
}

/// A live TLS stream split into independently locked halves.
struct TlsSession {
    reader: Mutex<ReadHalf<TlsStream<TcpStream>>>,
    writer: Mutex<WriteHalf<TlsStream<TcpStream>>>,
    closed_tx: watch::Sender<bool>,
    closed_rx: watch::Receiver<bool>,
}

impl TlsSession {
    fn new(stream: TlsStream<TcpStream>) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        let (closed_tx, closed_rx) = watch::channel(false);
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            closed_tx,
            closed_rx,
        }
    }
}

#[async_trait]
impl TransportSession for TlsSession {
    async fn write(&self, data: &[u8]) -> PushResult<usize> {
        if *self.closed_rx.borrow() {
            return Err(PushError::new(ErrorKind::WriteClosedGraceful));
        }

        let mut writer = self.writer.lock().await;
        let written = writer.write(data).await.map_err(|e| map_write_error(&e))?;
        writer.flush().await.map_err(|e| map_write_error(&e))?;
        Ok(written)
    }

    async fn read(&self, len: usize) -> PushResult<Bytes> {
        let mut closed = self.closed_rx.clone();
        if *closed.borrow_and_update() {
            return Err(PushError::new(ErrorKind::ReadClosedAbort));
        }

        let mut buf = vec![0u8; len];
        let mut reader = self.reader.lock().await;
        tokio::select! {
            biased;
            _ = closed.changed() => Err(PushError::new(ErrorKind::ReadClosedAbort)),
            res = reader.read_exact(&mut buf) => match res {
                Ok(_) => Ok(Bytes::from(buf)),
                Err(err) => Err(map_read_error(&err)),
            },
        }
    }

    async fn disconnect(&self) {
        if self.closed_tx.send_replace(true) {
            return;
        }
        debug!("closing TLS session");
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }
}

fn map_connect_error(err: &io::Error) -> PushError {
    match err.raw_os_error() {
        Some(code) => PushError::with_reason(ErrorKind::SocketConnect, i64::from(code)),
        None => PushError::new(ErrorKind::SocketConnect),
    }
}

/// Classify a handshake failure into the SSL kinds. tokio-rustls surfaces
/// rustls errors wrapped in `io::Error`, so unwrap that layer first.
fn map_handshake_error(err: &io::Error) -> PushError {
    if let Some(tls_err) = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    {
        return PushError::new(map_tls_error(tls_err));
    }

    let kind = match err.kind() {
        io::ErrorKind::TimedOut => ErrorKind::SslHandshakeTimeout,
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => ErrorKind::SslDroppedByServer,
        _ => ErrorKind::SslHandshakeFail,
    };
    PushError::new(kind)
}

fn map_tls_error(err: &rustls::Error) -> ErrorKind {
    use rustls::{AlertDescription, CertificateError, Error};

    match err {
        Error::InvalidCertificate(cert_err) => match cert_err {
            CertificateError::Expired => ErrorKind::SslHandshakeCertExpired,
            CertificateError::Revoked => ErrorKind::SslHandshakePeerCertRevoked,
            CertificateError::UnknownIssuer => ErrorKind::SslHandshakeUnknownRootCert,
            CertificateError::NotValidYet | CertificateError::BadSignature => {
                ErrorKind::SslHandshakeXCertChainInvalid
            }
            _ => ErrorKind::SslHandshakePeerCertUnknown,
        },
        Error::AlertReceived(alert) => match alert {
            AlertDescription::CloseNotify => ErrorKind::SslDroppedByServer,
            AlertDescription::BadCertificate
            | AlertDescription::CertificateRequired
            | AlertDescription::CertificateUnknown
            | AlertDescription::AccessDenied => ErrorKind::SslAuthFailed,
            _ => ErrorKind::SslHandshakeFail,
        },
        Error::InvalidMessage(_) | Error::PeerMisbehaved(_) => ErrorKind::SslHandshakeInternalError,
        _ => ErrorKind::SslHandshakeFail,
    }
}

fn map_read_error(err: &io::Error) -> PushError {
    let kind = match err.kind() {
        io::ErrorKind::UnexpectedEof => ErrorKind::ReadClosedGraceful,
        io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => {
            ErrorKind::ReadDroppedByServer
        }
        io::ErrorKind::ConnectionAborted => ErrorKind::ReadClosedAbort,
        _ => ErrorKind::ReadFail,
    };
    match err.raw_os_error() {
        Some(code) => PushError::with_reason(kind, i64::from(code)),
        None => PushError::new(kind),
    }
}

fn map_write_error(err: &io::Error) -> PushError {
    let kind = match err.kind() {
        io::ErrorKind::UnexpectedEof | io::ErrorKind::WriteZero => ErrorKind::WriteClosedGraceful,
        io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => {
            ErrorKind::WriteDroppedByServer
        }
        io::ErrorKind::ConnectionAborted => ErrorKind::WriteClosedAbort,
        _ => ErrorKind::WriteFail,
    };
    match err.raw_os_error() {
        Some(code) => PushError::with_reason(kind, i64::from(code)),
        None => PushError::new(kind),
    }
}
