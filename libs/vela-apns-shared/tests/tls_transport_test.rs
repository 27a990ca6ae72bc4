//! Loopback mutual-TLS transport tests with throwaway development
//! certificates

use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::RootCertStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use vela_apns_shared::frame::ErrorResponse;
use vela_apns_shared::{
    ErrorKind, Identity, TlsTransportConnector, TransportConnector, TransportSession,
};

struct DevCerts {
    ca_der: CertificateDer<'static>,
    server_chain: Vec<CertificateDer<'static>>,
    server_key: PrivateKeyDer<'static>,
    client_identity: Identity,
}

/// CA, CA-signed server certificate for localhost, and a CA-signed client
/// certificate. Test use only.
fn generate_dev_certs() -> DevCerts {
    let ca_keypair = rcgen::KeyPair::generate().unwrap();
    let mut ca_params = rcgen::CertificateParams::default();
    ca_params.distinguished_name = rcgen::DistinguishedName::new();
    ca_params
        .distinguished_name
        .push(rcgen::DnType::CommonName, "Vela Development CA");
    ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    let ca_cert = ca_params.self_signed(&ca_keypair).unwrap();

    let server_keypair = rcgen::KeyPair::generate().unwrap();
    let mut server_params = rcgen::CertificateParams::default();
    server_params.distinguished_name = rcgen::DistinguishedName::new();
    server_params
        .distinguished_name
        .push(rcgen::DnType::CommonName, "localhost");
    server_params
        .subject_alt_names
        .push(rcgen::SanType::DnsName("localhost".try_into().unwrap()));
    let server_cert = server_params
        .signed_by(&server_keypair, &ca_cert, &ca_keypair)
        .unwrap();

    let client_keypair = rcgen::KeyPair::generate().unwrap();
    let mut client_params = rcgen::CertificateParams::default();
    client_params.distinguished_name = rcgen::DistinguishedName::new();
    client_params
        .distinguished_name
        .push(rcgen::DnType::CommonName, "push client");
    let client_cert = client_params
        .signed_by(&client_keypair, &ca_cert, &ca_keypair)
        .unwrap();

    DevCerts {
        ca_der: ca_cert.der().clone(),
        server_chain: vec![server_cert.der().clone(), ca_cert.der().clone()],
        server_key: PrivateKeyDer::from(PrivatePkcs8KeyDer::from(server_keypair.serialize_der())),
        client_identity: Identity::from_pem(&client_cert.pem(), &client_keypair.serialize_pem())
            .unwrap(),
    }
}

/// Gateway stand-in requiring a client certificate signed by the dev CA.
fn acceptor_for(certs: &DevCerts) -> TlsAcceptor {
    let mut client_roots = RootCertStore::empty();
    client_roots.add(certs.ca_der.clone()).unwrap();
    let verifier = rustls::server::WebPkiClientVerifier::builder(Arc::new(client_roots))
        .build()
        .unwrap();

    let server_config = rustls::ServerConfig::builder()
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs.server_chain.clone(), certs.server_key.clone_key())
        .unwrap();
    TlsAcceptor::from(Arc::new(server_config))
}

#[tokio::test]
async fn test_transport_carries_frames_end_to_end() {
    let certs = generate_dev_certs();
    let acceptor = acceptor_for(&certs);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let frame = ErrorResponse {
        status: 2,
        identifier: 7,
    }
    .encode();
    let server_frame = frame.clone();
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut tls = acceptor.accept(tcp).await.unwrap();

        let mut inbound = [0u8; 4];
        tls.read_exact(&mut inbound).await.unwrap();
        assert_eq!(&inbound, b"ping");

        tls.write_all(&server_frame).await.unwrap();
        tls.shutdown().await.unwrap();
    });

    let connector = TlsTransportConnector::new()
        .with_only_added_roots()
        .with_added_root(certs.ca_der.clone());
    let session = connector
        .connect("localhost", port, &certs.client_identity)
        .await
        .unwrap();

    let written = session.write(b"ping").await.unwrap();
    assert_eq!(written, 4);

    let data = session.read(6).await.unwrap();
    let response = ErrorResponse::decode(&data).unwrap();
    assert_eq!(response.status, 2);
    assert_eq!(response.identifier, 7);
    assert_eq!(response.kind(), ErrorKind::ApnMissingDeviceToken);

    session.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn test_handshake_fails_against_unknown_root() {
    let certs = generate_dev_certs();
    let acceptor = acceptor_for(&certs);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        // The client aborts the handshake; the failure here is expected.
        let _ = acceptor.accept(tcp).await;
    });

    // Trust a different CA than the one that signed the server certificate.
    let other_ca = generate_dev_certs();
    let connector = TlsTransportConnector::new()
        .with_only_added_roots()
        .with_added_root(other_ca.ca_der.clone());

    let err = connector
        .connect("localhost", port, &certs.client_identity)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SslHandshakeUnknownRootCert);
}

#[tokio::test]
async fn test_disconnect_fails_pending_read_promptly() {
    let certs = generate_dev_certs();
    let acceptor = acceptor_for(&certs);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut tls = acceptor.accept(tcp).await.unwrap();
        // Hold the connection open without sending anything.
        let mut buf = [0u8; 1];
        let _ = tls.read_exact(&mut buf).await;
    });

    let connector = TlsTransportConnector::new()
        .with_only_added_roots()
        .with_added_root(certs.ca_der.clone());
    let session = connector
        .connect("localhost", port, &certs.client_identity)
        .await
        .unwrap();

    let reader_session = session.clone();
    let pending = tokio::spawn(async move { reader_session.read(6).await });

    // Give the read a moment to park on the socket.
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.disconnect().await;

    let result = tokio::time::timeout(Duration::from_secs(2), pending)
        .await
        .expect("pending read did not fail after disconnect")
        .unwrap();
    assert_eq!(result.unwrap_err().kind(), ErrorKind::ReadClosedAbort);
}
