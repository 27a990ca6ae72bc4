//! Client identity material and the credential-resolution boundary
//!
//! An [`Identity`] is the certificate chain plus private key used to
//! mutually authenticate the TLS handshake. Extraction from PKCS #12 blobs
//! or an OS credential store stays behind the [`CredentialResolver`]
//! boundary; this crate only consumes the result.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use push_error_types::{ErrorKind, PushError, PushResult};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use x509_parser::prelude::*;

use crate::config::Environment;

/// Apple push entitlement extension OIDs embedded in provisioning
/// certificates
const APNS_DEVELOPMENT_OID: &str = "1.2.840.113635.100.6.3.1";
const APNS_PRODUCTION_OID: &str = "1.2.840.113635.100.6.3.2";

struct IdentityInner {
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

/// Certificate chain plus private key for the mutual TLS handshake.
///
/// Cheap to clone; the key material is shared, not copied.
#[derive(Clone)]
pub struct Identity {
    inner: Arc<IdentityInner>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("chain_len", &self.inner.chain.len())
            .finish_non_exhaustive()
    }
}

impl Identity {
    /// Build an identity from DER certificates (leaf first) and a DER key.
    pub fn from_der(
        chain: Vec<CertificateDer<'static>>,
        key: PrivateKeyDer<'static>,
    ) -> PushResult<Self> {
        if chain.is_empty() {
            return Err(PushError::new(ErrorKind::IdentityCopyCertificate));
        }
        Ok(Self {
            inner: Arc::new(IdentityInner { chain, key }),
        })
    }

    /// Parse a PEM certificate chain and a PEM private key.
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> PushResult<Self> {
        let chain = rustls_pemfile::certs(&mut cert_pem.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| PushError::new(ErrorKind::IdentityCopyCertificate))?;

        let key = rustls_pemfile::private_key(&mut key_pem.as_bytes())
            .map_err(|_| PushError::new(ErrorKind::IdentityCopyPrivateKey))?
            .ok_or_else(|| PushError::new(ErrorKind::IdentityCopyPrivateKey))?;

        Self::from_der(chain, key)
    }

    /// Load a PEM certificate file and a PEM key file from disk.
    pub fn from_pem_files(cert_path: &Path, key_path: &Path) -> PushResult<Self> {
        let cert_pem = fs::read_to_string(cert_path)
            .map_err(|_| PushError::new(ErrorKind::IdentityCopyCertificate))?;
        let key_pem = fs::read_to_string(key_path)
            .map_err(|_| PushError::new(ErrorKind::IdentityCopyPrivateKey))?;

        Self::from_pem(&cert_pem, &key_pem)
    }

    /// Certificate chain, leaf first.
    pub fn certificate_chain(&self) -> Vec<CertificateDer<'static>> {
        self.inner.chain.clone()
    }

    /// Private key for the handshake.
    pub fn private_key(&self) -> PrivateKeyDer<'static> {
        self.inner.key.clone_key()
    }

    fn leaf_der(&self) -> &[u8] {
        self.inner.chain[0].as_ref()
    }
}

/// Boundary for extracting a signing identity from opaque credential
/// material.
///
/// Implementations decode PKCS #12 blobs or consult an OS credential store;
/// failures use the `Pkcs12*`/`Keychain*` kinds. Resolution runs entirely
/// before any network activity is attempted.
pub trait CredentialResolver: Send + Sync {
    fn identity_from_pkcs12(&self, data: &[u8], password: &str) -> PushResult<Identity>;
}

/// Resolve the deployment environment embedded in an identity's leaf
/// certificate.
///
/// A certificate entitled for production push only resolves to
/// [`Environment::Production`]; a development entitlement, a combined
/// entitlement, or no entitlement at all resolves to
/// [`Environment::Sandbox`]. Never returns [`Environment::Auto`].
pub fn environment_for(identity: &Identity) -> PushResult<Environment> {
    let (_, cert) = X509Certificate::from_der(identity.leaf_der())
        .map_err(|_| PushError::new(ErrorKind::SslCertificate))?;

    let mut development = false;
    let mut production = false;
    for ext in cert.extensions() {
        match ext.oid.to_id_string().as_str() {
            APNS_DEVELOPMENT_OID => development = true,
            APNS_PRODUCTION_OID => production = true,
            _ => {}
        }
    }

    if production && !development {
        Ok(Environment::Production)
    } else {
        Ok(Environment::Sandbox)
    }
}
