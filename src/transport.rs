use std::sync::Arc;
use std::time::Duration;

use log::debug;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::stack::Stack;
use openssl::x509::X509;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Certificate, Identity};
use reqwest::Url;

use crate::credentials::RegistryCredentials;
use crate::error::{Error, Result};
use crate::json_config::BasicAuth;

const REGISTRY_CONTENT_TYPES: &str =
    "application/vnd.schemaregistry.v1+json, application/vnd.schemaregistry+json, application/json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryResponse {
    pub status: u16,
    pub body: String,
}

impl RegistryResponse {
    pub fn new(status: u16, body: &str) -> Self {
        RegistryResponse {
            status,
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Any HTTP status comes back as a response; `Err` means nothing was received.
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url) -> Result<RegistryResponse>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, url: &Url) -> Result<RegistryResponse> {
        (**self).get(url)
    }
}

pub struct TlsTransport {
    client: Client,
}

impl TlsTransport {
    pub fn new(
        credentials: &RegistryCredentials,
        timeout: Duration,
        auth: Option<&BasicAuth>,
    ) -> Result<Self> {
        let identity =
            identity_from_pem(credentials.private_key(), credentials.client_certificate())?;
        let roots = certificates_from_pem(credentials.trusted_ca())?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(REGISTRY_CONTENT_TYPES));

        if let Some(auth) = auth {
            let mut value = HeaderValue::from_str(&format!(
                "Basic {}",
                base64::encode(format!("{}:{}", auth.username, auth.password))
            ))
            .map_err(|e| Error::config(format!("invalid basic auth credentials: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = Client::builder()
            .use_native_tls()
            .tls_built_in_root_certs(false)
            .identity(identity)
            .https_only(true)
            .redirect(reqwest::redirect::Policy::none())
            .default_headers(headers)
            .timeout(timeout);

        for root in roots {
            builder = builder.add_root_certificate(root);
        }

        let client = builder
            .build()
            .map_err(|e| Error::config(format!("unable to build TLS client: {}", e)))?;

        Ok(TlsTransport { client })
    }
}

impl Transport for TlsTransport {
    fn get(&self, url: &Url) -> Result<RegistryResponse> {
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        Ok(RegistryResponse { status, body })
    }
}

fn read_certificates(pem: &[u8], what: &str) -> Result<Vec<X509>> {
    let certificates = X509::stack_from_pem(pem)
        .map_err(|e| Error::config(format!("invalid {}: {}", what, e)))?;

    // stack_from_pem can return nothing for malformed input instead of failing.
    if certificates.is_empty() {
        let reason = X509::from_pem(pem)
            .err()
            .map_or_else(|| "no certificates found".to_string(), |e| e.to_string());
        return Err(Error::config(format!("invalid {}: {}", what, reason)));
    }

    Ok(certificates)
}

/// Certificates after the first one in `cert` are sent as the chain.
fn identity_from_pem(key: &[u8], cert: &[u8]) -> Result<Identity> {
    let pkey: PKey<Private> = PKey::private_key_from_pem(key)
        .map_err(|e| Error::config(format!("invalid private key: {}", e)))?;

    let mut chain = read_certificates(cert, "client certificate")?.into_iter();
    let leaf = chain
        .next()
        .ok_or_else(|| Error::config("client certificate is empty"))?;

    let matches = leaf
        .public_key()
        .map(|public| public.public_eq(&pkey))
        .unwrap_or(false);
    if !matches {
        return Err(Error::config("private key does not match the client certificate"));
    }

    let archive = build_pkcs12(&pkey, &leaf, chain)
        .map_err(|e| Error::config(format!("unable to package client identity: {}", e)))?;

    Identity::from_pkcs12_der(&archive, "")
        .map_err(|e| Error::config(format!("invalid client identity: {}", e)))
}

fn build_pkcs12(
    pkey: &PKey<Private>,
    leaf: &X509,
    chain: impl Iterator<Item = X509>,
) -> std::result::Result<Vec<u8>, openssl::error::ErrorStack> {
    let mut ca = Stack::new()?;
    for cert in chain {
        ca.push(cert)?;
    }

    Pkcs12::builder()
        .name("")
        .pkey(pkey)
        .cert(leaf)
        .ca(ca)
        .build2("")?
        .to_der()
}

fn certificates_from_pem(pem: &[u8]) -> Result<Vec<Certificate>> {
    read_certificates(pem, "trusted CA bundle")?
        .iter()
        .map(|cert| {
            cert.to_der()
                .map_err(|e| Error::config(format!("invalid trusted CA bundle: {}", e)))
                .and_then(|der| {
                    Certificate::from_der(&der)
                        .map_err(|e| Error::config(format!("invalid trusted CA bundle: {}", e)))
                })
        })
        .collect()
}
