use std::fs;
use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// `{"path": "..."}` or `{"pem": "..."}` in a config file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    Path(PathBuf),
    Pem(String),
    #[serde(skip)]
    Bytes(Vec<u8>),
}

impl CredentialSource {
    fn load(&self, what: &str) -> Result<Vec<u8>> {
        let data = match self {
            CredentialSource::Path(path) => {
                if path.as_os_str().is_empty() {
                    return Err(Error::config(format!("{} path is empty", what)));
                }

                debug!("loading {} from {}", what, path.display());

                fs::read(path).map_err(|e| {
                    Error::config(format!(
                        "unable to read {} from {}: {}",
                        what,
                        path.display(),
                        e
                    ))
                })?
            }
            CredentialSource::Pem(pem) => pem.as_bytes().to_vec(),
            CredentialSource::Bytes(bytes) => bytes.to_owned(),
        };

        if data.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(Error::config(format!("{} is empty", what)));
        }

        Ok(data)
    }
}

#[derive(Clone)]
pub struct RegistryCredentials {
    client_certificate: Vec<u8>,
    private_key: Vec<u8>,
    trusted_ca: Vec<u8>,
}

impl RegistryCredentials {
    pub fn load(
        client_certificate: &CredentialSource,
        private_key: &CredentialSource,
        trusted_ca: &CredentialSource,
    ) -> Result<Self> {
        Ok(RegistryCredentials {
            client_certificate: client_certificate.load("client certificate")?,
            private_key: private_key.load("private key")?,
            trusted_ca: trusted_ca.load("trusted CA bundle")?,
        })
    }

    pub fn client_certificate(&self) -> &[u8] {
        &self.client_certificate
    }

    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    pub fn trusted_ca(&self) -> &[u8] {
        &self.trusted_ca
    }
}

// Key material stays out of logs.
impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("client_certificate", &format!("{} bytes", self.client_certificate.len()))
            .field("private_key", &"<redacted>")
            .field("trusted_ca", &format!("{} bytes", self.trusted_ca.len()))
            .finish()
    }
}
