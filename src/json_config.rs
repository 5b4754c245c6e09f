use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credentials::CredentialSource;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RegistryClientConfig {
    pub url: String,
    pub client_certificate: CredentialSource,
    pub private_key: CredentialSource,
    pub trusted_ca: CredentialSource,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub cache_capacity: Option<usize>,
    #[serde(default)]
    pub auth: Option<BasicAuth>,
}

impl RegistryClientConfig {
    pub fn new(
        url: &str,
        client_certificate: CredentialSource,
        private_key: CredentialSource,
        trusted_ca: CredentialSource,
    ) -> Self {
        RegistryClientConfig {
            url: url.to_string(),
            client_certificate,
            private_key,
            trusted_ca,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_capacity: None,
            auth: None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn read_config<P: AsRef<Path>>(filename: P) -> Result<RegistryClientConfig, Box<dyn Error>> {
    let f = File::open(filename)?;
    let d: RegistryClientConfig = serde_json::from_reader(f)?;
    Ok(d)
}
