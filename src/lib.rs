//! Schema registry client authenticated with a client certificate.

pub use crate::credentials::{CredentialSource, RegistryCredentials};
pub use crate::error::{Error, Result};
pub use crate::json_config::{read_config, BasicAuth, RegistryClientConfig};
pub use crate::schema_registry::{CertAuthRegistryClient, SchemaRecord};
pub use crate::transport::{RegistryResponse, TlsTransport, Transport};

pub mod adapters;
mod credentials;
mod error;
pub mod json_config;
mod schema_registry;
mod transport;
