use log::{debug, info};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::adapters::{CacheKey, MemoryCache, SchemaCache, VersionSelector};
use crate::credentials::RegistryCredentials;
use crate::error::{Error, Result};
use crate::json_config::RegistryClientConfig;
use crate::transport::{RegistryResponse, TlsTransport, Transport};

pub const SUBJECT_NOT_FOUND: i64 = 40401;
pub const VERSION_NOT_FOUND: i64 = 40402;
pub const SCHEMA_NOT_FOUND: i64 = 40403;

/// One schema revision as served by the registry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SchemaRecord {
    pub id: u32,
    pub version: u32,
    pub subject: String,
    pub schema: String,
}

#[derive(Deserialize)]
struct SchemaRequestResponse {
    schema: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error_code: i64,
    message: String,
}

/// Cached `latest` lookups are never re-fetched, see `refresh_latest_schema`.
pub struct CertAuthRegistryClient {
    base_url: Url,
    transport: Box<dyn Transport>,
    cache: Box<dyn SchemaCache>,
}

impl CertAuthRegistryClient {
    pub fn new(config: RegistryClientConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.url)?;

        let credentials = RegistryCredentials::load(
            &config.client_certificate,
            &config.private_key,
            &config.trusted_ca,
        )?;

        let transport =
            TlsTransport::new(&credentials, config.request_timeout(), config.auth.as_ref())?;

        info!(
            "schema registry client for {} (timeout {}s)",
            base_url, config.request_timeout_secs
        );

        Ok(CertAuthRegistryClient {
            base_url,
            transport: Box::new(transport),
            cache: Box::new(MemoryCache::new(config.cache_capacity)),
        })
    }

    pub fn with_transport<T: Transport + 'static>(
        base_url: &str,
        transport: T,
        cache_capacity: Option<usize>,
    ) -> Result<Self> {
        Ok(CertAuthRegistryClient {
            base_url: parse_base_url(base_url)?,
            transport: Box::new(transport),
            cache: Box::new(MemoryCache::new(cache_capacity)),
        })
    }

    pub fn with_cache<C: SchemaCache + 'static>(mut self, cache: C) -> Self {
        self.cache = Box::new(cache);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Subjects in registry order. Never cached.
    pub fn list_subjects(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["subjects"])?;
        let subjects: Vec<String> = self.fetch(url, &[])?;

        info!("registry lists {} subjects", subjects.len());

        Ok(subjects)
    }

    pub fn get_latest_schema(&self, subject: &str) -> Result<SchemaRecord> {
        self.lookup(subject, VersionSelector::Latest)
    }

    pub fn get_schema_by_version(&self, subject: &str, version: u32) -> Result<SchemaRecord> {
        if version == 0 {
            return Err(Error::InvalidArgument(
                "schema version must be positive".to_string(),
            ));
        }

        self.lookup(subject, VersionSelector::Version(version))
    }

    pub fn refresh_latest_schema(&self, subject: &str) -> Result<SchemaRecord> {
        validate_subject(subject)?;
        self.fetch_record(subject, VersionSelector::Latest)
    }

    /// Raw schema text for a registry-assigned id.
    pub fn get_schema_by_id(&self, schema_id: u32) -> Result<String> {
        if let Some(schema) = self.cache.get_schema(schema_id) {
            debug!("cache hit for schema id {}", schema_id);
            return Ok(schema);
        }

        let url = self.endpoint(&["schemas", "ids", schema_id.to_string().as_str()])?;
        let body: SchemaRequestResponse = self.fetch(url, &[SCHEMA_NOT_FOUND])?;

        info!("fetched schema id {}", schema_id);

        self.cache.insert_schema(schema_id, body.schema.to_owned());

        Ok(body.schema)
    }

    fn lookup(&self, subject: &str, selector: VersionSelector) -> Result<SchemaRecord> {
        validate_subject(subject)?;

        let key = CacheKey {
            subject: subject.to_string(),
            selector,
        };

        if let Some(record) = self.cache.get_record(&key) {
            debug!("cache hit for {:?}", key);
            return Ok(record);
        }

        self.fetch_record(subject, selector)
    }

    fn fetch_record(&self, subject: &str, selector: VersionSelector) -> Result<SchemaRecord> {
        let version = match selector {
            VersionSelector::Latest => "latest".to_string(),
            VersionSelector::Version(v) => v.to_string(),
        };

        let url = self.endpoint(&["subjects", subject, "versions", version.as_str()])?;
        let record: SchemaRecord = self.fetch(url, &[SUBJECT_NOT_FOUND, VERSION_NOT_FOUND])?;

        if record.version == 0 {
            return Err(Error::Protocol(format!(
                "registry returned version 0 for subject {}",
                subject
            )));
        }

        info!(
            "fetched subject:{} version:{} id:{}",
            subject, record.version, record.id
        );

        self.cache
            .insert_record(CacheKey::version(subject, record.version), record.to_owned());
        if selector == VersionSelector::Latest {
            self.cache
                .insert_record(CacheKey::latest(subject), record.to_owned());
        }

        Ok(record)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|_| Error::config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn fetch<T: DeserializeOwned>(&self, url: Url, not_found_codes: &[i64]) -> Result<T> {
        let response = self.transport.get(&url)?;

        if !response.is_success() {
            return Err(registry_error(response, not_found_codes));
        }

        serde_json::from_str(&response.body)
            .map_err(|e| Error::Protocol(format!("unexpected response from {}: {}", url, e)))
    }
}

fn validate_subject(subject: &str) -> Result<()> {
    if subject.is_empty() {
        return Err(Error::InvalidArgument("subject must not be empty".to_string()));
    }

    // URL path normalisation drops these segments.
    if subject == "." || subject == ".." {
        return Err(Error::InvalidArgument(format!(
            "subject \"{}\" cannot be addressed",
            subject
        )));
    }

    Ok(())
}

fn parse_base_url(url: &str) -> Result<Url> {
    let trimmed = url.trim();

    if trimmed.is_empty() {
        return Err(Error::config("registry URL is empty"));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| Error::config(format!("invalid registry URL {}: {}", trimmed, e)))?;

    if parsed.cannot_be_a_base() {
        return Err(Error::config(format!(
            "registry URL {} cannot be a base URL",
            trimmed
        )));
    }

    if parsed.scheme() != "https" {
        return Err(Error::config(format!(
            "registry URL {} must use https",
            trimmed
        )));
    }

    Ok(parsed)
}

fn registry_error(response: RegistryResponse, not_found_codes: &[i64]) -> Error {
    let status = response.status;

    let (error_code, message) = match serde_json::from_str::<ErrorResponse>(&response.body) {
        Ok(body) => (Some(body.error_code), body.message),
        Err(_) => (None, response.body),
    };

    let not_found = status == 404
        && error_code.map_or(false, |code| not_found_codes.contains(&code));

    if not_found {
        Error::NotFound {
            status,
            error_code,
            message,
        }
    } else {
        Error::Registry {
            status,
            error_code,
            message,
        }
    }
}
