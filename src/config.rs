//! Client configuration and server information.
//!
//! A SCIM server is configured either through federation metadata
//! (`metadata_path` + `metadata_entity`, optionally narrowed with
//! `metadata_server` or `metadata_tags`) or statically with `scim_url`,
//! `pinned_public_keys` and `ca_bundle_path`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::canonicalize::TagSet;
use crate::castore::CaStore;
use crate::error::Error;
use crate::pinning::{concatenate_keys, parse_pinned_keys};
use crate::resolver::{MetadataResolver, SelectionCriterion};

/// Client configuration, usually loaded from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scim_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_public_keys: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_bundle_path: Option<PathBuf>,

    /// PEM certificate presented to the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_cert: Option<PathBuf>,
    /// PEM (PKCS#8) private key for `client_cert`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Post-processing options, keyed `pp-<processor>-<option>`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugin_options: BTreeMap<String, String>,
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("invalid configuration in {}: {}", path.display(), e)))
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Selection criterion for metadata based configuration.
    fn selection(&self) -> Result<SelectionCriterion, Error> {
        match (&self.metadata_server, &self.metadata_tags) {
            (Some(_), Some(_)) => Err(Error::Config(
                "metadata_server and metadata_tags are mutually exclusive".to_string(),
            )),
            (_, Some(tags)) => Ok(SelectionCriterion::ByTags(TagSet::new(tags))),
            (server, None) => Ok(SelectionCriterion::ByName(
                server.clone().unwrap_or_default(),
            )),
        }
    }
}

/// Where and how to reach the SCIM server.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    url: String,
    pinned_public_keys: String,
    ca_bundle_path: Option<PathBuf>,
    castore: Option<Arc<CaStore>>,
}

impl ServerInfo {
    pub fn from_config(config: &ServerConfig) -> Result<Self, Error> {
        match &config.metadata_path {
            Some(metadata_path) => Self::from_metadata(config, metadata_path).map_err(|e| {
                error!(
                    "failed to load metadata from {}: {}",
                    metadata_path.display(),
                    e
                );
                e
            }),
            None => Self::from_static(config),
        }
    }

    fn from_metadata(config: &ServerConfig, metadata_path: &Path) -> Result<Self, Error> {
        let entity_id = config.metadata_entity.as_deref().ok_or_else(|| {
            Error::Config("metadata_entity is required with metadata_path".to_string())
        })?;
        let criterion = config.selection()?;

        let info = MetadataResolver::from_file(metadata_path)?.resolve(entity_id, &criterion)?;
        if info.end_points().len() > 1 {
            warn!(
                "{} servers of entity '{}' match, using the first",
                info.end_points().len(),
                entity_id
            );
        }

        let end_point = info.end_points().first().ok_or_else(|| {
            Error::ServerNotFound(format!("no end point for entity '{}'", entity_id))
        })?;

        Ok(Self {
            url: end_point.url().to_string(),
            pinned_public_keys: concatenate_keys(end_point.pins()),
            ca_bundle_path: Some(info.ca_bundle_path().to_path_buf()),
            castore: Some(Arc::clone(info.castore())),
        })
    }

    fn from_static(config: &ServerConfig) -> Result<Self, Error> {
        let url = config.scim_url.clone().ok_or_else(|| {
            Error::Config("either metadata_path or scim_url must be set".to_string())
        })?;

        let pinned_public_keys = match &config.pinned_public_keys {
            Some(pinned) => concatenate_keys(&parse_pinned_keys(pinned)?),
            None => String::new(),
        };

        info!("using statically configured SCIM server {}", url);
        Ok(Self {
            url,
            pinned_public_keys,
            ca_bundle_path: config.ca_bundle_path.clone(),
            castore: None,
        })
    }

    /// Base URL of the SCIM endpoint, e.g. `https://example.com/scim/v2`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Pinned public keys in `alg//digest;...` form. Empty if none.
    pub fn pinned_public_keys(&self) -> &str {
        &self.pinned_public_keys
    }

    pub fn ca_bundle_path(&self) -> Option<&Path> {
        self.ca_bundle_path.as_deref()
    }

    /// Build the URL of a resource endpoint below the base URL.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Whether the CA bundle is a temporary file owned by this value.
    pub fn owns_ca_bundle(&self) -> bool {
        self.castore.is_some()
    }
}
