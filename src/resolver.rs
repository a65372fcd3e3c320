//! Federation metadata resolver.
//!
//! Looks up an entity in a federation metadata document, selects one or
//! more of its servers, and collects what a client needs to open a trusted
//! connection: base URLs, pinned public keys and a CA bundle file.

use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use serde::Deserialize;

use crate::canonicalize::TagSet;
use crate::castore::CaStore;
use crate::error::Error;
use crate::pinning::concatenate_keys;
use crate::types::metadata::{EntityDescriptor, MetadataDocument, ServerDescriptor};
use crate::types::pinning::{Pin, ServerEndpoint};

/// How to pick servers among those published by an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCriterion {
    /// Exact server name. An empty name selects the entity's only server.
    ByName(String),
    /// Exact canonical tag set. May select several servers.
    ByTags(TagSet),
}

/// Connection and trust information for one entity.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    end_points: Vec<ServerEndpoint>,
    castore: Arc<CaStore>,
}

impl ConnectionInfo {
    /// Selected endpoints, in document order.
    ///
    /// Several endpoints are only returned for tag based selection when
    /// servers share a tag set; choosing among them is up to the caller.
    pub fn end_points(&self) -> &[ServerEndpoint] {
        &self.end_points
    }

    /// Shared handle to the CA bundle. The file lives as long as any clone.
    pub fn castore(&self) -> &Arc<CaStore> {
        &self.castore
    }

    pub fn ca_bundle_path(&self) -> &Path {
        self.castore.path()
    }

    /// Pin string for the endpoint at `index`, if there is one.
    pub fn pinned_public_keys(&self, index: usize) -> Option<String> {
        self.end_points
            .get(index)
            .map(|ep| concatenate_keys(ep.pins()))
    }
}

/// A loaded metadata document that can be queried repeatedly.
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    document: MetadataDocument,
}

impl MetadataResolver {
    pub fn new(document: MetadataDocument) -> Self {
        Self { document }
    }

    /// Load and parse the metadata document at `path`.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::MetadataFormat(format!("cannot read {}: {}", path.display(), e))
        })?;
        let document: MetadataDocument = serde_json::from_str(&data).map_err(|e| {
            Error::MetadataFormat(format!("invalid metadata JSON in {}: {}", path.display(), e))
        })?;
        Ok(Self::new(document))
    }

    /// Parse a metadata document held in memory.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let document: MetadataDocument = serde_json::from_str(json)
            .map_err(|e| Error::MetadataFormat(format!("invalid metadata JSON: {}", e)))?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &MetadataDocument {
        &self.document
    }

    /// Resolve connection information for `entity_id`.
    pub fn resolve(
        &self,
        entity_id: &str,
        criterion: &SelectionCriterion,
    ) -> Result<ConnectionInfo, Error> {
        let entity = find_entity(&self.document, entity_id)?;

        let servers = entity.servers.as_deref().ok_or_else(|| {
            Error::MetadataFormat(format!("no servers for entity '{}'", entity_id))
        })?;

        let selected = match criterion {
            SelectionCriterion::ByName(name) => select_by_name(servers, name, entity_id)?,
            SelectionCriterion::ByTags(tags) => select_by_tags(servers, tags, entity_id)?,
        };
        debug!(
            "selected {} of {} servers for entity '{}'",
            selected.len(),
            servers.len(),
            entity_id
        );

        let end_points = selected
            .into_iter()
            .map(|server| build_end_point(server, entity_id))
            .collect::<Result<Vec<_>, _>>()?;

        let bundle = collect_certificates(&entity, entity_id)?;
        let castore = CaStore::with_contents(bundle.as_bytes())?;

        info!(
            "resolved entity '{}' to {} end point(s), CA bundle at {}",
            entity_id,
            end_points.len(),
            castore.path().display()
        );

        Ok(ConnectionInfo {
            end_points,
            castore: Arc::new(castore),
        })
    }
}

/// Resolve a server of `entity_id` by name from the metadata at `metadata_path`.
///
/// `server_name` may be empty when the entity publishes exactly one server.
pub fn resolve_by_name(
    metadata_path: &Path,
    entity_id: &str,
    server_name: &str,
) -> Result<ConnectionInfo, Error> {
    resolve(
        metadata_path,
        entity_id,
        &SelectionCriterion::ByName(server_name.to_string()),
    )
}

/// Resolve every server of `entity_id` whose tags equal `tags`, ignoring
/// case, order and repetition.
pub fn resolve_by_tags<S: AsRef<str>>(
    metadata_path: &Path,
    entity_id: &str,
    tags: &[S],
) -> Result<ConnectionInfo, Error> {
    resolve(
        metadata_path,
        entity_id,
        &SelectionCriterion::ByTags(TagSet::new(tags)),
    )
}

pub fn resolve(
    metadata_path: &Path,
    entity_id: &str,
    criterion: &SelectionCriterion,
) -> Result<ConnectionInfo, Error> {
    MetadataResolver::from_file(metadata_path)?.resolve(entity_id, criterion)
}

/// Same as [`resolve`] for a document already in memory.
pub fn resolve_from_str(
    document: &str,
    entity_id: &str,
    criterion: &SelectionCriterion,
) -> Result<ConnectionInfo, Error> {
    MetadataResolver::from_json(document)?.resolve(entity_id, criterion)
}

/// Entity ids are compared as opaque strings. If several entities share the
/// id, the last one wins. Only the selected entity is decoded.
fn find_entity(document: &MetadataDocument, entity_id: &str) -> Result<EntityDescriptor, Error> {
    if document.entities.is_none() {
        return Err(Error::MetadataFormat("no entities in metadata".to_string()));
    }

    let raw = document
        .entity(entity_id)
        .ok_or_else(|| Error::EntityNotFound(entity_id.to_string()))?;

    EntityDescriptor::deserialize(raw).map_err(|e| {
        Error::MetadataFormat(format!("malformed entity '{}': {}", entity_id, e))
    })
}

/// Select exactly one server by name. If several servers share the name,
/// the last one wins.
fn select_by_name<'a>(
    servers: &'a [ServerDescriptor],
    server_name: &str,
    entity_id: &str,
) -> Result<Vec<&'a ServerDescriptor>, Error> {
    if server_name.is_empty() {
        return match servers {
            [only] => Ok(vec![only]),
            [] => Err(Error::ServerNotFound(format!(
                "entity '{}' publishes no servers",
                entity_id
            ))),
            _ => Err(Error::AmbiguousSelection(format!(
                "entity '{}' has {} servers, please specify a server name",
                entity_id,
                servers.len()
            ))),
        };
    }

    servers
        .iter()
        .filter(|s| s.name.as_deref() == Some(server_name))
        .last()
        .map(|s| vec![s])
        .ok_or_else(|| {
            Error::ServerNotFound(format!(
                "no server named '{}' for entity '{}'",
                server_name, entity_id
            ))
        })
}

fn select_by_tags<'a>(
    servers: &'a [ServerDescriptor],
    tags: &TagSet,
    entity_id: &str,
) -> Result<Vec<&'a ServerDescriptor>, Error> {
    let selected: Vec<&ServerDescriptor> = servers
        .iter()
        .filter(|s| server_tags(s) == *tags)
        .collect();

    if selected.is_empty() {
        return Err(Error::ServerNotFound(format!(
            "no server tagged {} for entity '{}'",
            tags, entity_id
        )));
    }
    Ok(selected)
}

/// Canonical tags of a server; a server without tags has the empty set.
fn server_tags(server: &ServerDescriptor) -> TagSet {
    server
        .tags
        .as_deref()
        .map(TagSet::new)
        .unwrap_or_default()
}

fn build_end_point(server: &ServerDescriptor, entity_id: &str) -> Result<ServerEndpoint, Error> {
    let label = server.name.as_deref().unwrap_or("<unnamed>");

    let url = server.base_uri.as_deref().ok_or_else(|| {
        Error::MetadataFormat(format!(
            "server '{}' of entity '{}' has no base_uri",
            label, entity_id
        ))
    })?;

    let entries = server.pins.as_deref().ok_or_else(|| {
        Error::MetadataFormat(format!(
            "no pins for server '{}' of entity '{}'",
            label, entity_id
        ))
    })?;

    let pins = entries
        .iter()
        .map(|entry| {
            entry.to_pin().ok_or_else(|| {
                Error::MetadataFormat(format!(
                    "pin of server '{}' of entity '{}' lacks alg/digest (or name/value)",
                    label, entity_id
                ))
            })
        })
        .collect::<Result<Vec<Pin>, _>>()?;

    ServerEndpoint::new(url, pins)
}

/// Concatenate the PEM text of every issuer, one per line.
fn collect_certificates(entity: &EntityDescriptor, entity_id: &str) -> Result<String, Error> {
    let issuers = entity.issuers.as_deref().ok_or_else(|| {
        Error::MetadataFormat(format!("no issuers for entity '{}'", entity_id))
    })?;

    let mut bundle = String::new();
    for issuer in issuers {
        let cert = issuer.x509certificate.as_deref().ok_or_else(|| {
            Error::MetadataFormat(format!(
                "issuer of entity '{}' has no x509certificate",
                entity_id
            ))
        })?;
        bundle.push_str(cert);
        bundle.push('\n');
    }

    if bundle.is_empty() {
        return Err(Error::MetadataFormat(format!(
            "no certificates for entity '{}'",
            entity_id
        )));
    }
    Ok(bundle)
}
