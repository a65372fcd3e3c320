use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::pinning::Pin;

/// Federation metadata document: the list of participating entities.
///
/// Entities stay untyped until one is selected, so a malformed entry only
/// affects lookups of that entity. Required fields are modelled as `Option`
/// so that the resolver can report which one is missing instead of a
/// generic parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Value>>,
}

impl MetadataDocument {
    /// Raw entry of the entity with this id. The last one wins on duplicates.
    pub fn entity(&self, entity_id: &str) -> Option<&Value> {
        self.entities
            .as_deref()?
            .iter()
            .filter(|e| e.get("entity_id").and_then(Value::as_str) == Some(entity_id))
            .last()
    }
}

/// One federation participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<ServerDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuers: Option<Vec<IssuerDescriptor>>,
}

/// A server published by an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pins: Option<Vec<PinDescriptor>>,
}

/// A pin entry as written in metadata.
///
/// Current documents use `alg`/`digest`; older ones use `name`/`value`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PinDescriptor {
    /// Convert to a [`Pin`], preferring `alg`/`digest` over the legacy pair.
    pub fn to_pin(&self) -> Option<Pin> {
        match (&self.alg, &self.digest) {
            (Some(alg), Some(digest)) => Some(Pin::new(alg.as_str(), digest.as_str())),
            _ => match (&self.name, &self.value) {
                (Some(name), Some(value)) => Some(Pin::new(name.as_str(), value.as_str())),
                _ => None,
            },
        }
    }
}

/// A trusted certificate issuer for an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssuerDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x509certificate: Option<String>,
}
