//! # scimfed
//!
//! Federation metadata resolution and paginated SCIM reads.
//!
//! A SCIM client in a federation does not configure its servers by hand. It
//! looks the server up in signed federation metadata, which lists for every
//! entity its servers, the public keys they are pinned to and the issuers
//! trusted to sign their certificates. This crate turns such a document into
//! connection information and then reads resource collections from the
//! selected server page by page.
//!
//! ## Features
//!
//! - **Metadata resolution**: select an entity's server by name or by tag set
//! - **Key pinning**: pins in `alg//digest;...` form for pinned-TLS transports
//! - **CA bundles**: issuer certificates written to a self-deleting temp file
//! - **Pagination**: drain a SCIM `ListResponse` endpoint through any fetcher
//! - **HTTPS client** (feature `fetch`): blocking reqwest client with pin checks
//!
//! ## Quick Start
//!
//! ```rust
//! use scimfed::query::{query, HttpResponse};
//! use scimfed::resolver::{resolve_from_str, SelectionCriterion};
//!
//! let metadata = r#"{
//!     "entities": [{
//!         "entity_id": "https://sp.example.com",
//!         "issuers": [{"x509certificate": "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----"}],
//!         "servers": [{
//!             "base_uri": "https://scim.example.com/v2",
//!             "pins": [{"alg": "sha256", "digest": "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="}]
//!         }]
//!     }]
//! }"#;
//!
//! let info = resolve_from_str(
//!     metadata,
//!     "https://sp.example.com",
//!     &SelectionCriterion::ByName(String::new()),
//! )
//! .unwrap();
//! assert_eq!(info.end_points()[0].url(), "https://scim.example.com/v2");
//! assert!(info.ca_bundle_path().exists());
//!
//! let mut fetch = |_url: &str| -> Result<HttpResponse, scimfed::Error> {
//!     Ok(HttpResponse::ok(r#"{"totalResults": 1, "Resources": [{"id": "1"}]}"#))
//! };
//! let users = query("https://scim.example.com/v2/Users", &mut fetch).unwrap();
//! assert_eq!(users.len(), 1);
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns `Result<T, Error>`. [`error::Error::kind`] gives a
//! stable [`error::ErrorKind`] for programmatic handling.

pub mod canonicalize;
pub mod castore;
#[cfg(feature = "fetch")]
pub mod client;
pub mod config;
pub mod error;
pub mod pinning;
pub mod postprocess;
pub mod query;
pub mod resolver;
pub mod types;

pub use error::{Error, ErrorKind};
