//! Serde models for the documents this crate consumes and the values it
//! produces.

pub mod list_response;
pub mod metadata;
pub mod pinning;
