use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A pinned public key: hash algorithm plus digest of the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Pin {
    algorithm: String,
    digest: String,
}

impl Pin {
    pub fn new(algorithm: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            digest: digest.into(),
        }
    }

    /// The hash method, typically `sha256`.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Base64 encoded hash of the key.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Everything a client needs to reach and authenticate one server.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServerEndpoint {
    url: String,
    pins: Vec<Pin>,
}

impl ServerEndpoint {
    /// Build an endpoint. An endpoint always carries at least one pin.
    pub fn new(url: impl Into<String>, pins: Vec<Pin>) -> Result<Self, Error> {
        let url = url.into();
        if pins.is_empty() {
            return Err(Error::MetadataFormat(format!(
                "no pins for server '{}'",
                url
            )));
        }
        Ok(Self { url, pins })
    }

    /// Base URL of the SCIM endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_requires_pins() {
        let err = ServerEndpoint::new("https://scim.example.com/v2", vec![]).unwrap_err();
        assert!(matches!(err, Error::MetadataFormat(_)));
    }

    #[test]
    fn test_endpoint_keeps_pin_order() {
        let ep = ServerEndpoint::new(
            "https://scim.example.com/v2",
            vec![Pin::new("sha256", "AAA"), Pin::new("sha1", "BBB")],
        )
        .unwrap();
        assert_eq!(ep.url(), "https://scim.example.com/v2");
        assert_eq!(ep.pins()[0].algorithm(), "sha256");
        assert_eq!(ep.pins()[1].digest(), "BBB");
    }

    #[test]
    fn test_pin_serde_field_names() {
        let pin = Pin::new("sha256", "abc=");
        let json = serde_json::to_string(&pin).unwrap();
        assert_eq!(json, r#"{"algorithm":"sha256","digest":"abc="}"#);
    }
}
