//! Blocking HTTPS client for SCIM servers resolved from metadata.
//!
//! Trusts only the CA bundle from [`ServerInfo`] and checks the server's
//! public key against the configured pins on every response.

use std::path::Path;

use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use reqwest::tls::TlsInfo;
use x509_parser::prelude::*;

use crate::config::{ServerConfig, ServerInfo};
use crate::error::Error;
use crate::pinning::{matches_pins, parse_pinned_keys};
use crate::query::{query, Fetcher, HttpResponse};
use crate::types::pinning::Pin;

const SCIM_CONTENT_TYPE: &str = "application/scim+json";

/// A [`Fetcher`] over HTTPS with CA bundle trust and key pinning.
///
/// Pins are checked after the exchange, against the certificate of the
/// connection that carried the response. By then the request, including any
/// client certificate, has reached the peer; a pin mismatch only keeps the
/// response body from being read. Certificate validation against the CA
/// bundle still happens during the handshake.
pub struct ScimClient {
    client: Client,
    base_url: String,
    pins: Vec<Pin>,
}

impl ScimClient {
    pub fn new(info: &ServerInfo, config: &ServerConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .tls_info(true);

        if let Some(ca_bundle) = info.ca_bundle_path() {
            for cert in read_ca_bundle(ca_bundle)? {
                builder = builder.add_root_certificate(cert);
            }
            builder = builder.tls_built_in_root_certs(false);
        }

        match (&config.client_cert, &config.client_key) {
            (Some(cert), Some(key)) => {
                let cert = std::fs::read(cert)?;
                let key = std::fs::read(key)?;
                let identity = reqwest::Identity::from_pkcs8_pem(&cert, &key)
                    .map_err(|e| Error::Config(format!("invalid client identity: {}", e)))?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(Error::Config(
                    "client_cert and client_key must be set together".to_string(),
                ))
            }
        }

        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let pins = parse_pinned_keys(info.pinned_public_keys())?;
        if pins.is_empty() {
            warn!("no pinned public keys for {}, relying on CA bundle only", info.url());
        }

        Ok(Self {
            client: builder.build()?,
            base_url: info.url().to_string(),
            pins,
        })
    }

    /// Read every resource of `endpoint` (e.g. `Users`), following pagination.
    pub fn list(&mut self, endpoint: &str) -> Result<Vec<serde_json::Value>, Error> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        query(&url, self)
    }

    fn check_pins(&self, url: &str, response: &Response) -> Result<(), Error> {
        if self.pins.is_empty() {
            return Ok(());
        }

        let cert_der = response
            .extensions()
            .get::<TlsInfo>()
            .and_then(|info| info.peer_certificate())
            .ok_or_else(|| Error::Transport {
                url: url.to_string(),
                message: "no peer certificate to check pinned keys against".to_string(),
            })?;

        let (_, cert) = X509Certificate::from_der(cert_der).map_err(|e| Error::Transport {
            url: url.to_string(),
            message: format!("X.509 parse error: {}", e),
        })?;

        if !matches_pins(&self.pins, cert.public_key().raw) {
            return Err(Error::Transport {
                url: url.to_string(),
                message: "server public key does not match any pinned key".to_string(),
            });
        }
        Ok(())
    }
}

impl Fetcher for ScimClient {
    fn fetch(&mut self, url: &str) -> Result<HttpResponse, Error> {
        debug!("GET {}", url);
        let response = self.client.get(url).header(ACCEPT, SCIM_CONTENT_TYPE).send()?;
        self.check_pins(url, &response)?;

        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }
}

fn read_ca_bundle(path: &Path) -> Result<Vec<reqwest::Certificate>, Error> {
    let pem = std::fs::read(path)?;
    reqwest::Certificate::from_pem_bundle(&pem)
        .map_err(|e| Error::Config(format!("invalid CA bundle {}: {}", path.display(), e)))
}
