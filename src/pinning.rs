use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::types::pinning::Pin;

const PIN_SEPARATOR: &str = ";";
const ALG_SEPARATOR: &str = "//";

/// Join pins into the `alg//digest;alg//digest` form used by pinned-TLS
/// transports (e.g. curl's `CURLOPT_PINNEDPUBLICKEY`).
pub fn concatenate_keys(pins: &[Pin]) -> String {
    pins.iter()
        .map(|p| format!("{}{}{}", p.algorithm(), ALG_SEPARATOR, p.digest()))
        .collect::<Vec<_>>()
        .join(PIN_SEPARATOR)
}

/// Parse a pin string produced by [`concatenate_keys`] or written by hand
/// in configuration.
pub fn parse_pinned_keys(pinned: &str) -> Result<Vec<Pin>, Error> {
    pinned
        .split(PIN_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| match entry.split_once(ALG_SEPARATOR) {
            Some((alg, digest)) if !alg.is_empty() && !digest.is_empty() => {
                Ok(Pin::new(alg, digest))
            }
            _ => Err(Error::Config(format!(
                "invalid pinned key '{}', expected <alg>//<digest>",
                entry
            ))),
        })
        .collect()
}

/// Compute the `sha256` pin of a DER encoded SubjectPublicKeyInfo.
pub fn pin_from_public_key(spki_der: &[u8]) -> Pin {
    let digest = Sha256::digest(spki_der);
    Pin::new("sha256", STANDARD.encode(digest))
}

/// Whether the SubjectPublicKeyInfo `spki_der` matches any of `pins`.
///
/// Only `sha256` pins can be checked; pins using other algorithms never
/// match.
pub fn matches_pins(pins: &[Pin], spki_der: &[u8]) -> bool {
    let actual = pin_from_public_key(spki_der);
    pins.iter()
        .any(|p| p.algorithm().eq_ignore_ascii_case("sha256") && p.digest() == actual.digest())
}
