use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{json, Value};

use scimfed::config::{ServerConfig, ServerInfo};
use scimfed::error::{Error, ErrorKind};
use scimfed::pinning::concatenate_keys;
use scimfed::postprocess::{Disposition, PostProcessor, PostProcessorChain};
use scimfed::query::{query, HttpResponse};
use scimfed::resolver::{resolve_by_name, resolve_by_tags};

const CERT: &str = "-----BEGIN CERTIFICATE-----\nMIIBfederation\n-----END CERTIFICATE-----";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_metadata(dir: &std::path::Path) -> PathBuf {
    let doc = json!({
        "version": "1.0.0",
        "cache_ttl": 3600,
        "entities": [{
            "entity_id": "https://school.example.org",
            "organization": "Example School District",
            "issuers": [{"x509certificate": CERT}],
            "servers": [
                {
                    "name": "scim-prod",
                    "tags": ["SCIM", "production"],
                    "base_uri": "https://scim.example.org/v2",
                    "pins": [{"alg": "sha256", "digest": "PRODPIN="}]
                },
                {
                    "name": "scim-staging",
                    "tags": ["scim", "staging"],
                    "base_uri": "https://staging.example.org/v2",
                    "pins": [{"name": "sha256", "value": "STAGEPIN="}]
                }
            ]
        }]
    });
    let path = dir.join("federation-metadata.json");
    std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    path
}

/// Serves `total` users in pages of `page_size` below `base`.
fn paged_users(
    base: String,
    total: usize,
    page_size: usize,
    requested: &mut Vec<String>,
) -> impl FnMut(&str) -> Result<HttpResponse, Error> + '_ {
    move |url: &str| {
        assert!(url.starts_with(&base), "unexpected url {}", url);
        requested.push(url.to_string());
        let offset = (requested.len() - 1) * page_size;
        let count = total.saturating_sub(offset).min(page_size);
        let resources: Vec<Value> = (0..count)
            .map(|i| json!({"id": format!("u{}", offset + i), "userName": format!("user{}", offset + i)}))
            .collect();
        Ok(HttpResponse::ok(
            json!({
                "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
                "totalResults": total,
                "startIndex": offset + 1,
                "itemsPerPage": page_size,
                "Resources": resources
            })
            .to_string(),
        ))
    }
}

struct Uppercase;

impl PostProcessor for Uppercase {
    fn name(&self) -> &str {
        "uppercase"
    }

    fn wants(&self, object_type: &str) -> Disposition {
        match object_type {
            "User" => Disposition::Process,
            "Employment" => Disposition::Block,
            _ => Disposition::Skip,
        }
    }

    fn process(&self, _object_type: &str, input: &str) -> Result<String, Error> {
        Ok(input.to_uppercase())
    }
}

#[test]
fn test_resolve_then_query_all_users() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let metadata = write_metadata(dir.path());

    let info = resolve_by_name(&metadata, "https://school.example.org", "scim-prod").unwrap();
    let end_point = &info.end_points()[0];
    assert_eq!(concatenate_keys(end_point.pins()), "sha256//PRODPIN=");
    assert_eq!(
        std::fs::read_to_string(info.ca_bundle_path()).unwrap(),
        format!("{}\n", CERT)
    );

    let base = format!("{}/Users", end_point.url());
    let mut requested = Vec::new();
    let mut fetch = paged_users(base.clone(), 7, 3, &mut requested);
    let users = query(&base, &mut fetch).unwrap();
    drop(fetch);

    assert_eq!(users.len(), 7);
    assert_eq!(users[6]["userName"], "user6");
    assert_eq!(
        requested,
        vec![
            "https://scim.example.org/v2/Users".to_string(),
            "https://scim.example.org/v2/Users?startIndex=4".to_string(),
            "https://scim.example.org/v2/Users?startIndex=7".to_string(),
        ]
    );
}

#[test]
fn test_tag_selection_with_legacy_pins() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let metadata = write_metadata(dir.path());

    let info = resolve_by_tags(&metadata, "https://school.example.org", &["Staging", "SCIM"]).unwrap();
    assert_eq!(info.end_points().len(), 1);
    assert_eq!(info.end_points()[0].url(), "https://staging.example.org/v2");
    assert_eq!(info.pinned_public_keys(0).unwrap(), "sha256//STAGEPIN=");

    let err = resolve_by_tags(&metadata, "https://school.example.org", &["scim"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerNotFound);
}

#[test]
fn test_config_driven_flow_with_post_processing() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        metadata_path: Some(write_metadata(dir.path())),
        metadata_entity: Some("https://school.example.org".to_string()),
        metadata_tags: Some(vec!["production".to_string(), "scim".to_string()]),
        ..Default::default()
    };
    let server = ServerInfo::from_config(&config).unwrap();
    assert_eq!(server.pinned_public_keys(), "sha256//PRODPIN=");

    let mut chain = PostProcessorChain::new(vec![Box::new(Uppercase)]);
    chain.init(&BTreeMap::new()).unwrap();
    assert_eq!(
        chain.filter_types(&["User", "Employment", "StudentGroup"]),
        vec!["User".to_string(), "StudentGroup".to_string()]
    );

    let base = server.endpoint_url("Users");
    let mut requested = Vec::new();
    let mut fetch = paged_users(base.clone(), 2, 10, &mut requested);
    let users = query(&base, &mut fetch).unwrap();
    drop(fetch);
    assert_eq!(requested.len(), 1);

    let rendered = chain.process("User", &users[0].to_string()).unwrap();
    assert!(rendered.contains("USER0"));
    assert_eq!(chain.process("StudentGroup", "{}").unwrap(), "{}");

    let bundle = server.ca_bundle_path().unwrap().to_path_buf();
    drop(server);
    assert!(!bundle.exists());
}

#[test]
fn test_failed_page_aborts_query() {
    init_logging();
    let mut calls = 0;
    let mut fetch = |url: &str| -> Result<HttpResponse, Error> {
        calls += 1;
        match calls {
            1 => Ok(HttpResponse::ok(
                r#"{"totalResults": 3, "Resources": [{"id": "a"}]}"#,
            )),
            _ => Err(Error::Transport {
                url: url.to_string(),
                message: "connection reset by peer".to_string(),
            }),
        }
    };
    let err = query("https://scim.example.org/v2/Groups", &mut fetch).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
}
