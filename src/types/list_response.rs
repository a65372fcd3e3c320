use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A SCIM `ListResponse` page (RFC 7644 §3.4.2).
///
/// Only `totalResults` is required. `startIndex` is informational and any
/// value that is not a non-negative integer reads as absent; other members
/// such as `schemas` and `itemsPerPage` are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResponse {
    #[serde(rename = "totalResults")]
    pub total_results: u64,
    #[serde(
        rename = "startIndex",
        default,
        deserialize_with = "lenient_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_index: Option<u64>,
    #[serde(rename = "Resources", skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<Value>>,
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| v.as_u64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_full() {
        let json = r#"{
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
            "totalResults": 2,
            "startIndex": 1,
            "Resources": [
                {"id": "2819c223-7f76-453a-919d-413861904646", "userName": "bjensen"},
                {"id": "c75ad752-64ae-4823-840d-ffa80929976c", "userName": "jsmith"}
            ]
        }"#;
        let resp: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.total_results, 2);
        assert_eq!(resp.start_index, Some(1));
        let resources = resp.resources.unwrap();
        assert_eq!(resources[1]["userName"], "jsmith");
    }

    #[test]
    fn test_list_response_no_resources() {
        let resp: ListResponse = serde_json::from_str(r#"{"totalResults": 0}"#).unwrap();
        assert_eq!(resp.total_results, 0);
        assert!(resp.resources.is_none());
        assert!(resp.start_index.is_none());
    }

    #[test]
    fn test_list_response_tolerates_informational_members() {
        let json = r#"{
            "schemas": null,
            "totalResults": 1,
            "startIndex": "1",
            "itemsPerPage": "1",
            "Resources": [{"id": "a"}]
        }"#;
        let resp: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.total_results, 1);
        assert!(resp.start_index.is_none());
        assert_eq!(resp.resources.unwrap().len(), 1);

        let resp: ListResponse =
            serde_json::from_str(r#"{"totalResults": 0, "startIndex": null}"#).unwrap();
        assert!(resp.start_index.is_none());
    }

    #[test]
    fn test_list_response_requires_total_results() {
        assert!(serde_json::from_str::<ListResponse>(r#"{"Resources": []}"#).is_err());
        assert!(serde_json::from_str::<ListResponse>(r#"{"totalResults": "2"}"#).is_err());
        assert!(serde_json::from_str::<ListResponse>(r#"{"totalResults": -1}"#).is_err());
    }
}
