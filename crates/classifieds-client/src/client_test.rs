use serde_json::json;

use super::*;

fn test_client(base_url: &str) -> MarketplaceClient {
    MarketplaceClient::new(base_url, 5, "classifieds-test/0.1", SessionToken::default())
        .expect("client construction should not fail")
}

#[test]
fn endpoint_appends_to_api_prefix() {
    let client = test_client("https://api.example.test/api");
    let url = client.endpoint("/filter").unwrap();
    assert_eq!(url.as_str(), "https://api.example.test/api/filter");
}

#[test]
fn endpoint_tolerates_trailing_slash() {
    let client = test_client("https://api.example.test/api/");
    let url = client.endpoint("wishlist").unwrap();
    assert_eq!(url.as_str(), "https://api.example.test/api/wishlist");
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = MarketplaceClient::new("not a url", 5, "ua", SessionToken::default());
    assert!(matches!(result, Err(ClientError::InvalidBaseUrl { .. })));
}

#[test]
fn extract_message_prefers_message_field() {
    let body = json!({ "message": "Invalid data", "error": "other" });
    assert_eq!(extract_message(&body).as_deref(), Some("Invalid data"));
}

#[test]
fn extract_message_reads_validation_errors() {
    let body = json!({ "errors": { "wishable_id": ["The wishable id field is required."] } });
    assert_eq!(
        extract_message(&body).as_deref(),
        Some("The wishable id field is required.")
    );
}

#[test]
fn extract_message_none_when_absent() {
    assert!(extract_message(&json!({ "status": false })).is_none());
}
