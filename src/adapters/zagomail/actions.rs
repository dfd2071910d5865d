//! Zagomail subscriber and campaign actions.

use super::client::{Envelope, ZagomailClient};
use crate::adapters::http::ApiRequest;
use crate::adapters::props::{insert_some, non_empty, parse_props, require_scalar, require_text};
use crate::domain::{Credentials, DomainError, DropdownOption, DropdownState, NotFound};
use crate::ports::Action;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{error, info};

const SUBSCRIBER_MISSING: &str = "The subscriber does not exist in this list";

fn record_or_unexpected(envelope: Envelope, context: &str) -> Result<Value, DomainError> {
    envelope.record().cloned().ok_or_else(|| {
        DomainError::UnexpectedResponse(format!(
            "Failed to {}: Response data or record missing despite success status.",
            context
        ))
    })
}

/// Subscriber lookups: a record, or a structured miss instead of an error.
fn lookup_result(
    result: Result<Envelope, DomainError>,
    empty_message: &str,
) -> Result<Value, DomainError> {
    match result {
        Ok(envelope) => Ok(match envelope.record() {
            Some(record) => record.clone(),
            None => NotFound::new(empty_message).into_value(),
        }),
        Err(e) if e.vendor_message_contains(SUBSCRIBER_MISSING) => {
            Ok(NotFound::new("Subscriber not found.").into_value())
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSubscriberInput {
    pub list_uid: Option<String>,
    pub email: Option<String>,
    pub fname: Option<String>,
    pub lname: Option<String>,
}

pub fn create_subscriber_request(input: &CreateSubscriberInput) -> Result<ApiRequest, DomainError> {
    let list_uid = require_text(&input.list_uid, "List UID is required.")?;
    let email = require_text(&input.email, "Email is required.")?;

    let mut body = Map::new();
    body.insert("email".into(), json!(email));
    insert_some(&mut body, "fname", non_empty(&input.fname));
    insert_some(&mut body, "lname", non_empty(&input.lname));

    Ok(ApiRequest::post("lists/subscriber-create")
        .query("list_uid", list_uid)
        .json(Value::Object(body)))
}

#[derive(Debug, Default, Deserialize)]
pub struct TagSubscriberInput {
    pub list_uid: Option<String>,
    pub subscriber_uid: Option<String>,
    pub ztag_id: Option<Value>,
}

pub fn tag_subscriber_request(input: &TagSubscriberInput) -> Result<ApiRequest, DomainError> {
    let list_uid = require_text(&input.list_uid, "List UID is required.")?;
    let subscriber_uid = require_text(&input.subscriber_uid, "Subscriber UID is required.")?;
    let ztag_id = require_scalar(&input.ztag_id, "Tag ID is required.")?;

    Ok(ApiRequest::post("lists/add-tag")
        .query("ztag_id", ztag_id)
        .query("subscriber_uid", subscriber_uid)
        .query("list_uid", list_uid))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubscriberInput {
    pub list_uid: Option<String>,
    pub subscriber_uid: Option<String>,
    pub email: Option<String>,
    pub fname: Option<String>,
    pub lname: Option<String>,
}

pub fn update_subscriber_request(input: &UpdateSubscriberInput) -> Result<ApiRequest, DomainError> {
    let list_uid = require_text(&input.list_uid, "List UID is required.")?;
    let subscriber_uid = require_text(&input.subscriber_uid, "Subscriber UID is required.")?;

    let mut body = Map::new();
    insert_some(&mut body, "email", non_empty(&input.email));
    insert_some(&mut body, "fname", non_empty(&input.fname));
    insert_some(&mut body, "lname", non_empty(&input.lname));
    if body.is_empty() {
        return Err(DomainError::Validation("No update fields provided.".to_string()));
    }

    Ok(ApiRequest::post("lists/subscriber-update")
        .query("list_uid", list_uid)
        .query("subscriber_uid", subscriber_uid)
        .json(Value::Object(body)))
}

#[derive(Debug, Default, Deserialize)]
pub struct FindSubscriberInput {
    pub list_uid: Option<String>,
    pub email: Option<String>,
}

pub fn find_subscriber_request(input: &FindSubscriberInput) -> Result<ApiRequest, DomainError> {
    let list_uid = require_text(&input.list_uid, "List UID is required.")?;
    let email = require_text(&input.email, "Email is required.")?;
    Ok(ApiRequest::post("lists/search-by-email")
        .query("list_uid", list_uid)
        .json(json!({ "email": email })))
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriberDetailsInput {
    pub list_uid: Option<String>,
    pub subscriber_uid: Option<String>,
}

pub fn subscriber_details_request(input: &SubscriberDetailsInput) -> Result<ApiRequest, DomainError> {
    let list_uid = require_text(&input.list_uid, "List UID is required.")?;
    let subscriber_uid = require_text(&input.subscriber_uid, "Subscriber UID is required.")?;
    Ok(ApiRequest::get("lists/get-subscriber")
        .query("list_uid", list_uid)
        .query("subscriber_uid", subscriber_uid))
}

#[derive(Debug, Default, Deserialize)]
pub struct CampaignStatsInput {
    pub campaign_uid: Option<String>,
    pub page: Option<i64>,
    #[serde(rename = "perPage", alias = "per_page")]
    pub per_page: Option<i64>,
}

pub fn campaign_stats_request(input: &CampaignStatsInput) -> Result<ApiRequest, DomainError> {
    let campaign_uid = require_text(&input.campaign_uid, "Campaign UID is required.")?;

    let mut body = Map::new();
    insert_some(&mut body, "page", input.page);
    insert_some(&mut body, "perPage", input.per_page);

    Ok(ApiRequest::get("campaigns/get-stats")
        .query("campaign_uid", campaign_uid)
        .json(Value::Object(body)))
}

pub struct CreateSubscriber;

#[async_trait::async_trait]
impl Action for CreateSubscriber {
    fn name(&self) -> &'static str {
        "create_subscriber"
    }

    fn display_name(&self) -> &'static str {
        "Create Subscriber"
    }

    fn description(&self) -> &'static str {
        "Creates a new subscriber in a list."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = ZagomailClient::from_credentials(auth)?;
        let input: CreateSubscriberInput = parse_props(props)?;
        let envelope = client.execute(&create_subscriber_request(&input)?).await?;
        record_or_unexpected(envelope, "create subscriber")
    }
}

pub struct TagSubscriber;

#[async_trait::async_trait]
impl Action for TagSubscriber {
    fn name(&self) -> &'static str {
        "tag_subscriber"
    }

    fn display_name(&self) -> &'static str {
        "Tag Subscriber"
    }

    fn description(&self) -> &'static str {
        "Adds a tag to an existing subscriber."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = ZagomailClient::from_credentials(auth)?;
        let input: TagSubscriberInput = parse_props(props)?;
        let envelope = client.execute(&tag_subscriber_request(&input)?).await?;
        let message = envelope
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Tag added successfully!".to_string());
        Ok(json!({ "success": true, "message": message }))
    }
}

pub struct UpdateSubscriber;

#[async_trait::async_trait]
impl Action for UpdateSubscriber {
    fn name(&self) -> &'static str {
        "update_subscriber"
    }

    fn display_name(&self) -> &'static str {
        "Update Subscriber"
    }

    fn description(&self) -> &'static str {
        "Updates an existing subscriber in a list."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = ZagomailClient::from_credentials(auth)?;
        let input: UpdateSubscriberInput = parse_props(props)?;
        let envelope = client.execute(&update_subscriber_request(&input)?).await?;
        record_or_unexpected(envelope, "update subscriber")
    }
}

pub struct FindSubscriberByEmail;

#[async_trait::async_trait]
impl Action for FindSubscriberByEmail {
    fn name(&self) -> &'static str {
        "find_subscriber_by_email"
    }

    fn display_name(&self) -> &'static str {
        "Find Subscriber by Email"
    }

    fn description(&self) -> &'static str {
        "Searches for a subscriber in a list by their email address."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = ZagomailClient::from_credentials(auth)?;
        let input: FindSubscriberInput = parse_props(props)?;
        let request = find_subscriber_request(&input)?;
        lookup_result(
            client.execute(&request).await,
            "Subscriber not found or API returned success without data.",
        )
    }
}

pub struct GetSubscriberDetails;

#[async_trait::async_trait]
impl Action for GetSubscriberDetails {
    fn name(&self) -> &'static str {
        "get_subscriber_details"
    }

    fn display_name(&self) -> &'static str {
        "Get Subscriber Details"
    }

    fn description(&self) -> &'static str {
        "Retrieves the details of a specific subscriber in a list."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = ZagomailClient::from_credentials(auth)?;
        let input: SubscriberDetailsInput = parse_props(props)?;
        let request = subscriber_details_request(&input)?;
        lookup_result(
            client.execute(&request).await,
            "Subscriber details not found or API returned success without data.",
        )
    }
}

pub struct GetCampaignStats;

#[async_trait::async_trait]
impl Action for GetCampaignStats {
    fn name(&self) -> &'static str {
        "get_campaign_stats"
    }

    fn display_name(&self) -> &'static str {
        "Get Campaign Stats"
    }

    fn description(&self) -> &'static str {
        "Retrieves statistics for a specific campaign."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = ZagomailClient::from_credentials(auth)?;
        let input: CampaignStatsInput = parse_props(props)?;
        let request = campaign_stats_request(&input)?;

        match client.execute(&request).await {
            Ok(envelope) => envelope.data.ok_or_else(|| {
                DomainError::UnexpectedResponse(
                    "Failed to get campaign stats: Response data missing despite success status."
                        .to_string(),
                )
            }),
            Err(e @ DomainError::Vendor { .. }) if e.to_string().to_lowercase().contains("not found") => {
                Ok(NotFound::new("Campaign not found.").into_value())
            }
            Err(e) => Err(e),
        }
    }
}

/// Mailing lists for the `list_uid` picker.
pub async fn list_options(auth: &Credentials) -> DropdownState {
    let client = match ZagomailClient::from_credentials(auth) {
        Ok(c) => c,
        Err(_) => return DropdownState::failure("Please authenticate first"),
    };
    match client.all_lists().await {
        Ok(lists) if lists.is_empty() => DropdownState::failure("No lists found in your account."),
        Ok(lists) => {
            info!(count = lists.len(), "loaded zagomail list options");
            DropdownState::ready(
                lists
                    .into_iter()
                    .map(|l| DropdownOption {
                        label: l.name,
                        value: json!(l.uid),
                    })
                    .collect(),
            )
        }
        Err(e) => {
            error!(error = %e, "Failed to load lists for dropdown");
            DropdownState::failure("Error loading lists.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ZagomailAuth;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth(server: &MockServer) -> Credentials {
        Credentials::Zagomail(ZagomailAuth::new("pk", "sk").with_api_url(server.uri()))
    }

    async fn respond(server: &MockServer, http_method: &str, route: &str, body: Value) {
        Mock::given(method(http_method))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_create_subscriber_omits_empty_names() {
        let input = CreateSubscriberInput {
            list_uid: Some("l1".into()),
            email: Some("a@b.co".into()),
            fname: Some("".into()),
            lname: Some("Lee".into()),
        };
        let req = create_subscriber_request(&input).unwrap();
        assert_eq!(req.query_value("list_uid"), Some("l1"));
        assert_eq!(req.body, Some(json!({ "email": "a@b.co", "lname": "Lee" })));
    }

    #[test]
    fn test_tag_subscriber_query_order() {
        let input: TagSubscriberInput = serde_json::from_value(json!({
            "list_uid": "l1", "subscriber_uid": "s1", "ztag_id": 42
        }))
        .unwrap();
        let req = tag_subscriber_request(&input).unwrap();
        let keys: Vec<&str> = req.query.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["ztag_id", "subscriber_uid", "list_uid"]);
        assert_eq!(req.query_value("ztag_id"), Some("42"));
    }

    #[test]
    fn test_update_subscriber_requires_a_field() {
        let input = UpdateSubscriberInput {
            list_uid: Some("l1".into()),
            subscriber_uid: Some("s1".into()),
            email: Some("  ".into()),
            ..Default::default()
        };
        let err = update_subscriber_request(&input).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: No update fields provided.");
    }

    #[test]
    fn test_campaign_stats_paging_is_optional() {
        let input: CampaignStatsInput =
            serde_json::from_value(json!({ "campaign_uid": "c1", "perPage": 10 })).unwrap();
        let req = campaign_stats_request(&input).unwrap();
        assert_eq!(req.body, Some(json!({ "perPage": 10 })));
    }

    #[tokio::test]
    async fn test_create_subscriber_returns_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lists/subscriber-create"))
            .and(body_json(json!({ "email": "a@b.co", "publicKey": "pk" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": { "record": { "subscriber_uid": "s9", "email": "a@b.co" } }
            })))
            .mount(&server)
            .await;

        let out = CreateSubscriber
            .run(&auth(&server), json!({ "list_uid": "l1", "email": "a@b.co" }))
            .await
            .unwrap();
        assert_eq!(out, json!({ "subscriber_uid": "s9", "email": "a@b.co" }));
    }

    #[tokio::test]
    async fn test_create_subscriber_without_record_is_unexpected() {
        let server = MockServer::start().await;
        respond(&server, "POST", "/lists/subscriber-create", json!({ "status": "success" })).await;

        let err = CreateSubscriber
            .run(&auth(&server), json!({ "list_uid": "l1", "email": "a@b.co" }))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn test_tag_subscriber_default_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lists/add-tag"))
            .and(query_param("ztag_id", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .mount(&server)
            .await;

        let out = TagSubscriber
            .run(
                &auth(&server),
                json!({ "list_uid": "l1", "subscriber_uid": "s1", "ztag_id": "7" }),
            )
            .await
            .unwrap();
        assert_eq!(out, json!({ "success": true, "message": "Tag added successfully!" }));
    }

    #[tokio::test]
    async fn test_find_subscriber_missing_is_not_found() {
        let server = MockServer::start().await;
        respond(
            &server,
            "POST",
            "/lists/search-by-email",
            json!({ "status": "error", "error": "The subscriber does not exist in this list." }),
        )
        .await;

        let out = FindSubscriberByEmail
            .run(&auth(&server), json!({ "list_uid": "l1", "email": "x@b.co" }))
            .await
            .unwrap();
        assert_eq!(out, json!({ "found": false, "message": "Subscriber not found." }));
    }

    #[tokio::test]
    async fn test_find_subscriber_success_without_record() {
        let server = MockServer::start().await;
        respond(&server, "POST", "/lists/search-by-email", json!({ "status": "success", "data": {} })).await;

        let out = FindSubscriberByEmail
            .run(&auth(&server), json!({ "list_uid": "l1", "email": "x@b.co" }))
            .await
            .unwrap();
        assert_eq!(out["found"], json!(false));
    }

    #[tokio::test]
    async fn test_subscriber_details_other_errors_propagate() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "/lists/get-subscriber",
            json!({ "status": "error", "error": "Invalid API key" }),
        )
        .await;

        let err = GetSubscriberDetails
            .run(&auth(&server), json!({ "list_uid": "l1", "subscriber_uid": "s1" }))
            .await
            .unwrap_err();
        assert!(err.vendor_message_contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_update_subscriber_missing_subscriber_is_an_error() {
        let server = MockServer::start().await;
        respond(
            &server,
            "POST",
            "/lists/subscriber-update",
            json!({ "status": "error", "error": "The subscriber does not exist in this list" }),
        )
        .await;

        let err = UpdateSubscriber
            .run(
                &auth(&server),
                json!({ "list_uid": "l1", "subscriber_uid": "s1", "fname": "Ada" }),
            )
            .await
            .unwrap_err();
        match err {
            DomainError::Vendor { vendor, message } => {
                assert_eq!(vendor, "Zagomail");
                assert_eq!(message, "The subscriber does not exist in this list");
            }
            other => panic!("expected vendor error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_campaign_not_found_is_structured() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "/campaigns/get-stats",
            json!({ "status": "error", "error": "Campaign Not Found" }),
        )
        .await;

        let out = GetCampaignStats
            .run(&auth(&server), json!({ "campaign_uid": "c1" }))
            .await
            .unwrap();
        assert_eq!(out, json!({ "found": false, "message": "Campaign not found." }));
    }

    #[tokio::test]
    async fn test_campaign_stats_returns_data() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "/campaigns/get-stats",
            json!({ "status": "success", "data": { "opens": 3 } }),
        )
        .await;

        let out = GetCampaignStats
            .run(&auth(&server), json!({ "campaign_uid": "c1" }))
            .await
            .unwrap();
        assert_eq!(out, json!({ "opens": 3 }));
    }

    #[tokio::test]
    async fn test_list_options_empty_account() {
        let server = MockServer::start().await;
        respond(
            &server,
            "GET",
            "/lists/all-lists",
            json!({ "status": "success", "data": { "records": [] } }),
        )
        .await;

        let state = list_options(&auth(&server)).await;
        assert!(state.disabled);
        assert_eq!(state.placeholder.as_deref(), Some("No lists found in your account."));
    }
}
