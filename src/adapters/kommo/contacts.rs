//! Kommo contact actions and the contact picker.

use super::client::{KommoClient, embedded_list};
use super::leads::insert_tag_changes;
use crate::adapters::http::ApiRequest;
use crate::adapters::props::{
    insert_non_empty_array, insert_some, join_with, non_empty, parse_props, require_id,
    require_text,
};
use crate::domain::{
    Credentials, DomainError, DropdownOption, DropdownState, KommoContact, TagRef, embedded_tags,
};
use crate::ports::Action;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{error, info};

pub const CONTACT_WITH_OPTIONS: &[&str] = &["leads", "catalog_elements"];

#[derive(Debug, Default, Deserialize)]
pub struct CreateContactInput {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub responsible_user_id: Option<i64>,
    pub custom_fields_values: Option<Value>,
    pub tags: Option<Vec<TagRef>>,
}

pub fn create_contact_request(input: &CreateContactInput) -> Result<ApiRequest, DomainError> {
    let name = require_text(&input.name, "Contact name is required.")?;

    let mut contact = Map::new();
    contact.insert("name".into(), json!(name));
    insert_some(&mut contact, "first_name", non_empty(&input.first_name));
    insert_some(&mut contact, "last_name", non_empty(&input.last_name));
    insert_some(&mut contact, "responsible_user_id", input.responsible_user_id);
    insert_non_empty_array(&mut contact, "custom_fields_values", &input.custom_fields_values);

    let tags = embedded_tags(input.tags.as_deref().unwrap_or_default());
    if !tags.is_empty() {
        contact.insert("_embedded".into(), json!({ "tags": tags }));
    }

    Ok(ApiRequest::post("/api/v4/contacts").json(json!([contact])))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateContactInput {
    pub contact_id: Option<Value>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub responsible_user_id: Option<i64>,
    pub custom_fields_values: Option<Value>,
    pub tags_to_add: Option<Vec<TagRef>>,
    pub tags_to_delete: Option<Vec<TagRef>>,
}

pub fn update_contact_request(input: &UpdateContactInput) -> Result<ApiRequest, DomainError> {
    let contact_id = require_id(&input.contact_id, "Contact ID is required.")?;

    let mut update = Map::new();
    insert_some(&mut update, "name", non_empty(&input.name));
    insert_some(&mut update, "first_name", non_empty(&input.first_name));
    insert_some(&mut update, "last_name", non_empty(&input.last_name));
    insert_some(&mut update, "responsible_user_id", input.responsible_user_id);
    insert_non_empty_array(&mut update, "custom_fields_values", &input.custom_fields_values);
    insert_tag_changes(&mut update, &input.tags_to_add, &input.tags_to_delete);

    if update.is_empty() {
        return Err(DomainError::Validation("No update fields provided.".to_string()));
    }

    Ok(ApiRequest::patch(format!("/api/v4/contacts/{}", contact_id)).json(Value::Object(update)))
}

#[derive(Debug, Default, Deserialize)]
pub struct FindContactInput {
    pub email: Option<String>,
    pub with_param: Option<Vec<String>>,
}

/// Kommo has no email filter; the general `query` search matches custom email fields.
pub fn find_contact_request(input: &FindContactInput) -> Result<ApiRequest, DomainError> {
    let email = require_text(&input.email, "Email address is required.")?;
    let with = join_with(&input.with_param, CONTACT_WITH_OPTIONS)?;
    Ok(ApiRequest::get("/api/v4/contacts")
        .query("query", email)
        .query_opt("with", with))
}

pub struct CreateContact;

#[async_trait::async_trait]
impl Action for CreateContact {
    fn name(&self) -> &'static str {
        "create_new_contact"
    }

    fn display_name(&self) -> &'static str {
        "Create New Contact"
    }

    fn description(&self) -> &'static str {
        "Adds a new contact to Kommo."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = KommoClient::from_credentials(auth)?;
        let input: CreateContactInput = parse_props(props)?;
        client.execute(&create_contact_request(&input)?).await
    }
}

pub struct UpdateContact;

#[async_trait::async_trait]
impl Action for UpdateContact {
    fn name(&self) -> &'static str {
        "update_contact"
    }

    fn display_name(&self) -> &'static str {
        "Update Contact"
    }

    fn description(&self) -> &'static str {
        "Updates an existing contact in Kommo."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = KommoClient::from_credentials(auth)?;
        let input: UpdateContactInput = parse_props(props)?;
        client.execute(&update_contact_request(&input)?).await
    }
}

pub struct FindContactByEmail;

#[async_trait::async_trait]
impl Action for FindContactByEmail {
    fn name(&self) -> &'static str {
        "find_contact_by_email"
    }

    fn display_name(&self) -> &'static str {
        "Find Contact by Email"
    }

    fn description(&self) -> &'static str {
        "Looks up contacts that match a specific email address. Returns a list of contacts found."
    }

    /// Returns the matching contacts; an empty list when Kommo finds none.
    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = KommoClient::from_credentials(auth)?;
        let input: FindContactInput = parse_props(props)?;
        let body = client.execute(&find_contact_request(&input)?).await?;
        Ok(Value::Array(embedded_list(&body, "contacts")))
    }
}

/// Recent contacts for the `contact_id` picker.
pub async fn contact_options(auth: &Credentials) -> DropdownState {
    let client = match KommoClient::from_credentials(auth) {
        Ok(c) => c,
        Err(e) => return DropdownState::failure(e.to_string()),
    };
    let request = ApiRequest::get("/api/v4/contacts")
        .query("limit", 100)
        .query("order", "updated_at:desc");

    match client.execute(&request).await {
        Ok(body) if body.get("_embedded").is_some() => {
            let options: Vec<DropdownOption> = embedded_list(&body, "contacts")
                .into_iter()
                .filter_map(|v| serde_json::from_value::<KommoContact>(v).ok())
                .map(|c| DropdownOption {
                    label: c.label(),
                    value: json!(c.id),
                })
                .collect();
            info!(count = options.len(), "loaded kommo contact options");
            DropdownState::ready(options)
        }
        Ok(_) => DropdownState::failure("Could not load contacts."),
        Err(e) => {
            error!(error = %e, "Error fetching contacts");
            DropdownState::failure("Error fetching contacts.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::KommoAuth;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn kommo_auth(server: &MockServer) -> Credentials {
        Credentials::Kommo(KommoAuth::new("tok", Some("acme".into())).with_base_url(server.uri()))
    }

    #[test]
    fn test_create_contact_body() {
        let input: CreateContactInput = serde_json::from_value(json!({
            "name": "Jane Roe",
            "first_name": "",
            "last_name": "Roe",
            "custom_fields_values": [],
            "tags": [{ "id": 3, "name": "vip" }, { "name": "lead" }, {}]
        }))
        .unwrap();
        let req = create_contact_request(&input).unwrap();
        assert_eq!(
            req.body,
            Some(json!([{
                "name": "Jane Roe",
                "last_name": "Roe",
                "_embedded": { "tags": [{ "id": 3 }, { "name": "lead" }] }
            }]))
        );
    }

    #[test]
    fn test_update_contact_requires_id() {
        let input = UpdateContactInput {
            name: Some("New".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_contact_request(&input),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_update_contact_body() {
        let input: UpdateContactInput = serde_json::from_value(json!({
            "contact_id": 8,
            "responsible_user_id": 2,
            "first_name": null
        }))
        .unwrap();
        let req = update_contact_request(&input).unwrap();
        assert_eq!(req.path, "/api/v4/contacts/8");
        assert_eq!(req.body, Some(json!({ "responsible_user_id": 2 })));
    }

    #[test]
    fn test_find_contact_rejects_unknown_with() {
        let input: FindContactInput = serde_json::from_value(json!({
            "email": "a@b.co",
            "with_param": ["companies"]
        }))
        .unwrap();
        assert!(matches!(
            find_contact_request(&input),
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_find_contact_unwraps_embedded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/contacts"))
            .and(query_param("query", "a@b.co"))
            .and(query_param("with", "leads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_page": 1,
                "_embedded": { "contacts": [{ "id": 1, "name": "A" }] }
            })))
            .mount(&server)
            .await;

        let out = FindContactByEmail
            .run(
                &kommo_auth(&server),
                json!({ "email": "a@b.co", "with_param": ["leads"] }),
            )
            .await
            .unwrap();
        assert_eq!(out, json!([{ "id": 1, "name": "A" }]));
    }

    #[tokio::test]
    async fn test_find_contact_no_match_is_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/contacts"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let out = FindContactByEmail
            .run(&kommo_auth(&server), json!({ "email": "none@b.co" }))
            .await
            .unwrap();
        assert_eq!(out, json!([]));
    }

    #[tokio::test]
    async fn test_contact_options() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/contacts"))
            .and(query_param("order", "updated_at:desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_embedded": { "contacts": [
                    { "id": 1, "first_name": "Ann", "last_name": "Lee" },
                    { "id": 2 }
                ] }
            })))
            .mount(&server)
            .await;

        let state = contact_options(&kommo_auth(&server)).await;
        let labels: Vec<&str> = state.options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Ann Lee", "Contact ID: 2"]);
    }

    #[tokio::test]
    async fn test_contact_options_wrong_credentials_kind() {
        let auth = Credentials::Zagomail(crate::domain::ZagomailAuth::new("pk", "sk"));
        let state = contact_options(&auth).await;
        assert!(state.disabled);
        assert!(state.options.is_empty());
        assert_eq!(
            state.placeholder.as_deref(),
            Some("Configuration error: Expected a Kommo OAuth2 connection")
        );
    }
}
