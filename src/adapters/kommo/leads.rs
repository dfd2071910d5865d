//! Kommo lead actions: create, update, find by id, and the lead picker.

use super::client::{KommoClient, embedded_list};
use crate::adapters::http::ApiRequest;
use crate::adapters::props::{
    insert_non_empty_array, insert_some, join_with, non_empty, parse_props, require_id,
    require_text,
};
use crate::domain::{
    Credentials, DomainError, DropdownOption, DropdownState, KommoLead, TagRef, embedded_tags,
};
use crate::ports::Action;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{error, info};

/// Related entities `find_lead_by_id` can embed.
pub const LEAD_WITH_OPTIONS: &[&str] = &[
    "contacts",
    "loss_reason",
    "catalog_elements",
    "is_price_modified_by_robot",
    "only_deleted",
    "source_id",
];

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IdRef {
    pub id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateLeadInput {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub status_id: Option<i64>,
    pub pipeline_id: Option<i64>,
    pub responsible_user_id: Option<i64>,
    pub contact_ids: Option<Vec<IdRef>>,
    pub company_id: Option<i64>,
    pub tags: Option<Vec<TagRef>>,
    pub custom_fields_values: Option<Value>,
}

/// POST `/api/v4/leads` with a one-element array body.
pub fn create_lead_request(input: &CreateLeadInput) -> Result<ApiRequest, DomainError> {
    let name = require_text(&input.name, "Lead name is required.")?;

    let mut lead = Map::new();
    lead.insert("name".into(), json!(name));
    insert_some(&mut lead, "price", input.price);
    insert_some(&mut lead, "status_id", input.status_id);
    insert_some(&mut lead, "pipeline_id", input.pipeline_id);
    insert_some(&mut lead, "responsible_user_id", input.responsible_user_id);

    let mut embedded = Map::new();
    if let Some(contacts) = input.contact_ids.as_ref().filter(|c| !c.is_empty()) {
        let refs: Vec<Value> = contacts.iter().map(|c| json!({ "id": c.id })).collect();
        embedded.insert("contacts".into(), Value::Array(refs));
    }
    if let Some(company_id) = input.company_id {
        embedded.insert("companies".into(), json!([{ "id": company_id }]));
    }
    let tags = embedded_tags(input.tags.as_deref().unwrap_or_default());
    if !tags.is_empty() {
        embedded.insert("tags".into(), Value::Array(tags));
    }
    if !embedded.is_empty() {
        lead.insert("_embedded".into(), Value::Object(embedded));
    }

    insert_non_empty_array(&mut lead, "custom_fields_values", &input.custom_fields_values);

    Ok(ApiRequest::post("/api/v4/leads").json(json!([lead])))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLeadInput {
    pub lead_id: Option<Value>,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub status_id: Option<i64>,
    pub pipeline_id: Option<i64>,
    pub responsible_user_id: Option<i64>,
    pub custom_fields_values: Option<Value>,
    pub tags_to_add: Option<Vec<TagRef>>,
    pub tags_to_delete: Option<Vec<TagRef>>,
}

/// PATCH `/api/v4/leads/{id}` with a single-object body.
pub fn update_lead_request(input: &UpdateLeadInput) -> Result<ApiRequest, DomainError> {
    let lead_id = require_id(&input.lead_id, "Lead ID is required.")?;

    let mut update = Map::new();
    insert_some(&mut update, "name", non_empty(&input.name));
    insert_some(&mut update, "price", input.price);
    insert_some(&mut update, "status_id", input.status_id);
    insert_some(&mut update, "pipeline_id", input.pipeline_id);
    insert_some(&mut update, "responsible_user_id", input.responsible_user_id);
    insert_non_empty_array(&mut update, "custom_fields_values", &input.custom_fields_values);
    insert_tag_changes(&mut update, &input.tags_to_add, &input.tags_to_delete);

    if update.is_empty() {
        return Err(DomainError::Validation("No update fields provided.".to_string()));
    }

    Ok(ApiRequest::patch(format!("/api/v4/leads/{}", lead_id)).json(Value::Object(update)))
}

/// Adds `_embedded.tags_to_add` / `tags_to_delete` for non-empty normalized lists.
pub(crate) fn insert_tag_changes(
    target: &mut Map<String, Value>,
    to_add: &Option<Vec<TagRef>>,
    to_delete: &Option<Vec<TagRef>>,
) {
    let mut embedded = Map::new();
    for (key, tags) in [("tags_to_add", to_add), ("tags_to_delete", to_delete)] {
        let normalized = embedded_tags(tags.as_deref().unwrap_or_default());
        if !normalized.is_empty() {
            embedded.insert(key.into(), Value::Array(normalized));
        }
    }
    if !embedded.is_empty() {
        target.insert("_embedded".into(), Value::Object(embedded));
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FindLeadInput {
    pub lead_id: Option<Value>,
    pub with_param: Option<Vec<String>>,
}

/// GET `/api/v4/leads/{id}`.
pub fn find_lead_request(input: &FindLeadInput) -> Result<ApiRequest, DomainError> {
    let lead_id = require_id(&input.lead_id, "Lead ID is required.")?;
    let with = join_with(&input.with_param, LEAD_WITH_OPTIONS)?;
    Ok(ApiRequest::get(format!("/api/v4/leads/{}", lead_id)).query_opt("with", with))
}

pub struct CreateLead;

#[async_trait::async_trait]
impl Action for CreateLead {
    fn name(&self) -> &'static str {
        "create_new_lead"
    }

    fn display_name(&self) -> &'static str {
        "Create New Lead"
    }

    fn description(&self) -> &'static str {
        "Adds a new lead to Kommo."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = KommoClient::from_credentials(auth)?;
        let input: CreateLeadInput = parse_props(props)?;
        let request = create_lead_request(&input)?;
        client.execute(&request).await
    }
}

pub struct UpdateLead;

#[async_trait::async_trait]
impl Action for UpdateLead {
    fn name(&self) -> &'static str {
        "update_lead"
    }

    fn display_name(&self) -> &'static str {
        "Update Lead"
    }

    fn description(&self) -> &'static str {
        "Updates an existing lead in Kommo."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = KommoClient::from_credentials(auth)?;
        let input: UpdateLeadInput = parse_props(props)?;
        let request = update_lead_request(&input)?;
        client.execute(&request).await
    }
}

pub struct FindLead;

#[async_trait::async_trait]
impl Action for FindLead {
    fn name(&self) -> &'static str {
        "find_lead_by_id"
    }

    fn display_name(&self) -> &'static str {
        "Find Lead by ID"
    }

    fn description(&self) -> &'static str {
        "Retrieves the details of a specific lead by its ID."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = KommoClient::from_credentials(auth)?;
        let input: FindLeadInput = parse_props(props)?;
        let request = find_lead_request(&input)?;
        client.execute(&request).await
    }
}

/// Recent leads for the `lead_id` picker. Never fails; errors become a disabled state.
pub async fn lead_options(auth: &Credentials) -> DropdownState {
    let client = match KommoClient::from_credentials(auth) {
        Ok(c) => c,
        Err(e) => return DropdownState::failure(e.to_string()),
    };
    let request = ApiRequest::get("/api/v4/leads")
        .query("limit", 100)
        .query("order", "updated_at:desc");

    match client.execute(&request).await {
        Ok(body) => {
            if body.get("_embedded").is_none() {
                return DropdownState::failure("Could not load leads.");
            }
            let leads: Vec<KommoLead> = embedded_list(&body, "leads")
                .into_iter()
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect();
            info!(count = leads.len(), "loaded kommo lead options");
            DropdownState::ready(
                leads
                    .iter()
                    .map(|l| DropdownOption {
                        label: l.label(),
                        value: json!(l.id),
                    })
                    .collect(),
            )
        }
        Err(e) => {
            error!(error = %e, "Error fetching leads");
            DropdownState::failure("Error fetching leads.")
        }
    }
}
