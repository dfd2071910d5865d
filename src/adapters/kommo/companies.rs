//! Kommo company search.

use super::client::{KommoClient, embedded_list};
use crate::adapters::http::ApiRequest;
use crate::adapters::props::{join_with, parse_props, require_text};
use crate::domain::{Credentials, DomainError};
use crate::ports::Action;
use serde::Deserialize;
use serde_json::Value;

pub const COMPANY_WITH_OPTIONS: &[&str] = &["leads", "contacts", "catalog_elements"];

#[derive(Debug, Default, Deserialize)]
pub struct FindCompanyInput {
    pub name_query: Option<String>,
    pub with_param: Option<Vec<String>>,
}

pub fn find_company_request(input: &FindCompanyInput) -> Result<ApiRequest, DomainError> {
    let query = require_text(&input.name_query, "Company name query is required.")?;
    let with = join_with(&input.with_param, COMPANY_WITH_OPTIONS)?;
    Ok(ApiRequest::get("/api/v4/companies")
        .query("query", query)
        .query_opt("with", with))
}

pub struct FindCompany;

#[async_trait::async_trait]
impl Action for FindCompany {
    fn name(&self) -> &'static str {
        "find_company"
    }

    fn display_name(&self) -> &'static str {
        "Find Company"
    }

    fn description(&self) -> &'static str {
        "Finds companies by partial or full name. Returns a list of companies found."
    }

    async fn run(&self, auth: &Credentials, props: Value) -> Result<Value, DomainError> {
        let client = KommoClient::from_credentials(auth)?;
        let input: FindCompanyInput = parse_props(props)?;
        let body = client.execute(&find_company_request(&input)?).await?;
        Ok(Value::Array(embedded_list(&body, "companies")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::KommoAuth;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_find_company_request() {
        let input: FindCompanyInput = serde_json::from_value(json!({
            "name_query": "Acme",
            "with_param": ["contacts", "leads"]
        }))
        .unwrap();
        let req = find_company_request(&input).unwrap();
        assert_eq!(req.query_value("query"), Some("Acme"));
        assert_eq!(req.query_value("with"), Some("contacts,leads"));
    }

    #[tokio::test]
    async fn test_find_company_unexpected_shape_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/companies"))
            .and(query_param("query", "Acme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_page": 1 })))
            .mount(&server)
            .await;

        let auth = Credentials::Kommo(
            KommoAuth::new("tok", Some("acme".into())).with_base_url(server.uri()),
        );
        let out = FindCompany
            .run(&auth, json!({ "name_query": "Acme" }))
            .await
            .unwrap();
        assert_eq!(out, json!([]));
    }
}
