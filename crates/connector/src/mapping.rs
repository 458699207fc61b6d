//! Mapping store REST API: which internal category/contractor points at
//! which account/vendor in the accounting system.

use std::time::Duration;

use ledgerbridge_config::Settings;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ConnectorError;
use crate::http::{ApiClient, RetryPolicy};

/// Expense category and the ledger account it books to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contractor {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub vendor_id: Option<String>,
}

/// Contractor to vendor link, one per contractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractorMapping {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub contractor_id: String,
    pub vendor_id: String,
}

/// Mapping store client (blocking).
#[derive(Clone)]
pub struct MappingClient {
    api: ApiClient,
    base_url: String,
    token: Option<String>,
}

impl MappingClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConnectorError> {
        let api = ApiClient::new(
            "mapping API",
            Duration::from_secs(settings.timeout_secs),
            RetryPolicy::new(settings.max_retries),
        )?;
        Ok(Self {
            api,
            base_url: settings.mapping_api_base.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_base_url(base_url: String) -> Result<Self, ConnectorError> {
        let settings = Settings { mapping_api_base: base_url, ..Settings::default() };
        Self::from_settings(&settings)
    }

    /// Send a bearer token with every request.
    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.api = self.api.with_retry(retry);
        self
    }

    // ── Categories ──────────────────────────────────────────────────

    pub fn list_categories(&self) -> Result<Vec<Category>, ConnectorError> {
        self.get("/api/categories")
    }

    /// Point a category at a ledger account. `None` unmaps it.
    pub fn update_category_account(&self, id: &str, account_id: Option<&str>) -> Result<Category, ConnectorError> {
        let path = format!("/api/categories/{}", urlencoding::encode(id));
        self.patch(&path, &json!({ "accountId": account_id }))
    }

    // ── Contractors ─────────────────────────────────────────────────

    pub fn list_contractors(&self) -> Result<Vec<Contractor>, ConnectorError> {
        self.get("/api/contractors")
    }

    /// Create a contractor. The name must not be blank. Not retried.
    pub fn create_contractor(&self, name: &str) -> Result<Contractor, ConnectorError> {
        if name.trim().is_empty() {
            return Err(ConnectorError::Validation(400, "Name is required".into()));
        }
        let url = self.url("/api/contractors");
        let body = json!({ "name": name });
        let value = self.api.send_json_once(|http| self.authorize(http.post(&url)).json(&body))?;
        decode(value)
    }

    /// Link a contractor to a vendor. `None` unmaps it.
    pub fn update_contractor_vendor(&self, id: &str, vendor_id: Option<&str>) -> Result<Contractor, ConnectorError> {
        let path = format!("/api/contractors/{}", urlencoding::encode(id));
        self.patch(&path, &json!({ "vendorId": vendor_id }))
    }

    pub fn list_contractor_mappings(&self) -> Result<Vec<ContractorMapping>, ConnectorError> {
        self.get("/api/contractors/mapping")
    }

    /// Create or replace the vendor link for a contractor.
    pub fn upsert_contractor_mapping(
        &self,
        contractor_id: &str,
        vendor_id: &str,
    ) -> Result<ContractorMapping, ConnectorError> {
        if contractor_id.is_empty() || vendor_id.is_empty() {
            return Err(ConnectorError::Validation(
                400,
                "contractorId and vendorId are required".into(),
            ));
        }
        let url = self.url("/api/contractors/mapping");
        let body = json!({ "contractorId": contractor_id, "vendorId": vendor_id });
        let value = self.api.send_json(|http| self.authorize(http.post(&url)).json(&body))?;
        decode(value)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConnectorError> {
        let url = self.url(path);
        let value = self.api.send_json(|http| self.authorize(http.get(&url)))?;
        decode(value)
    }

    fn patch<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ConnectorError> {
        let url = self.url(path);
        let value = self.api.send_json(|http| self.authorize(http.patch(&url)).json(body))?;
        decode(value)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ConnectorError> {
    serde_json::from_value(value).map_err(|e| ConnectorError::Parse(e.to_string()))
}
