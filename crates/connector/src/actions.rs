//! Integration platform action API.
//!
//! Every operation is a named action run against one connection:
//! `POST {base}/connections/{key}/actions/{action}/run` with a JSON input,
//! answering `{ "output": { "records": [...], "cursor": ... } }`.
//!
//! Journal fetches are sent once per account: a failed account is
//! reported and recovered by the next refresh, never retried in place.

use std::time::Duration;

use ledgerbridge_config::Settings;
use ledgerbridge_journal::model::id_string;
use ledgerbridge_journal::{AccountRef, JournalEntry, JournalQuery, JournalSource, SourceError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConnectorError;
use crate::http::{ApiClient, RetryPolicy};

/// Invoice record from `list-invoices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    /// String or number, as the accounting system sends it.
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Vendor record from `get-vendors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Action API client (blocking).
#[derive(Clone)]
pub struct ActionClient {
    api: ApiClient,
    base_url: String,
    token: String,
    connection_key: String,
    journal_action: String,
    ledger_accounts_action: String,
    invoices_action: String,
    create_invoice_action: String,
    accounts_action: String,
    vendors_action: String,
    invoices_collection: String,
    max_pages: usize,
}

impl ActionClient {
    pub fn from_settings(settings: &Settings, token: String) -> Result<Self, ConnectorError> {
        let api = ApiClient::new(
            "action API",
            Duration::from_secs(settings.timeout_secs),
            RetryPolicy::new(settings.max_retries),
        )?;

        Ok(Self {
            api,
            base_url: settings.action_api_base.trim_end_matches('/').to_string(),
            token,
            connection_key: settings.connection_key.clone(),
            journal_action: settings.journal_action.clone(),
            ledger_accounts_action: settings.ledger_accounts_action.clone(),
            invoices_action: settings.invoices_action.clone(),
            create_invoice_action: settings.create_invoice_action.clone(),
            accounts_action: settings.accounts_action.clone(),
            vendors_action: settings.vendors_action.clone(),
            invoices_collection: settings.invoices_collection.clone(),
            max_pages: settings.max_pages_per_account.max(1),
        })
    }

    /// Default settings against another base URL.
    pub fn with_base_url(token: String, base_url: String) -> Result<Self, ConnectorError> {
        let settings = Settings { action_api_base: base_url, ..Settings::default() };
        Self::from_settings(&settings, token)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.api = self.api.with_retry(retry);
        self
    }

    /// Cursor pages followed per journal/list call (at least 1).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn action_url(&self, action: &str) -> String {
        format!(
            "{}/connections/{}/actions/{}/run",
            self.base_url,
            urlencoding::encode(&self.connection_key),
            urlencoding::encode(action)
        )
    }

    pub fn data_collection_url(&self, collection: &str) -> String {
        format!(
            "{}/connections/{}/data/{}",
            self.base_url,
            urlencoding::encode(&self.connection_key),
            urlencoding::encode(collection)
        )
    }

    /// Run an action and return its `output`. `retry` selects the client's
    /// retry policy; otherwise the request is sent exactly once.
    fn run(&self, action: &str, input: &Value, retry: bool) -> Result<Value, ConnectorError> {
        let url = self.action_url(action);
        let build = |http: &reqwest::blocking::Client| http.post(&url).bearer_auth(&self.token).json(input);
        let mut body = if retry {
            self.api.send_json(build)?
        } else {
            self.api.send_json_once(build)?
        };
        Ok(body.get_mut("output").map(Value::take).unwrap_or(Value::Null))
    }

    /// Run a list action, following `output.cursor` up to `max_pages`.
    fn list_records<T: DeserializeOwned>(
        &self,
        action: &str,
        mut input: Value,
        retry: bool,
    ) -> Result<Vec<T>, ConnectorError> {
        let mut records = Vec::new();

        for page in 1..=self.max_pages {
            let mut output = self.run(action, &input, retry)?;
            if let Some(batch) = output.get_mut("records").map(Value::take) {
                if !batch.is_null() {
                    let batch: Vec<T> = serde_json::from_value(batch)
                        .map_err(|e| ConnectorError::Parse(format!("{} records: {}", action, e)))?;
                    records.extend(batch);
                }
            }

            let cursor = output["cursor"].as_str().filter(|c| !c.is_empty());
            match cursor {
                Some(cursor) if page < self.max_pages => {
                    log::debug!("{}: following cursor to page {}", action, page + 1);
                    input["cursor"] = Value::String(cursor.to_string());
                }
                Some(_) => {
                    log::debug!("{}: stopping at {} page(s) with more available", action, self.max_pages);
                    break;
                }
                None => break,
            }
        }

        Ok(records)
    }

    /// Journal entries for one ledger account. One request per cursor
    /// page, no retry.
    pub fn journal_entries(&self, query: &JournalQuery) -> Result<Vec<JournalEntry>, ConnectorError> {
        let input = serde_json::to_value(query).map_err(|e| ConnectorError::Parse(e.to_string()))?;
        self.list_records(&self.journal_action, input, false)
    }

    /// Ledger accounts offered on the selection screen.
    pub fn list_ledger_accounts(&self) -> Result<Vec<AccountRef>, ConnectorError> {
        self.list_records(&self.ledger_accounts_action, empty_input(), true)
    }

    /// Mapping targets for categories and contractors.
    pub fn list_accounts(&self) -> Result<Vec<AccountRef>, ConnectorError> {
        self.list_records(&self.accounts_action, empty_input(), true)
    }

    pub fn list_vendors(&self) -> Result<Vec<Vendor>, ConnectorError> {
        self.list_records(&self.vendors_action, empty_input(), true)
    }

    pub fn list_invoices(&self) -> Result<Vec<Invoice>, ConnectorError> {
        self.list_records(&self.invoices_action, empty_input(), true)
    }

    /// Field schema of the invoices data collection, used to build the
    /// create-invoice form. `None` when the collection publishes none.
    pub fn invoice_schema(&self) -> Result<Option<Value>, ConnectorError> {
        let url = self.data_collection_url(&self.invoices_collection);
        let mut body = self.api.send_json(|http| http.get(&url).bearer_auth(&self.token))?;
        Ok(body
            .get_mut("fieldsSchema")
            .map(Value::take)
            .filter(|schema| !schema.is_null()))
    }

    /// Create an invoice from form input. Not retried.
    pub fn create_invoice(&self, input: &Value) -> Result<Value, ConnectorError> {
        self.run(&self.create_invoice_action, input, false)
    }
}

fn empty_input() -> Value {
    Value::Object(Default::default())
}

impl JournalSource for ActionClient {
    fn list_journal_entries(&self, query: &JournalQuery) -> Result<Vec<JournalEntry>, SourceError> {
        self.journal_entries(query).map_err(SourceError::from)
    }
}
