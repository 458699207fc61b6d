//! Blocking clients for the two external collaborators of the journal
//! engine: the integration platform's action API (journal entries,
//! ledger accounts, mapping targets, invoices) and the mapping store's
//! REST API.
//!
//! [`ActionClient`] implements [`ledgerbridge_journal::JournalSource`], so
//! a [`ledgerbridge_journal::JournalView`] can be driven directly from it.

mod auth;
mod error;
mod http;

pub mod actions;
pub mod mapping;

pub use actions::{ActionClient, Invoice, Vendor};
pub use auth::{
    auth_file_path, delete_credentials, load_credentials, resolve_token, save_credentials, Credentials,
    TOKEN_ENV,
};
pub use error::ConnectorError;
pub use http::{ApiClient, RetryPolicy};
pub use mapping::{Category, Contractor, ContractorMapping, MappingClient};
