//! Per-account fetcher: one retrieval call per selected account, with
//! failures isolated to the account that produced them.

use std::thread;

use serde::{Deserialize, Serialize};

use crate::dates::format_for_query;
use crate::error::{JournalError, SourceError};
use crate::model::{DateRange, JournalEntry};

// ---------------------------------------------------------------------------
// Source seam
// ---------------------------------------------------------------------------

/// Request body for the journal-entry list action.
///
/// Date boundaries are omitted entirely when open-ended; `cursor` is
/// always sent (as `null` for the first page).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalQuery {
    pub ledger_account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
    pub cursor: Option<String>,
}

impl JournalQuery {
    pub fn new(account_id: &str, range: &DateRange) -> Self {
        Self {
            ledger_account_id: account_id.to_string(),
            from_date: range.from.map(format_for_query),
            to_date: range.to.map(format_for_query),
            cursor: None,
        }
    }
}

/// Anything that can list journal entries for one ledger account.
///
/// `Sync` so that [`FetchMode::Concurrent`] can share one source across
/// worker threads.
pub trait JournalSource: Sync {
    fn list_journal_entries(&self, query: &JournalQuery) -> Result<Vec<JournalEntry>, SourceError>;
}

impl<S: JournalSource + ?Sized> JournalSource for &S {
    fn list_journal_entries(&self, query: &JournalQuery) -> Result<Vec<JournalEntry>, SourceError> {
        (**self).list_journal_entries(query)
    }
}

impl<S: JournalSource + ?Sized + Send> JournalSource for std::sync::Arc<S> {
    fn list_journal_entries(&self, query: &JournalQuery) -> Result<Vec<JournalEntry>, SourceError> {
        (**self).list_journal_entries(query)
    }
}

impl<S: JournalSource + ?Sized + Send> JournalSource for Box<S> {
    fn list_journal_entries(&self, query: &JournalQuery) -> Result<Vec<JournalEntry>, SourceError> {
        (**self).list_journal_entries(query)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How the per-account calls are scheduled. Both modes return outcomes in
/// account order, so merging and error reporting do not depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// One call at a time, in account order.
    #[default]
    Sequential,
    /// All calls in flight at once on scoped threads, joined in account order.
    Concurrent,
}

/// Result of one account's retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub account_id: String,
    pub result: Result<Vec<JournalEntry>, SourceError>,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The account's batch; empty for a failed account.
    pub fn entries(&self) -> &[JournalEntry] {
        match &self.result {
            Ok(entries) => entries,
            Err(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&SourceError> {
        self.result.as_ref().err()
    }
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Fetch every account's batch. Returns one outcome per input id, in input
/// order. A failing account is logged and recorded; the rest still run.
pub fn fetch_entries<S>(
    source: &S,
    account_ids: &[String],
    range: &DateRange,
    mode: FetchMode,
) -> Vec<FetchOutcome>
where
    S: JournalSource + ?Sized,
{
    match mode {
        FetchMode::Sequential => account_ids
            .iter()
            .map(|id| fetch_one(source, id, range))
            .collect(),
        FetchMode::Concurrent => thread::scope(|scope| {
            let handles: Vec<_> = account_ids
                .iter()
                .map(|id| scope.spawn(move || fetch_one(source, id, range)))
                .collect();

            handles
                .into_iter()
                .zip(account_ids)
                .map(|(handle, id)| {
                    handle.join().unwrap_or_else(|_| {
                        log::error!("fetch worker for account {id} panicked");
                        FetchOutcome {
                            account_id: id.clone(),
                            result: Err(SourceError::Internal("fetch worker panicked".into())),
                        }
                    })
                })
                .collect()
        }),
    }
}

fn fetch_one<S>(source: &S, account_id: &str, range: &DateRange) -> FetchOutcome
where
    S: JournalSource + ?Sized,
{
    let query = JournalQuery::new(account_id, range);
    let result = match source.list_journal_entries(&query) {
        Ok(mut entries) => {
            for entry in &mut entries {
                entry.stamp_account(account_id);
            }
            log::debug!("account {account_id}: {} journal entries", entries.len());
            Ok(entries)
        }
        Err(e) => {
            log::error!("Error fetching entries for account {account_id}: {e}");
            Err(e)
        }
    };

    FetchOutcome {
        account_id: account_id.to_string(),
        result,
    }
}

/// The error a view should show for a set of outcomes: the last failing
/// account in fetch order, or `None` if every account succeeded.
pub fn last_failure(outcomes: &[FetchOutcome]) -> Option<JournalError> {
    outcomes.iter().rev().find_map(|o| {
        o.error().map(|cause| JournalError::AccountFetch {
            account_id: o.account_id.clone(),
            cause: cause.clone(),
        })
    })
}
