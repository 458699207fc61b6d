//! Orchestrator for one journal-entries page visit.
//!
//! Owns the merged collection, the loading/error state, the date filter
//! inputs and the pager. Every run is stamped with a generation number;
//! a run that finishes after a newer one has started throws its results
//! away instead of overwriting the newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::{format_for_display, DateFilter, PLACEHOLDER};
use crate::error::JournalError;
use crate::fetch::{fetch_entries, last_failure, FetchMode, JournalSource};
use crate::merge::merge;
use crate::model::JournalEntry;
use crate::paginate::{page_slice, paginate, total_pages, PageView, Pager};
use crate::selection::Selection;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Nothing fetched: no run yet, or no accounts selected.
    Idle,
    Loading,
    Success,
    /// At least one account failed; the others are still displayed.
    PartialError,
}

/// What a call to [`JournalView::refresh`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Empty selection; no fetch attempted.
    NoAccounts,
    /// Results were installed into the view.
    Completed { entries: usize, failed_accounts: usize },
    /// A newer run started while this one was in flight; results dropped.
    Superseded,
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalRow {
    pub id: String,
    pub date: String,
    pub number: String,
    pub status: String,
    pub account: String,
    pub created: String,
    pub modified: String,
}

/// Pager footer and banner state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSummary {
    pub state: ViewState,
    pub page: usize,
    pub total_pages: usize,
    pub total_entries: usize,
    pub can_previous: bool,
    pub can_next: bool,
    pub error: Option<String>,
}

impl ViewSummary {
    pub fn is_loading(&self) -> bool {
        self.state == ViewState::Loading
    }

    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.page, self.total_pages)
    }

    /// Text for an empty table body.
    pub fn empty_label(&self) -> &'static str {
        if self.is_loading() {
            "Loading..."
        } else {
            "No entries found"
        }
    }
}

struct ViewInner {
    state: ViewState,
    entries: Vec<JournalEntry>,
    error: Option<JournalError>,
    filter: DateFilter,
    pager: Pager,
}

pub struct JournalView<S> {
    source: S,
    selection: Selection,
    mode: FetchMode,
    generation: AtomicU64,
    inner: Mutex<ViewInner>,
}

impl<S: JournalSource> JournalView<S> {
    pub fn new(source: S, selection: Selection) -> Self {
        Self {
            source,
            selection,
            mode: FetchMode::default(),
            generation: AtomicU64::new(0),
            inner: Mutex::new(ViewInner {
                state: ViewState::Idle,
                entries: Vec::new(),
                error: None,
                filter: DateFilter::default(),
                pager: Pager::new(DEFAULT_PAGE_SIZE),
            }),
        }
    }

    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        self.lock().pager = Pager::new(page_size);
        self
    }

    pub fn with_filter(self, filter: DateFilter) -> Self {
        self.lock().filter = filter;
        self
    }

    // -----------------------------------------------------------------------
    // Runs
    // -----------------------------------------------------------------------

    /// First run of a page visit: starts on page 1.
    pub fn mount(&self) -> RunStatus {
        self.lock().pager.reset();
        self.refresh()
    }

    /// Fetch every selected account, merge, and install the result.
    ///
    /// The page index is kept across runs; callers that want to jump back
    /// to the first page use [`JournalView::mount`].
    pub fn refresh(&self) -> RunStatus {
        if self.selection.is_empty() {
            let mut inner = self.lock();
            inner.state = ViewState::Idle;
            inner.entries.clear();
            inner.error = Some(JournalError::NoAccountsSelected);
            return RunStatus::NoAccounts;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let range = {
            let mut inner = self.lock();
            inner.state = ViewState::Loading;
            inner.error = None;
            inner.filter.effective_range()
        };

        let ids = self.selection.ids();
        let outcomes = fetch_entries(&self.source, &ids, &range, self.mode);
        let merged = merge(&outcomes);
        let error = last_failure(&outcomes);
        let failed_accounts = outcomes.iter().filter(|o| !o.is_ok()).count();

        let mut inner = self.lock();
        let current = self.generation.load(Ordering::SeqCst);
        if current != generation {
            log::warn!("discarding results of run {generation}; run {current} is newer");
            return RunStatus::Superseded;
        }

        let entries = merged.len();
        inner.state = if error.is_some() { ViewState::PartialError } else { ViewState::Success };
        inner.entries = merged;
        inner.error = error;
        RunStatus::Completed { entries, failed_accounts }
    }

    // -----------------------------------------------------------------------
    // Filter inputs
    // -----------------------------------------------------------------------

    pub fn filter(&self) -> DateFilter {
        self.lock().filter
    }

    pub fn set_use_from(&self, enabled: bool) {
        self.lock().filter.set_use_from(enabled);
    }

    pub fn set_use_to(&self, enabled: bool) {
        self.lock().filter.set_use_to(enabled);
    }

    pub fn set_from(&self, date: Option<NaiveDate>) {
        self.lock().filter.set_from(date);
    }

    pub fn set_to(&self, date: Option<NaiveDate>) {
        self.lock().filter.set_to(date);
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn next_page(&self) {
        let mut inner = self.lock();
        let total = total_pages(inner.entries.len(), inner.pager.page_size());
        inner.pager.next(total);
    }

    pub fn previous_page(&self) {
        self.lock().pager.previous();
    }

    pub fn page(&self) -> usize {
        self.lock().pager.page()
    }

    pub fn total_pages(&self) -> usize {
        let inner = self.lock();
        total_pages(inner.entries.len(), inner.pager.page_size())
    }

    pub fn current_page(&self) -> PageView<JournalEntry> {
        let inner = self.lock();
        paginate(&inner.entries, inner.pager.page(), inner.pager.page_size())
    }
}

impl<S> JournalView<S> {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn lock(&self) -> MutexGuard<'_, ViewInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ViewState {
        self.lock().state
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.lock().entries.clone()
    }

    pub fn error(&self) -> Option<JournalError> {
        self.lock().error.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        self.lock().error.as_ref().map(ToString::to_string)
    }

    /// Display name of a selected account, `-` when it is not selected.
    pub fn account_name(&self, id: &str) -> String {
        self.selection.name_of(id).unwrap_or(PLACEHOLDER).to_string()
    }

    /// The current page rendered as table rows.
    pub fn rows(&self) -> Vec<JournalRow> {
        let inner = self.lock();
        page_slice(&inner.entries, inner.pager.page(), inner.pager.page_size())
            .iter()
            .map(|entry| self.row(entry))
            .collect()
    }

    fn row(&self, entry: &JournalEntry) -> JournalRow {
        let fields = &entry.fields;
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        JournalRow {
            id: entry.id.clone(),
            date: format_for_display(fields.trandate.as_deref()),
            number: text(&fields.tranid),
            status: text(&fields.status),
            account: entry.account().map_or_else(|| PLACEHOLDER.to_string(), |id| self.account_name(id)),
            created: format_for_display(fields.createddate.as_deref()),
            modified: format_for_display(fields.lastmodifieddate.as_deref()),
        }
    }

    pub fn summary(&self) -> ViewSummary {
        let inner = self.lock();
        let total = total_pages(inner.entries.len(), inner.pager.page_size());
        ViewSummary {
            state: inner.state,
            page: inner.pager.page(),
            total_pages: total,
            total_entries: inner.entries.len(),
            can_previous: inner.pager.can_previous(),
            can_next: inner.pager.can_next(total),
            error: inner.error.as_ref().map(ToString::to_string),
        }
    }
}
