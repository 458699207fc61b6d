use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use ledgerbridge_journal::selection::{decode, encode};
use ledgerbridge_journal::{
    AccountRef, FetchMode, JournalEntry, JournalError, JournalQuery, JournalSource, JournalView,
    RunStatus, Selection, SourceError, ViewState,
};

/// Fixed per-account batches.
struct StaticSource {
    batches: HashMap<String, Result<Vec<JournalEntry>, SourceError>>,
}

impl StaticSource {
    fn new(batches: Vec<(&str, Result<Vec<&str>, SourceError>)>) -> Self {
        let batches = batches
            .into_iter()
            .map(|(account, result)| {
                let result = result.map(|ids| ids.into_iter().map(JournalEntry::new).collect());
                (account.to_string(), result)
            })
            .collect();
        Self { batches }
    }
}

impl JournalSource for StaticSource {
    fn list_journal_entries(&self, query: &JournalQuery) -> Result<Vec<JournalEntry>, SourceError> {
        self.batches
            .get(&query.ledger_account_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn entry_ids(entries: &[JournalEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.id.as_str()).collect()
}

fn cash_and_ar() -> Vec<AccountRef> {
    vec![AccountRef::new("A1", "Cash"), AccountRef::new("A2", "AR")]
}

#[test]
fn two_accounts_merge_and_paginate() {
    let accounts = cash_and_ar();
    let encoded = encode(&accounts);
    let decoded = decode(&encoded.ids, &encoded.names);
    assert_eq!(decoded, accounts);

    let source = StaticSource::new(vec![("A1", Ok(vec!["J1", "J2"])), ("A2", Ok(vec!["J2", "J3"]))]);
    let view = JournalView::new(source, Selection::new(decoded)).with_page_size(2);

    assert_eq!(view.mount(), RunStatus::Completed { entries: 3, failed_accounts: 0 });
    assert_eq!(view.state(), ViewState::Success);

    let merged = view.entries();
    let stamped: Vec<(&str, Option<&str>)> = merged.iter().map(|e| (e.id.as_str(), e.account())).collect();
    assert_eq!(stamped, vec![("J1", Some("A1")), ("J2", Some("A2")), ("J3", Some("A2"))]);

    let page = view.current_page();
    assert_eq!(entry_ids(&page.items), vec!["J1", "J2"]);
    assert_eq!(page.total_pages, 2);

    view.next_page();
    let page = view.current_page();
    assert_eq!(page.page, 2);
    assert_eq!(entry_ids(&page.items), vec!["J3"]);
}

#[test]
fn middle_account_failure_is_isolated() {
    let source = StaticSource::new(vec![
        ("A1", Ok(vec!["J1", "J2"])),
        ("A2", Err(SourceError::Http(500, "Internal Server Error".into()))),
        ("A3", Ok(vec!["J5"])),
    ]);
    let selection = Selection::new(vec![
        AccountRef::new("A1", "Cash"),
        AccountRef::new("A2", "AR"),
        AccountRef::new("A3", "AP"),
    ]);

    for mode in [FetchMode::Sequential, FetchMode::Concurrent] {
        let view = JournalView::new(&source, selection.clone()).with_mode(mode);
        assert_eq!(view.mount(), RunStatus::Completed { entries: 3, failed_accounts: 1 });
        assert_eq!(view.state(), ViewState::PartialError);
        assert_eq!(entry_ids(&view.entries()), vec!["J1", "J2", "J5"]);
        assert_eq!(view.error_message().as_deref(), Some("Error fetching entries for account A2"));
        assert!(matches!(view.error(), Some(JournalError::AccountFetch { account_id, .. }) if account_id == "A2"));
    }
}

#[test]
fn refresh_clears_a_recovered_error() {
    struct Flaky {
        calls: Mutex<usize>,
    }
    impl JournalSource for Flaky {
        fn list_journal_entries(&self, _query: &JournalQuery) -> Result<Vec<JournalEntry>, SourceError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == 1 {
                Err(SourceError::Network("connection reset".into()))
            } else {
                Ok(vec![JournalEntry::new("J1")])
            }
        }
    }

    let view = JournalView::new(
        Flaky { calls: Mutex::new(0) },
        Selection::new(vec![AccountRef::new("A1", "Cash")]),
    );
    view.mount();
    assert_eq!(view.state(), ViewState::PartialError);
    assert!(view.entries().is_empty());

    view.refresh();
    assert_eq!(view.state(), ViewState::Success);
    assert_eq!(view.error(), None);
    assert_eq!(entry_ids(&view.entries()), vec!["J1"]);
}

#[test]
fn navigation_saturates_and_survives_refresh() {
    let ids: Vec<String> = (1..=25).map(|n| format!("J{n}")).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let source = StaticSource::new(vec![("A1", Ok(id_refs))]);
    let view = JournalView::new(source, Selection::new(vec![AccountRef::new("A1", "Cash")]));
    view.mount();

    assert_eq!(view.total_pages(), 3);
    view.previous_page();
    assert_eq!(view.page(), 1);

    for _ in 0..5 {
        view.next_page();
    }
    assert_eq!(view.page(), 3);
    assert!(!view.summary().can_next);
    assert_eq!(view.summary().page_label(), "Page 3 of 3");
    assert_eq!(view.rows().len(), 5);

    view.refresh();
    assert_eq!(view.page(), 3);

    view.mount();
    assert_eq!(view.page(), 1);
}

#[test]
fn empty_result_is_a_valid_state() {
    let source = StaticSource::new(vec![("A1", Ok(vec![]))]);
    let view = JournalView::new(source, Selection::new(vec![AccountRef::new("A1", "Cash")]));
    view.mount();

    let summary = view.summary();
    assert_eq!(summary.state, ViewState::Success);
    assert_eq!(summary.total_pages, 0);
    assert_eq!(summary.page, 1);
    assert!(!summary.can_next);
    assert!(view.current_page().items.is_empty());
}

// ---------------------------------------------------------------------------
// Overlapping runs
// ---------------------------------------------------------------------------

/// Blocks the first call until released; later calls answer immediately.
struct GatedSource {
    first: Mutex<Option<(Sender<()>, Receiver<()>)>>,
}

impl JournalSource for GatedSource {
    fn list_journal_entries(&self, _query: &JournalQuery) -> Result<Vec<JournalEntry>, SourceError> {
        let gate = self.first.lock().unwrap().take();
        match gate {
            Some((started, release)) => {
                started.send(()).unwrap();
                release.recv().unwrap();
                Ok(vec![JournalEntry::new("stale")])
            }
            None => Ok(vec![JournalEntry::new("fresh")]),
        }
    }
}

#[test]
fn slower_stale_run_is_discarded() {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let source = GatedSource { first: Mutex::new(Some((started_tx, release_rx))) };
    let view = Arc::new(JournalView::new(source, Selection::new(vec![AccountRef::new("A1", "Cash")])));

    let slow = {
        let view = Arc::clone(&view);
        thread::spawn(move || view.refresh())
    };
    started_rx.recv().unwrap();

    assert_eq!(view.refresh(), RunStatus::Completed { entries: 1, failed_accounts: 0 });
    release_tx.send(()).unwrap();

    assert_eq!(slow.join().unwrap(), RunStatus::Superseded);
    assert_eq!(entry_ids(&view.entries()), vec!["fresh"]);
    assert_eq!(view.state(), ViewState::Success);
}
