//! Merge per-account batches into one list with a single record per id.

use std::collections::HashMap;

use crate::fetch::FetchOutcome;
use crate::model::JournalEntry;

/// Combine successful batches in account order.
///
/// A record id keeps the position of its first appearance; its value (and
/// the account stamp with it) is replaced by every later appearance.
/// Failed accounts contribute nothing.
pub fn merge(outcomes: &[FetchOutcome]) -> Vec<JournalEntry> {
    merge_batches(outcomes.iter().map(FetchOutcome::entries))
}

/// Same as [`merge`], over plain batches.
pub fn merge_batches<'a, I>(batches: I) -> Vec<JournalEntry>
where
    I: IntoIterator<Item = &'a [JournalEntry]>,
{
    let mut merged: Vec<JournalEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut replaced = 0usize;

    for entry in batches.into_iter().flatten() {
        match index.get(&entry.id) {
            Some(&pos) => {
                merged[pos] = entry.clone();
                replaced += 1;
            }
            None => {
                index.insert(entry.id.clone(), merged.len());
                merged.push(entry.clone());
            }
        }
    }

    if replaced > 0 {
        log::debug!("merged {} journal entries ({replaced} duplicates replaced)", merged.len());
    }
    merged
}
