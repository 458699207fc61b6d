//! Journal-entry aggregation engine.
//!
//! Pure engine crate: takes a set of selected ledger accounts and a
//! [`JournalSource`], fetches one batch per account, merges the batches
//! into one id-unique collection and serves it page by page.
//! No HTTP or filesystem dependencies; the connector crate plugs the
//! external action API in behind [`JournalSource`].

pub mod dates;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod model;
pub mod paginate;
pub mod selection;
pub mod view;

pub use dates::{format_for_display, format_for_query, DateFilter};
pub use error::{JournalError, SourceError};
pub use fetch::{fetch_entries, FetchMode, FetchOutcome, JournalQuery, JournalSource};
pub use merge::merge;
pub use model::{AccountRef, DateRange, JournalEntry, JournalFields};
pub use paginate::{paginate, PageView, Pager};
pub use selection::Selection;
pub use view::{JournalRow, JournalView, RunStatus, ViewState, ViewSummary};
