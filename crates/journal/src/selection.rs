//! Selection codec: carries the chosen accounts across the navigation
//! boundary as URL query parameters.
//!
//! Two wire forms are understood:
//!
//! - **Paired** (`selection=`): one field, each account rendered as
//!   `pct(id):pct(name)`, accounts joined by `,`. Both halves are
//!   percent-encoded, so `:` and `,` can only ever be delimiters. This is
//!   the form [`Selection::to_query`] emits.
//! - **Parallel** (`accounts=` + `accountNames=`): two comma-joined lists
//!   correlated by index. Still accepted on the way in; an id with no
//!   name at the same index is dropped.
//!
//! Decoding never fails. Malformed input degrades to a shorter list.

use std::borrow::Cow;

use url::form_urlencoded;

use crate::model::AccountRef;

pub const SELECTION_PARAM: &str = "selection";
pub const ACCOUNTS_PARAM: &str = "accounts";
pub const ACCOUNT_NAMES_PARAM: &str = "accountNames";

const LIST_SEP: char = ',';
const PAIR_SEP: char = ':';

/// The parallel-list wire form: `ids` and `names` correlate by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelLists {
    pub ids: String,
    pub names: String,
}

/// Encode accounts as two index-aligned, comma-joined, percent-encoded lists.
pub fn encode(accounts: &[AccountRef]) -> ParallelLists {
    ParallelLists {
        ids: join_encoded(accounts.iter().map(|a| a.id.as_str())),
        names: join_encoded(accounts.iter().map(|a| a.name.as_str())),
    }
}

fn join_encoded<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(|p| urlencoding::encode(p).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode the parallel-list form. Empty tokens are discarded before
/// pairing, and ids without a name at the same position are dropped.
pub fn decode(ids_param: &str, names_param: &str) -> Vec<AccountRef> {
    let names: Vec<&str> = split_tokens(names_param).collect();

    split_tokens(ids_param)
        .enumerate()
        .filter_map(|(i, id)| {
            let name = names.get(i)?;
            Some(AccountRef::new(percent_decode(id), percent_decode(name)))
        })
        .collect()
}

/// Encode accounts as a single list of `id:name` pairs.
pub fn encode_pairs(accounts: &[AccountRef]) -> String {
    accounts
        .iter()
        .map(|a| format!("{}{PAIR_SEP}{}", urlencoding::encode(&a.id), urlencoding::encode(&a.name)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode the paired form. Tokens without a `:` or with an empty id are
/// dropped; an empty name is kept.
pub fn decode_pairs(param: &str) -> Vec<AccountRef> {
    split_tokens(param)
        .filter_map(|token| {
            let (id, name) = token.split_once(PAIR_SEP)?;
            let id = percent_decode(id);
            if id.is_empty() {
                return None;
            }
            Some(AccountRef::new(id, percent_decode(name)))
        })
        .collect()
}

fn split_tokens(param: &str) -> impl Iterator<Item = &str> {
    param.split(LIST_SEP).filter(|t| !t.is_empty())
}

// Invalid escapes (or escapes that are not UTF-8) keep the raw token.
fn percent_decode(token: &str) -> String {
    match urlencoding::decode(token) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            log::debug!("keeping undecodable selection token {token:?}");
            token.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The ordered set of accounts one journal view works on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    accounts: Vec<AccountRef>,
}

impl Selection {
    pub fn new(accounts: Vec<AccountRef>) -> Self {
        Self { accounts }
    }

    /// Rebuild a selection from a URL query string (leading `?` optional).
    /// `selection` wins over the legacy parallel parameters when present.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut paired: Option<Cow<'_, str>> = None;
        let mut ids: Option<Cow<'_, str>> = None;
        let mut names: Option<Cow<'_, str>> = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                SELECTION_PARAM => paired = Some(value),
                ACCOUNTS_PARAM => ids = Some(value),
                ACCOUNT_NAMES_PARAM => names = Some(value),
                _ => {}
            }
        }

        let accounts = match paired {
            Some(p) => decode_pairs(&p),
            None => decode(ids.as_deref().unwrap_or(""), names.as_deref().unwrap_or("")),
        };
        Self { accounts }
    }

    /// Query string (without `?`) in the paired form.
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair(SELECTION_PARAM, &encode_pairs(&self.accounts))
            .finish()
    }

    pub fn accounts(&self) -> &[AccountRef] {
        &self.accounts
    }

    pub fn ids(&self) -> Vec<String> {
        self.accounts.iter().map(|a| a.id.clone()).collect()
    }

    /// Display name for an account id, if it is part of the selection.
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.accounts.iter().find(|a| a.id == id).map(|a| a.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }
}

impl From<Vec<AccountRef>> for Selection {
    fn from(accounts: Vec<AccountRef>) -> Self {
        Self::new(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cash_and_ar() -> Vec<AccountRef> {
        vec![AccountRef::new("A1", "Cash"), AccountRef::new("A2", "AR")]
    }

    #[test]
    fn parallel_roundtrip() {
        let encoded = encode(&cash_and_ar());
        assert_eq!(encoded.ids, "A1,A2");
        assert_eq!(encoded.names, "Cash,AR");
        assert_eq!(decode(&encoded.ids, &encoded.names), cash_and_ar());
    }

    #[test]
    fn parallel_names_with_delimiters() {
        let accounts = vec![
            AccountRef::new("118", "Accounts Payable, Trade"),
            AccountRef::new("220", "Cash & Equivalents 100%"),
        ];
        let encoded = encode(&accounts);
        assert_eq!(encoded.names, "Accounts%20Payable%2C%20Trade,Cash%20%26%20Equivalents%20100%25");
        assert_eq!(decode(&encoded.ids, &encoded.names), accounts);
    }

    #[test]
    fn parallel_drops_ids_without_names() {
        let decoded = decode("A1,A2,A3", "Cash,AR");
        assert_eq!(decoded, cash_and_ar());
    }

    #[test]
    fn parallel_empty_tokens_shift_alignment() {
        // Empty name tokens are discarded before pairing, so the lists
        // realign by position. This is the known fragility of the form.
        let decoded = decode("A1,,A2", "Cash,,AR");
        assert_eq!(decoded, cash_and_ar());

        let shifted = decode("A1,A2", ",AR");
        assert_eq!(shifted, vec![AccountRef::new("A1", "AR")]);
    }

    #[test]
    fn parallel_empty_and_malformed_input() {
        assert!(decode("", "").is_empty());
        assert!(decode(",,,", "Cash").is_empty());
        assert_eq!(decode("A1", "%E0%A4%A"), vec![AccountRef::new("A1", "%E0%A4%A")]);
    }

    #[test]
    fn pairs_roundtrip_with_awkward_names() {
        let accounts = vec![
            AccountRef::new("A1", "Cash"),
            AccountRef::new("ns:42", "Accrued: Payroll, Taxes"),
            AccountRef::new("A3", ""),
        ];
        let encoded = encode_pairs(&accounts);
        assert_eq!(encoded.matches(',').count(), 2);
        assert_eq!(decode_pairs(&encoded), accounts);
    }

    #[test]
    fn pairs_drop_malformed_tokens() {
        assert_eq!(decode_pairs("A1:Cash,garbage,:NoId,A2:AR"), cash_and_ar());
        assert!(decode_pairs("").is_empty());
    }

    #[test]
    fn query_prefers_paired_form() {
        let selection = Selection::new(cash_and_ar());
        let query = selection.to_query();
        assert!(query.starts_with("selection="));
        assert_eq!(Selection::from_query(&query), selection);
        assert_eq!(Selection::from_query(&format!("?{query}")), selection);

        let mixed = format!("{query}&accounts=X9&accountNames=Other");
        assert_eq!(Selection::from_query(&mixed).accounts(), cash_and_ar().as_slice());
    }

    #[test]
    fn query_falls_back_to_parallel_form() {
        // accountNames values are percent-encoded before being placed in
        // the query string, so the space arrives double-encoded.
        let query = "accounts=A1%2CA2&accountNames=Petty%2520Cash%2CAR";
        let selection = Selection::from_query(query);
        assert_eq!(
            selection.accounts(),
            &[AccountRef::new("A1", "Petty Cash"), AccountRef::new("A2", "AR")]
        );
    }

    #[test]
    fn query_without_selection_is_empty() {
        assert!(Selection::from_query("").is_empty());
        assert!(Selection::from_query("page=2").is_empty());
    }

    #[test]
    fn name_lookup() {
        let selection = Selection::new(cash_and_ar());
        assert_eq!(selection.name_of("A2"), Some("AR"));
        assert_eq!(selection.name_of("A9"), None);
        assert_eq!(selection.ids(), vec!["A1".to_string(), "A2".to_string()]);
        assert_eq!(selection.len(), 2);
    }
}
