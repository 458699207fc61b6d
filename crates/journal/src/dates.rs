//! Date handling at the two edges of the engine: outbound request
//! boundaries (`M/D/YYYY`) and inbound record fields, which arrive as a
//! mix of ISO-8601 and locale-formatted strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::model::DateRange;

/// Rendered for dates that are missing or cannot be parsed.
pub const PLACEHOLDER: &str = "-";

const US_DATE: &str = "%-m/%-d/%Y";

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

const LOOSE_DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
];

const LOOSE_DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%a %b %d %Y",
];

/// Render a request boundary the way the journal action expects it.
pub fn format_for_query(date: NaiveDate) -> String {
    date.format(US_DATE).to_string()
}

/// Render a record date for display. Never fails: anything that does not
/// parse comes back as [`PLACEHOLDER`].
pub fn format_for_display(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return PLACEHOLDER.to_string();
    };

    match parse_iso(raw).or_else(|| parse_loose(raw)) {
        Some(date) => date.format(US_DATE).to_string(),
        None => {
            log::debug!("unparseable record date {raw:?}");
            PLACEHOLDER.to_string()
        }
    }
}

/// Strict ISO-8601: calendar date, optionally with time and offset.
/// Offset-qualified timestamps keep the calendar date of their own offset.
pub fn parse_iso(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.date_naive());
    }
    for fmt in ISO_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Fallback for the locale-formatted strings the accounting system uses
/// in some fields (`3/5/2024 10:15 am`, `05-Mar-2024`, RFC 2822, ...).
pub fn parse_loose(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }
    for fmt in LOOSE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    LOOSE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Parse a date-picker value (`YYYY-MM-DD`).
pub fn parse_input_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

// ---------------------------------------------------------------------------
// Filter inputs
// ---------------------------------------------------------------------------

/// The "from"/"to" inputs with their enable toggles.
///
/// Turning a toggle off clears its value, so re-enabling starts empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFilter {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    use_from: bool,
    use_to: bool,
}

impl DateFilter {
    pub fn set_use_from(&mut self, enabled: bool) {
        self.use_from = enabled;
        if !enabled {
            self.from = None;
        }
    }

    pub fn set_use_to(&mut self, enabled: bool) {
        self.use_to = enabled;
        if !enabled {
            self.to = None;
        }
    }

    pub fn set_from(&mut self, date: Option<NaiveDate>) {
        self.from = date;
    }

    pub fn set_to(&mut self, date: Option<NaiveDate>) {
        self.to = date;
    }

    pub fn use_from(&self) -> bool {
        self.use_from
    }

    pub fn use_to(&self) -> bool {
        self.use_to
    }

    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    /// The range a fetch cycle actually sends: a boundary counts only when
    /// its toggle is on and a value is present.
    pub fn effective_range(&self) -> DateRange {
        DateRange {
            from: self.from.filter(|_| self.use_from),
            to: self.to.filter(|_| self.use_to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn query_format_has_no_leading_zeros() {
        assert_eq!(format_for_query(d(2024, 3, 5)), "3/5/2024");
        assert_eq!(format_for_query(d(2024, 12, 31)), "12/31/2024");
    }

    #[test]
    fn display_iso_and_locale_agree() {
        let iso = format_for_display(Some("2024-03-05"));
        let iso_ts = format_for_display(Some("2024-03-05T10:15:00Z"));
        let local = format_for_display(Some("3/5/2024"));
        let local_ts = format_for_display(Some("3/5/2024 10:15 am"));
        assert_eq!(iso, "3/5/2024");
        assert_eq!(iso, iso_ts);
        assert_eq!(iso, local);
        assert_eq!(iso, local_ts);
    }

    #[test]
    fn display_keeps_offset_calendar_date() {
        assert_eq!(format_for_display(Some("2024-03-05T23:30:00-08:00")), "3/5/2024");
        assert_eq!(format_for_display(Some("2024-03-05T23:30:00.123+0100")), "3/5/2024");
    }

    #[test]
    fn display_other_locale_shapes() {
        assert_eq!(format_for_display(Some("05-Mar-2024")), "3/5/2024");
        assert_eq!(format_for_display(Some("March 5, 2024")), "3/5/2024");
        assert_eq!(format_for_display(Some("Tue, 5 Mar 2024 10:15:00 +0000")), "3/5/2024");
    }

    #[test]
    fn display_placeholder_for_garbage() {
        assert_eq!(format_for_display(None), "-");
        assert_eq!(format_for_display(Some("")), "-");
        assert_eq!(format_for_display(Some("   ")), "-");
        assert_eq!(format_for_display(Some("not a date")), "-");
        assert_eq!(format_for_display(Some("2024-13-45")), "-");
    }

    #[test]
    fn input_date_parse() {
        assert_eq!(parse_input_date("2024-01-31"), Some(d(2024, 1, 31)));
        assert_eq!(parse_input_date("01/31/2024"), None);
    }

    #[test]
    fn filter_toggles() {
        let mut filter = DateFilter::default();
        filter.set_from(Some(d(2024, 1, 1)));
        filter.set_to(Some(d(2024, 1, 31)));
        // Values without toggles are not sent.
        assert_eq!(filter.effective_range(), DateRange::unbounded());

        filter.set_use_from(true);
        filter.set_from(Some(d(2024, 1, 1)));
        assert_eq!(filter.effective_range(), DateRange::new(Some(d(2024, 1, 1)), None));

        filter.set_use_to(true);
        filter.set_to(Some(d(2024, 1, 31)));
        assert_eq!(
            filter.effective_range(),
            DateRange::new(Some(d(2024, 1, 1)), Some(d(2024, 1, 31)))
        );

        filter.set_use_from(false);
        assert_eq!(filter.from(), None);
        filter.set_use_from(true);
        assert_eq!(filter.effective_range(), DateRange::new(None, Some(d(2024, 1, 31))));
    }
}
