//! Record date handling for year/month buckets.

use chrono::{Datelike, NaiveDate};
use tracing::warn;

/// Portuguese month names, indexed 1-12. Index 0 is unused.
pub const MONTH_NAMES: [&str; 13] = [
    "",
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Parse the `YYYY-MM-DD` prefix of a record date.
///
/// Only the first 10 characters are considered, so full timestamps work.
/// A blank date counts as missing; anything else that fails to parse is
/// logged and treated the same way.
pub fn parse_record_date(date: Option<&str>) -> Option<NaiveDate> {
    let date = date.map(str::trim).filter(|d| !d.is_empty())?;
    let prefix = match date.char_indices().nth(10) {
        Some((idx, _)) => &date[..idx],
        None => date,
    };
    match NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Unparseable record date {:?}: {}", date, e);
            None
        }
    }
}

/// Year/month subfolder for a record date, e.g. `2025/12 Dezembro 2025`.
///
/// Returns `None` for a missing or unparseable date; the file then goes
/// straight into the case folder.
pub fn month_subfolder(date: Option<&str>) -> Option<String> {
    let parsed = parse_record_date(date)?;
    let month = parsed.month();
    Some(format!(
        "{year}/{month:02} {name} {year}",
        year = parsed.year(),
        month = month,
        name = MONTH_NAMES[month as usize]
    ))
}
