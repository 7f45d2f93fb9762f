//! Extraction of table, view and record IDs from pasted Airtable URLs.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::{query::Query, request::url_encode, Error};

lazy_static! {
    static ref TABLE_ID: Regex = Regex::new(r"(?i)tbl[[:word:]]+").unwrap();
    static ref VIEW_ID: Regex = Regex::new(r"(?i)viw[[:word:]]+").unwrap();
    static ref RECORD_ID: Regex = Regex::new(r"(?i)rec[[:word:]]+").unwrap();
}

/// The identifiers embedded in a record URL such as
/// `https://airtable.com/appXXX/tblYYY/viwZZZ/recWWW`.
///
/// Each identifier is matched on its own, so they may appear in any order.
/// Identifiers that cannot be found are left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordLocator {
    pub table: String,
    pub view: String,
    pub record_id: String,
}

impl RecordLocator {
    pub fn from_url(url: &str) -> Self {
        let first = |re: &Regex| {
            re.find(url)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };
        Self {
            table: first(&TABLE_ID),
            view: first(&VIEW_ID),
            record_id: first(&RECORD_ID),
        }
    }
}

/// Fills in the `table`, `view` and `record-id` parameters from the query's
/// `record-url`, replacing any values given for them directly.
pub fn decompose(mut query: Query) -> Result<Query, Error> {
    let url = query.get_str("record-url").ok_or(Error::MissingRecordUrl)?;
    let locator = RecordLocator::from_url(url);
    debug!("Decomposed record URL {} into {:?}", url, locator);
    query.insert("table", url_encode(&locator.table));
    query.insert("view", url_encode(&locator.view));
    query.insert("record-id", url_encode(&locator.record_id));
    Ok(query)
}
