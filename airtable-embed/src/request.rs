//! Construction of Airtable API request paths from validated parameters.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::Parameters;

// Everything but the unreserved characters of RFC 3986.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encodes a string for use as a path segment or query component.
pub fn url_encode(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// The request path for fetching a single record.
pub fn record_path(params: &Parameters) -> String {
    format!(
        "{}/{}",
        params.str("table"),
        url_encode(params.str("record-id"))
    )
}

/// The request path (including query string) for listing the records of a
/// table that match the query's filter and ordering.
pub fn table_path(params: &Parameters, max_records_ceiling: u32) -> String {
    let mut path = format!("{}?", params.str("table"));
    let fields = params
        .fields()
        .iter()
        .map(|field| format!("{}={}", url_encode("fields[]"), url_encode(field)))
        .collect::<Vec<String>>()
        .join("&");
    path.push_str(&fields);

    let filter = params.str("where");
    if !filter.is_empty() {
        path.push_str(&format!("&filterByFormula={}", url_encode(filter)));
    }

    path.push_str(&format!(
        "&maxRecords={}",
        effective_max_records(params.str("max-records"), max_records_ceiling)
    ));

    let order_by = params.str("order-by");
    if !order_by.is_empty() {
        path.push_str(&format!(
            "&{}={}",
            url_encode("sort[0][field]"),
            url_encode(order_by)
        ));
    }

    let order = match params.str("order") {
        "" => "asc",
        order => order,
    };
    path.push_str(&format!(
        "&{}={}",
        url_encode("sort[0][direction]"),
        url_encode(order)
    ));
    path
}

/// The number of records to ask for: the requested amount, capped at the
/// ceiling. Missing, zero or non-numeric requests get the ceiling.
pub fn effective_max_records(requested: &str, ceiling: u32) -> u32 {
    match requested.trim().parse::<u32>() {
        Ok(n) if n > 0 => n.min(ceiling),
        _ => ceiling,
    }
}
