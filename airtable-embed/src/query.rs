//! Tokenization of the query string written between the embed tag markers.
//!
//! A query looks like:
//!
//! ```text
//! type: "record" | record-url: "https://airtable.com/tblX/viwY/recZ" | fields: "Name, Notes"
//! ```

use crate::Error;

/// Separates one `key: value` segment from the next.
pub const PAIR_SEPARATOR: &str = " | ";

/// Separates a key from its value within a segment.
pub const KEY_VALUE_SEPARATOR: &str = ": ";

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    /// An ordered list of names, as produced for the `fields` key.
    List(Vec<String>),
}

impl Param {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(l) => Some(l),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(l) => l.is_empty(),
        }
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// An ordered collection of parameters parsed from a query string.
///
/// Keys are unique. Inserting an existing key replaces its value without
/// changing its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, Param)>);

impl Query {
    /// Splits a raw query string into its key/value pairs.
    ///
    /// Keys are lower-cased and values have their surrounding quotes removed.
    /// The `type` value is lower-cased too, and a `fields` value is split on
    /// commas into a list of trimmed field names.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let mut query = Self::default();
        for segment in raw.trim().split(PAIR_SEPARATOR) {
            let (key, value) = segment
                .split_once(KEY_VALUE_SEPARATOR)
                .ok_or_else(|| Error::MalformedQuery(segment.to_string()))?;
            let key = key.trim().to_lowercase();
            let value = value.trim().trim_matches('"');
            let param = match key.as_str() {
                "type" => Param::Text(value.to_lowercase()),
                "fields" => Param::List(split_fields(value)),
                _ => Param::from(value),
            };
            query.insert(key, param);
        }
        Ok(query)
    }

    /// Sets the value for the given key, returning the previous value if
    /// there was one.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<Param>
    where
        K: AsRef<str>,
        V: Into<Param>,
    {
        let key = key.as_ref();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.0.push((key.to_string(), value));
                None
            }
        }
    }

    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&Param> {
        let key = key.as_ref();
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns the textual value for the given key, if any.
    pub fn get_str<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.get(key).and_then(Param::as_str)
    }

    pub fn contains_key<K: AsRef<str>>(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// The requested field names, in the order they were written.
    pub fn fields(&self) -> &[String] {
        self.get("fields").and_then(Param::as_list).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn split_fields(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quotes_are_stripped_and_keys_lowercased() {
        let query = Query::parse(r#"type: "Image" | Table: "tblX" | record-id: "recY""#).unwrap();
        let pairs = query.iter().collect::<Vec<(&str, &Param)>>();
        assert_eq!(
            pairs,
            vec![
                ("type", &Param::from("image")),
                ("table", &Param::from("tblX")),
                ("record-id", &Param::from("recY")),
            ]
        );
    }

    #[test]
    fn fields_are_split_in_order() {
        let query = Query::parse(r#"type: record | fields: "Name,  Notes ,Photo""#).unwrap();
        assert_eq!(query.fields(), &["Name", "Notes", "Photo"]);
    }

    #[test]
    fn later_duplicates_overwrite_in_place() {
        let query = Query::parse("type: text | table: tblA | fields: x | TABLE: tblB").unwrap();
        assert_eq!(query.len(), 3);
        assert_eq!(query.get_str("table"), Some("tblB"));
        assert_eq!(query.iter().nth(1).map(|(k, _)| k), Some("table"));
    }

    #[test]
    fn value_may_contain_separator_characters() {
        let query =
            Query::parse(r#"type: table | where: "{Status}: 'Done'" | order: desc"#).unwrap();
        assert_eq!(query.get_str("where"), Some("{Status}: 'Done'"));
    }

    #[test]
    fn segment_without_separator_is_malformed() {
        let err = Query::parse("type: image | record-url").unwrap_err();
        match err {
            Error::MalformedQuery(segment) => assert_eq!(segment, "record-url"),
            _ => panic!("unexpected error: {:?}", err),
        }
    }
}
