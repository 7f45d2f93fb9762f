use std::{fmt, str::FromStr};

use crate::{query::PAIR_SEPARATOR, Error};

/// Every alias accepted for the `type` parameter.
pub const ACCEPTED_TYPES: &[&str] = &[
    "img", "image", "picture", "text", "txt", "table", "tbl", "record",
];

/// The ways in which fetched records can be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// A single image attachment from one record.
    Image,
    /// A block of field names and values from one record.
    Record,
    /// Inline text made up of field values from one record.
    Text,
    /// Several records matched by a table query.
    Table,
}

impl DisplayMode {
    /// Determines the display mode from the type declaration that opens the
    /// raw query string.
    ///
    /// This only looks at the first segment, so it can run before the rest of
    /// the query is tokenized.
    pub fn resolve(raw: &str) -> Result<Self, Error> {
        let declaration = raw
            .trim_start()
            .split_once(PAIR_SEPARATOR)
            .map(|(first, _)| first)
            .unwrap_or_default();
        if declaration.trim().is_empty() {
            return Err(Error::MissingTypeParameter);
        }
        let declaration = declaration.to_lowercase();
        let alias = declaration
            .split_once("type: ")
            .map(|(_, alias)| alias.replace('"', ""))
            .unwrap_or_default();
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(Error::MissingTypeParameter);
        }
        alias.parse()
    }
}

impl FromStr for DisplayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "img" | "image" | "picture" => Self::Image,
            "text" | "txt" => Self::Text,
            "table" | "tbl" => Self::Table,
            "record" => Self::Record,
            other => {
                return Err(Error::InvalidTypeParameter {
                    value: other.to_string(),
                    accepted: ACCEPTED_TYPES,
                })
            }
        })
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Image => "image",
                Self::Record => "record",
                Self::Text => "text",
                Self::Table => "table",
            }
        )
    }
}
