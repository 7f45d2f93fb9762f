//! Per-display-mode parameter schemas and validation.

use log::trace;

use crate::{
    query::Query,
    DisplayMode, Error,
};

/// How a schema treats one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The parameter must be present and non-empty.
    Required,
    /// The parameter falls back to the given value when missing or empty.
    Default(&'static str),
}

/// The parameters a display mode understands, in the order in which they are
/// checked, together with the closed value sets of some of them.
#[derive(Debug)]
pub struct Schema {
    rules: &'static [(&'static str, Rule)],
    allowed: &'static [(&'static str, &'static [&'static str])],
}

static IMAGE_SCHEMA: Schema = Schema {
    rules: &[
        ("type", Rule::Required),
        ("record-url", Rule::Required),
        ("table", Rule::Required),
        ("record-id", Rule::Required),
        ("alt-tag", Rule::Default("")),
        ("image-size", Rule::Default("large")),
        ("position", Rule::Default("block")),
    ],
    allowed: &[
        ("image-size", &["", "small", "large", "full"]),
        ("position", &["", "left", "centre", "right", "block"]),
    ],
};

static RECORD_SCHEMA: Schema = Schema {
    rules: &[
        ("type", Rule::Required),
        ("record-url", Rule::Required),
        ("table", Rule::Required),
        ("fields", Rule::Required),
        ("record-id", Rule::Required),
        ("alt-tag", Rule::Default("")),
    ],
    allowed: &[],
};

static TEXT_SCHEMA: Schema = Schema {
    rules: &[
        ("type", Rule::Required),
        ("table", Rule::Required),
        ("fields", Rule::Required),
        ("record-id", Rule::Required),
        ("record-url", Rule::Required),
    ],
    allowed: &[],
};

static TABLE_SCHEMA: Schema = Schema {
    rules: &[
        ("type", Rule::Required),
        ("table", Rule::Required),
        ("fields", Rule::Required),
        ("record-url", Rule::Required),
        ("where", Rule::Default("")),
        ("order-by", Rule::Default("")),
        ("order", Rule::Default("asc")),
        ("max-records", Rule::Default("")),
    ],
    allowed: &[("order", &["asc", "desc"])],
};

impl Schema {
    /// The schema that applies to the given display mode.
    pub fn for_mode(mode: DisplayMode) -> &'static Schema {
        match mode {
            DisplayMode::Image => &IMAGE_SCHEMA,
            DisplayMode::Record => &RECORD_SCHEMA,
            DisplayMode::Text => &TEXT_SCHEMA,
            DisplayMode::Table => &TABLE_SCHEMA,
        }
    }

    /// The closed set of values accepted for the given parameter, if it has
    /// one.
    pub fn allowed_values(&self, key: &str) -> Option<&'static [&'static str]> {
        self.allowed
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, values)| *values)
    }

    /// Checks the given query against this schema, producing a fully
    /// populated set of parameters.
    ///
    /// Parameters that the schema does not mention are carried over
    /// unchecked.
    pub fn validate(&self, query: Query) -> Result<Parameters, Error> {
        let mut validated = query;
        for (key, rule) in self.rules {
            let present = validated.get(key).filter(|v| !v.is_empty()).is_some();
            match (rule, present) {
                (_, true) => {}
                (Rule::Required, false) if validated.contains_key(key) => {
                    return Err(Error::MissingParameterValue(key.to_string()))
                }
                (Rule::Required, false) => return Err(Error::MissingParameter(key.to_string())),
                (Rule::Default(default), false) => {
                    trace!("Defaulting parameter {} to \"{}\"", key, default);
                    validated.insert(key, *default);
                }
            }
            if let Some(allowed) = self.allowed_values(key) {
                let value = validated.get_str(key).unwrap_or_default();
                if !allowed.contains(&value) {
                    return Err(Error::InvalidParameterValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        allowed,
                    });
                }
            }
        }
        Ok(Parameters(validated))
    }
}

/// A query that has passed validation against its display mode's schema.
///
/// Every parameter named by the schema is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters(Query);

impl Parameters {
    /// The textual value for the given key, or an empty string if the key is
    /// absent or holds a list.
    pub fn str(&self, key: &str) -> &str {
        self.0.get_str(key).unwrap_or_default()
    }

    /// The requested field names, in order.
    pub fn fields(&self) -> &[String] {
        self.0.fields()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn image_query(extra: &str) -> Query {
        Query::parse(&format!(
            "type: image | record-url: x | table: tblA | record-id: recB{}",
            extra
        ))
        .unwrap()
    }

    #[test]
    fn image_defaults_are_filled_in() {
        let params = Schema::for_mode(DisplayMode::Image)
            .validate(image_query(""))
            .unwrap();
        assert_eq!(params.str("alt-tag"), "");
        assert_eq!(params.str("image-size"), "large");
        assert_eq!(params.str("position"), "block");
    }

    #[test]
    fn empty_value_for_defaulted_key_uses_default() {
        let params = Schema::for_mode(DisplayMode::Image)
            .validate(image_query(r#" | image-size: """#))
            .unwrap();
        assert_eq!(params.str("image-size"), "large");
    }

    #[test]
    fn extra_keys_are_kept_unchecked() {
        let params = Schema::for_mode(DisplayMode::Image)
            .validate(image_query(" | caption: hello"))
            .unwrap();
        assert_eq!(params.str("caption"), "hello");
    }

    #[test]
    fn missing_required_parameter_is_named() {
        let query = Query::parse("type: record | record-url: x | table: tblA | record-id: recB")
            .unwrap();
        let err = Schema::for_mode(DisplayMode::Record)
            .validate(query)
            .unwrap_err();
        match err {
            Error::MissingParameter(key) => assert_eq!(key, "fields"),
            _ => panic!("unexpected error: {:?}", err),
        }
    }

    #[test]
    fn empty_required_parameter_is_reported() {
        let query =
            Query::parse(r#"type: text | record-url: x | table: "" | fields: a | record-id: r"#)
                .unwrap();
        let err = Schema::for_mode(DisplayMode::Text).validate(query).unwrap_err();
        match err {
            Error::MissingParameterValue(key) => assert_eq!(key, "table"),
            _ => panic!("unexpected error: {:?}", err),
        }

        let query =
            Query::parse(r#"type: text | record-url: x | table: t | fields: " , " | record-id: r"#)
                .unwrap();
        let err = Schema::for_mode(DisplayMode::Text).validate(query).unwrap_err();
        assert!(matches!(err, Error::MissingParameterValue(ref key) if key == "fields"));
    }

    #[test]
    fn value_outside_closed_set_is_rejected() {
        let err = Schema::for_mode(DisplayMode::Image)
            .validate(image_query(" | position: middle"))
            .unwrap_err();
        match err {
            Error::InvalidParameterValue {
                key,
                value,
                allowed,
            } => {
                assert_eq!(key, "position");
                assert_eq!(value, "middle");
                assert!(allowed.contains(&"centre"));
            }
            _ => panic!("unexpected error: {:?}", err),
        }

        let query =
            Query::parse("type: table | record-url: x | table: t | fields: a | order: up").unwrap();
        assert!(matches!(
            Schema::for_mode(DisplayMode::Table).validate(query),
            Err(Error::InvalidParameterValue { .. })
        ));
    }

    #[test]
    fn table_defaults() {
        let query = Query::parse("type: table | record-url: x | table: t | fields: a").unwrap();
        let params = Schema::for_mode(DisplayMode::Table).validate(query).unwrap();
        assert_eq!(params.str("order"), "asc");
        assert_eq!(params.str("where"), "");
        assert_eq!(params.str("max-records"), "");
        assert_eq!(params.fields(), &["a"]);
    }
}
