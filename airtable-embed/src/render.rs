//! Turning API responses into markup for each display mode.

use handlebars::html_escape;
use log::debug;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::{
    template::{self, Templates},
    Error, Parameters,
};

/// Inline style for an image shown on its own.
pub const IMAGE_STYLE: &str = "max-width: 250px;";

/// Inline style for the image shown alongside a record's fields.
pub const RECORD_IMAGE_STYLE: &str = "float: right; max-width: 350px; margin-left: 10px";

/// The thumbnail size used when none is requested.
pub const DEFAULT_IMAGE_SIZE: &str = "large";

/// Presentation options for a single image.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    pub alt: &'a str,
    pub size: &'a str,
    pub position: &'a str,
    pub style: &'a str,
}

impl<'a> ImageView<'a> {
    pub fn from_params(params: &'a Parameters, style: &'a str) -> Self {
        let size = match params.str("image-size") {
            "" => DEFAULT_IMAGE_SIZE,
            size => size,
        };
        Self {
            alt: params.str("alt-tag"),
            size,
            position: params.str("position"),
            style,
        }
    }

    pub fn with_size(mut self, size: &'a str) -> Self {
        self.size = size;
        self
    }
}

#[derive(Serialize)]
struct ImageData<'a> {
    href: &'a str,
    src: &'a str,
    alt: &'a str,
    style: &'a str,
    position: &'a str,
}

/// Renders an image linking to its full-size version.
///
/// `thumbnails` is the object holding the `small`/`large`/`full` variants of
/// an attachment.
pub fn image(
    templates: &Templates,
    view: &ImageView,
    thumbnails: &JsonValue,
) -> Result<String, Error> {
    let data = ImageData {
        href: thumbnail_url(thumbnails, "full")?,
        src: thumbnail_url(thumbnails, view.size)?,
        alt: view.alt,
        style: view.style,
        position: view.position,
    };
    templates.render(template::IMAGE, &data)
}

fn thumbnail_url<'a>(thumbnails: &'a JsonValue, size: &str) -> Result<&'a str, Error> {
    thumbnails
        .get(size)
        .and_then(|t| t.get("url"))
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::MissingThumbnail(size.to_string()))
}

#[derive(Serialize)]
struct FieldData<'a> {
    name: &'a str,
    value: String,
}

#[derive(Serialize)]
struct RecordData<'a> {
    image: String,
    fields: Vec<FieldData<'a>>,
}

/// Renders the requested fields of a single record, with its first image
/// floated to the right if it has one.
///
/// Fields holding lists or objects (attachments, linked records) are skipped.
pub fn record(
    templates: &Templates,
    params: &Parameters,
    record: &JsonValue,
    thumbnails: Option<&JsonValue>,
) -> Result<String, Error> {
    let mut fields = Vec::new();
    for (name, value) in requested_values(params, record)? {
        if let Some(value) = scalar_text(value) {
            fields.push(FieldData { name, value });
        }
    }
    let image_html = match thumbnails {
        Some(thumbnails) => {
            let view =
                ImageView::from_params(params, RECORD_IMAGE_STYLE).with_size(DEFAULT_IMAGE_SIZE);
            match image(templates, &view, thumbnails) {
                Ok(html) => html,
                Err(Error::MissingThumbnail(size)) => {
                    debug!("Record image has no {} thumbnail, leaving it out", size);
                    String::new()
                }
                Err(e) => return Err(e),
            }
        }
        None => String::new(),
    };
    templates.render(
        template::RECORD,
        &RecordData {
            image: image_html,
            fields,
        },
    )
}

/// Renders the requested fields of a single record as escaped, space
/// separated text.
pub fn text(params: &Parameters, record: &JsonValue) -> Result<String, Error> {
    let parts = requested_values(params, record)?
        .into_iter()
        .filter_map(|(_, value)| scalar_text(value))
        .map(|value| html_escape(&value))
        .collect::<Vec<String>>();
    Ok(parts.join(" ").trim_end().to_string())
}

#[derive(Serialize)]
struct CellImage<'a> {
    href: &'a str,
    src: &'a str,
}

#[derive(Serialize)]
struct Cell<'a> {
    text: String,
    image: Option<CellImage<'a>>,
}

#[derive(Serialize)]
struct TableData<'a> {
    fields: &'a [String],
    rows: Vec<Vec<Cell<'a>>>,
}

/// Renders several records as an HTML table with one column per requested
/// field.
///
/// Records do not need to contain every field, since Airtable leaves empty
/// fields out of its responses. Missing values become empty cells.
pub fn table(
    templates: &Templates,
    params: &Parameters,
    records: &[JsonValue],
) -> Result<String, Error> {
    let fields = params.fields();
    let rows = records
        .iter()
        .map(|record| {
            let values = field_map(record);
            fields
                .iter()
                .map(|name| table_cell(values.and_then(|v| v.get(name))))
                .collect()
        })
        .collect();
    templates.render(template::TABLE, &TableData { fields, rows })
}

fn table_cell(value: Option<&JsonValue>) -> Cell<'_> {
    let empty = Cell {
        text: String::new(),
        image: None,
    };
    let value = match value {
        Some(value) => value,
        None => return empty,
    };
    if let Some(text) = scalar_text(value) {
        return Cell { text, image: None };
    }
    match value {
        JsonValue::Array(items) if items.iter().all(|item| scalar_text(item).is_some()) => Cell {
            text: items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<String>>()
                .join(", "),
            image: None,
        },
        JsonValue::Array(items) => Cell {
            text: String::new(),
            image: items.iter().find_map(attachment_image),
        },
        _ => empty,
    }
}

fn attachment_image(attachment: &JsonValue) -> Option<CellImage<'_>> {
    let src = attachment
        .get("thumbnails")?
        .get("small")?
        .get("url")?
        .as_str()?;
    let href = attachment
        .get("url")
        .and_then(JsonValue::as_str)
        .unwrap_or(src);
    Some(CellImage { href, src })
}

/// Renders the fragment shown in place of an embed that failed.
pub fn error_fragment(err: &Error) -> String {
    format!(
        "<p style='color: red; font-weight: bold;'>Airtable Error: {}</p>",
        html_escape(&err.to_string())
    )
}

fn field_map(record: &JsonValue) -> Option<&Map<String, JsonValue>> {
    record.get("fields").and_then(JsonValue::as_object)
}

// Looks up every requested field, failing on the first one the record does
// not have.
fn requested_values<'a>(
    params: &'a Parameters,
    record: &'a JsonValue,
) -> Result<Vec<(&'a str, &'a JsonValue)>, Error> {
    let values = field_map(record);
    params
        .fields()
        .iter()
        .map(|name| {
            values
                .and_then(|v| v.get(name))
                .map(|value| (name.as_str(), value))
                .ok_or_else(|| Error::InvalidFieldName(name.clone()))
        })
        .collect()
}

fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null => Some(String::new()),
        JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}
