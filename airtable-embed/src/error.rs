use std::path::PathBuf;

use thiserror::Error;

/// The primary error type that can be produced while rendering an embed.
///
/// The `Display` output of each variant is plain text and is shown to page
/// readers as-is (after HTML escaping) inside the error fragment.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed query segment \"{0}\": expected \"key: value\"")]
    MalformedQuery(String),
    #[error("missing type parameter or not enough parameters")]
    MissingTypeParameter,
    #[error("invalid type parameter \"{value}\"; accepted types: {}", .accepted.join(" | "))]
    InvalidTypeParameter {
        value: String,
        accepted: &'static [&'static str],
    },
    #[error("missing record-url parameter")]
    MissingRecordUrl,
    #[error("missing parameter: {0}")]
    MissingParameter(String),
    #[error("missing parameter value for: \"{0}\"")]
    MissingParameterValue(String),
    #[error("invalid parameter value \"{value}\" for key \"{key}\"; possible values: {}", format_allowed(.allowed))]
    InvalidParameterValue {
        key: String,
        value: String,
        allowed: &'static [&'static str],
    },
    #[error("invalid field name: {0}")]
    InvalidFieldName(String),
    #[error("no \"{0}\" image thumbnail found in the record")]
    MissingThumbnail(String),
    #[error("{0}")]
    TransportFailure(String),
    #[error("failed to compile template \"{0}\": {1}")]
    TemplateCompile(String, Box<handlebars::TemplateError>),
    #[error("failed to render template \"{0}\": {1}")]
    TemplateRender(String, handlebars::RenderError),
    #[error("I/O error {0}: {1}")]
    Io(String, std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("cannot determine file type of file: {0}")]
    CannotDetermineFileType(PathBuf),
    #[error("failed to load configuration from {0}")]
    FailedToLoadConfig(PathBuf),
}

// Closed value sets may contain the empty string, which stands for "use the
// default". It is listed separately since it would otherwise be invisible.
fn format_allowed(allowed: &[&str]) -> String {
    let listed = allowed
        .iter()
        .filter(|v| !v.is_empty())
        .copied()
        .collect::<Vec<&str>>()
        .join(" | ");
    if allowed.contains(&"") {
        format!("{} or ''", listed)
    } else {
        listed
    }
}
