//! Airtable embeds for wiki pages.
//!
//! Page authors write a compact query inside an embed tag, for example:
//!
//! ```text
//! {{airtable>type: image | record-url: "https://airtable.com/appX/tblY/viwZ/recW" | position: right}}
//! ```
//!
//! At render time the query is validated, the matching records are fetched
//! from the Airtable API and the tag is replaced with the generated markup.
//! See [`Context`] for the entry point. For the command line interface, see
//! the `airtable-embed-cli` crate.

mod config;
mod context;
mod error;
mod mode;
pub mod query;
pub mod record_url;
pub mod render;
pub mod request;
pub mod schema;
pub mod syntax;
mod template;
pub mod thumbnails;
mod transport;

pub use config::{Config, SupportedFormat, DEFAULT_ENDPOINT, DEFAULT_MAX_RECORDS};
pub use context::{Context, PageOutput, RenderOutcome, SUPPORTED_FORMAT};
pub use error::Error;
pub use mode::{DisplayMode, ACCEPTED_TYPES};
pub use query::{Param, Query};
pub use schema::{Parameters, Schema};
pub use template::Templates;
pub use transport::{AirtableClient, Transport};
