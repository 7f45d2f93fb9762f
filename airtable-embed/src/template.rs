//! Markup templates and template helpers.

use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use serde::Serialize;

use crate::Error;

pub const IMAGE: &str = "image";
pub const RECORD: &str = "record";
pub const TABLE: &str = "table";

const IMAGE_TEMPLATE: &str = r#"
<div>
    <a href="{{href}}" target="_blank" rel="noopener">
        <img alt="{{alt}}" src="{{src}}" style="{{style}}" class="airtable-image{{media_class position}}">
    </a>
</div>"#;

const RECORD_TEMPLATE: &str = r#"<div style="margin-bottom: 50px; clear: both">{{{image}}}{{#each fields}}
    <div>
        <h3>{{name}}</h3>
        <p>{{value}}</p>
    </div>{{/each}}
    <div style="clear: both;"></div>
</div>"#;

const TABLE_TEMPLATE: &str = r#"<table class="airtable-table">
    <thead>
        <tr>{{#each fields}}<th>{{this}}</th>{{/each}}</tr>
    </thead>
    <tbody>{{#each rows}}
        <tr>{{#each this}}<td>{{#if image}}<a href="{{image.href}}" target="_blank" rel="noopener"><img alt="" src="{{image.src}}" class="airtable-image"></a>{{else}}{{text}}{{/if}}</td>{{/each}}</tr>{{/each}}
    </tbody>
</table>"#;

/// The compiled templates used to render each display mode.
pub struct Templates<'reg> {
    hb: Handlebars<'reg>,
}

impl<'reg> Templates<'reg> {
    /// Compiles all of the built-in templates.
    pub fn new() -> Result<Self, Error> {
        let mut hb = Handlebars::new();
        hb.register_helper("media_class", Box::new(media_class));
        for (name, source) in [
            (IMAGE, IMAGE_TEMPLATE),
            (RECORD, RECORD_TEMPLATE),
            (TABLE, TABLE_TEMPLATE),
        ] {
            hb.register_template_string(name, source)
                .map_err(|e| Error::TemplateCompile(name.to_string(), Box::new(e)))?;
        }
        Ok(Self { hb })
    }

    /// Renders the named template with the given data. Values are HTML
    /// escaped unless the template uses triple braces.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, Error> {
        self.hb
            .render(name, data)
            .map_err(|e| Error::TemplateRender(name.to_string(), e))
    }
}

/// Maps an image position onto the wiki's media alignment class.
pub fn position_class(position: &str) -> Option<&'static str> {
    match position {
        "centre" => Some("mediacentre"),
        "right" => Some("mediaright"),
        "left" => Some("medialeft"),
        _ => None,
    }
}

/// Writes the media alignment class for a position, preceded by a space, or
/// nothing if the position has no class.
///
/// Usage:
///
/// ```handlebars
/// <img class="airtable-image{{media_class position}}">
/// ```
pub fn media_class(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let position = h
        .param(0)
        .and_then(|p| p.value().as_str())
        .unwrap_or_default();
    if let Some(class) = position_class(position) {
        out.write(" ")?;
        out.write(class)?;
    }
    Ok(())
}
