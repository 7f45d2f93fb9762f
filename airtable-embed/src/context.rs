use log::{debug, warn};
use serde_json::Value as JsonValue;

use crate::{
    record_url, render,
    render::{ImageView, IMAGE_STYLE},
    request,
    schema::Schema,
    syntax, thumbnails, AirtableClient, Config, DisplayMode, Error, Query, Templates, Transport,
};

/// The only output format embeds are rendered for.
pub const SUPPORTED_FORMAT: &str = "xhtml";

/// The result of rendering a single embed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Nothing was rendered, either because the output format is not
    /// supported or because the tag was empty.
    NotApplicable,
    /// The embed rendered successfully.
    Rendered(String),
    /// The embed failed. The markup is an error message for the page reader.
    Failed(String),
}

impl RenderOutcome {
    /// Whether this counts as a completed render.
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }

    /// The markup to place in the page, if any.
    pub fn markup(&self) -> Option<&str> {
        match self {
            Self::NotApplicable => None,
            Self::Rendered(m) | Self::Failed(m) => Some(m),
        }
    }
}

/// The result of rendering all of the embed tags in a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutput {
    /// The page source with every tag replaced by its markup.
    pub markup: String,
    pub rendered: usize,
    pub failed: usize,
}

/// Execution context for rendering embeds.
///
/// Holds the read-only configuration, the transport used to reach the API and
/// the compiled templates. Each call to [`Context::render`] is independent of
/// every other.
pub struct Context<'a> {
    config: Config,
    transport: Box<dyn Transport + 'a>,
    templates: Templates<'a>,
}

impl<'a> Context<'a> {
    /// Constructor. Requests go to the Airtable API described by the given
    /// configuration.
    pub fn new(config: Config) -> Result<Self, Error> {
        let transport = AirtableClient::new(&config)?;
        Self::with_transport(config, transport)
    }

    /// Constructor allowing for a custom transport.
    pub fn with_transport<T>(config: Config, transport: T) -> Result<Self, Error>
    where
        T: Transport + 'a,
    {
        debug!("Creating render context with {:?}", config);
        Ok(Self {
            config,
            transport: Box::new(transport),
            templates: Templates::new()?,
        })
    }

    /// Renders the body of a single embed tag for the given output format.
    ///
    /// Failures never escape: they are turned into an error fragment.
    pub fn render(&self, format: &str, body: &str) -> RenderOutcome {
        if format != SUPPORTED_FORMAT || body.trim().is_empty() {
            return RenderOutcome::NotApplicable;
        }
        match self.render_body(body) {
            Ok(markup) => RenderOutcome::Rendered(markup),
            Err(e) => {
                warn!("Failed to render embed \"{}\": {}", body, e);
                RenderOutcome::Failed(render::error_fragment(&e))
            }
        }
    }

    /// Runs the full pipeline for one embed body: mode resolution,
    /// validation, the API request and rendering.
    pub fn render_body(&self, body: &str) -> Result<String, Error> {
        let mode = DisplayMode::resolve(body)?;
        debug!("Rendering {} embed", mode);
        let query = record_url::decompose(Query::parse(body)?)?;
        let params = Schema::for_mode(mode).validate(query)?;
        match mode {
            DisplayMode::Image => {
                let response = self.fetch(&request::record_path(&params))?;
                let view = ImageView::from_params(&params, IMAGE_STYLE);
                let thumbnails = thumbnails::find(&response)
                    .ok_or_else(|| Error::MissingThumbnail(view.size.to_string()))?;
                render::image(&self.templates, &view, thumbnails)
            }
            DisplayMode::Record => {
                let response = self.fetch(&request::record_path(&params))?;
                render::record(
                    &self.templates,
                    &params,
                    &response,
                    thumbnails::find(&response),
                )
            }
            DisplayMode::Text => {
                let response = self.fetch(&request::record_path(&params))?;
                render::text(&params, &response)
            }
            DisplayMode::Table => {
                let path = request::table_path(&params, self.config.max_records);
                let response = self.fetch(&path)?;
                let records = response
                    .get("records")
                    .and_then(JsonValue::as_array)
                    .ok_or_else(|| {
                        Error::TransportFailure("API response has no records list".to_string())
                    })?;
                debug!("Table query matched {} record(s)", records.len());
                match records.as_slice() {
                    // A single match is shown the same way as a record query.
                    [single] => render::record(
                        &self.templates,
                        &params,
                        single,
                        thumbnails::find(&response),
                    ),
                    _ => render::table(&self.templates, &params, records),
                }
            }
        }
    }

    /// Replaces every embed tag in the given page source with its rendered
    /// markup.
    pub fn render_page(&self, format: &str, source: &str) -> PageOutput {
        let mut markup = String::with_capacity(source.len());
        let mut rendered = 0;
        let mut failed = 0;
        let mut last = 0;
        for tag in syntax::tags(source) {
            markup.push_str(&source[last..tag.start]);
            let outcome = self.render(format, tag.body);
            match &outcome {
                RenderOutcome::Rendered(_) => rendered += 1,
                RenderOutcome::Failed(_) => failed += 1,
                RenderOutcome::NotApplicable => {}
            }
            markup.push_str(outcome.markup().unwrap_or_default());
            last = tag.end;
        }
        markup.push_str(&source[last..]);
        PageOutput {
            markup,
            rendered,
            failed,
        }
    }

    fn fetch(&self, path: &str) -> Result<JsonValue, Error> {
        debug!("Requesting {}", path);
        self.transport.get(path)
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use serde_json::json;

    const RECORD_URL: &str = "https://airtable.com/appBase/tblMachines/viwAll/recMarble";

    #[derive(Clone)]
    struct FakeTransport {
        response: Result<JsonValue, String>,
        requests: Rc<RefCell<Vec<String>>>,
    }

    impl FakeTransport {
        fn returning(response: JsonValue) -> Self {
            Self {
                response: Ok(response),
                requests: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                requests: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, path: &str) -> Result<JsonValue, Error> {
            self.requests.borrow_mut().push(path.to_string());
            self.response.clone().map_err(Error::TransportFailure)
        }
    }

    fn marble_machine() -> JsonValue {
        json!({
            "id": "recMarble",
            "createdTime": "2021-03-01T10:00:00.000Z",
            "fields": {
                "Name": "Marble Machine X",
                "Builder": "Martin",
                "Photo": [{
                    "id": "attPhoto",
                    "url": "https://dl.example.com/full.jpg",
                    "thumbnails": {
                        "small": {"url": "https://dl.example.com/small.jpg"},
                        "large": {"url": "https://dl.example.com/large.jpg"},
                        "full": {"url": "https://dl.example.com/full.jpg"},
                    },
                }],
            },
        })
    }

    fn context(transport: &FakeTransport) -> Context<'static> {
        Context::with_transport(Config::new("appBase", "key"), transport.clone()).unwrap()
    }

    #[test]
    fn image_embed() {
        let transport = FakeTransport::returning(marble_machine());
        let outcome = context(&transport).render(
            "xhtml",
            &format!(
                r#"type: "Picture" | record-url: "{}" | position: centre | alt-tag: "Marble machine""#,
                RECORD_URL
            ),
        );
        assert_eq!(transport.requests(), vec!["tblMachines/recMarble"]);
        assert!(outcome.is_rendered());
        let html = outcome.markup().unwrap();
        assert_eq!(html.matches("<a ").count(), 1);
        assert_eq!(html.matches("<img ").count(), 1);
        assert!(html.contains(r#"class="airtable-image mediacentre""#));
        assert!(html.contains(r#"src="https://dl.example.com/large.jpg""#));
    }

    #[test]
    fn image_embed_without_attachment_fails() {
        let transport = FakeTransport::returning(json!({"id": "recA", "fields": {"Name": "x"}}));
        let outcome = context(&transport).render(
            "xhtml",
            &format!("type: image | record-url: {}", RECORD_URL),
        );
        match outcome {
            RenderOutcome::Failed(html) => assert!(html.contains("image thumbnail")),
            _ => panic!("unexpected outcome: {:?}", outcome),
        }
    }

    #[test]
    fn missing_parameter_fails_before_any_request() {
        let transport = FakeTransport::returning(marble_machine());
        let outcome = context(&transport).render(
            "xhtml",
            &format!("type: record | record-url: {}", RECORD_URL),
        );
        assert_eq!(
            outcome,
            RenderOutcome::Failed(
                "<p style='color: red; font-weight: bold;'>Airtable Error: missing parameter: fields</p>"
                    .to_string()
            )
        );
        assert!(transport.requests().is_empty());

        let err = context(&transport)
            .render_body(&format!("type: text | record-url: {}", RECORD_URL))
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter(ref key) if key == "fields"));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn unknown_field_produces_no_partial_markup() {
        let transport = FakeTransport::returning(marble_machine());
        let outcome = context(&transport).render(
            "xhtml",
            &format!("type: record | record-url: {} | fields: Name, Colour", RECORD_URL),
        );
        match outcome {
            RenderOutcome::Failed(html) => {
                assert!(html.contains("invalid field name: Colour"));
                assert!(!html.contains("<h3>"));
            }
            _ => panic!("unexpected outcome: {:?}", outcome),
        }
    }

    #[test]
    fn text_embed() {
        let transport = FakeTransport::returning(marble_machine());
        let outcome = context(&transport).render(
            "xhtml",
            &format!("type: txt | record-url: {} | fields: Name, Builder", RECORD_URL),
        );
        assert_eq!(
            outcome,
            RenderOutcome::Rendered("Marble Machine X Martin".to_string())
        );
    }

    #[test]
    fn single_table_match_renders_like_record() {
        let record_transport = FakeTransport::returning(marble_machine());
        let record_html = context(&record_transport)
            .render_body(&format!(
                "type: record | record-url: {} | fields: Name, Builder",
                RECORD_URL
            ))
            .unwrap();

        let table_transport = FakeTransport::returning(json!({ "records": [marble_machine()] }));
        let table_html = context(&table_transport)
            .render_body(&format!(
                "type: table | record-url: {} | fields: Name, Builder | where: \"{{Builder}} = 'Martin'\"",
                RECORD_URL
            ))
            .unwrap();

        assert_eq!(record_html, table_html);
        assert!(record_html.contains("large.jpg"));
        assert!(table_transport.requests()[0].contains("filterByFormula="));
    }

    #[test]
    fn multiple_table_matches_render_a_table() {
        let mut second = marble_machine();
        second["fields"]["Name"] = json!("Modulin");
        let transport = FakeTransport::returning(json!({ "records": [marble_machine(), second] }));
        let html = context(&transport)
            .render_body(&format!(
                "type: tbl | record-url: {} | fields: Name | order-by: Name | order: desc",
                RECORD_URL
            ))
            .unwrap();
        assert!(html.starts_with("<table"));
        assert!(html.contains("<td>Marble Machine X</td>"));
        assert!(html.contains("<td>Modulin</td>"));
    }

    #[test]
    fn empty_table_result_renders_header_only() {
        let transport = FakeTransport::returning(json!({ "records": [] }));
        let outcome = context(&transport).render(
            "xhtml",
            &format!("type: table | record-url: {} | fields: Name", RECORD_URL),
        );
        assert!(outcome.is_rendered());
        let html = outcome.markup().unwrap();
        assert!(html.contains("<th>Name</th>"));
        assert!(!html.contains("<td>"));
    }

    #[test]
    fn table_response_without_records_fails() {
        for response in [json!({"unexpected": true}), json!({"records": "none"})] {
            let transport = FakeTransport::returning(response);
            let ctx = context(&transport);
            let body = format!("type: table | record-url: {} | fields: Name", RECORD_URL);
            let err = ctx.render_body(&body).unwrap_err();
            assert!(matches!(err, Error::TransportFailure(_)));
            match ctx.render("xhtml", &body) {
                RenderOutcome::Failed(html) => assert!(!html.contains("<table")),
                outcome => panic!("unexpected outcome: {:?}", outcome),
            }
        }
    }

    #[test]
    fn table_request_respects_configured_ceiling() {
        let transport = FakeTransport::returning(json!({ "records": [] }));
        let ctx = Context::with_transport(
            Config::new("appBase", "key").with_max_records(20),
            transport.clone(),
        )
        .unwrap();
        for (requested, expected) in [("500", "20"), ("5", "5"), ("many", "20")] {
            let _ = ctx.render_body(&format!(
                "type: table | record-url: {} | fields: Name | max-records: {}",
                RECORD_URL, requested
            ));
            let last = transport.requests().pop().unwrap();
            assert!(
                last.contains(&format!("&maxRecords={}&", expected)),
                "unexpected request {}",
                last
            );
        }
    }

    #[test]
    fn transport_failure_is_reported() {
        let transport = FakeTransport::failing("Could not find table tblMachines");
        let outcome = context(&transport).render(
            "xhtml",
            &format!("type: text | record-url: {} | fields: Name", RECORD_URL),
        );
        assert!(!outcome.is_rendered());
        assert!(outcome
            .markup()
            .unwrap()
            .contains("Could not find table tblMachines"));
    }

    #[test]
    fn unsupported_format_or_empty_body_is_not_applicable() {
        let transport = FakeTransport::returning(marble_machine());
        let ctx = context(&transport);
        let body = format!("type: text | record-url: {} | fields: Name", RECORD_URL);
        assert_eq!(ctx.render("metadata", &body), RenderOutcome::NotApplicable);
        assert_eq!(ctx.render("xhtml", "  "), RenderOutcome::NotApplicable);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn page_tags_are_replaced() {
        let transport = FakeTransport::returning(marble_machine());
        let page = format!(
            "Built by {{{{airtable>type: text | record-url: {} | fields: Builder}}}}.\n\
             {{{{airtable>type: chart | record-url: x}}}}\n",
            RECORD_URL
        );
        let output = context(&transport).render_page("xhtml", &page);
        assert_eq!(output.rendered, 1);
        assert_eq!(output.failed, 1);
        assert!(output.markup.starts_with("Built by Martin.\n<p style="));
        assert!(output.markup.contains("invalid type parameter"));
        assert!(!output.markup.contains("{{airtable>"));
    }

    #[test]
    fn page_tags_are_dropped_for_other_formats() {
        let transport = FakeTransport::returning(marble_machine());
        let page = format!(
            "Built by {{{{airtable>type: text | record-url: {} | fields: Builder}}}}.",
            RECORD_URL
        );
        let output = context(&transport).render_page("metadata", &page);
        assert_eq!(output.markup, "Built by .");
        assert_eq!(output.rendered, 0);
        assert_eq!(output.failed, 0);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn unterminated_page_tag_is_kept() {
        let transport = FakeTransport::returning(marble_machine());
        let page = format!(
            "Built by {{{{airtable>type: text | record-url: {} | fields: Builder}}}}. \
             Then {{{{airtable>type: text | record-url: x",
            RECORD_URL
        );
        let output = context(&transport).render_page("xhtml", &page);
        assert_eq!(output.rendered, 1);
        assert_eq!(output.failed, 0);
        assert_eq!(
            output.markup,
            "Built by Martin. Then {{airtable>type: text | record-url: x"
        );
        assert_eq!(transport.requests().len(), 1);
    }
}
