use std::{fs, path::PathBuf, process};

use airtable_embed::{Config, Context, RenderOutcome};
use clap::Parser;
use eyre::{Result, WrapErr};

#[derive(Parser, Debug)]
#[clap(name = "airtable-embed", about, version)]
struct Args {
    /// Increase output logging verbosity.
    #[clap(short, long)]
    verbose: bool,

    /// Configuration file (JSON or YAML) holding the base ID and API key.
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Airtable base ID, overriding the configuration file.
    #[clap(long)]
    base_id: Option<String>,

    /// Airtable API key, overriding the configuration file.
    #[clap(long)]
    api_key: Option<String>,

    /// Upper bound on the number of records fetched by table queries.
    #[clap(long)]
    max_records: Option<u32>,

    /// Seconds to wait for each API request.
    #[clap(long)]
    timeout: Option<u64>,

    /// The output format to render for.
    #[clap(long, default_value = "xhtml")]
    format: String,

    /// Render a single embed body (the text between the tag markers).
    #[clap(short, long)]
    query: Option<String>,

    /// Write rendered pages into this directory instead of standard output.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Which page file(s) to render.
    pages: Vec<String>,
}

fn main() {
    let args = Args::parse();
    simple_logger::init_with_level(if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    })
    .unwrap();

    match run(&args) {
        Ok(true) => log::info!("Success!"),
        Ok(false) => {
            log::error!("One or more embeds failed to render");
            process::exit(1);
        }
        Err(e) => {
            log::error!("Failed: {:?}", e);
            process::exit(2);
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(base_id) = &args.base_id {
        config.base_id = base_id.clone();
    }
    if let Some(api_key) = &args.api_key {
        config.api_key = api_key.clone();
    }
    if let Some(max_records) = args.max_records {
        config = config.with_max_records(max_records);
    }
    if let Some(timeout) = args.timeout {
        config = config.with_timeout_secs(timeout);
    }
    Ok(config)
}

// Returns whether everything rendered without errors.
fn run(args: &Args) -> Result<bool> {
    let ctx = Context::new(load_config(args)?)?;

    if let Some(query) = &args.query {
        let outcome = ctx.render(&args.format, query);
        if let Some(markup) = outcome.markup() {
            println!("{}", markup);
        }
        return Ok(!matches!(outcome, RenderOutcome::Failed(_)));
    }

    let patterns = if args.pages.is_empty() {
        vec!["*.txt".to_string(), "pages/**/*.txt".to_string()]
    } else {
        args.pages.clone()
    };
    if let Some(output) = &args.output {
        fs::create_dir_all(output)
            .wrap_err_with(|| format!("failed to create {}", output.display()))?;
    }

    let mut ok = true;
    let mut page_count = 0_u64;
    for pattern in &patterns {
        for entry_result in glob::glob(pattern)? {
            let path = entry_result?;
            if !path.is_file() {
                continue;
            }
            let source = fs::read_to_string(&path)
                .wrap_err_with(|| format!("failed to read page {}", path.display()))?;
            let page = ctx.render_page(&args.format, &source);
            log::info!(
                "{}: {} embed(s) rendered, {} failed",
                path.display(),
                page.rendered,
                page.failed
            );
            ok &= page.failed == 0;
            page_count += 1;
            match (&args.output, path.file_name()) {
                (Some(output), Some(file_name)) => {
                    let target = output.join(file_name).with_extension("html");
                    fs::write(&target, &page.markup)
                        .wrap_err_with(|| format!("failed to write {}", target.display()))?;
                    log::debug!("Wrote {}", target.display());
                }
                _ => print!("{}", page.markup),
            }
        }
    }
    if page_count == 0 {
        log::warn!("No pages matched {:?}", patterns);
    }
    Ok(ok)
}
