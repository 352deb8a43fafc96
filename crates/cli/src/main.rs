// ABOUTME: CLI for extracting news articles using the prensa-extract pipeline.
// ABOUTME: Drives a headless browser per URL and prints article records as JSON.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use prensa_extract::{ArticleRecord, Client, Options};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Extract one or more news articles and output JSON.
#[derive(Parser, Debug)]
#[command(name = "prensa-cli")]
#[command(about = "Extract news articles with prensa-extract and print JSON", long_about = None)]
struct Args {
    /// Site identifier the URLs belong to (see --list-sites).
    #[arg(required_unless_present = "list_sites")]
    site: Option<String>,

    /// Article URL(s) to extract.
    #[arg(required_unless_present = "list_sites")]
    urls: Vec<String>,

    /// List supported site identifiers and exit.
    #[arg(long, default_value_t = false)]
    list_sites: bool,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Explicit Chromium executable to launch.
    #[arg(long)]
    browser_path: Option<PathBuf>,

    /// Use the production environment mapping (PRENSA_CHROMIUM_PATH).
    #[arg(long, default_value_t = false)]
    production: bool,

    /// Abort an extraction after this many milliseconds.
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Navigation timeout per page load, in milliseconds.
    #[arg(long)]
    navigation_timeout_ms: Option<u64>,

    /// Write a PNG of the page state here when navigation fails.
    #[arg(long)]
    screenshot_on_failure: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut opts = if args.production {
        Options::for_environment(true)
    } else {
        Options::from_env()
    };
    if let Some(path) = args.browser_path.clone() {
        opts.browser_executable = Some(path);
    }
    if let Some(ms) = args.deadline_ms {
        opts.deadline = Some(Duration::from_millis(ms));
    }
    if let Some(ms) = args.navigation_timeout_ms {
        opts.navigation_timeout = Duration::from_millis(ms);
    }
    opts.failure_screenshot = args.screenshot_on_failure.clone();

    let client = Client::new(opts);

    if args.list_sites {
        for site in client.site_ids() {
            println!("{site}");
        }
        return Ok(());
    }

    let Some(site) = args.site.as_deref() else {
        bail!("a site identifier is required");
    };

    let mut results = Vec::new();

    for url in &args.urls {
        match client.extract(site, url).await {
            Ok(record) => results.push(json!({
                "url": url,
                "ok": true,
                "article": record,
                "error": null
            })),
            Err(err) => results.push(json!({
                "url": url,
                "ok": false,
                "article": ArticleRecord::failed(),
                "error": err.to_string()
            })),
        }
    }

    // Output format:
    // - Single URL and ok => emit the article record alone
    // - Otherwise emit an envelope with the per-URL outcomes and counts
    let output = if args.urls.len() == 1 {
        if let Some(first) = results.first() {
            if first.get("ok").and_then(|v| v.as_bool()) == Some(true) {
                first.get("article").cloned().unwrap_or_else(|| json!({}))
            } else {
                json!({ "articles": results, "total_articles": results.len(), "extracted": 0, "failed": 1 })
            }
        } else {
            json!({})
        }
    } else {
        let extracted = results
            .iter()
            .filter(|r| r.get("ok").and_then(|v| v.as_bool()) == Some(true))
            .count();
        let failed = results.len() - extracted;
        json!({
            "articles": results,
            "total_articles": results.len(),
            "extracted": extracted,
            "failed": failed
        })
    };

    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
