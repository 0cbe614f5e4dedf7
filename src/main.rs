// Command-line driver: run one search and print the result bundle as
// JSON. The long-lived deployment embeds the library behind an HTTP
// layer; this binary exists for local runs and diagnostics.

use anyhow::{Context, Result};
use serpcrawl::{SearchConfig, SearchParams, SessionManager};

fn usage() -> ! {
    eprintln!("usage: serpcrawl <query> [lang] [max_pages]");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let mut args = std::env::args().skip(1);
    let Some(query) = args.next() else { usage() };
    let lang = args.next();
    let max_pages = match args.next() {
        Some(raw) => raw
            .parse::<usize>()
            .context("max_pages must be a positive integer")?,
        None => 1,
    };

    let config = SearchConfig::from_env();
    let manager = SessionManager::with_headless(config.headless());

    let mut params = SearchParams::new(query);
    if let Some(lang) = lang {
        params.lang = lang;
    }
    params.max_pages = max_pages;
    params.use_stealth = config.stealth_mode();
    params.use_proxy = config.use_proxies();

    let outcome = serpcrawl::search(&manager, &config, params).await;
    manager.shutdown().await?;

    let outcome = outcome?;
    if outcome.blocked {
        eprintln!("warning: the search engine blocked this request");
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
