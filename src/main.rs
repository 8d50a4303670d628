use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bayshows::fetch::{CommandRenderer, PageRenderer, SnapshotRenderer};
use bayshows::scraping::{self, RunContext};
use bayshows::{aggregate, collect_listing, dates};

#[derive(Parser)]
#[command(name = "bayshows")]
#[command(about = "Bay Area show listing aggregator")]
#[command(version = "0.1.0")]
struct Cli {
    /// Run a single source instead of all of them
    #[arg(long)]
    source: Option<String>,

    /// Override the Pacific "today" used for past/future filtering (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Where to write the aggregated listing JSON ("-" for stdout)
    #[arg(long, default_value = "-")]
    out: String,

    /// Saved DOM snapshot to parse instead of rendering live pages
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// External command that renders a URL and prints the settled DOM
    #[arg(long)]
    render_cmd: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("bayshows=info".parse().expect("valid log directive")),
        )
        .init();

    let cli = Cli::parse();
    let today = cli.today.unwrap_or_else(dates::today_pacific);
    info!("run starting, today={today}");

    let snapshot = cli.snapshot.map(SnapshotRenderer::new);
    let command = match (&snapshot, &cli.render_cmd) {
        (None, Some(spec)) => CommandRenderer::from_spec(spec),
        _ => None,
    };
    let renderer: Option<&dyn PageRenderer> = match (&snapshot, &command) {
        (Some(r), _) => Some(r),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    };

    let ctx = RunContext { today, renderer };
    let listing = match &cli.source {
        Some(name) => {
            let events = scraping::run_single(name, &ctx)
                .with_context(|| format!("source {name} failed"))?;
            aggregate::build_listing(events, today)
        }
        None => collect_listing(&ctx),
    };
    info!(
        "listing spans {} days with {} events",
        listing.days.len(),
        listing.event_count()
    );

    let json = serde_json::to_string_pretty(&listing).context("unable to serialize listing")?;
    if cli.out == "-" {
        println!("{json}");
    } else {
        fs::write(&cli.out, json).with_context(|| format!("unable to write {}", cli.out))?;
        info!("wrote {}", cli.out);
    }
    Ok(())
}
