pub mod base;
pub mod edmtrain;
pub mod foopee;
pub mod nineteenhz;
pub mod partiful;
pub mod poshvip;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::fetch::PageRenderer;
use crate::models::{Event, Source};

// One run shares a single "today" for every date comparison, plus the
// optional renderer for sources that only exist after client scripts run.
pub struct RunContext<'a> {
    pub today: NaiveDate,
    pub renderer: Option<&'a dyn PageRenderer>,
}

impl<'a> RunContext<'a> {
    pub fn new(today: NaiveDate) -> Self {
        RunContext {
            today,
            renderer: None,
        }
    }

    pub fn with_renderer(today: NaiveDate, renderer: &'a dyn PageRenderer) -> Self {
        RunContext {
            today,
            renderer: Some(renderer),
        }
    }
}

pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;
    fn url(&self) -> &'static str;
    fn fetch(&self, ctx: &RunContext<'_>) -> anyhow::Result<Vec<Event>>;
}

fn active_adapters() -> Vec<Box<dyn SourceAdapter>> {
    vec![
        Box::new(nineteenhz::Nineteenhz),
        Box::new(foopee::Foopee),
        Box::new(poshvip::Poshvip),
        Box::new(edmtrain::Edmtrain),
        Box::new(partiful::Partiful),
    ]
}

pub fn source_names() -> Vec<&'static str> {
    active_adapters()
        .into_iter()
        .map(|adapter| adapter.source().as_str())
        .collect()
}

fn find_adapter(name: &str) -> Option<Box<dyn SourceAdapter>> {
    active_adapters()
        .into_iter()
        .find(|adapter| adapter.source().as_str() == name)
}

// A source that fails costs only its own events; an empty return is a
// valid result ("no events"), never an error.
pub fn run_all(ctx: &RunContext<'_>) -> Vec<Event> {
    let mut events = Vec::new();
    for adapter in active_adapters() {
        let source = adapter.source();
        debug!("{source}: fetching {}", adapter.url());
        match adapter.fetch(ctx) {
            Ok(mut scraped) => {
                info!("{source}: collected {} events", scraped.len());
                events.append(&mut scraped);
            }
            Err(err) => {
                warn!("{source}: skipped, {err:#}");
            }
        }
    }
    events
}

pub fn run_single(name: &str, ctx: &RunContext<'_>) -> anyhow::Result<Vec<Event>> {
    let adapter = find_adapter(name).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown source: {name} (available: {})",
            source_names().join(", ")
        )
    })?;
    adapter.fetch(ctx)
}
