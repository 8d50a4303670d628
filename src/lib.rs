pub mod aggregate;
pub mod dates;
pub mod dedupe;
pub mod fetch;
pub mod models;
pub mod rules;
pub mod scraping;

pub use models::{Category, DayGroup, Event, Listing, Source};

use scraping::RunContext;

// Every adapter, then grouping and ordering. Always yields a listing;
// sources that failed have already been logged and skipped.
pub fn collect_listing(ctx: &RunContext<'_>) -> Listing {
    let events = scraping::run_all(ctx);
    aggregate::build_listing(events, ctx.today)
}
