use anyhow::Result;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::base;
use super::{RunContext, SourceAdapter};
use crate::dates;
use crate::fetch;
use crate::models::{resolve_title, Event, Source};
use crate::rules::{self, CityPolicy, Rules, AGE_RESTRICTED_PHRASES};

const URL: &str = "https://19hz.info/eventlisting_BayArea.php";
const SOURCE: Source = Source::Nineteenhz;

// The listing covers a wider region than its name suggests; Sacramento rows
// are tagged with an explicit city suffix and get dropped here.
const RULES: Rules = Rules {
    rejected_phrases: AGE_RESTRICTED_PHRASES,
    city: CityPolicy::Deny(&["Sacramento"]),
};

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table tr").expect("nineteenhz row selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("nineteenhz cell selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("nineteenhz link selector"));

// "1/20/2026, 9:00 pm": slash date with the start time right behind it.
static COMBINED_SLASH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2}/\d{1,2}(?:/\d{2,4})?)[,:]?\s+(\d{1,2}(?::\d{2})?\s*[ap]m)")
        .expect("nineteenhz combined slash regex")
});

// "Friday, Jan 23: 10:00 pm" and similar written-out forms.
static COMBINED_TEXTUAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)((?:mon|tue|wed|thu|fri|sat|sun)[a-z]*[,.]?\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*[,.]?\s+\d{1,2})[,:]?\s+(\d{1,2}(?::\d{2})?\s*[ap]m)",
    )
    .expect("nineteenhz combined textual regex")
});

static TRAILING_CITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]+)\)\s*$").expect("nineteenhz trailing city regex"));

pub struct Nineteenhz;

impl SourceAdapter for Nineteenhz {
    fn source(&self) -> Source {
        SOURCE
    }

    fn url(&self) -> &'static str {
        URL
    }

    fn fetch(&self, ctx: &RunContext<'_>) -> Result<Vec<Event>> {
        let html = fetch::fetch_html(URL)?;
        Ok(self.parse_document(&html, ctx.today))
    }
}

impl Nineteenhz {
    pub(crate) fn parse_document(&self, html: &str, today: NaiveDate) -> Vec<Event> {
        let document = Html::parse_document(html);
        let mut events = Vec::new();
        let mut rows = 0usize;

        for row in document.select(&ROW_SELECTOR) {
            rows += 1;
            let cells: Vec<ElementRef<'_>> = row.select(&CELL_SELECTOR).collect();
            if cells.len() < 2 {
                continue;
            }

            let when_text = base::inner_text(cells[0]);
            let Some((date, time)) = parse_when(&when_text, today) else {
                debug!("nineteenhz: unparseable date cell {when_text:?}, dropping row");
                continue;
            };

            let billing = base::inner_text(cells[1]);
            if billing.is_empty() {
                continue;
            }
            let (raw_title, venue, city) = split_billing(&billing);

            let price_age = cells
                .get(3)
                .map(|cell| base::inner_text(*cell))
                .unwrap_or_default();
            if let Some(phrase) = RULES.rejection(&price_age) {
                debug!("nineteenhz: {raw_title:?} rejected ({phrase})");
                continue;
            }
            if !RULES.city_ok(city.as_deref()) {
                debug!("nineteenhz: {raw_title:?} outside area ({city:?})");
                continue;
            }

            let Some(title) = resolve_title(Some(&raw_title), &[], venue.as_deref()) else {
                debug!("nineteenhz: row with empty billing, dropping");
                continue;
            };

            let genres = cells.get(2).map(|cell| base::inner_text(*cell));
            let organizer = cells.get(4).map(|cell| base::inner_text(*cell));
            let details = join_details(&[genres.as_deref(), Some(&price_age), organizer.as_deref()]);
            let link = base::absolute_url(URL, base::first_attr(&row, &LINK_SELECTOR, "href"));
            let category = rules::categorize(&format!("{title} {details}"));

            events.push(Event {
                date,
                time,
                source: SOURCE,
                title,
                venue,
                city,
                details,
                bands: Vec::new(),
                link,
                category,
            });
        }

        if events.is_empty() {
            warn!("nineteenhz: no events parsed ({rows} rows seen)");
        }
        events
    }
}

// Combined date+time grammars first; when neither lines up, a date match
// and a time match are taken independently. No date means no event.
fn parse_when(text: &str, today: NaiveDate) -> Option<(NaiveDate, Option<String>)> {
    if let Some(caps) = COMBINED_SLASH_RE.captures(text) {
        if let Some(date) = dates::parse_slash_date(caps.get(1).unwrap().as_str(), today) {
            return Some((date, Some(caps.get(2).unwrap().as_str().to_string())));
        }
    }
    if let Some(caps) = COMBINED_TEXTUAL_RE.captures(text) {
        if let Some(date) = dates::parse_textual_date(caps.get(1).unwrap().as_str(), today) {
            return Some((date, Some(caps.get(2).unwrap().as_str().to_string())));
        }
    }
    let date = dates::find_date(text, today)?;
    Some((date, dates::find_time(text)))
}

// "Sound Box - Tash @ Make-Out Room (San Francisco)" splits on the last
// " @ " into billing and venue, then peels a trailing parenthesized city.
fn split_billing(text: &str) -> (String, Option<String>, Option<String>) {
    let Some((title, venue_part)) = text.rsplit_once(" @ ") else {
        return (text.trim().to_string(), None, None);
    };
    let venue_part = venue_part.trim();
    match TRAILING_CITY_RE.captures(venue_part) {
        Some(caps) => {
            let city = base::clean_text(caps.get(1).unwrap().as_str());
            let venue = base::clean_text(&venue_part[..caps.get(0).unwrap().start()]);
            (title.trim().to_string(), non_empty(venue), non_empty(city))
        }
        None => (
            title.trim().to_string(),
            non_empty(venue_part.to_string()),
            None,
        ),
    }
}

fn join_details(segments: &[Option<&str>]) -> String {
    segments
        .iter()
        .filter_map(|segment| *segment)
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "—" && *s != "–" && *s != "-")
        .collect::<Vec<_>>()
        .join(" | ")
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
