use anyhow::Result;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::base;
use super::{RunContext, SourceAdapter};
use crate::dates;
use crate::dedupe::dedupe_events;
use crate::fetch;
use crate::models::{resolve_title, Event, Source};
use crate::rules::{self, CityPolicy, Rules, AGE_RESTRICTED_PHRASES};

const URL: &str = "http://www.foopee.com/punk/the-list/by-date.0.html";
const SECOND_PAGE: &str = "http://www.foopee.com/punk/the-list/by-date.1.html";
const SOURCE: Source = Source::Foopee;

// The list covers all of Northern California; only these spellings count as
// in-area. The odd ones ("Berkley", "San Fransisco") appear verbatim in the
// source and have to be honored.
const BAY_AREA_CITIES: &[&str] = &[
    "San Francisco",
    "S.F.",
    "SF",
    "San Fransisco",
    "Berkeley",
    "Berkley",
    "Oakland",
    "Alameda",
    "Albany",
    "Emeryville",
    "Richmond",
    "El Cerrito",
    "Walnut Creek",
    "Concord",
    "Vallejo",
    "Fairfax",
    "San Rafael",
    "Mill Valley",
    "Novato",
    "Petaluma",
    "Santa Rosa",
    "Sebastopol",
    "Napa",
    "Hayward",
    "Fremont",
    "San Leandro",
    "San Jose",
    "Santa Clara",
    "Sunnyvale",
    "Mountain View",
    "Palo Alto",
    "Menlo Park",
    "Redwood City",
    "San Mateo",
    "Burlingame",
    "Pacifica",
    "Half Moon Bay",
    "Santa Cruz",
    "Felton",
];

const RULES: Rules = Rules {
    rejected_phrases: AGE_RESTRICTED_PHRASES,
    city: CityPolicy::Allow(BAY_AREA_CITIES),
};

static ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li").expect("foopee item selector"));
static SUBLIST_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ul").expect("foopee sublist selector"));
static BOLD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("b, strong").expect("foopee header selector"));
static HREF_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("foopee link selector"));
static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title, h1, h2, h3").expect("foopee heading selector"));

// Weekly page heading, "1/19/2026 - 1/25/2026".
static WEEK_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}/\d{1,2}/\d{2,4})\s*-\s*\d{1,2}/\d{1,2}/\d{2,4}")
        .expect("foopee week range regex")
});

pub struct Foopee;

impl SourceAdapter for Foopee {
    fn source(&self) -> Source {
        SOURCE
    }

    fn url(&self) -> &'static str {
        URL
    }

    fn fetch(&self, ctx: &RunContext<'_>) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        let first = fetch::fetch_html(URL)?;
        events.extend(self.parse_document(&first, ctx.today));
        match fetch::fetch_html(SECOND_PAGE) {
            Ok(html) => events.extend(self.parse_document(&html, ctx.today)),
            Err(err) => warn!("foopee: second page unavailable, {err:#}"),
        }
        Ok(dedupe_events(events))
    }
}

impl Foopee {
    // Bold date headers replace the running date as items stream by in
    // document order. An item wrapping its own sublist is a section
    // container, never a show row; only leaves emit, read against the
    // current date or the page's week-range anchor.
    pub(crate) fn parse_document(&self, html: &str, today: NaiveDate) -> Vec<Event> {
        let document = Html::parse_document(html);
        let anchor = week_anchor(&document, today);
        let mut current_date: Option<NaiveDate> = None;
        let mut events = Vec::new();

        for item in document.select(&ITEM_SELECTOR) {
            if let Some(date) = header_date(&item, today) {
                current_date = Some(date);
                continue;
            }
            if item.select(&SUBLIST_SELECTOR).next().is_some() {
                continue;
            }
            let Some(date) = current_date.or(anchor) else {
                debug!("foopee: show item before any date header, dropping");
                continue;
            };
            if let Some(event) = parse_show(&item, date) {
                events.push(event);
            }
        }

        if events.is_empty() {
            warn!("foopee: no shows parsed");
        }
        dedupe_events(events)
    }
}

fn week_anchor(document: &Html, today: NaiveDate) -> Option<NaiveDate> {
    for heading in document.select(&HEADING_SELECTOR) {
        let text = base::inner_text(heading);
        if let Some(caps) = WEEK_RANGE_RE.captures(&text) {
            if let Some(date) = dates::parse_slash_date(caps.get(1).unwrap().as_str(), today) {
                return Some(date);
            }
        }
    }
    None
}

fn header_date(item: &ElementRef<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let bold = item.select(&BOLD_SELECTOR).next()?;
    dates::parse_textual_date(&base::inner_text(bold), today)
}

fn parse_show(item: &ElementRef<'_>, date: NaiveDate) -> Option<Event> {
    let links: Vec<(String, Option<String>)> = item
        .select(&HREF_SELECTOR)
        .map(|a| (base::inner_text(a), a.value().attr("href").map(str::to_string)))
        .collect();
    if links.is_empty() {
        return None;
    }

    let full_text = base::inner_text(*item);
    if let Some(phrase) = RULES.rejection(&full_text) {
        debug!("foopee: show rejected ({phrase}): {full_text:?}");
        return None;
    }

    // First link is "venue, city"; the rest are the lineup.
    let (venue_text, href) = &links[0];
    let (venue, city) = match venue_text.rsplit_once(',') {
        Some((venue, city)) => (base::clean_text(venue), Some(base::clean_text(city))),
        None => (base::clean_text(venue_text), None),
    };
    if !RULES.city_ok(city.as_deref()) {
        debug!("foopee: show outside area ({city:?}): {full_text:?}");
        return None;
    }

    let bands: Vec<String> = links[1..].iter().map(|(text, _)| text.clone()).collect();
    let link_texts: Vec<String> = links.iter().map(|(text, _)| text.clone()).collect();
    let leftover = base::remove_substrings(&full_text, &link_texts);
    let time = dates::find_time(&leftover);
    let details = match &time {
        Some(token) => base::remove_substrings(&leftover, std::slice::from_ref(token)),
        None => leftover,
    };
    let details = details
        .trim_matches(|c: char| c == ',' || c == '.' || c.is_whitespace())
        .to_string();

    let title = resolve_title(None, &bands, Some(&venue))?;
    let category = rules::categorize(&format!("{title} {details}"));

    Some(Event {
        date,
        time,
        source: SOURCE,
        title,
        venue: Some(venue),
        city,
        details,
        bands,
        link: base::absolute_url(URL, href.clone()),
        category,
    })
}
