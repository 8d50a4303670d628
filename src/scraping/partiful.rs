use anyhow::Result;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::base;
use super::{RunContext, SourceAdapter};
use crate::dates;
use crate::dedupe::dedupe_by_key;
use crate::models::{resolve_title, Event, Source};
use crate::rules::{self, CityPolicy, Rules, AGE_RESTRICTED_PHRASES};

const URL: &str = "https://partiful.com/discover/sf";
const SOURCE: Source = Source::Partiful;

const RULES: Rules = Rules {
    rejected_phrases: AGE_RESTRICTED_PHRASES,
    city: CityPolicy::Any,
};

// Most to least trustworthy ways of spotting an event card in the rendered
// page; the first pattern that matches anything wins outright.
static CARD_TIERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    vec![
        Selector::parse(r#"[data-testid="event-card"]"#).expect("partiful testid selector"),
        Selector::parse(r#"a[href*="/e/"]"#).expect("partiful event link selector"),
        Selector::parse(r#"[class*="EventCard"], [class*="event-card"]"#)
            .expect("partiful class selector"),
    ]
});

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[data-testid="event-title"], h1, h2, h3, strong"#)
        .expect("partiful title selector")
});
static VENUE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[data-testid="event-venue"]"#).expect("partiful venue selector")
});
static LINE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span, p, div").expect("partiful line selector"));
static EVENT_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/e/"]"#).expect("partiful inner link selector"));

// "@ The Great Northern" style location inside one text line.
static VENUE_AT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\s*([A-Za-z0-9][A-Za-z0-9'&. -]*)").expect("partiful venue regex"));

pub struct Partiful;

impl SourceAdapter for Partiful {
    fn source(&self) -> Source {
        SOURCE
    }

    fn url(&self) -> &'static str {
        URL
    }

    // The discover page is empty markup until client scripts run. No
    // renderer, or a failed render, degrades to an empty contribution.
    fn fetch(&self, ctx: &RunContext<'_>) -> Result<Vec<Event>> {
        let Some(renderer) = ctx.renderer else {
            warn!("partiful: no page renderer available, skipping");
            return Ok(Vec::new());
        };
        match renderer.render(URL) {
            Ok(dom) => Ok(self.parse_dom(&dom, ctx.today)),
            Err(err) => {
                warn!("partiful: render failed, {err}");
                Ok(Vec::new())
            }
        }
    }
}

impl Partiful {
    pub(crate) fn parse_dom(&self, html: &str, today: NaiveDate) -> Vec<Event> {
        let document = Html::parse_document(html);
        let cards = first_matching_tier(&document);
        if cards.is_empty() {
            warn!("partiful: no event cards recognized in rendered page");
            return Vec::new();
        }

        let events: Vec<Event> = cards
            .into_iter()
            .filter_map(|card| parse_card(&card, today))
            .collect();
        dedupe_by_key(events, |event| event.link.clone())
    }
}

fn first_matching_tier<'a>(document: &'a Html) -> Vec<ElementRef<'a>> {
    for selector in CARD_TIERS.iter() {
        let cards: Vec<ElementRef<'a>> = document.select(selector).collect();
        if !cards.is_empty() {
            return cards;
        }
    }
    Vec::new()
}

// Matching within one child element's own text keeps sibling link labels
// from bleeding into the captured name.
fn venue_from_at_line(card: &ElementRef<'_>) -> Option<String> {
    for line in card.select(&LINE_SELECTOR) {
        let line_text = base::inner_text(line);
        if let Some(caps) = VENUE_AT_RE.captures(&line_text) {
            let venue = base::clean_text(caps.get(1).unwrap().as_str());
            if !venue.is_empty() {
                return Some(venue);
            }
        }
    }
    None
}

fn parse_card(card: &ElementRef<'_>, today: NaiveDate) -> Option<Event> {
    let text = base::inner_text(*card);
    if text.is_empty() {
        return None;
    }
    if let Some(phrase) = RULES.rejection(&text) {
        debug!("partiful: card rejected ({phrase}): {text:?}");
        return None;
    }
    let Some(date) = dates::find_date(&text, today) else {
        debug!("partiful: no date in card: {text:?}");
        return None;
    };

    let explicit = base::first_text(card, &TITLE_SELECTOR);
    let venue = base::first_text(card, &VENUE_SELECTOR).or_else(|| venue_from_at_line(card));
    let title = resolve_title(explicit.as_deref(), &[], venue.as_deref())?;

    let href = card
        .value()
        .attr("href")
        .map(str::to_string)
        .or_else(|| base::first_attr(card, &EVENT_LINK_SELECTOR, "href"));

    Some(Event {
        date,
        time: dates::find_time(&text),
        source: SOURCE,
        title,
        venue,
        city: None,
        details: String::new(),
        bands: Vec::new(),
        link: base::absolute_url(URL, href),
        category: rules::categorize(&text),
    })
}
