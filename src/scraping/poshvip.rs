use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use chrono_tz::America::Los_Angeles;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};

use super::base;
use super::{RunContext, SourceAdapter};
use crate::dedupe::dedupe_by_key;
use crate::fetch;
use crate::models::{resolve_title, Event, Source};
use crate::rules::{self, CityPolicy, Rules, AGE_RESTRICTED_PHRASES};

const URL: &str = "https://www.poshvip.com/sf/events";
const BASE: &str = "https://www.poshvip.com";
const SOURCE: Source = Source::Poshvip;
const EXCERPT_LEN: usize = 140;

const RULES: Rules = Rules {
    rejected_phrases: AGE_RESTRICTED_PHRASES,
    city: CityPolicy::Any,
};

static NEXT_DATA_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script#__NEXT_DATA__").expect("poshvip script selector"));

pub struct Poshvip;

impl SourceAdapter for Poshvip {
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

impl Poshvip {
    pub(crate) fn parse_document(&self, html: &str, today: NaiveDate) -> Vec<Event> {
        let document = Html::parse_document(html);
        let Some(script) = document.select(&NEXT_DATA_SELECTOR).next() else {
            warn!("poshvip: hydration payload missing from page");
            return Vec::new();
        };
        let raw: String = script.text().collect();
        match serde_json::from_str::<Value>(&raw) {
            Ok(payload) => self.parse_payload(&payload, today),
            Err(err) => {
                warn!("poshvip: hydration payload unreadable, {err}");
                Vec::new()
            }
        }
    }

    // The hydration blob lists every event twice, in a flat feed and again
    // inside themed sections; both paths collapse by record id first.
    pub(crate) fn parse_payload(&self, payload: &Value, today: NaiveDate) -> Vec<Event> {
        let page = &payload["props"]["pageProps"];
        let mut records: Vec<&Value> = Vec::new();
        if let Some(feed) = page["feed"].as_array() {
            records.extend(feed.iter());
        }
        if let Some(sections) = page["sections"].as_array() {
            for section in sections {
                if let Some(list) = section["events"].as_array() {
                    records.extend(list.iter());
                }
            }
        }
        if records.is_empty() {
            warn!("poshvip: no event records in payload");
            return Vec::new();
        }

        let records = dedupe_by_key(records, |record| record_id(record));
        records
            .into_iter()
            .filter_map(|record| parse_record(record, today))
            .collect()
    }
}

fn record_id(record: &Value) -> Option<String> {
    match &record["id"] {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn parse_record(record: &Value, today: NaiveDate) -> Option<Event> {
    let start = record["startTime"].as_str()?;
    let Ok(instant) = DateTime::parse_from_rfc3339(start) else {
        debug!("poshvip: unreadable startTime {start:?}, dropping record");
        return None;
    };
    let local = instant.with_timezone(&Los_Angeles);
    let date = local.date_naive();
    if date < today {
        return None;
    }

    let name = record["name"].as_str();
    let description = record["description"].as_str().unwrap_or_default();
    let age = record["age"].as_str().unwrap_or_default();
    let tags: Vec<&str> = record["tags"]
        .as_array()
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let screened = format!("{} {age} {description}", name.unwrap_or_default());
    if let Some(phrase) = RULES.rejection(&screened) {
        debug!("poshvip: {name:?} rejected ({phrase})");
        return None;
    }

    let venue = record["venue"]["name"].as_str().map(str::to_string);
    let city = record["venue"]["city"].as_str().map(str::to_string);
    let title = resolve_title(name, &[], venue.as_deref())?;

    let mut segments: Vec<String> = Vec::new();
    if !tags.is_empty() {
        segments.push(tags.join(", "));
    }
    if !age.is_empty() {
        segments.push(age.to_string());
    }
    if !description.is_empty() {
        segments.push(excerpt(description));
    }

    let category = rules::categorize(&format!("{title} {} {description}", tags.join(" ")));

    Some(Event {
        date,
        time: Some(local.format("%-I:%M %p").to_string()),
        source: SOURCE,
        title,
        venue,
        city,
        details: segments.join(" | "),
        bands: Vec::new(),
        link: base::absolute_url(BASE, record["url"].as_str().map(str::to_string)),
        category,
    })
}

fn excerpt(text: &str) -> String {
    let cleaned = base::clean_text(text);
    if cleaned.chars().count() <= EXCERPT_LEN {
        return cleaned;
    }
    cleaned.chars().take(EXCERPT_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
    }

    fn sample_payload() -> Value {
        json!({
            "props": {
                "pageProps": {
                    "feed": [
                        {
                            "id": "evt_100",
                            "name": "Deep House Sundays",
                            "startTime": "2026-01-21T03:00:00Z",
                            "venue": {"name": "Audio", "city": "San Francisco"},
                            "url": "/events/deep-house-sundays",
                            "description": "Weekly deep house session with rotating residents.",
                            "tags": ["house", "deep house"]
                        },
                        {
                            "id": "evt_101",
                            "name": "Velvet Rope",
                            "startTime": "2026-01-24T05:30:00Z",
                            "venue": {"name": "Temple", "city": "San Francisco"},
                            "url": "/events/velvet-rope",
                            "description": "VIP bottle service night.",
                            "age": "21+"
                        },
                        {
                            "id": "evt_102",
                            "name": "New Years Warmup",
                            "startTime": "2026-01-01T04:00:00Z",
                            "venue": {"name": "Halcyon", "city": "San Francisco"},
                            "url": "/events/nye-warmup"
                        }
                    ],
                    "sections": [
                        {
                            "title": "This Weekend",
                            "events": [
                                {
                                    "id": "evt_100",
                                    "name": "Deep House Sundays",
                                    "startTime": "2026-01-21T03:00:00Z",
                                    "venue": {"name": "Audio", "city": "San Francisco"},
                                    "url": "/events/deep-house-sundays"
                                },
                                {
                                    "id": "evt_103",
                                    "name": "Bassline Bloom",
                                    "startTime": "2026-02-01T06:00:00Z",
                                    "venue": {"name": "Great Northern", "city": "San Francisco"},
                                    "url": "/events/bassline-bloom",
                                    "tags": ["bass music"]
                                }
                            ]
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn feed_and_sections_collapse_by_record_id() {
        let events = Poshvip.parse_payload(&sample_payload(), today());
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Deep House Sundays", "Bassline Bloom"]);
    }

    #[test]
    fn instants_land_on_their_pacific_date() {
        let events = Poshvip.parse_payload(&sample_payload(), today());
        let deep_house = &events[0];
        // 2026-01-21T03:00:00Z is still Jan 20, 7:00 PM in California.
        assert_eq!(deep_house.date, NaiveDate::from_ymd_opt(2026, 1, 20).unwrap());
        assert_eq!(deep_house.time.as_deref(), Some("7:00 PM"));
        assert_eq!(deep_house.venue.as_deref(), Some("Audio"));
        assert_eq!(deep_house.city.as_deref(), Some("San Francisco"));
        assert_eq!(
            deep_house.link.as_deref(),
            Some("https://www.poshvip.com/events/deep-house-sundays")
        );
    }

    #[test]
    fn age_gated_records_are_dropped() {
        let events = Poshvip.parse_payload(&sample_payload(), today());
        assert!(events.iter().all(|e| e.title != "Velvet Rope"));
    }

    #[test]
    fn past_records_are_dropped() {
        let events = Poshvip.parse_payload(&sample_payload(), today());
        assert!(events.iter().all(|e| e.title != "New Years Warmup"));
    }

    #[test]
    fn tags_and_description_feed_details_and_category() {
        let events = Poshvip.parse_payload(&sample_payload(), today());
        let deep_house = &events[0];
        assert!(deep_house.details.starts_with("house, deep house | "));
        assert_eq!(deep_house.category, Some(crate::models::Category::Electronic));
    }

    #[test]
    fn page_without_payload_parses_to_nothing() {
        let html = "<html><body><div id=\"app\"></div></body></html>";
        assert!(Poshvip.parse_document(html, today()).is_empty());
    }

    #[test]
    fn malformed_payload_parses_to_nothing() {
        let html = r#"<script id="__NEXT_DATA__" type="application/json">{not json</script>"#;
        assert!(Poshvip.parse_document(html, today()).is_empty());
    }

    #[test]
    fn embedded_script_round_trips_through_html() {
        let payload = sample_payload();
        let html = format!(
            "<html><body><script id=\"__NEXT_DATA__\" type=\"application/json\">{payload}</script></body></html>"
        );
        let events = Poshvip.parse_document(&html, today());
        assert_eq!(events.len(), 2);
    }
}
