use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use tracing::{debug, warn};

use super::{RunContext, SourceAdapter};
use crate::dedupe::dedupe_by_key;
use crate::fetch;
use crate::models::{resolve_title, Category, Event, Source};
use crate::rules::{self, CityPolicy, Rules, AGE_RESTRICTED_PHRASES};

const URL: &str = "https://edmtrain.com/api/events";
const SOURCE: Source = Source::Edmtrain;
const LATITUDE: &str = "37.7749";
const LONGITUDE: &str = "-122.4194";

const RULES: Rules = Rules {
    rejected_phrases: AGE_RESTRICTED_PHRASES,
    city: CityPolicy::Any,
};

pub struct Edmtrain;

impl SourceAdapter for Edmtrain {
    fn source(&self) -> Source {
        SOURCE
    }

    fn url(&self) -> &'static str {
        URL
    }

    // Three overlapping windows (this week, next week, the month ahead);
    // identical records collapse by the provider's event id afterwards.
    fn fetch(&self, ctx: &RunContext<'_>) -> Result<Vec<Event>> {
        let client = std::env::var("EDMTRAIN_CLIENT")
            .map_err(|_| anyhow!("EDMTRAIN_CLIENT is not set"))?;
        let mut records = Vec::new();
        for (start, end) in windows(ctx.today) {
            let start = start.to_string();
            let end = end.to_string();
            let payload = fetch::fetch_json(
                URL,
                &[
                    ("client", client.as_str()),
                    ("latitude", LATITUDE),
                    ("longitude", LONGITUDE),
                    ("startDate", start.as_str()),
                    ("endDate", end.as_str()),
                ],
            )?;
            match payload["data"].as_array() {
                Some(data) => records.extend(data.iter().cloned()),
                None => warn!("edmtrain: window {start}..{end} returned no data array"),
            }
        }
        Ok(parse_records(records, ctx.today))
    }
}

fn windows(today: NaiveDate) -> [(NaiveDate, NaiveDate); 3] {
    [
        (today, today + Duration::days(6)),
        (today + Duration::days(7), today + Duration::days(13)),
        (today, today + Duration::days(29)),
    ]
}

pub(crate) fn parse_records(records: Vec<Value>, today: NaiveDate) -> Vec<Event> {
    let records = dedupe_by_key(records, |record| record["id"].as_i64());
    records
        .iter()
        .filter_map(|record| parse_record(record, today))
        .collect()
}

fn parse_record(record: &Value, today: NaiveDate) -> Option<Event> {
    let date_text = record["date"].as_str()?;
    let Ok(date) = NaiveDate::parse_from_str(date_text, "%Y-%m-%d") else {
        debug!("edmtrain: unreadable date {date_text:?}, dropping record");
        return None;
    };
    if date < today {
        return None;
    }

    let ages = record["ages"].as_str().unwrap_or_default();
    if let Some(phrase) = RULES.rejection(ages) {
        debug!("edmtrain: record {} rejected ({phrase})", record["id"]);
        return None;
    }

    let bands: Vec<String> = record["artistList"]
        .as_array()
        .map(|artists| {
            artists
                .iter()
                .filter_map(|artist| artist["name"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let venue = record["venue"]["name"].as_str().map(str::to_string);
    let city = record["venue"]["location"]
        .as_str()
        .and_then(|location| location.split(',').next())
        .map(|city| city.trim().to_string());
    let title = resolve_title(record["name"].as_str(), &bands, venue.as_deref())?;

    let mut segments: Vec<&str> = Vec::new();
    if !ages.is_empty() {
        segments.push(ages);
    }
    if record["festivalInd"].as_bool() == Some(true) {
        segments.push("festival");
    }

    let category = if record["electronicGenreInd"].as_bool() == Some(true) {
        Some(Category::Electronic)
    } else {
        rules::categorize(&title)
    };

    Some(Event {
        date,
        time: record["startTime"].as_str().map(str::to_string),
        source: SOURCE,
        title,
        venue,
        city,
        details: segments.join(" | "),
        bands,
        link: record["link"].as_str().map(str::to_string),
        category,
    })
}
