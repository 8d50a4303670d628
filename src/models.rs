use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Nineteenhz,
    Foopee,
    Poshvip,
    Edmtrain,
    Partiful,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Nineteenhz => "nineteenhz",
            Source::Foopee => "foopee",
            Source::Poshvip => "poshvip",
            Source::Edmtrain => "edmtrain",
            Source::Partiful => "partiful",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Electronic,
    Live,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub date: NaiveDate,
    pub time: Option<String>, // verbatim source text: "9:00 pm", "7pm/8pm"
    pub source: Source,
    pub title: String,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub details: String, // secondary fields joined with " | "
    pub bands: Vec<String>,
    pub link: Option<String>,
    pub category: Option<Category>,
}

// Explicit title, else first performer, else venue; None drops the candidate.
pub fn resolve_title(
    explicit: Option<&str>,
    bands: &[String],
    venue: Option<&str>,
) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| bands.first().cloned())
        .or_else(|| venue.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string))
}

impl Event {
    // Dedup key for sources without a provider-side id; venue and title
    // are case-folded so re-capitalized reposts still collapse.
    pub fn composite_key(&self) -> (Source, NaiveDate, Option<String>, String) {
        (
            self.source,
            self.date,
            self.venue.as_ref().map(|v| v.to_lowercase()),
            self.title.to_lowercase(),
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub events: Vec<Event>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub days: Vec<DayGroup>, // ascending by date
}

impl Listing {
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.date).collect()
    }

    pub fn event_count(&self) -> usize {
        self.days.iter().map(|d| d.events.len()).sum()
    }

    pub fn from_groups(groups: BTreeMap<NaiveDate, Vec<Event>>) -> Self {
        Listing {
            days: groups
                .into_iter()
                .map(|(date, events)| DayGroup { date, events })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_falls_back_to_performer_then_venue() {
        let bands = vec!["Jezebel: Rewritten".to_string()];
        assert_eq!(
            resolve_title(Some("Main Bill"), &bands, Some("Black Cat")),
            Some("Main Bill".to_string())
        );
        assert_eq!(
            resolve_title(None, &bands, Some("Black Cat")),
            Some("Jezebel: Rewritten".to_string())
        );
        assert_eq!(
            resolve_title(Some("  "), &[], Some("Black Cat")),
            Some("Black Cat".to_string())
        );
        assert_eq!(resolve_title(None, &[], None), None);
    }

    #[test]
    fn source_tags_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&Source::Nineteenhz).unwrap(),
            "\"nineteenhz\""
        );
        assert_eq!(Source::Foopee.to_string(), "foopee");
    }
}
