use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::dates::time_sort_key;
use crate::models::{Event, Listing};

// Past dates drop against the run's single today; within a day the stable
// sort keeps emission order for equal times.
pub fn build_listing(events: Vec<Event>, today: NaiveDate) -> Listing {
    let mut groups: BTreeMap<NaiveDate, Vec<Event>> = BTreeMap::new();
    for event in events {
        if event.date < today {
            continue;
        }
        groups.entry(event.date).or_default().push(event);
    }
    for day in groups.values_mut() {
        day.sort_by_key(|event| time_sort_key(event.time.as_deref()));
    }
    Listing::from_groups(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(date: NaiveDate, time: Option<&str>, title: &str) -> Event {
        Event {
            date,
            time: time.map(str::to_string),
            source: Source::Nineteenhz,
            title: title.to_string(),
            venue: None,
            city: None,
            details: String::new(),
            bands: Vec::new(),
            link: None,
            category: None,
        }
    }

    #[test]
    fn past_dates_are_dropped_entirely() {
        let today = day(2026, 3, 10);
        let listing = build_listing(
            vec![
                event(day(2026, 3, 9), None, "yesterday"),
                event(day(2026, 3, 10), None, "tonight"),
                event(day(2026, 3, 11), None, "tomorrow"),
            ],
            today,
        );
        assert_eq!(listing.dates(), vec![day(2026, 3, 10), day(2026, 3, 11)]);
        assert_eq!(listing.event_count(), 2);
    }

    #[test]
    fn times_order_chronologically_within_a_day() {
        let today = day(2026, 3, 1);
        let date = day(2026, 3, 10);
        let listing = build_listing(
            vec![
                event(date, Some("10:00 PM"), "late"),
                event(date, None, "unknown"),
                event(date, Some("9:00 PM"), "early"),
            ],
            today,
        );
        let titles: Vec<&str> = listing.days[0]
            .events
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["early", "late", "unknown"]);
    }

    #[test]
    fn equal_times_keep_emission_order() {
        let today = day(2026, 3, 1);
        let date = day(2026, 3, 10);
        let listing = build_listing(
            vec![
                event(date, Some("8pm"), "first in"),
                event(date, Some("8:00 pm"), "second in"),
            ],
            today,
        );
        let titles: Vec<&str> = listing.days[0]
            .events
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["first in", "second in"]);
    }

    #[test]
    fn flattening_reproduces_the_surviving_events() {
        let today = day(2026, 3, 10);
        let input = vec![
            event(day(2026, 3, 12), Some("9pm"), "a"),
            event(day(2026, 3, 10), None, "b"),
            event(day(2026, 3, 9), Some("8pm"), "gone"),
            event(day(2026, 3, 12), Some("7pm"), "c"),
        ];
        let listing = build_listing(input.clone(), today);

        let mut flattened: Vec<Event> = listing
            .days
            .iter()
            .flat_map(|d| d.events.iter().cloned())
            .collect();
        let mut expected: Vec<Event> = input
            .into_iter()
            .filter(|e| e.date >= today)
            .collect();
        flattened.sort_by(|a, b| (a.date, &a.title).cmp(&(b.date, &b.title)));
        expected.sort_by(|a, b| (a.date, &a.title).cmp(&(b.date, &b.title)));
        assert_eq!(flattened, expected);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let today = day(2026, 3, 10);
        let input = vec![
            event(day(2026, 3, 12), Some("9pm"), "a"),
            event(day(2026, 3, 10), None, "b"),
            event(day(2026, 3, 12), Some("7pm"), "c"),
        ];
        let once = build_listing(input.clone(), today);
        let again = build_listing(
            once.days
                .iter()
                .flat_map(|d| d.events.iter().cloned())
                .collect(),
            today,
        );
        assert_eq!(once, again);
        assert_eq!(build_listing(input.clone(), today), build_listing(input, today));
    }
}
