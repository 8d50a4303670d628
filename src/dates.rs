use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::America::Los_Angeles;
use once_cell::sync::Lazy;
use regex::Regex;

// A lone clock time, "9pm" or "9:00 pm".
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d{1,2}(?::\d{2})?\s*[ap]m").expect("valid time regex"));

// Door/show pairs and ranges, "7pm/8pm" or "6pm/7pm til 9pm". Requires at
// least one continuation so a bare time falls through to TIME_RE.
static TIME_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d{1,2}(?::\d{2})?\s*[ap]m(?:\s*/\s*\d{1,2}(?::\d{2})?\s*[ap]m|\s*till?\s*\d{1,2}(?::\d{2})?\s*[ap]m)+",
    )
    .expect("valid time range regex")
});

static TIME_PARTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s*([ap])m").expect("valid time parts regex"));

static SLASH_DATE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}/\d{1,2}(?:/\d{2,4})?\b").expect("valid slash date regex"));

static TEXTUAL_DATE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*[,.]?\s+)?(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*[,.]?\s+\d{1,2}\b",
    )
    .expect("valid textual date regex")
});

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

// Every future/past decision in a run compares against the Pacific calendar date.
pub fn today_pacific() -> NaiveDate {
    Utc::now().with_timezone(&Los_Angeles).date_naive()
}

pub fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    parse_slash_date(text, today).or_else(|| parse_textual_date(text, today))
}

// "M/D/YYYY", "M/D/YY", or yearless "M/D".
pub fn parse_slash_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let token = text.trim();
    let mut parts = token.split('/');
    let month = parts.next()?.trim().parse::<u32>().ok()?;
    let day = parts.next()?.trim().parse::<u32>().ok()?;
    let year = parts.next();
    if parts.next().is_some() {
        return None;
    }
    match year {
        Some(raw) => {
            let mut year = raw.trim().parse::<i32>().ok()?;
            if year < 100 {
                year += 2000;
            }
            NaiveDate::from_ymd_opt(year, month, day)
        }
        None => resolve_yearless(month, day, today),
    }
}

// "Monday, Jan 20" / "Tue Jan 20" / "Jan 20". The weekday is decoration.
pub fn parse_textual_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let mut tokens = text
        .split(|c: char| c.is_whitespace() || c == ',' || c == '.')
        .filter(|t| !t.is_empty());

    let mut first = tokens.next()?;
    if is_weekday(first) {
        first = tokens.next()?;
    }
    let month = month_number(first)?;
    let day = tokens.next()?.trim().parse::<u32>().ok()?;
    resolve_yearless(month, day, today)
}

// Yearless dates mean the next occurrence.
fn resolve_yearless(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
    match this_year {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}

fn is_weekday(token: &str) -> bool {
    let lower = token.to_lowercase();
    WEEKDAYS.iter().any(|w| lower.starts_with(w))
}

fn month_number(token: &str) -> Option<u32> {
    let lower = token.to_lowercase();
    MONTHS
        .iter()
        .position(|m| lower.starts_with(m))
        .map(|idx| idx as u32 + 1)
}

// Slash tokens win over textual ones when both appear.
pub fn find_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(m) = SLASH_DATE_TOKEN_RE.find(text) {
        if let Some(date) = parse_slash_date(m.as_str(), today) {
            return Some(date);
        }
    }
    if let Some(m) = TEXTUAL_DATE_TOKEN_RE.find(text) {
        if let Some(date) = parse_textual_date(m.as_str(), today) {
            return Some(date);
        }
    }
    None
}

// Range forms are tried before lone times so "7pm/8pm" survives whole;
// the token comes back exactly as the source printed it.
pub fn find_time(text: &str) -> Option<String> {
    if let Some(m) = TIME_RANGE_RE.find(text) {
        return Some(m.as_str().to_string());
    }
    TIME_RE.find(text).map(|m| m.as_str().to_string())
}

// Minute-of-day of the first clock time in the token (the door time, for
// door/show pairs); missing or unreadable times sort after everything else.
pub fn time_sort_key(time: Option<&str>) -> u32 {
    let Some(text) = time else {
        return u32::MAX;
    };
    let Some(caps) = TIME_PARTS_RE.captures(text) else {
        return u32::MAX;
    };
    let hour = caps.get(1).unwrap().as_str().parse::<u32>().unwrap_or(0);
    let minute = caps
        .get(2)
        .map(|m| m.as_str().parse::<u32>().unwrap_or(0))
        .unwrap_or(0);
    if hour > 12 || minute > 59 {
        return u32::MAX;
    }
    let meridiem = caps.get(3).unwrap().as_str().to_lowercase();
    let hour24 = match (hour % 12, meridiem.as_str()) {
        (h, "p") => h + 12,
        (h, _) => h,
    };
    hour24 * 60 + minute
}
