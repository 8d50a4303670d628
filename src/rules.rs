use crate::models::Category;

// Hard 21-and-over spellings; substring match also catches "(21+)". 18+ stays in.
pub const AGE_RESTRICTED_PHRASES: &[&str] = &["21+", "21 and over", "21 & over", "21 and up"];

pub struct Rules {
    pub rejected_phrases: &'static [&'static str],
    pub city: CityPolicy,
}

pub enum CityPolicy {
    Any,                            // source is already scoped
    Allow(&'static [&'static str]), // only these spellings, and a city is required
    Deny(&'static [&'static str]),  // everything except these; no city passes
}

impl Rules {
    // The matching phrase doubles as the logged skip reason.
    pub fn rejection(&self, text: &str) -> Option<&'static str> {
        let lower = text.to_lowercase();
        self.rejected_phrases
            .iter()
            .copied()
            .find(|phrase| lower.contains(&phrase.to_lowercase()))
    }

    pub fn city_ok(&self, city: Option<&str>) -> bool {
        match &self.city {
            CityPolicy::Any => true,
            CityPolicy::Allow(list) => match city {
                Some(name) => contains_city(list, name),
                None => false,
            },
            CityPolicy::Deny(list) => match city {
                Some(name) => !contains_city(list, name),
                None => true,
            },
        }
    }
}

fn contains_city(list: &[&str], name: &str) -> bool {
    let name = name.trim().to_lowercase();
    list.iter().any(|c| c.to_lowercase() == name)
}

const ELECTRONIC_KEYWORDS: &[&str] = &[
    "techno", "house", "trance", "dubstep", "drum & bass", "drum and bass", "dnb", "d&b",
    "electronic", "edm", "rave", "dj set", "djs", "bass music", "acid", "breaks", "hardstyle",
];

const LIVE_KEYWORDS: &[&str] = &[
    "punk", "rock", "metal", "indie", "hardcore", "jazz", "folk", "shoegaze", "garage",
    "hip hop", "hip-hop", "emo", "ska", "surf", "psych", "singer-songwriter", "acoustic",
];

// Electronic wins when a text mentions both; no keyword match means no category.
pub fn categorize(text: &str) -> Option<Category> {
    let lower = text.to_lowercase();
    if ELECTRONIC_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(Category::Electronic);
    }
    if LIVE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(Category::Live);
    }
    None
}
