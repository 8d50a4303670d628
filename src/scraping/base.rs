use scraper::{ElementRef, Selector};

pub fn clean_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|node| {
            let cleaned = inner_text(node);
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned)
            }
        })
        .flatten()
}

pub fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

pub fn absolute_url(base: &str, href: Option<String>) -> Option<String> {
    let href = href?;
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href);
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(&href).ok().map(|u| u.to_string())
}

// Removes each listed substring once, then recollapses whitespace.
pub fn remove_substrings(text: &str, remove: &[String]) -> String {
    let mut remainder = text.to_string();
    for piece in remove {
        if piece.is_empty() {
            continue;
        }
        if let Some(idx) = remainder.find(piece.as_str()) {
            remainder.replace_range(idx..idx + piece.len(), " ");
        }
    }
    clean_text(&remainder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a \n\t b  "), "a b");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn inner_text_flattens_nested_markup() {
        let doc = Html::parse_fragment("<p>Black <b>Cat</b>, S.F.</p>");
        let selector = Selector::parse("p").unwrap();
        let p = doc.select(&selector).next().unwrap();
        assert_eq!(inner_text(p), "Black Cat , S.F.");
    }

    #[test]
    fn absolute_url_resolves_relative_hrefs() {
        assert_eq!(
            absolute_url("https://example.com/list/", Some("event/1".to_string())),
            Some("https://example.com/list/event/1".to_string())
        );
        assert_eq!(
            absolute_url("https://example.com", Some("https://other.com/x".to_string())),
            Some("https://other.com/x".to_string())
        );
        assert_eq!(absolute_url("https://example.com", None), None);
    }

    #[test]
    fn remove_substrings_leaves_the_plain_remainder() {
        let text = "Black Cat, S.F. Jezebel: Rewritten $30 7pm/8pm";
        let links = vec!["Black Cat, S.F.".to_string(), "Jezebel: Rewritten".to_string()];
        assert_eq!(remove_substrings(text, &links), "$30 7pm/8pm");
    }
}
