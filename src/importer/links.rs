//! Facebook event id extraction from page post links.

use crate::models::FbId;
use once_cell::sync::Lazy;
use regex::Regex;

static FB_EVENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://www\.facebook\.com/events/([0-9]+)")
        .expect("event link pattern is valid")
});

/// Distinct event ids referenced by `links`, in first-seen order. Missing
/// and non-matching links are skipped.
pub fn event_ids_from_links<'a, I>(links: I) -> Vec<FbId>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut ids: Vec<FbId> = Vec::new();
    for link in links.into_iter().flatten() {
        if let Some(id) = FB_EVENT_RE.captures(link).and_then(|c| c.get(1)) {
            if !ids.iter().any(|seen| seen == id.as_str()) {
                ids.push(id.as_str().to_string());
            }
        }
    }
    ids
}

/// `extracted` minus everything already offered, order kept.
pub fn candidate_ids(extracted: Vec<FbId>, seen: &[FbId]) -> Vec<FbId> {
    extracted
        .into_iter()
        .filter(|id| !seen.contains(id))
        .collect()
}

/// Items of `ids` not in `other`, order kept.
pub(crate) fn difference(ids: &[FbId], other: &[FbId]) -> Vec<FbId> {
    ids.iter()
        .filter(|id| !other.contains(id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ids(links: &[Option<&str>]) -> Vec<FbId> {
        event_ids_from_links(links.iter().copied())
    }

    #[test_case("https://www.facebook.com/events/123", &["123"]; "plain link")]
    #[test_case("https://www.facebook.com/events/123/?ref=page", &["123"]; "suffix ignored")]
    #[test_case("see https://www.facebook.com/events/123", &[]; "anchored at start")]
    #[test_case("http://www.facebook.com/events/123", &[]; "https only")]
    #[test_case("https://www.facebook.com/photos/123", &[]; "other object")]
    #[test_case("https://www.facebook.com/events/abc", &[]; "digits only")]
    #[test_case("", &[]; "empty link")]
    fn test_event_ids_from_link(link: &str, expected: &[&str]) {
        assert_eq!(ids(&[Some(link)]), expected);
    }

    #[test]
    fn test_duplicates_collapse_in_first_seen_order() {
        let links = [
            Some("https://www.facebook.com/events/222"),
            None,
            Some("https://www.facebook.com/events/111"),
            Some("https://www.facebook.com/events/222/"),
        ];
        assert_eq!(ids(&links), vec!["222", "111"]);
    }

    #[test]
    fn test_candidates_exclude_seen_ids() {
        let extracted = vec!["111".to_string(), "222".to_string()];
        assert_eq!(candidate_ids(extracted, &["111".to_string()]), vec!["222"]);
    }

    #[test]
    fn test_candidates_empty_when_all_seen() {
        let seen = vec!["1".to_string(), "2".to_string()];
        assert!(candidate_ids(seen.clone(), &seen).is_empty());
    }
}
