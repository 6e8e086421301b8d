//! Chapter-number rules.
//!
//! Each rule reads one input of a link (href or text) and captures a number.
//! Rules run in table order and the first match wins. New site conventions
//! are added as new rows; existing rows stay untouched.

use super::ChapterLink;
use regex::Regex;
use std::sync::LazyLock;

/// Which part of a link a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleInput {
    /// The resolved href as is.
    Href,
    /// The href with trailing slashes removed.
    HrefTrimmed,
    /// The link text.
    Text,
}

/// A named numbering rule.
#[derive(Debug)]
pub struct NumberRule {
    pub name: &'static str,
    pub input: RuleInput,
    /// Only applies to links inside a chapter-list item.
    pub list_items_only: bool,
    pattern: Regex,
}

impl NumberRule {
    fn new(name: &'static str, input: RuleInput, list_items_only: bool, pattern: &str) -> Self {
        Self {
            name,
            input,
            list_items_only,
            pattern: Regex::new(pattern).expect("Invalid chapter number rule"),
        }
    }

    /// Applies the rule to `link`.
    pub fn apply(&self, link: &ChapterLink) -> Option<f64> {
        if self.list_items_only && !link.in_list {
            return None;
        }

        let haystack = match self.input {
            RuleInput::Href => link.href.as_str(),
            RuleInput::HrefTrimmed => link.href.trim_end_matches('/'),
            RuleInput::Text => link.text.as_str(),
        };

        self.pattern
            .captures(haystack)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|n| n.is_finite())
    }
}

/// Rule table, highest priority first.
pub static NUMBER_RULES: LazyLock<Vec<NumberRule>> = LazyLock::new(|| {
    vec![
        // .../chapter-12/ or .../chapter-12.5/
        NumberRule::new(
            "href-chapter-slug",
            RuleInput::Href,
            false,
            r"(?i)chapter-(\d+(?:\.\d+)?)",
        ),
        // .../series-x-12
        NumberRule::new(
            "href-trailing-dash",
            RuleInput::HrefTrimmed,
            false,
            r"-(\d+(?:\.\d+)?)$",
        ),
        // .../series-x/12/
        NumberRule::new(
            "href-trailing-segment",
            RuleInput::Href,
            false,
            r"/(\d+(?:\.\d+)?)/?$",
        ),
        NumberRule::new(
            "text-chapter-label",
            RuleInput::Text,
            true,
            r"(?i)chapter\s*(\d+(?:\.\d+)?)",
        ),
        NumberRule::new(
            "text-trailing-number",
            RuleInput::Text,
            true,
            r"(\d+(?:\.\d+)?)\s*$",
        ),
    ]
});

/// Extracts a chapter number, returning it with the name of the rule that matched.
pub fn extract_number(link: &ChapterLink) -> Option<(f64, &'static str)> {
    NUMBER_RULES
        .iter()
        .find_map(|rule| rule.apply(link).map(|n| (n, rule.name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(href: &str, text: &str, in_list: bool) -> ChapterLink {
        ChapterLink {
            href: href.to_string(),
            text: text.to_string(),
            in_list,
            released: None,
        }
    }

    fn rule(name: &str) -> &'static NumberRule {
        NUMBER_RULES.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn test_chapter_slug() {
        let r = rule("href-chapter-slug");
        assert_eq!(r.apply(&link("https://a.com/x/chapter-12/", "", false)), Some(12.0));
        assert_eq!(r.apply(&link("https://a.com/x/Chapter-12.5/", "", false)), Some(12.5));
        assert_eq!(r.apply(&link("https://a.com/x/ch/12/", "", false)), None);
    }

    #[test]
    fn test_trailing_dash() {
        let r = rule("href-trailing-dash");
        assert_eq!(r.apply(&link("https://a.com/read/solo-leveling-7/", "", false)), Some(7.0));
        assert_eq!(r.apply(&link("https://a.com/read/solo-leveling/", "", false)), None);
    }

    #[test]
    fn test_trailing_segment() {
        let r = rule("href-trailing-segment");
        assert_eq!(r.apply(&link("https://a.com/series/x/31/", "", false)), Some(31.0));
        assert_eq!(r.apply(&link("https://a.com/series/x/31", "", false)), Some(31.0));
    }

    #[test]
    fn test_text_rules_need_list_items() {
        let outside = link("https://a.com/x/read", "Chapter 9", false);
        let inside = link("https://a.com/x/read", "Chapter 9", true);
        assert_eq!(rule("text-chapter-label").apply(&outside), None);
        assert_eq!(rule("text-chapter-label").apply(&inside), Some(9.0));
        assert_eq!(
            rule("text-trailing-number").apply(&link("https://a.com/x/read", "Ep. 4", true)),
            Some(4.0)
        );
    }

    #[test]
    fn test_priority_href_before_text() {
        let l = link("https://a.com/x/chapter-3/", "Chapter 99", true);
        assert_eq!(extract_number(&l), Some((3.0, "href-chapter-slug")));
    }

    #[test]
    fn test_no_rule_matches() {
        let l = link("https://a.com/x/chapter-preview/", "Preview", true);
        assert_eq!(extract_number(&l), None);
    }
}
