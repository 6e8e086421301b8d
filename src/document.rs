//! Queryable HTML trees.
//!
//! A thin layer over `scraper::Html` that adds the read patterns every
//! extractor needs: first-match text, attribute reads with fallback names,
//! and `<meta>` lookups. `Document` is not `Send`; pull owned data out of it
//! before awaiting anything.

use scraper::{ElementRef, Html, Selector};

/// Attribute names that may carry an image URL, most authoritative first.
pub const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src", "data-original"];

/// A parsed page or fragment.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a full HTML page.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Parses a standalone fragment, such as an AJAX partial.
    pub fn parse_fragment(html: &str) -> Self {
        Self {
            html: Html::parse_fragment(html),
        }
    }

    /// All elements matching `selector`, in document order.
    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> scraper::html::Select<'a, 'b> {
        self.html.select(selector)
    }

    /// Trimmed text of the first match, if non-empty.
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        self.select(selector)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
    }

    /// Trimmed, non-empty texts of every match.
    pub fn all_texts(&self, selector: &Selector) -> Vec<String> {
        self.select(selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// First non-empty value among `attrs` on the first match.
    pub fn first_attr(&self, selector: &Selector, attrs: &[&str]) -> Option<String> {
        self.select(selector)
            .next()
            .and_then(|el| attr_with_fallback(el, attrs))
    }

    /// First usable image source of the first match.
    pub fn first_image(&self, selector: &Selector) -> Option<String> {
        self.select(selector).next().and_then(image_source)
    }

    /// `content` of `<meta property=key>` or `<meta name=key>`.
    pub fn meta(&self, key: &str) -> Option<String> {
        let selector =
            Selector::parse(&format!(r#"meta[property="{key}"], meta[name="{key}"]"#)).ok()?;
        self.first_attr(&selector, &["content"])
    }
}

/// Element text with whitespace runs collapsed.
pub fn element_text(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty (trimmed) attribute among `names`.
pub fn attr_with_fallback(el: ElementRef, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| el.value().attr(name))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Image URL of `el`, skipping inline `data:` placeholders left by lazy loaders.
pub fn image_source(el: ElementRef) -> Option<String> {
    IMAGE_ATTRS
        .iter()
        .filter_map(|name| el.value().attr(name))
        .map(str::trim)
        .find(|v| !v.is_empty() && !v.starts_with("data:"))
        .map(str::to_string)
}
