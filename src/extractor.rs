// Metadata Extractor
// Pulls banner, title and description out of raw HTML with ordered fallbacks.
//
// Tags are scanned with a lightweight pattern pass: every <meta>/<link> tag is
// matched once, then its attributes are read independently, so attribute order
// inside a tag does not matter. No entity decoding is performed.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::types::{ScrapedMetadata, DEFAULT_BANNER_URL};

/// Opening <meta> or <link> tags, in document order
static HEAD_TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(meta|link)\b([^>]*)>").expect("Failed to compile head tag regex")
});

/// name="value" or name='value' pairs inside a tag
static ATTRIBUTE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9_:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("Failed to compile attribute regex")
});

/// First text run of the <title> element
static TITLE_ELEMENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("Failed to compile title regex")
});

const IMAGE_KEYS: &[&str] = &["og:image", "twitter:image"];
const TITLE_KEYS: &[&str] = &["og:title", "twitter:title"];
const DESCRIPTION_KEYS: &[&str] = &["og:description", "twitter:description", "description"];
const IMAGE_LINK_RELS: &[&str] = &["image_src", "preload"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Meta,
    Link,
}

/// A scanned tag with lower-cased attribute names
#[derive(Debug)]
struct HeadTag {
    kind: TagKind,
    attributes: HashMap<String, String>,
}

impl HeadTag {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether `property` or `name` equals one of `keys` (case-insensitive)
    fn names_one_of(&self, keys: &[&str]) -> bool {
        ["property", "name"].iter().any(|attr| {
            self.attr(attr)
                .map(|value| keys.iter().any(|key| value.trim().eq_ignore_ascii_case(key)))
                .unwrap_or(false)
        })
    }
}

fn scan_head_tags(html: &str) -> Vec<HeadTag> {
    HEAD_TAG_PATTERN
        .captures_iter(html)
        .map(|caps| {
            let kind = if caps[1].eq_ignore_ascii_case("meta") {
                TagKind::Meta
            } else {
                TagKind::Link
            };
            let mut attributes = HashMap::new();
            for attr in ATTRIBUTE_PATTERN.captures_iter(&caps[2]) {
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                // First occurrence wins, like a browser's attribute parser
                attributes
                    .entry(attr[1].to_ascii_lowercase())
                    .or_insert_with(|| value.to_string());
            }
            HeadTag { kind, attributes }
        })
        .collect()
}

/// Trim a candidate and treat empty-after-trim as not found
fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `content` of the first <meta> tag whose property/name is in `keys`
fn meta_content(tags: &[HeadTag], keys: &[&str]) -> Option<String> {
    tags.iter()
        .filter(|tag| tag.kind == TagKind::Meta && tag.names_one_of(keys))
        .find_map(|tag| tag.attr("content").filter(|content| !content.is_empty()))
        .and_then(non_empty)
}

/// `href` of the first <link> tag whose rel is in `rels`
fn link_href(tags: &[HeadTag], rels: &[&str]) -> Option<String> {
    tags.iter()
        .filter(|tag| {
            tag.kind == TagKind::Link
                && tag
                    .attr("rel")
                    .map(|rel| rels.iter().any(|r| rel.trim().eq_ignore_ascii_case(r)))
                    .unwrap_or(false)
        })
        .find_map(|tag| tag.attr("href").filter(|href| !href.is_empty()))
        .and_then(non_empty)
}

fn title_element(html: &str) -> Option<String> {
    TITLE_ELEMENT_PATTERN
        .captures(html)
        .and_then(|caps| non_empty(&caps[1]))
}

/// Extract banner, title and description from a page
///
/// Resolution order:
/// - banner: og/twitter image meta, then `image_src`/`preload` link, then the placeholder
/// - title: og/twitter title meta, then `<title>`, then empty
/// - description: og/twitter/plain description meta, then empty
///
/// The banner is returned as written in the page; see `resolver::resolve`.
pub fn extract(html: &str) -> ScrapedMetadata {
    let tags = scan_head_tags(html);

    let banner = meta_content(&tags, IMAGE_KEYS)
        .or_else(|| link_href(&tags, IMAGE_LINK_RELS))
        .unwrap_or_else(|| DEFAULT_BANNER_URL.to_string());

    let title = meta_content(&tags, TITLE_KEYS)
        .or_else(|| title_element(html))
        .unwrap_or_default();

    let description = meta_content(&tags, DESCRIPTION_KEYS).unwrap_or_default();

    ScrapedMetadata {
        banner,
        title,
        description,
    }
}
