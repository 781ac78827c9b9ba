// PageObservation: everything the classifiers may look at after one navigation.
//
// Built once from (final URL, status, rendered HTML). Meta tags, the canonical
// link and JSON-LD blocks are pulled out eagerly; arbitrary selector checks
// re-parse the stored HTML on demand so the value stays plain data.

use std::collections::HashMap;

use scraper::{Html, Selector};
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub struct PageObservation {
    /// URL after redirects, lowercased.
    pub final_url: String,
    pub http_status: Option<u16>,
    /// Rendered HTML, lowercased for phrase matching.
    pub html: String,
    /// `<meta property|name=... content=...>` pairs; keys lowercased.
    pub meta_tags: HashMap<String, String>,
    /// `rel=canonical` href resolved against the final URL, lowercased.
    pub canonical_url: Option<String>,
    /// JSON-LD blocks that parsed as JSON.
    pub structured_data: Vec<serde_json::Value>,
    /// Raw JSON-LD script text, lowercased, including blocks that failed to parse.
    pub structured_data_raw: Vec<String>,
    raw_html: String,
}

impl PageObservation {
    pub fn new(final_url: &str, http_status: Option<u16>, raw_html: String) -> Self {
        let final_url = final_url.trim().to_lowercase();
        let document = Html::parse_document(&raw_html);

        let meta_tags = extract_meta_tags(&document);
        let canonical_url = extract_canonical(&document, &final_url);
        let (structured_data, structured_data_raw) = extract_json_ld(&document);

        Self {
            html: raw_html.to_lowercase(),
            final_url,
            http_status,
            meta_tags,
            canonical_url,
            structured_data,
            structured_data_raw,
            raw_html,
        }
    }

    /// Does any element match the CSS selector? Invalid selectors answer `false`.
    pub fn has_selector(&self, css: &str) -> bool {
        let Ok(selector) = Selector::parse(css) else {
            tracing::debug!(css, "Invalid selector, treating as absent");
            return false;
        };
        let document = Html::parse_document(&self.raw_html);
        let found = document.select(&selector).next().is_some();
        found
    }

    /// Non-empty `content` of a meta tag.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta_tags
            .get(&key.to_lowercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

fn extract_meta_tags(document: &Html) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    let Ok(selector) = Selector::parse("meta[content]") else {
        return tags;
    };

    for el in document.select(&selector) {
        let attrs = el.value();
        let Some(key) = attrs.attr("property").or_else(|| attrs.attr("name")) else {
            continue;
        };
        let content = attrs.attr("content").unwrap_or_default().trim();
        let entry = tags.entry(key.trim().to_lowercase()).or_insert_with(String::new);
        if entry.is_empty() {
            *entry = content.to_string();
        }
    }
    tags
}

fn extract_canonical(document: &Html, final_url: &str) -> Option<String> {
    let selector = Selector::parse(r#"link[rel="canonical"]"#).ok()?;
    let href = document
        .select(&selector)
        .find_map(|el| el.value().attr("href"))?
        .trim();
    if href.is_empty() {
        return None;
    }

    let resolved = match Url::parse(final_url) {
        Ok(base) => base.join(href).map(|u| u.to_string()).unwrap_or_else(|_| href.to_string()),
        Err(_) => href.to_string(),
    };
    Some(resolved.to_lowercase())
}

fn extract_json_ld(document: &Html) -> (Vec<serde_json::Value>, Vec<String>) {
    let mut parsed = Vec::new();
    let mut raw = Vec::new();
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return (parsed, raw);
    };

    for el in document.select(&selector) {
        let text: String = el.text().collect();
        match serde_json::from_str::<serde_json::Value>(text.trim()) {
            Ok(value) => parsed.push(value),
            Err(e) => tracing::debug!(error = %e, "Unparseable JSON-LD block"),
        }
        raw.push(text.to_lowercase());
    }
    (parsed, raw)
}
