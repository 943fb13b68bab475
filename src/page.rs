//! Server-side view-state carried between postbacks.

use crate::error::AmsError;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

/// The two hidden fields the server requires on every postback. A page
/// missing either cannot be postbacked from.
pub const VIEWSTATE_FIELD: &str = "__VIEWSTATE";
pub const EVENT_VALIDATION_FIELD: &str = "__EVENTVALIDATION";

static HIDDEN_INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input[type=hidden][name]").unwrap());

/// A rendered page plus the hidden fields needed to postback from it.
#[derive(Debug, Clone)]
pub struct PageState {
    /// Every hidden input's name/value, last-wins on duplicate names
    pub hidden_fields: HashMap<String, String>,
    /// The page HTML as received
    pub raw_html: String,
}

impl PageState {
    /// Extracts hidden fields from a full HTML document.
    pub fn from_html(html: String) -> Self {
        let document = Html::parse_document(&html);
        let hidden_fields = extract_hidden_fields(&document);
        Self {
            hidden_fields,
            raw_html: html,
        }
    }

    /// Returns an error naming the first missing mandatory token, if any.
    pub fn require_postback_tokens(&self, page: &str) -> Result<(), AmsError> {
        for field in [VIEWSTATE_FIELD, EVENT_VALIDATION_FIELD] {
            if !self.hidden_fields.contains_key(field) {
                return Err(AmsError::MissingViewState {
                    field: field.to_string(),
                    page: page.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Parses the raw HTML into a document for scraping.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.raw_html)
    }
}

/// Collects every hidden input's name/value into a map, last-wins.
pub fn extract_hidden_fields(document: &Html) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for input in document.select(&HIDDEN_INPUT_SELECTOR) {
        if let Some(name) = input.value().attr("name") {
            if name.trim().is_empty() {
                continue;
            }
            let value = input.value().attr("value").unwrap_or_default();
            fields.insert(name.to_string(), value.to_string());
        }
    }
    fields
}

/// Lenient integer parsing for positional table cells: strip everything that
/// is not a digit and parse the remainder. Empty or malformed input is 0.
pub fn lenient_int(text: &str) -> u32 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
