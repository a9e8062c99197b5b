//! Rule-based field extraction for pages of interest

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ExtractionRule;

/// Values extracted for one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedField {
    /// Field name from the rule
    pub name: String,

    /// Predicate configured for the rule, if any
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub predicate: Option<String>,

    /// One value per matched element, document order
    #[serde(rename = "value", default)]
    pub values: Vec<String>,
}

/// Everything extracted from one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// URL of the page
    pub url: String,

    /// When the page was fetched
    pub fetched_at: chrono::DateTime<chrono::Utc>,

    /// Structural similarity score of the page
    pub score: f64,

    /// Extracted fields, rule order
    #[serde(rename = "field", default)]
    pub fields: Vec<ExtractedField>,
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_value(element: ElementRef<'_>, attribute: Option<&str>) -> Option<String> {
    match attribute {
        Some(name) => element.value().attr(name).map(|v| v.trim().to_string()),
        None => Some(collapse_whitespace(&element.text().collect::<String>())),
    }
}

/// Apply every rule to `html`
///
/// `predicates` is indexed like `rules`. Rules whose selector fails to parse
/// are skipped with a warning and produce an empty field.
pub fn extract_fields(
    html: &str,
    rules: &[ExtractionRule],
    predicates: &[String],
) -> Vec<ExtractedField> {
    let document = Html::parse_document(html);

    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            let values = match Selector::parse(&rule.selector) {
                Ok(selector) => document
                    .select(&selector)
                    .filter_map(|element| element_value(element, rule.attribute.as_deref()))
                    .filter(|value| !value.is_empty())
                    .collect(),
                Err(e) => {
                    warn!("Failed to parse selector '{}': {}", rule.selector, e);
                    Vec::new()
                }
            };

            ExtractedField {
                name: rule.field.clone(),
                predicate: predicates.get(index).cloned(),
                values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Lamp</title></head><body>
        <h1>  Brass
            Lamp </h1>
        <span class="price">$10</span>
        <img class="main" src=" /img/lamp.png ">
        <ul class="tags"><li>home</li><li>light</li><li> </li></ul>
    </body></html>"#;

    #[test]
    fn test_extract_text_fields() {
        let rules = vec![
            ExtractionRule::new("title", "h1"),
            ExtractionRule::new("tags", "ul.tags li"),
        ];
        let fields = extract_fields(PAGE, &rules, &[]);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "title");
        assert_eq!(fields[0].values, vec!["Brass Lamp"]);
        assert_eq!(fields[1].values, vec!["home", "light"]);
        assert!(fields[0].predicate.is_none());
    }

    #[test]
    fn test_extract_attribute() {
        let rules = vec![ExtractionRule::new("image", "img.main").with_attribute("src")];
        let fields = extract_fields(PAGE, &rules, &[]);
        assert_eq!(fields[0].values, vec!["/img/lamp.png"]);
    }

    #[test]
    fn test_missing_element_gives_empty_field() {
        let rules = vec![ExtractionRule::new("sku", ".sku")];
        let fields = extract_fields(PAGE, &rules, &[]);
        assert!(fields[0].values.is_empty());
    }

    #[test]
    fn test_predicates_attached_by_index() {
        let rules = vec![
            ExtractionRule::new("title", "h1"),
            ExtractionRule::new("price", ".price"),
        ];
        let predicates = vec![
            "http://purl.org/dc/terms/title".to_string(),
            "http://schema.org/price".to_string(),
        ];
        let fields = extract_fields(PAGE, &rules, &predicates);
        assert_eq!(
            fields[1].predicate.as_deref(),
            Some("http://schema.org/price")
        );
        assert_eq!(fields[1].values, vec!["$10"]);
    }

    #[test]
    fn test_invalid_selector_skipped() {
        let rules = vec![
            ExtractionRule::new("broken", "h1[[["),
            ExtractionRule::new("title", "title"),
        ];
        let fields = extract_fields(PAGE, &rules, &[]);
        assert!(fields[0].values.is_empty());
        assert_eq!(fields[1].values, vec!["Lamp"]);
    }
}
