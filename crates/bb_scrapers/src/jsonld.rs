use chrono::NaiveDate;
use scraper::{Html, Selector};
use serde_json::Value;

/// Every JSON object found in `application/ld+json` blocks, with `@graph`
/// members and top-level arrays flattened.
fn objects(document: &Html) -> Vec<Value> {
    let mut found = Vec::new();
    if let Ok(script_selector) = Selector::parse("script[type='application/ld+json']") {
        for script in document.select(&script_selector) {
            if let Ok(json) = serde_json::from_str::<Value>(script.text().collect::<String>().trim()) {
                flatten(json, &mut found);
            }
        }
    }
    found
}

fn flatten(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|v| flatten(v, out)),
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten(graph, out);
            }
            out.push(Value::Object(map));
        }
        _ => {}
    }
}

/// `datePublished` (or `dateCreated`) of the first object carrying one.
pub fn published_date(document: &Html) -> Option<NaiveDate> {
    objects(document).iter().find_map(|obj| {
        ["datePublished", "dateCreated"]
            .iter()
            .filter_map(|key| obj.get(*key).and_then(Value::as_str))
            .find_map(crate::extractor::parse_date)
    })
}

const ARTICLE_TYPES: &[&str] = &["Article", "BlogPosting", "NewsArticle", "TechArticle", "Report"];

fn is_article(obj: &Value) -> bool {
    match obj.get("@type") {
        Some(Value::String(t)) => ARTICLE_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| ARTICLE_TYPES.contains(&t)),
        _ => false,
    }
}

fn text_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Any object's `headline`, else the `name` of an article-typed object.
/// Site and organization names are never taken as a title.
pub fn headline(document: &Html) -> Option<String> {
    let objects = objects(document);
    objects
        .iter()
        .find_map(|obj| text_field(obj, "headline"))
        .or_else(|| {
            objects
                .iter()
                .filter(|obj| is_article(obj))
                .find_map(|obj| text_field(obj, "name"))
        })
}
