//! Auto-seed: derive an initial `trackProduct` command from host markup.

use pagetrack_core::command::Command;
use pagetrack_core::event::EventType;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Attribute name → value, as read off one host element.
pub type ElementAttributes = HashMap<String, String>;

pub const DEFAULT_MARKER: &str = "data-track-product";

/// Event field ← element attribute.
const PRODUCT_FIELDS: &[(&str, &str)] = &[
    ("id", "data-product-id"),
    ("name", "data-product-name"),
    ("price", "data-product-price"),
    ("category", "data-product-category"),
];

/// Build a `trackProduct` command from the first element carrying
/// `marker_attribute`. Returns `None` if there is no such element or it has
/// no product id.
pub fn product_seed<'a>(
    elements: impl IntoIterator<Item = &'a ElementAttributes>,
    marker_attribute: &str,
) -> Option<Command> {
    let element = elements
        .into_iter()
        .find(|attrs| attrs.contains_key(marker_attribute))?;

    let mut data = Map::new();
    for (field, attribute) in PRODUCT_FIELDS {
        if let Some(value) = element.get(*attribute).filter(|v| !v.is_empty()) {
            data.insert((*field).to_string(), Value::String(value.clone()));
        }
    }

    if !data.contains_key("id") {
        return None;
    }
    Some(Command::track(EventType::Product, Value::Object(data)))
}
