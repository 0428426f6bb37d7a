//! Flatten extracted fields into scalar metadata entries.
//!
//! Vector stores generally accept only scalar metadata, so lists are stored as a joined string,
//! a count, and up to [`MAX_LISTED`] numbered entries.

use serde_json::{Map, Value};

use super::parse::ExtractedFields;

/// Maximum number of products (and clients) stored as numbered entries.
pub const MAX_LISTED: usize = 5;

/// Write `fields` into `metadata`.
///
/// `creator` is only written when the metadata has none yet and the extraction found one, so a
/// creator taken from the source file wins over the model's guess.
pub fn flatten_into_metadata(fields: &ExtractedFields, metadata: &mut Map<String, Value>) {
    metadata.insert("category".into(), Value::from(fields.category.as_str()));
    flatten_list(metadata, "product", "products_str", &fields.products);
    flatten_list(metadata, "client", "clients_str", &fields.clients);

    if !fields.creator.is_empty() && !metadata.contains_key("creator") {
        metadata.insert("creator".into(), Value::from(fields.creator.as_str()));
    }
}

fn flatten_list(
    metadata: &mut Map<String, Value>,
    singular: &str,
    joined_key: &str,
    items: &[String],
) {
    metadata.insert(joined_key.into(), Value::from(items.join(", ")));
    metadata.insert(format!("{singular}_count"), Value::from(items.len()));
    for (idx, item) in items.iter().take(MAX_LISTED).enumerate() {
        metadata.insert(format!("{singular}_{}", idx + 1), Value::from(item.as_str()));
    }
}
