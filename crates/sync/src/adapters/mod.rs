//! Source adapters for reading/writing native configuration formats.

mod claude;
mod opencode;
pub mod traits;
pub(crate) mod utils;

pub use claude::ClaudeAdapter;
pub use opencode::OpenCodeAdapter;
pub use traits::SourceAdapter;

use mcpbridge_snapshot::{McpItem, Source};
use serde_json::Value;

/// Builds an item from a native table entry.
///
/// OpenCode carries `enabled` (default true) and `description` inside the
/// document; Claude entries are always enabled and undescribed.
pub fn item_from_native(source: Source, name: &str, config: &Value) -> McpItem {
    let (enabled, description) = match source {
        Source::OpenCode => (
            config.get("enabled").and_then(Value::as_bool).unwrap_or(true),
            config
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
        ),
        Source::Claude => (true, None),
    };
    McpItem {
        name: name.to_string(),
        config: config.clone(),
        source,
        enabled,
        description,
    }
}

/// Shapes a submitted document before it is stored.
///
/// OpenCode gets `enabled: true` on new entries that do not say otherwise and
/// stores a non-empty description in the document. Claude stores the document
/// as given.
pub fn prepare_for_insert(
    source: Source,
    mut config: Value,
    description: Option<&str>,
    is_new: bool,
) -> Value {
    if source == Source::OpenCode {
        if let Value::Object(doc) = &mut config {
            if is_new && !doc.contains_key("enabled") {
                doc.insert("enabled".into(), Value::Bool(true));
            }
            if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
                doc.insert("description".into(), Value::String(description.to_string()));
            }
        }
    }
    config
}
