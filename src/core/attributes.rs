//! Display attributes from line item metadata
//!
//! Metadata comes in two shapes. Plain entries (`pa_size: M`) become one
//! text attribute each. Entries written by a product-input-fields integration
//! hold a list of sub-field objects (`title`, `type`, `_value`); each usable
//! sub-field becomes its own attribute, and uploaded images become image
//! attributes. The shape of the value decides which source handles an entry.

use crate::types::{Attribute, MetaEntry};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A way of turning one metadata entry into display attributes
pub trait MetadataSource {
    /// Whether the entry has the shape this source understands
    fn accepts(&self, entry: &MetaEntry) -> bool;

    /// Attributes for an accepted entry, in stored order
    fn attributes(&self, entry: &MetaEntry) -> Vec<Attribute>;
}

//==============================================================================
// Plain attributes
//==============================================================================

/// Scalar `key: value` entries
#[derive(Debug, Clone, Default)]
pub struct StandardAttributeSource {
    labels: BTreeMap<String, String>,
}

impl StandardAttributeSource {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }

    /// Human-readable label for a metadata key
    pub fn label(&self, key: &str) -> String {
        if let Some(label) = self.labels.get(key) {
            return label.clone();
        }

        let bare = key.strip_prefix("pa_").unwrap_or(key);
        match urlencoding::decode(bare) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => bare.to_string(),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl MetadataSource for StandardAttributeSource {
    fn accepts(&self, entry: &MetaEntry) -> bool {
        scalar_text(&entry.value).is_some()
    }

    fn attributes(&self, entry: &MetaEntry) -> Vec<Attribute> {
        match scalar_text(&entry.value) {
            Some(value) => vec![Attribute::text(self.label(&entry.key), value)],
            None => Vec::new(),
        }
    }
}

//==============================================================================
// Structured custom fields
//==============================================================================

/// Lists of `{title, type, _value}` sub-field objects
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredFieldSource;

impl StructuredFieldSource {
    fn sub_field(field: &Map<String, Value>) -> Option<Attribute> {
        let title = field
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())?;
        let field_type = field.get("type").and_then(Value::as_str).unwrap_or("text");
        let stored = field.get("_value").unwrap_or(&Value::Null);

        if field_type == "file" {
            return Self::image_field(title, stored);
        }

        scalar_text(stored).map(|value| Attribute::text(title, value))
    }

    /// A file sub-field is kept only when the upload is an image
    fn image_field(title: &str, stored: &Value) -> Option<Attribute> {
        let (path, declared_mime) = match stored {
            Value::Object(file) => {
                let path = ["tmp_name", "path", "name"]
                    .iter()
                    .find_map(|key| file.get(*key).and_then(Value::as_str))
                    .filter(|p| !p.is_empty())?;
                let mime = file.get("type").and_then(Value::as_str).map(str::to_string);
                (path.to_string(), mime)
            }
            Value::String(path) if !path.is_empty() => (path.clone(), None),
            _ => return None,
        };

        let mime = declared_mime.filter(|m| !m.is_empty()).or_else(|| {
            let guess_from = match stored {
                Value::Object(file) => file.get("name").and_then(Value::as_str).unwrap_or(path.as_str()),
                _ => path.as_str(),
            };
            mime_guess::from_path(guess_from)
                .first()
                .map(|m| m.essence_str().to_string())
        });

        match mime {
            Some(mime) if mime.starts_with("image/") => Some(Attribute::image(title, path)),
            _ => {
                debug!(field = title, "dropping non-image file field");
                None
            }
        }
    }
}

impl MetadataSource for StructuredFieldSource {
    fn accepts(&self, entry: &MetaEntry) -> bool {
        matches!(&entry.value, Value::Array(items) if items.iter().all(Value::is_object))
    }

    fn attributes(&self, entry: &MetaEntry) -> Vec<Attribute> {
        let Value::Array(items) = &entry.value else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|field| {
                let attr = Self::sub_field(field);
                if attr.is_none() {
                    debug!(key = %entry.key, "dropping malformed structured field");
                }
                attr
            })
            .collect()
    }
}

//==============================================================================
// Extractor
//==============================================================================

/// Turns a variant line item's metadata into ordered display attributes
pub struct AttributeExtractor {
    sources: Vec<Box<dyn MetadataSource>>,
    hidden_keys: BTreeSet<String>,
}

impl Default for AttributeExtractor {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl AttributeExtractor {
    /// Extractor with the structured and plain sources, plus key label overrides
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self::with_sources(vec![
            Box::new(StructuredFieldSource),
            Box::new(StandardAttributeSource::new(labels)),
        ])
    }

    /// Sources are tried in order; the first that accepts an entry wins
    pub fn with_sources(sources: Vec<Box<dyn MetadataSource>>) -> Self {
        Self {
            sources,
            hidden_keys: BTreeSet::new(),
        }
    }

    /// Metadata keys that never become attributes
    pub fn hide_keys<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.hidden_keys.extend(keys);
        self
    }

    pub fn extract(&self, meta: &[MetaEntry]) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        for entry in meta {
            if self.hidden_keys.contains(&entry.key) {
                debug!(key = %entry.key, "hidden metadata entry");
                continue;
            }
            match self.sources.iter().find(|source| source.accepts(entry)) {
                Some(source) => attributes.extend(source.attributes(entry)),
                None => debug!(key = %entry.key, "skipping metadata entry"),
            }
        }
        attributes
    }
}
