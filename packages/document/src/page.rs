use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Block;

/// Flat page metadata record (title, slug, SEO fields, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageData {
    fields: BTreeMap<String, Value>,
}

impl PageData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Merge a single field, returning the previous value
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }

    pub fn slug(&self) -> Option<&str> {
        self.get("slug").and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for PageData {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Blocks and page metadata captured together; the unit of undo/redo and
/// the on-disk page document format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub blocks: Vec<Block>,

    #[serde(default)]
    pub page_data: PageData,
}

impl Snapshot {
    pub fn new(blocks: Vec<Block>, page_data: PageData) -> Self {
        Self { blocks, page_data }
    }

    /// Stable CRC32 of the snapshot's JSON form, used to tell whether two
    /// states differ without keeping both around.
    pub fn fingerprint(&self) -> String {
        // Serialization of these types cannot fail: all map keys are strings.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&bytes);
        format!("{:08x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_data_is_flat_json_object() {
        let mut page = PageData::new();
        page.set("title", json!("Summer sale"));
        page.set("slug", json!("summer-sale"));

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value, json!({ "slug": "summer-sale", "title": "Summer sale" }));
        assert_eq!(page.title(), Some("Summer sale"));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = Snapshot::new(vec![Block::new("b1", "text")], PageData::new());
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());

        b.page_data.set("title", json!("Changed"));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
