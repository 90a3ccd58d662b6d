//! Template catalog seam.
//!
//! The catalog itself lives outside the editor core; the editor only needs
//! to look templates up by slug or id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pagecraft_document::{Block, ConfigMap, ContainerType};

pub const SECTION_CONTAINER_SLUG: &str = "section-container";
pub const FLEXBOX_CONTAINER_SLUG: &str = "flexbox-container";
pub const GRID_CONTAINER_SLUG: &str = "grid-container";
pub const GENERIC_CONTAINER_SLUG: &str = "container";

/// Catalog record for a block type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub slug: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub default_config: DefaultConfig,

    /// Opaque to the editor; validated by the catalog
    #[serde(default)]
    pub config_schema: Value,
}

impl Template {
    pub fn new(id: impl Into<String>, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id: id.into(),
            name: slug.clone(),
            slug,
            default_config: DefaultConfig::default(),
            config_schema: Value::Null,
        }
    }

    pub fn with_default_content(mut self, key: impl Into<String>, value: Value) -> Self {
        self.default_config.content.insert(key.into(), value);
        self
    }
}

/// Initial values for the three config partitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultConfig {
    #[serde(default)]
    pub content: ConfigMap,

    #[serde(default)]
    pub style: ConfigMap,

    #[serde(default)]
    pub advanced: ConfigMap,
}

impl DefaultConfig {
    pub fn apply_to(&self, block: &mut Block) {
        block.content_config = self.content.clone();
        block.style_config = self.style.clone();
        block.advanced_config = self.advanced.clone();
    }
}

pub trait TemplateCatalog {
    fn by_slug(&self, slug: &str) -> Option<&Template>;

    fn by_id(&self, id: &str) -> Option<&Template>;
}

/// Well-known template slug for each container variant. `Block` maps to the
/// generic container.
pub fn container_template_slug(container_type: ContainerType) -> &'static str {
    match container_type {
        ContainerType::Section => SECTION_CONTAINER_SLUG,
        ContainerType::Flexbox => FLEXBOX_CONTAINER_SLUG,
        ContainerType::Grid => GRID_CONTAINER_SLUG,
        ContainerType::Block => GENERIC_CONTAINER_SLUG,
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    templates: Vec<Template>,
}

impl InMemoryCatalog {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn insert(&mut self, template: Template) {
        self.templates.retain(|t| t.id != template.id);
        self.templates.push(template);
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FromIterator<Template> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Template>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl TemplateCatalog for InMemoryCatalog {
    fn by_slug(&self, slug: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.slug == slug)
    }

    fn by_id(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_container_slugs() {
        assert_eq!(container_template_slug(ContainerType::Section), "section-container");
        assert_eq!(container_template_slug(ContainerType::Flexbox), "flexbox-container");
        assert_eq!(container_template_slug(ContainerType::Grid), "grid-container");
        assert_eq!(container_template_slug(ContainerType::Block), "container");
    }

    #[test]
    fn test_lookup() {
        let catalog: InMemoryCatalog = vec![
            Template::new("t-1", "heading"),
            Template::new("t-2", "section-container"),
        ]
        .into_iter()
        .collect();

        assert_eq!(catalog.by_slug("heading").map(|t| t.id.as_str()), Some("t-1"));
        assert_eq!(catalog.by_id("t-2").map(|t| t.slug.as_str()), Some("section-container"));
        assert!(catalog.by_slug("grid-container").is_none());
    }

    #[test]
    fn test_template_deserializes_from_catalog_json() {
        let template: Template = serde_json::from_value(json!({
            "id": "t-9",
            "slug": "button",
            "defaultConfig": { "content": { "label": "Buy now" } },
            "configSchema": { "type": "object" }
        }))
        .unwrap();

        assert_eq!(template.default_config.content["label"], json!("Buy now"));
        assert!(template.default_config.style.is_empty());
    }
}
