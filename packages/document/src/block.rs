use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open string-keyed configuration map.
///
/// Values are arbitrary JSON (string, number, bool, nested map, array). The
/// shape of each partition is owned by the template catalog, not by the tree.
pub type ConfigMap = serde_json::Map<String, Value>;

/// Block variant. Only the container variants may own children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerType {
    #[default]
    Block,
    Section,
    Flexbox,
    Grid,
}

impl ContainerType {
    pub fn is_container(self) -> bool {
        !matches!(self, ContainerType::Block)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContainerType::Block => "BLOCK",
            ContainerType::Section => "SECTION",
            ContainerType::Flexbox => "FLEXBOX",
            ContainerType::Grid => "GRID",
        }
    }
}

/// One of the three independently edited config partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigTab {
    Content,
    Style,
    Advanced,
}

/// Layout parameters carried by container blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justify: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap: Option<bool>,

    /// Anything the catalog adds that the core does not interpret
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl LayoutSettings {
    /// Default layout seeded when a container of the given type is created
    pub fn for_container(container_type: ContainerType) -> Option<Self> {
        match container_type {
            ContainerType::Block => None,
            ContainerType::Section => Some(Self {
                direction: Some("column".to_string()),
                ..Self::default()
            }),
            ContainerType::Flexbox => Some(Self {
                direction: Some("row".to_string()),
                gap: Some("16px".to_string()),
                wrap: Some(false),
                ..Self::default()
            }),
            ContainerType::Grid => Some(Self {
                columns: Some(2),
                gap: Some("16px".to_string()),
                ..Self::default()
            }),
        }
    }
}

/// A node in the page document.
///
/// The authoritative form is a flat list linked by `parent_id`. `children`
/// is only populated while the list is materialized as a tree by
/// [`crate::build_block_tree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub template_id: String,

    #[serde(default)]
    pub container_type: ContainerType,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub order: i64,

    #[serde(default = "default_visible")]
    pub is_visible: bool,

    #[serde(default)]
    pub content_config: ConfigMap,

    #[serde(default)]
    pub style_config: ConfigMap,

    #[serde(default)]
    pub advanced_config: ConfigMap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_settings: Option<LayoutSettings>,

    /// User-assigned display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

fn default_visible() -> bool {
    true
}

impl Block {
    /// Create a visible leaf block with empty config
    pub fn new(id: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            template_id: template_id.into(),
            container_type: ContainerType::Block,
            parent_id: None,
            order: 0,
            is_visible: true,
            content_config: ConfigMap::new(),
            style_config: ConfigMap::new(),
            advanced_config: ConfigMap::new(),
            layout_settings: None,
            label: None,
            children: Vec::new(),
        }
    }

    /// Create an empty container of the given variant with its default layout
    pub fn container(
        id: impl Into<String>,
        template_id: impl Into<String>,
        container_type: ContainerType,
    ) -> Self {
        Self {
            container_type,
            layout_settings: LayoutSettings::for_container(container_type),
            ..Self::new(id, template_id)
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_content(mut self, key: impl Into<String>, value: Value) -> Self {
        self.content_config.insert(key.into(), value);
        self
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    pub fn is_container(&self) -> bool {
        self.container_type.is_container()
    }

    /// Label shown in layer panels and matched by search
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.template_id)
    }

    pub fn config(&self, tab: ConfigTab) -> &ConfigMap {
        match tab {
            ConfigTab::Content => &self.content_config,
            ConfigTab::Style => &self.style_config,
            ConfigTab::Advanced => &self.advanced_config,
        }
    }

    pub fn config_mut(&mut self, tab: ConfigTab) -> &mut ConfigMap {
        match tab {
            ConfigTab::Content => &mut self.content_config,
            ConfigTab::Style => &mut self.style_config,
            ConfigTab::Advanced => &mut self.advanced_config,
        }
    }

    /// Copy of this block without its materialized children
    pub fn detached(&self) -> Block {
        Block {
            id: self.id.clone(),
            template_id: self.template_id.clone(),
            container_type: self.container_type,
            parent_id: self.parent_id.clone(),
            order: self.order,
            is_visible: self.is_visible,
            content_config: self.content_config.clone(),
            style_config: self.style_config.clone(),
            advanced_config: self.advanced_config.clone(),
            layout_settings: self.layout_settings.clone(),
            label: self.label.clone(),
            children: Vec::new(),
        }
    }
}

/// Partial update merged into a block by [`crate::update_block_in_tree`].
/// Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockPatch {
    pub template_id: Option<String>,
    pub container_type: Option<ContainerType>,
    pub is_visible: Option<bool>,
    pub order: Option<i64>,
    pub content_config: Option<ConfigMap>,
    pub style_config: Option<ConfigMap>,
    pub advanced_config: Option<ConfigMap>,
    pub layout_settings: Option<Option<LayoutSettings>>,
    pub label: Option<Option<String>>,
}

impl BlockPatch {
    /// Patch replacing one config partition
    pub fn config(tab: ConfigTab, config: ConfigMap) -> Self {
        let mut patch = Self::default();
        match tab {
            ConfigTab::Content => patch.content_config = Some(config),
            ConfigTab::Style => patch.style_config = Some(config),
            ConfigTab::Advanced => patch.advanced_config = Some(config),
        }
        patch
    }

    pub fn visibility(is_visible: bool) -> Self {
        Self {
            is_visible: Some(is_visible),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, block: &mut Block) {
        if let Some(template_id) = &self.template_id {
            block.template_id = template_id.clone();
        }
        if let Some(container_type) = self.container_type {
            block.container_type = container_type;
        }
        if let Some(is_visible) = self.is_visible {
            block.is_visible = is_visible;
        }
        if let Some(order) = self.order {
            block.order = order;
        }
        if let Some(config) = &self.content_config {
            block.content_config = config.clone();
        }
        if let Some(config) = &self.style_config {
            block.style_config = config.clone();
        }
        if let Some(config) = &self.advanced_config {
            block.advanced_config = config.clone();
        }
        if let Some(layout) = &self.layout_settings {
            block.layout_settings = layout.clone();
        }
        if let Some(label) = &self.label {
            block.label = label.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_serializes_camel_case() {
        let block = Block::new("b1", "heading").with_parent("s1").with_order(2);
        let value = serde_json::to_value(&block).unwrap();

        assert_eq!(value["templateId"], "heading");
        assert_eq!(value["containerType"], "BLOCK");
        assert_eq!(value["parentId"], "s1");
        assert_eq!(value["isVisible"], true);
        // Derived children are not persisted
        assert!(value.get("children").is_none());
    }

    #[test]
    fn test_block_deserializes_with_defaults() {
        let block: Block = serde_json::from_value(json!({
            "id": "b1",
            "templateId": "text",
            "contentConfig": { "text": "Hello", "level": 2, "nested": { "a": [1, 2] } }
        }))
        .unwrap();

        assert_eq!(block.container_type, ContainerType::Block);
        assert!(block.is_visible);
        assert_eq!(block.parent_id, None);
        assert_eq!(block.content_config["level"], json!(2));
    }

    #[test]
    fn test_container_gets_layout() {
        let grid = Block::container("g", "grid-container", ContainerType::Grid);
        assert_eq!(grid.layout_settings.as_ref().unwrap().columns, Some(2));

        let leaf = Block::new("l", "text");
        assert!(leaf.layout_settings.is_none());
    }

    #[test]
    fn test_display_label_falls_back_to_template() {
        let block = Block::new("b1", "heading");
        assert_eq!(block.display_label(), "heading");
        assert_eq!(block.with_label("Hero title").display_label(), "Hero title");
    }

    #[test]
    fn test_patch_only_touches_set_fields() {
        let mut block = Block::new("b1", "text").with_content("text", json!("hi"));
        let mut style = ConfigMap::new();
        style.insert("color".to_string(), json!("red"));

        BlockPatch::config(ConfigTab::Style, style).apply_to(&mut block);

        assert_eq!(block.style_config["color"], json!("red"));
        assert_eq!(block.content_config["text"], json!("hi"));
        assert!(block.is_visible);
    }
}
