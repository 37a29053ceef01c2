use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geometric bounds as reported by the host: `[left, top, right, bottom]` in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct HostBounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl From<[f64; 4]> for HostBounds {
    fn from([left, top, right, bottom]: [f64; 4]) -> Self {
        Self { left, top, right, bottom }
    }
}

impl From<HostBounds> for [f64; 4] {
    fn from(bounds: HostBounds) -> Self {
        [bounds.left, bounds.top, bounds.right, bounds.bottom]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Path,
    CompoundPath,
    Group,
    Text,
    Placed,
    Rectangle,
    Polyline,
    Polygon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageItem {
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    pub kind: ItemKind,
    /// `None` when the host could not report geometry for the item.
    #[serde(default)]
    pub bounds: Option<HostBounds>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PageItem>,
}

impl PageItem {
    pub fn new(id: ObjectId, kind: ItemKind) -> Self {
        Self {
            id,
            name: String::new(),
            kind,
            bounds: None,
            points: Vec::new(),
            contents: None,
            stroke: None,
            fill: None,
            tags: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_bounds(mut self, bounds: HostBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_children(mut self, children: Vec<PageItem>) -> Self {
        self.children = children;
        self
    }

    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    fn find(&self, id: ObjectId) -> Option<&PageItem> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    fn find_mut(&mut self, id: ObjectId) -> Option<&mut PageItem> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    fn max_id(&self) -> u64 {
        self.children.iter().map(PageItem::max_id).fold(self.id.0, u64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    #[serde(default)]
    pub items: Vec<PageItem>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), items: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Object ids currently selected in the host, in selection order.
    #[serde(default)]
    pub selection: Vec<ObjectId>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), layers: Vec::new(), selection: Vec::new() }
    }

    pub fn find_item(&self, id: ObjectId) -> Option<&PageItem> {
        self.layers.iter().flat_map(|layer| layer.items.iter()).find_map(|item| item.find(id))
    }

    pub fn find_item_mut(&mut self, id: ObjectId) -> Option<&mut PageItem> {
        self.layers
            .iter_mut()
            .flat_map(|layer| layer.items.iter_mut())
            .find_map(|item| item.find_mut(id))
    }

    /// Layer holding `id`, at any depth.
    pub fn layer_of(&self, id: ObjectId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.items.iter().any(|item| item.find(id).is_some()))
    }

    /// Next id not used anywhere in the tree.
    pub fn next_object_id(&self) -> ObjectId {
        let max = self
            .layers
            .iter()
            .flat_map(|layer| layer.items.iter())
            .map(PageItem::max_id)
            .max()
            .unwrap_or(0);
        ObjectId(max + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    /// `#RRGGBB`
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialCatalog {
    #[serde(default)]
    pub materials: BTreeMap<String, MaterialEntry>,
}

impl MaterialCatalog {
    pub fn get(&self, name: &str) -> Option<&MaterialEntry> {
        self.materials.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: MaterialEntry) -> Option<MaterialEntry> {
        self.materials.insert(name.into(), entry)
    }

    pub fn remove(&mut self, name: &str) -> Option<MaterialEntry> {
        self.materials.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("object {0} does not exist in the document")]
    UnknownObject(ObjectId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentAction {
    /// Replaces the value of an existing tag with the same name, or appends a new tag.
    SetTag { object_id: ObjectId, name: String, value: String },
    RemoveTag { object_id: ObjectId, name: String },
    RenameItem { object_id: ObjectId, name: String },
    /// Appends to the named layer, creating it when missing.
    AddItem { layer: String, item: PageItem },
    SetSelection { ids: Vec<ObjectId> },
}

pub fn apply_document_action(
    document: &mut Document,
    action: DocumentAction,
) -> Result<(), ModelError> {
    match action {
        DocumentAction::SetTag { object_id, name, value } => {
            let item =
                document.find_item_mut(object_id).ok_or(ModelError::UnknownObject(object_id))?;
            match item.tags.iter_mut().find(|tag| tag.name == name) {
                Some(tag) => tag.value = value,
                None => item.tags.push(Tag { name, value }),
            }
        }
        DocumentAction::RemoveTag { object_id, name } => {
            let item =
                document.find_item_mut(object_id).ok_or(ModelError::UnknownObject(object_id))?;
            item.tags.retain(|tag| tag.name != name);
        }
        DocumentAction::RenameItem { object_id, name } => {
            let item =
                document.find_item_mut(object_id).ok_or(ModelError::UnknownObject(object_id))?;
            item.name = name;
        }
        DocumentAction::AddItem { layer, item } => {
            let index = match document.layers.iter().position(|l| l.name == layer) {
                Some(index) => index,
                None => {
                    document.layers.push(Layer::new(layer));
                    document.layers.len() - 1
                }
            };
            document.layers[index].items.push(item);
        }
        DocumentAction::SetSelection { ids } => {
            if let Some(missing) = ids.iter().find(|id| document.find_item(**id).is_none()) {
                return Err(ModelError::UnknownObject(*missing));
            }
            document.selection = ids;
        }
    }

    Ok(())
}
