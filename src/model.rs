use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::services::JobQueue;

pub type DocumentId = u64;
pub type ElementId = u64;

/// Schema-less key/value bag used for element properties, metadata and content data.
pub type Properties = serde_json::Map<String, Value>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }

    /// Any state may (re)enter processing; only processing may finish.
    pub fn can_transition_to(self, next: DocumentStatus) -> bool {
        match next {
            DocumentStatus::Processing => true,
            DocumentStatus::Completed | DocumentStatus::Failed => {
                self == DocumentStatus::Processing
            }
            DocumentStatus::Draft => false,
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Image,
    Shape,
    Line,
    Table,
    Signature,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Image => "image",
            ElementKind::Shape => "shape",
            ElementKind::Line => "line",
            ElementKind::Table => "table",
            ElementKind::Signature => "signature",
        }
    }

    pub fn parse(value: &str) -> Option<ElementKind> {
        match value {
            "text" => Some(ElementKind::Text),
            "image" => Some(ElementKind::Image),
            "shape" => Some(ElementKind::Shape),
            "line" => Some(ElementKind::Line),
            "table" => Some(ElementKind::Table),
            "signature" => Some(ElementKind::Signature),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn first_page() -> u32 {
    1
}

/// One positioned visual object. Coordinates are PDF points, bottom-left origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default = "first_page", alias = "page")]
    pub page_number: u32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub z_index: u32,
    #[serde(default)]
    pub properties: Properties,
}

impl Element {
    pub fn new(kind: ElementKind, page_number: u32) -> Self {
        Element {
            id: 0,
            kind,
            page_number,
            x: 0.0,
            y: 0.0,
            width: None,
            height: None,
            z_index: 0,
            properties: Properties::new(),
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_z_index(mut self, z_index: u32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = Some(width);
        self.height = Some(height);
    }

    pub fn content(&self) -> Option<&Value> {
        self.properties.get("content")
    }

    pub fn styles(&self) -> Option<&Properties> {
        self.properties.get("styles").and_then(Value::as_object)
    }

    /// Content as a display string; missing content is empty.
    pub fn text_content(&self) -> String {
        match self.content() {
            None | Some(Value::Null) => String::new(),
            Some(value) => display_value(value),
        }
    }

    /// Look a presentation attribute up on the flat bag first, then under `styles`.
    pub fn style(&self, key: &str) -> Option<&Value> {
        self.properties
            .get(key)
            .filter(|v| !v.is_null())
            .or_else(|| self.styles().and_then(|s| s.get(key)).filter(|v| !v.is_null()))
    }

    pub fn style_str(&self, key: &str) -> Option<&str> {
        self.style(key).and_then(Value::as_str)
    }

    pub fn style_number(&self, key: &str) -> Option<f32> {
        self.style(key).and_then(number)
    }

    pub fn is_hidden(&self) -> bool {
        self.style("hidden").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Flat projection: type, position, dimensions and every property key.
    pub fn render_properties(&self) -> Value {
        let mut out = Properties::new();
        out.insert("type".into(), Value::from(self.kind.as_str()));
        out.insert("position".into(), serde_json::json!({ "x": self.x, "y": self.y }));
        out.insert(
            "dimensions".into(),
            serde_json::json!({ "width": self.width, "height": self.height }),
        );
        for (key, value) in &self.properties {
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out)
    }
}

/// Numeric property value; numeric strings are accepted.
pub fn number(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
}

/// Render a JSON value as text the way it should appear on a page.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Stable sort by `(page_number, z_index)`; ties keep creation order.
pub fn paint_order<'a, I>(elements: I) -> Vec<&'a Element>
where
    I: IntoIterator<Item = &'a Element>,
{
    let mut ordered: Vec<&Element> = elements.into_iter().collect();
    ordered.sort_by_key(|e| (e.page_number, e.z_index));
    ordered
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
}

impl Owner {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Reference to generated output handed to the storage collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub reference: String,
    pub filename: String,
    pub content_type: String,
    pub byte_size: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub version_number: u32,
    #[serde(default)]
    pub changes: Properties,
    #[serde(default)]
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Version {
    pub fn description(&self) -> String {
        if self.changes.is_empty() {
            format!("Version {}", self.version_number)
        } else {
            let keys: Vec<&str> = self.changes.keys().map(String::as_str).collect();
            format!("Version {} - {}", self.version_number, keys.join(", "))
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: DocumentId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub metadata: Properties,
    #[serde(default)]
    pub content_data: Properties,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub template: Option<Arc<Template>>,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub generated_file: Option<Attachment>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub versions: Vec<Version>,
    /// Lower bound for the next element id; ids are never handed out twice.
    #[serde(default)]
    next_element_id: ElementId,
}

impl Document {
    /// A draft document; without a title it gets a dated placeholder.
    pub fn new(title: Option<String>) -> Self {
        let title = title.unwrap_or_else(|| {
            format!("Untitled Document {}", Utc::now().format("%Y-%m-%d"))
        });
        Document {
            title: Some(title),
            ..Document::default()
        }
    }

    /// Assign the element a fresh id and append it.
    pub fn push_element(&mut self, mut element: Element) -> ElementId {
        let after_existing = self.elements.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let id = self.next_element_id.max(after_existing);
        self.next_element_id = id + 1;
        element.id = id;
        self.elements.push(element);
        id
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Result<&mut Element, Error> {
        self.elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(Error::ElementNotFound(id))
    }

    pub fn remove_element(&mut self, id: ElementId) -> Result<Element, Error> {
        let index = self
            .elements
            .iter()
            .position(|e| e.id == id)
            .ok_or(Error::ElementNotFound(id))?;
        Ok(self.elements.remove(index))
    }

    pub fn ordered_elements(&self) -> Vec<&Element> {
        paint_order(&self.elements)
    }

    pub fn elements_on_page(&self, page: u32) -> Vec<&Element> {
        paint_order(self.elements.iter().filter(|e| e.page_number == page))
    }

    pub fn max_page_number(&self) -> Option<u32> {
        self.elements.iter().map(|e| e.page_number).max()
    }

    /// Highest page number in use, or 1 for an empty document.
    pub fn page_count(&self) -> u32 {
        self.max_page_number().unwrap_or(1)
    }

    pub fn transition_to(&mut self, next: DocumentStatus) -> Result<(), Error> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Mark the document as processing and hand it to the background queue.
    pub fn request_generation(&mut self, queue: &dyn JobQueue) -> Result<(), Error> {
        self.transition_to(DocumentStatus::Processing)?;
        queue.enqueue(self.id)
    }

    /// Failure is recorded regardless of the current state.
    pub fn mark_failed(&mut self) {
        self.status = DocumentStatus::Failed;
    }

    /// Raise the element above everything else on its page.
    pub fn bring_to_front(&mut self, id: ElementId) -> Result<u32, Error> {
        let page = self.element(id).ok_or(Error::ElementNotFound(id))?.page_number;
        let max_z = self
            .elements
            .iter()
            .filter(|e| e.page_number == page)
            .map(|e| e.z_index)
            .max()
            .unwrap_or(0);
        let element = self.element_mut(id)?;
        element.z_index = max_z + 1;
        Ok(element.z_index)
    }

    /// Put the element at z 0 and push every other element on its page up by one.
    pub fn send_to_back(&mut self, id: ElementId) -> Result<(), Error> {
        let page = self.element(id).ok_or(Error::ElementNotFound(id))?.page_number;
        for element in self.elements.iter_mut().filter(|e| e.page_number == page) {
            if element.id == id {
                element.z_index = 0;
            } else {
                element.z_index += 1;
            }
        }
        Ok(())
    }

    /// Copy of the document and its elements without generated output or history.
    pub fn duplicate(&self) -> Document {
        let mut copy = Document {
            id: 0,
            title: self.title.clone(),
            metadata: self.metadata.clone(),
            content_data: self.content_data.clone(),
            status: self.status,
            template: self.template.clone(),
            owner: self.owner.clone(),
            ..Document::default()
        };
        for element in &self.elements {
            copy.push_element(element.clone());
        }
        copy
    }

    pub fn create_version(&mut self, user: Option<String>, changes: Properties) -> &Version {
        let version_number = self
            .versions
            .iter()
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1;
        self.versions.push(Version {
            version_number,
            changes,
            user,
            created_at: Utc::now(),
        });
        &self.versions[self.versions.len() - 1]
    }

    /// Slug of the title used for the generated file name.
    pub fn file_stem(&self) -> String {
        let stem = slug::slugify(self.title.as_deref().unwrap_or_default());
        if stem.is_empty() {
            format!("document-{}", self.id)
        } else {
            stem
        }
    }
}

/// Reusable blueprint: page setup, parameterised element definitions and default data.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub structure: Properties,
    #[serde(default)]
    pub default_data: Properties,
    #[serde(default)]
    usage_count: AtomicU64,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Template {
            name: name.into(),
            ..Template::default()
        }
    }

    pub fn with_structure(mut self, structure: Properties) -> Self {
        self.structure = structure;
        self
    }

    pub fn with_default_data(mut self, default_data: Properties) -> Self {
        self.default_data = default_data;
        self
    }

    pub fn usage_count(&self) -> u64 {
        self.usage_count.load(Ordering::SeqCst)
    }

    pub fn increment_usage(&self) -> u64 {
        self.usage_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn has_structure(&self) -> bool {
        !self.structure.is_empty()
    }

    /// Element definitions; anything other than an array means none.
    pub fn element_definitions(&self) -> &[Value] {
        self.structure
            .get("elements")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn metadata(&self) -> Properties {
        self.structure
            .get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    pub fn page_size(&self) -> Option<&Value> {
        self.structure.get("page_size").filter(|v| !v.is_null())
    }

    pub fn margins(&self) -> Option<&Value> {
        self.structure.get("margins").filter(|v| !v.is_null())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetKind {
    Header,
    Footer,
    Watermark,
    Signature,
    Table,
    Chart,
    Image,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snippet {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub snippet_type: Option<SnippetKind>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}
