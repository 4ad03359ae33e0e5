use serde::{Deserialize, Serialize};

use crate::model::{Document, DocumentId, DocumentStatus, Element, ElementId, ElementKind, Properties};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonPreview {
    pub document: DocumentSummary,
    pub elements: Vec<ElementProjection>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub title: Option<String>,
    pub status: DocumentStatus,
    pub pages: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// Machine-readable view of one element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementProjection {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub page: u32,
    pub position: Position,
    pub dimensions: Dimensions,
    pub z_index: u32,
    pub properties: Properties,
}

impl From<&Element> for ElementProjection {
    fn from(element: &Element) -> Self {
        ElementProjection {
            id: element.id,
            kind: element.kind,
            page: element.page_number,
            position: Position {
                x: element.x,
                y: element.y,
            },
            dimensions: Dimensions {
                width: element.width,
                height: element.height,
            },
            z_index: element.z_index,
            properties: element.properties.clone(),
        }
    }
}

pub(crate) fn project(document: &Document, page: Option<u32>) -> JsonPreview {
    let elements = match page {
        Some(page) => document.elements_on_page(page),
        None => document.ordered_elements(),
    };
    JsonPreview {
        document: DocumentSummary {
            id: document.id,
            title: document.title.clone(),
            status: document.status,
            pages: if page.is_some() { 1 } else { document.page_count() },
        },
        elements: elements.into_iter().map(ElementProjection::from).collect(),
    }
}
