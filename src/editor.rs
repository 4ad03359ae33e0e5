//! Structural edits on a document's elements.
//!
//! Every edit is followed by a full regeneration; there is no partial re-render.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};

use crate::error::Error;
use crate::generator::Generator;
use crate::model::{
    Attachment, Document, Element, ElementId, ElementKind, Properties, Snippet, SnippetKind,
    number,
};

#[derive(Clone, Debug)]
pub struct TextOptions {
    pub x: f32,
    pub y: f32,
    pub font: String,
    pub size: f32,
    pub color: String,
}

impl Default for TextOptions {
    fn default() -> Self {
        TextOptions {
            x: 50.0,
            y: 50.0,
            font: "Helvetica".to_string(),
            size: 12.0,
            color: "#000000".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BoxOptions {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for BoxOptions {
    fn default() -> Self {
        BoxOptions {
            x: 50.0,
            y: 50.0,
            width: 100.0,
            height: 100.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ShapeOptions {
    pub frame: BoxOptions,
    pub fill_color: Option<String>,
    pub stroke_color: String,
    pub line_width: f32,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        ShapeOptions {
            frame: BoxOptions::default(),
            fill_color: None,
            stroke_color: "#000000".to_string(),
            line_width: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    Url(String),
    Bytes(Vec<u8>),
}

impl From<&str> for ImageSource {
    /// Strings starting with `http` are URLs; anything else is treated as raw bytes.
    fn from(value: &str) -> Self {
        if value.starts_with("http") {
            ImageSource::Url(value.to_string())
        } else {
            ImageSource::Bytes(value.as_bytes().to_vec())
        }
    }
}

/// Partial update; `None` leaves the attribute alone.
#[derive(Clone, Debug, Default)]
pub struct ElementUpdate {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Shallow-merged into the existing properties.
    pub properties: Option<Properties>,
}

/// Caller override for where a general snippet lands.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnippetPosition {
    pub x: Option<f32>,
    pub y: Option<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Png,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "png" => Ok(ExportFormat::Png),
            other => Err(Error::UnsupportedFormat(format!("export format '{other}'"))),
        }
    }
}

pub struct EditorService<'d, 'g> {
    document: &'d mut Document,
    generator: &'d Generator<'g>,
}

impl<'d, 'g> EditorService<'d, 'g> {
    pub fn new(document: &'d mut Document, generator: &'d Generator<'g>) -> Self {
        EditorService {
            document,
            generator,
        }
    }

    pub fn document(&self) -> &Document {
        self.document
    }

    pub fn add_text(
        &mut self,
        page: u32,
        text: &str,
        options: TextOptions,
    ) -> Result<ElementId, Error> {
        self.ensure_page_exists(page);
        let element = Element::new(ElementKind::Text, page)
            .at(options.x, options.y)
            .with_property("content", text)
            .with_property("font_family", options.font)
            .with_property("font_size", options.size)
            .with_property("color", options.color);
        let id = self.document.push_element(element);
        self.regenerate()?;
        Ok(id)
    }

    pub fn add_image(
        &mut self,
        page: u32,
        source: ImageSource,
        options: BoxOptions,
    ) -> Result<ElementId, Error> {
        self.ensure_page_exists(page);
        let element = Element::new(ElementKind::Image, page)
            .at(options.x, options.y)
            .sized(options.width, options.height);
        let element = match source {
            ImageSource::Url(url) => element.with_property("image_url", url),
            ImageSource::Bytes(bytes) => element.with_property("image_data", BASE64.encode(bytes)),
        };
        let id = self.document.push_element(element);
        self.regenerate()?;
        Ok(id)
    }

    pub fn add_shape(
        &mut self,
        page: u32,
        shape_type: &str,
        options: ShapeOptions,
    ) -> Result<ElementId, Error> {
        self.ensure_page_exists(page);
        let frame = options.frame;
        let element = Element::new(ElementKind::Shape, page)
            .at(frame.x, frame.y)
            .sized(frame.width, frame.height)
            .with_property("shape_type", shape_type)
            .with_property("fill_color", options.fill_color)
            .with_property("stroke_color", options.stroke_color)
            .with_property("line_width", options.line_width);
        let id = self.document.push_element(element);
        self.regenerate()?;
        Ok(id)
    }

    pub fn update_element(&mut self, id: ElementId, update: ElementUpdate) -> Result<(), Error> {
        let element = self.document.element_mut(id)?;
        if let Some(x) = update.x {
            element.x = x;
        }
        if let Some(y) = update.y {
            element.y = y;
        }
        if let Some(width) = update.width {
            element.width = Some(width);
        }
        if let Some(height) = update.height {
            element.height = Some(height);
        }
        if let Some(properties) = update.properties {
            element.properties.extend(properties);
        }
        self.regenerate()
    }

    pub fn delete_element(&mut self, id: ElementId) -> Result<Element, Error> {
        let removed = self.document.remove_element(id)?;
        self.regenerate()?;
        Ok(removed)
    }

    pub fn bring_to_front(&mut self, id: ElementId) -> Result<u32, Error> {
        let z = self.document.bring_to_front(id)?;
        self.regenerate()?;
        Ok(z)
    }

    pub fn send_to_back(&mut self, id: ElementId) -> Result<(), Error> {
        self.document.send_to_back(id)?;
        self.regenerate()
    }

    /// Append an empty page and return its number.
    pub fn add_page(&mut self) -> Result<u32, Error> {
        let page = self.document.max_page_number().unwrap_or(0) + 1;
        self.document.push_element(placeholder(page));
        self.regenerate()?;
        Ok(page)
    }

    /// Remove page `page` and shift every later page down by one.
    pub fn delete_page(&mut self, page: u32) -> Result<(), Error> {
        self.document.elements.retain(|e| e.page_number != page);
        for element in self.document.elements.iter_mut().filter(|e| e.page_number > page) {
            element.page_number -= 1;
        }
        self.regenerate()
    }

    /// `new_order[i]` is the old page number that becomes page `i + 1`.
    ///
    /// Pages are first staged above every page number in use and only then
    /// moved to their final numbers, so overlapping moves never collide.
    pub fn reorder_pages(&mut self, new_order: &[u32]) -> Result<(), Error> {
        let page_count = self.document.page_count();
        let mut sorted = new_order.to_vec();
        sorted.sort_unstable();
        if sorted.len() != page_count as usize || sorted.iter().zip(1..).any(|(p, n)| *p != n) {
            return Err(Error::InvalidPageOrder(format!(
                "{new_order:?} is not a permutation of pages 1..={page_count}"
            )));
        }

        let offset = self
            .document
            .max_page_number()
            .unwrap_or(0)
            .max(page_count);
        for (index, &old_page) in new_order.iter().enumerate() {
            let staged = offset + index as u32 + 1;
            for element in self
                .document
                .elements
                .iter_mut()
                .filter(|e| e.page_number == old_page)
            {
                element.page_number = staged;
            }
        }
        for element in self
            .document
            .elements
            .iter_mut()
            .filter(|e| e.page_number > offset)
        {
            element.page_number -= offset;
        }

        self.regenerate()
    }

    /// Materialise `snippet` on `page` and return the new element ids.
    pub fn apply_snippet(
        &mut self,
        snippet: &Snippet,
        page: u32,
        position: SnippetPosition,
    ) -> Result<Vec<ElementId>, Error> {
        let elements = match snippet.snippet_type {
            Some(SnippetKind::Header) => vec![banner_element(snippet, page, &HEADER)],
            Some(SnippetKind::Footer) => vec![banner_element(snippet, page, &FOOTER)],
            Some(SnippetKind::Watermark) => vec![watermark_element(snippet, page)],
            _ => general_elements(snippet, page, position),
        };
        let ids = elements
            .into_iter()
            .map(|element| self.document.push_element(element))
            .collect();
        self.regenerate()?;
        Ok(ids)
    }

    pub fn export(&mut self, format: ExportFormat) -> Result<Attachment, Error> {
        match format {
            ExportFormat::Pdf => {
                if self.document.generated_file.is_none() {
                    self.regenerate()?;
                }
                self.document
                    .generated_file
                    .clone()
                    .ok_or_else(|| Error::Storage("document has no generated file".into()))
            }
            ExportFormat::Png => Err(Error::NotImplemented("PNG export".into())),
        }
    }

    /// Hidden placeholders for every page between the last one and `page`.
    /// Does not regenerate on its own.
    pub fn ensure_page_exists(&mut self, page: u32) {
        let max_page = self.document.max_page_number().unwrap_or(0);
        for missing in (max_page + 1)..=page {
            self.document.push_element(placeholder(missing));
        }
    }

    fn regenerate(&mut self) -> Result<(), Error> {
        self.generator.generate(self.document).map(|_| ())
    }
}

fn placeholder(page: u32) -> Element {
    Element::new(ElementKind::Text, page)
        .at(-1000.0, -1000.0)
        .with_property("content", "")
        .with_property("hidden", true)
}

struct BannerDefaults {
    y: f32,
    size: f32,
    color: &'static str,
}

const HEADER: BannerDefaults = BannerDefaults {
    y: 750.0,
    size: 14.0,
    color: "#000000",
};

const FOOTER: BannerDefaults = BannerDefaults {
    y: 50.0,
    size: 10.0,
    color: "#666666",
};

fn prop_number(snippet: &Snippet, key: &str) -> Option<f32> {
    snippet.properties.get(key).and_then(number)
}

fn prop_str<'s>(snippet: &'s Snippet, key: &str) -> Option<&'s str> {
    snippet.properties.get(key).and_then(Value::as_str)
}

fn banner_element(snippet: &Snippet, page: u32, defaults: &BannerDefaults) -> Element {
    let content = snippet
        .content
        .clone()
        .or_else(|| prop_str(snippet, "content").map(str::to_string))
        .unwrap_or_default();
    Element::new(ElementKind::Text, page)
        .at(
            prop_number(snippet, "x").unwrap_or(50.0),
            prop_number(snippet, "y").unwrap_or(defaults.y),
        )
        .with_property("content", content)
        .with_property("font_family", prop_str(snippet, "font").unwrap_or("Helvetica"))
        .with_property("font_size", prop_number(snippet, "size").unwrap_or(defaults.size))
        .with_property("color", prop_str(snippet, "color").unwrap_or(defaults.color))
}

fn watermark_element(snippet: &Snippet, page: u32) -> Element {
    Element::new(ElementKind::Text, page)
        .at(
            prop_number(snippet, "x").unwrap_or(200.0),
            prop_number(snippet, "y").unwrap_or(400.0),
        )
        .with_property("content", snippet.content.clone().unwrap_or_default())
        .with_property("font_family", prop_str(snippet, "font").unwrap_or("Helvetica"))
        .with_property("font_size", prop_number(snippet, "size").unwrap_or(48.0))
        .with_property("color", prop_str(snippet, "color").unwrap_or("#CCCCCC"))
        .with_property("rotation", prop_number(snippet, "rotation").unwrap_or(45.0))
        .with_property("opacity", prop_number(snippet, "opacity").unwrap_or(0.3))
}

/// A JSON array of element definitions, or failing that a single text element.
fn general_elements(snippet: &Snippet, page: u32, position: SnippetPosition) -> Vec<Element> {
    let content = snippet.content.as_deref().unwrap_or_default();
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(definitions)) => definitions
            .iter()
            .filter_map(|def| definition_element(def, page, position))
            .collect(),
        Ok(_) => {
            log::debug!("snippet '{}' content is not an element list", snippet.name);
            Vec::new()
        }
        Err(_) => {
            let mut properties = Properties::new();
            properties.insert("content".into(), json!(content));
            properties.extend(snippet.properties.clone());
            vec![
                Element::new(ElementKind::Text, page)
                    .at(position.x.unwrap_or(50.0), position.y.unwrap_or(50.0))
                    .with_properties(properties),
            ]
        }
    }
}

fn definition_element(def: &Value, page: u32, position: SnippetPosition) -> Option<Element> {
    let kind_name = def.get("type").and_then(Value::as_str).unwrap_or("text");
    let Some(kind) = ElementKind::parse(kind_name) else {
        log::warn!("skipping snippet element with unknown type '{kind_name}'");
        return None;
    };
    let mut element = Element::new(kind, page).at(
        position
            .x
            .or_else(|| def.get("x").and_then(number))
            .unwrap_or(50.0),
        position
            .y
            .or_else(|| def.get("y").and_then(number))
            .unwrap_or(50.0),
    );
    element.width = def.get("width").and_then(number);
    element.height = def.get("height").and_then(number);
    if let Some(Value::Object(properties)) = def.get("properties") {
        element.properties = properties.clone();
    }
    Some(element)
}
