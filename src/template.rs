use std::sync::Arc;

use serde_json::Value;

use crate::interpolate::{deep_merge, interpolate_value};
use crate::model::{Document, Element, ElementKind, Properties, Template, number};

/// Instantiates a document from a template and caller-supplied data.
pub struct TemplateProcessor {
    template: Arc<Template>,
    data: Properties,
}

impl TemplateProcessor {
    pub fn new(template: Arc<Template>, data: Properties) -> Self {
        TemplateProcessor { template, data }
    }

    /// Template defaults with caller data layered on top.
    pub fn merged_data(&self) -> Properties {
        deep_merge(&self.template.default_data, &self.data)
    }

    pub fn process(&self) -> Document {
        let merged = self.merged_data();
        let mut document = Document::new(None);
        document.template = Some(Arc::clone(&self.template));
        document.metadata = self.template.metadata();

        for definition in self.template.element_definitions() {
            if let Some(element) = element_from_definition(definition, &merged) {
                document.push_element(element);
            }
        }

        document.content_data = merged;
        log::debug!(
            "instantiated template '{}' with {} elements",
            self.template.name,
            document.elements.len()
        );
        document
    }
}

fn element_from_definition(definition: &Value, data: &Properties) -> Option<Element> {
    if !definition.is_object() {
        log::warn!("skipping template element definition that is not an object");
        return None;
    }
    let mut processed = definition.clone();
    interpolate_value(&mut processed, data);
    let def = processed.as_object()?;

    let kind = match def.get("type").and_then(Value::as_str) {
        None => ElementKind::Text,
        Some(name) => match ElementKind::parse(name) {
            Some(kind) => kind,
            None => {
                log::warn!("skipping template element with unknown type '{name}'");
                return None;
            }
        },
    };

    let page = def
        .get("page")
        .or_else(|| def.get("page_number"))
        .and_then(number)
        .map(|p| p.round().max(1.0) as u32)
        .unwrap_or(1);
    let z_index = def
        .get("z_index")
        .and_then(number)
        .map(|z| z.round().max(0.0) as u32)
        .unwrap_or(0);

    let mut element = Element::new(kind, page)
        .at(
            def.get("x").and_then(number).unwrap_or(0.0),
            def.get("y").and_then(number).unwrap_or(0.0),
        )
        .with_z_index(z_index);
    element.width = def.get("width").and_then(number);
    element.height = def.get("height").and_then(number);
    if let Some(Value::Object(properties)) = def.get("properties") {
        element.properties = properties.clone();
    }
    Some(element)
}
