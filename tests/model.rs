mod common;

use common::properties;
use pagecraft::model::paint_order;
use pagecraft::services::MemoryQueue;
use pagecraft::{
    Color, Document, DocumentStatus, Element, ElementKind, Error, Owner, Template, Version,
};
use serde_json::json;

fn text(page: u32, z: u32, content: &str) -> Element {
    Element::new(ElementKind::Text, page)
        .with_z_index(z)
        .with_property("content", content)
}

#[test]
fn color_parsing() {
    assert_eq!(Color::parse("#FF0000").components(), (1.0, 0.0, 0.0));

    let (r, g, b) = Color::parse("255,128,0").components();
    assert_eq!(r, 1.0);
    assert!((g - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(b, 0.0);

    assert_eq!(Color::parse("not-a-color"), Color::BLACK);
    assert_eq!(Color::parse("#12"), Color::BLACK);
    assert_eq!(Color::parse("300,0,0"), Color::BLACK);
    assert_eq!(Color::parse("1,2"), Color::BLACK);
}

#[test]
fn paint_order_is_page_then_z_then_creation() {
    let mut doc = Document::new(Some("Order".into()));
    doc.push_element(text(2, 0, "p2"));
    doc.push_element(text(1, 5, "top"));
    doc.push_element(text(1, 0, "first"));
    doc.push_element(text(1, 0, "second"));

    let order: Vec<String> = doc
        .ordered_elements()
        .iter()
        .map(|e| e.text_content())
        .collect();
    assert_eq!(order, ["first", "second", "top", "p2"]);

    let on_page_one: Vec<String> = paint_order(doc.elements.iter().filter(|e| e.page_number == 1))
        .iter()
        .map(|e| e.text_content())
        .collect();
    assert_eq!(on_page_one, ["first", "second", "top"]);
}

#[test]
fn bring_to_front_goes_above_page_maximum() {
    let mut doc = Document::new(None);
    let a = doc.push_element(text(1, 3, "a"));
    let b = doc.push_element(text(1, 7, "b"));
    doc.push_element(text(2, 40, "other page"));

    assert_eq!(doc.bring_to_front(a).unwrap(), 8);
    assert_eq!(doc.element(a).unwrap().z_index, 8);
    assert_eq!(doc.element(b).unwrap().z_index, 7);
}

#[test]
fn send_to_back_shifts_only_same_page() {
    let mut doc = Document::new(None);
    let a = doc.push_element(text(1, 0, "a"));
    let b = doc.push_element(text(1, 2, "b"));
    let c = doc.push_element(text(1, 5, "c"));
    let other = doc.push_element(text(2, 1, "other"));

    doc.send_to_back(c).unwrap();
    assert_eq!(doc.element(c).unwrap().z_index, 0);
    assert_eq!(doc.element(a).unwrap().z_index, 1);
    assert_eq!(doc.element(b).unwrap().z_index, 3);
    assert_eq!(doc.element(other).unwrap().z_index, 1);
}

#[test]
fn z_order_on_missing_element_is_an_error() {
    let mut doc = Document::new(None);
    assert!(matches!(doc.bring_to_front(99), Err(Error::ElementNotFound(99))));
    assert!(matches!(doc.send_to_back(99), Err(Error::ElementNotFound(99))));
}

#[test]
fn page_count_defaults_to_one() {
    let mut doc = Document::new(None);
    assert_eq!(doc.page_count(), 1);
    doc.push_element(text(4, 0, "late"));
    assert_eq!(doc.page_count(), 4);
}

#[test]
fn untitled_documents_get_a_dated_title() {
    let doc = Document::new(None);
    let title = doc.title.unwrap();
    assert!(title.starts_with("Untitled Document "), "{title}");
    assert_eq!(title.len(), "Untitled Document 2024-01-01".len());
}

#[test]
fn status_transitions() {
    use DocumentStatus::*;
    assert!(Draft.can_transition_to(Processing));
    assert!(Failed.can_transition_to(Processing));
    assert!(Completed.can_transition_to(Processing));
    assert!(Processing.can_transition_to(Completed));
    assert!(Processing.can_transition_to(Failed));
    assert!(!Draft.can_transition_to(Completed));
    assert!(!Processing.can_transition_to(Draft));

    let mut doc = Document::new(None);
    let err = doc.transition_to(Completed).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { from: Draft, to: Completed }));
    doc.mark_failed();
    assert_eq!(doc.status, Failed);
}

#[test]
fn request_generation_enqueues_the_document() {
    let queue = MemoryQueue::new();
    let mut doc = Document::new(None);
    doc.id = 42;
    doc.request_generation(&queue).unwrap();
    assert_eq!(doc.status, DocumentStatus::Processing);
    assert_eq!(queue.pending(), vec![42]);
    assert_eq!(queue.pop(), Some(42));
    assert_eq!(queue.pop(), None);
}

#[test]
fn styles_are_read_from_flat_and_nested_properties() {
    let element = Element::new(ElementKind::Text, 1).with_properties(properties(json!({
        "content": "x",
        "font_size": "18",
        "styles": { "color": "#00FF00", "font_size": 9 }
    })));
    assert_eq!(element.style_number("font_size"), Some(18.0));
    assert_eq!(element.style_str("color"), Some("#00FF00"));
    assert!(!element.is_hidden());

    let rendered = element.render_properties();
    assert_eq!(rendered["type"], "text");
    assert_eq!(rendered["position"], json!({ "x": 0.0, "y": 0.0 }));
    assert_eq!(rendered["content"], "x");
}

#[test]
fn elements_move_and_resize() {
    let mut element = Element::new(ElementKind::Image, 1).at(1.0, 2.0);
    element.move_to(30.0, 40.0);
    element.resize(120.0, 80.0);
    assert_eq!((element.x, element.y), (30.0, 40.0));
    assert_eq!((element.width, element.height), (Some(120.0), Some(80.0)));
}

#[test]
fn element_json_uses_defaults() {
    let element: Element = serde_json::from_value(json!({ "type": "shape" })).unwrap();
    assert_eq!(element.page_number, 1);
    assert_eq!(element.z_index, 0);
    assert_eq!(element.width, None);

    let element: Element = serde_json::from_value(json!({ "type": "line", "page": 3 })).unwrap();
    assert_eq!(element.page_number, 3);
}

#[test]
fn duplicate_copies_elements_without_output() {
    let mut doc = Document::new(Some("Report".into()));
    doc.owner = Some(Owner {
        name: None,
        email: "ann@example.com".into(),
    });
    doc.push_element(text(1, 0, "a"));
    doc.push_element(text(2, 1, "b"));
    doc.status = DocumentStatus::Completed;

    let copy = doc.duplicate();
    assert_eq!(copy.title.as_deref(), Some("Report"));
    assert_eq!(copy.elements.len(), 2);
    assert!(copy.generated_file.is_none());
    assert_eq!(copy.owner.unwrap().display_name(), "ann@example.com");
}

#[test]
fn versions_are_numbered_and_described() {
    let mut doc = Document::new(None);
    doc.create_version(None, Default::default());
    let version: &Version = doc.create_version(
        Some("ann".into()),
        properties(json!({ "title": "New", "elements": [] })),
    );
    assert_eq!(version.version_number, 2);
    assert_eq!(version.description(), "Version 2 - elements, title");
    assert_eq!(doc.versions[0].description(), "Version 1");
}

#[test]
fn file_stem_falls_back_to_id() {
    let mut doc = Document::new(Some("Quarterly Report: Q3!".into()));
    assert_eq!(doc.file_stem(), "quarterly-report-q3");
    doc.title = Some("***".into());
    doc.id = 7;
    assert_eq!(doc.file_stem(), "document-7");
}

#[test]
fn template_usage_counter() {
    let template = Template::new("Invoice");
    assert_eq!(template.usage_count(), 0);
    assert_eq!(template.increment_usage(), 1);
    assert_eq!(template.usage_count(), 1);
    assert!(!template.has_structure());
    assert!(template.element_definitions().is_empty());
}
