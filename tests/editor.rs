mod common;

use common::{Harness, page_count, properties, shown_text};
use pagecraft::{
    BoxOptions, Document, DocumentStatus, EditorService, Element, ElementKind, ElementUpdate,
    Error, ExportFormat, ImageSource, ShapeOptions, Snippet, SnippetKind, SnippetPosition,
    TextOptions,
};
use serde_json::json;

fn text(page: u32, content: &str) -> Element {
    Element::new(ElementKind::Text, page).with_property("content", content)
}

fn pages_of(doc: &Document, content: &str) -> Vec<u32> {
    doc.elements
        .iter()
        .filter(|e| e.text_content() == content)
        .map(|e| e.page_number)
        .collect()
}

#[test]
fn add_text_regenerates() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    let mut editor = EditorService::new(&mut doc, &generator);

    let id = editor
        .add_text(
            1,
            "Hello",
            TextOptions {
                size: 20.0,
                ..TextOptions::default()
            },
        )
        .unwrap();

    let element = editor.document().element(id).unwrap();
    assert_eq!((element.x, element.y), (50.0, 50.0));
    assert_eq!(element.style_str("font_family"), Some("Helvetica"));
    assert_eq!(element.style_number("font_size"), Some(20.0));
    assert_eq!(element.style_str("color"), Some("#000000"));
    assert_eq!(doc.status, DocumentStatus::Completed);

    let file = doc.generated_file.clone().unwrap();
    let pdf = harness.storage.get(&file.reference).unwrap().bytes;
    assert_eq!(shown_text(&pdf, 1), ["Hello"]);
}

#[test]
fn adding_to_a_later_page_creates_the_pages_before_it() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    EditorService::new(&mut doc, &generator)
        .add_text(3, "late", TextOptions::default())
        .unwrap();

    assert_eq!(doc.page_count(), 3);
    for page in 1..=2 {
        assert!(doc.elements_on_page(page).iter().all(|e| e.is_hidden()));
    }
    let file = doc.generated_file.clone().unwrap();
    let pdf = harness.storage.get(&file.reference).unwrap().bytes;
    assert_eq!(page_count(&pdf), 3);
}

#[test]
fn images_keep_urls_and_encode_bytes() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    let mut editor = EditorService::new(&mut doc, &generator);

    let by_url = editor
        .add_image(1, ImageSource::from("https://img.test/logo.png"), BoxOptions::default())
        .unwrap();
    let inline = editor
        .add_image(1, ImageSource::Bytes(vec![1, 2, 3]), BoxOptions::default())
        .unwrap();

    let doc = editor.document();
    let by_url = doc.element(by_url).unwrap();
    assert_eq!(by_url.style_str("image_url"), Some("https://img.test/logo.png"));
    assert_eq!((by_url.width, by_url.height), (Some(100.0), Some(100.0)));
    assert_eq!(doc.element(inline).unwrap().style_str("image_data"), Some("AQID"));
    assert_eq!(doc.status, DocumentStatus::Completed);
}

#[test]
fn shapes_get_stroke_defaults() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    let id = EditorService::new(&mut doc, &generator)
        .add_shape(
            1,
            "circle",
            ShapeOptions {
                fill_color: Some("#00FF00".into()),
                ..ShapeOptions::default()
            },
        )
        .unwrap();

    let shape = doc.element(id).unwrap();
    assert_eq!(shape.kind, ElementKind::Shape);
    assert_eq!(shape.style_str("shape_type"), Some("circle"));
    assert_eq!(shape.style_str("fill_color"), Some("#00FF00"));
    assert_eq!(shape.style_str("stroke_color"), Some("#000000"));
    assert_eq!(shape.style_number("line_width"), Some(1.0));
}

#[test]
fn update_merges_properties_shallowly() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    let id = doc.push_element(
        text(1, "old").with_property("color", "#FF0000").at(1.0, 2.0),
    );

    EditorService::new(&mut doc, &generator)
        .update_element(
            id,
            ElementUpdate {
                x: Some(70.0),
                width: Some(10.0),
                properties: Some(properties(json!({ "content": "new" }))),
                ..ElementUpdate::default()
            },
        )
        .unwrap();

    let element = doc.element(id).unwrap();
    assert_eq!((element.x, element.y), (70.0, 2.0));
    assert_eq!(element.width, Some(10.0));
    assert_eq!(element.text_content(), "new");
    assert_eq!(element.style_str("color"), Some("#FF0000"));
}

#[test]
fn missing_elements_are_reported() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    let mut editor = EditorService::new(&mut doc, &generator);
    assert!(matches!(editor.delete_element(5), Err(Error::ElementNotFound(5))));
    assert!(matches!(
        editor.update_element(5, ElementUpdate::default()),
        Err(Error::ElementNotFound(5))
    ));
}

#[test]
fn delete_and_restack_elements() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    let a = doc.push_element(text(1, "a"));
    let b = doc.push_element(text(1, "b").with_z_index(4));

    let mut editor = EditorService::new(&mut doc, &generator);
    assert_eq!(editor.bring_to_front(a).unwrap(), 5);
    editor.send_to_back(a).unwrap();
    let removed = editor.delete_element(b).unwrap();
    assert_eq!(removed.z_index, 5);

    assert_eq!(doc.elements.len(), 1);
    assert_eq!(doc.element(a).unwrap().z_index, 0);
}

#[test]
fn deleted_element_ids_are_not_reused() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    let mut editor = EditorService::new(&mut doc, &generator);

    let a = editor.add_text(1, "a", TextOptions::default()).unwrap();
    let b = editor.add_text(1, "b", TextOptions::default()).unwrap();
    editor.delete_element(b).unwrap();
    let c = editor.add_text(1, "c", TextOptions::default()).unwrap();

    assert_ne!(c, a);
    assert_ne!(c, b);
    assert!(matches!(
        editor.update_element(b, ElementUpdate::default()),
        Err(Error::ElementNotFound(id)) if id == b
    ));
    assert!(matches!(editor.delete_element(b), Err(Error::ElementNotFound(id)) if id == b));
    assert_eq!(pages_of(&doc, "c"), [1]);
    assert_eq!(doc.elements.len(), 2);
}

#[test]
fn add_page_appends_a_hidden_placeholder() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    doc.push_element(text(1, "cover"));

    let page = EditorService::new(&mut doc, &generator).add_page().unwrap();
    assert_eq!(page, 2);
    let placeholders = doc.elements_on_page(2);
    assert_eq!(placeholders.len(), 1);
    assert!(placeholders[0].is_hidden());
    assert_eq!((placeholders[0].x, placeholders[0].y), (-1000.0, -1000.0));

    let file = doc.generated_file.clone().unwrap();
    let pdf = harness.storage.get(&file.reference).unwrap().bytes;
    assert_eq!(page_count(&pdf), 2);
    assert!(shown_text(&pdf, 2).is_empty());
}

#[test]
fn delete_page_renumbers_later_pages() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    doc.push_element(text(1, "one"));
    doc.push_element(text(2, "two"));
    doc.push_element(text(3, "three"));
    doc.push_element(text(3, "three again"));

    EditorService::new(&mut doc, &generator).delete_page(2).unwrap();

    assert!(pages_of(&doc, "two").is_empty());
    assert_eq!(pages_of(&doc, "one"), [1]);
    assert_eq!(pages_of(&doc, "three"), [2]);
    assert_eq!(pages_of(&doc, "three again"), [2]);
    assert!(doc.elements_on_page(3).is_empty());
    assert_eq!(doc.page_count(), 2);
}

#[test]
fn reorder_pages_applies_the_permutation() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    doc.push_element(text(1, "one"));
    doc.push_element(text(2, "two"));
    doc.push_element(text(3, "three"));

    EditorService::new(&mut doc, &generator)
        .reorder_pages(&[3, 1, 2])
        .unwrap();

    assert_eq!(pages_of(&doc, "three"), [1]);
    assert_eq!(pages_of(&doc, "one"), [2]);
    assert_eq!(pages_of(&doc, "two"), [3]);

    let file = doc.generated_file.clone().unwrap();
    let pdf = harness.storage.get(&file.reference).unwrap().bytes;
    assert_eq!(shown_text(&pdf, 1), ["three"]);
}

#[test]
fn swapping_pages_does_not_merge_them() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    doc.push_element(text(1, "one"));
    doc.push_element(text(2, "two"));

    EditorService::new(&mut doc, &generator)
        .reorder_pages(&[2, 1])
        .unwrap();

    assert_eq!(pages_of(&doc, "two"), [1]);
    assert_eq!(pages_of(&doc, "one"), [2]);
}

#[test]
fn invalid_page_orders_are_rejected_untouched() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    doc.push_element(text(1, "one"));
    doc.push_element(text(2, "two"));

    let mut editor = EditorService::new(&mut doc, &generator);
    for order in [&[1, 1][..], &[1][..], &[1, 3][..], &[2, 1, 3][..]] {
        assert!(matches!(
            editor.reorder_pages(order),
            Err(Error::InvalidPageOrder(_))
        ));
    }
    assert_eq!(pages_of(&doc, "one"), [1]);
    assert_eq!(pages_of(&doc, "two"), [2]);
    assert_eq!(doc.status, DocumentStatus::Draft);
}

fn snippet(kind: Option<SnippetKind>, content: &str) -> Snippet {
    Snippet {
        name: "snippet".into(),
        snippet_type: kind,
        content: Some(content.into()),
        ..Snippet::default()
    }
}

#[test]
fn header_footer_and_watermark_defaults() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    let mut editor = EditorService::new(&mut doc, &generator);

    let header = editor
        .apply_snippet(&snippet(Some(SnippetKind::Header), "ACME"), 1, SnippetPosition::default())
        .unwrap();
    let footer = editor
        .apply_snippet(&snippet(Some(SnippetKind::Footer), "Page 1"), 1, SnippetPosition::default())
        .unwrap();
    let watermark = editor
        .apply_snippet(
            &snippet(Some(SnippetKind::Watermark), "DRAFT"),
            1,
            SnippetPosition::default(),
        )
        .unwrap();

    let doc = editor.document();
    let header = doc.element(header[0]).unwrap();
    assert_eq!((header.x, header.y), (50.0, 750.0));
    assert_eq!(header.style_number("font_size"), Some(14.0));
    assert_eq!(header.text_content(), "ACME");

    let footer = doc.element(footer[0]).unwrap();
    assert_eq!((footer.x, footer.y), (50.0, 50.0));
    assert_eq!(footer.style_number("font_size"), Some(10.0));
    assert_eq!(footer.style_str("color"), Some("#666666"));

    let watermark = doc.element(watermark[0]).unwrap();
    assert_eq!((watermark.x, watermark.y), (200.0, 400.0));
    assert_eq!(watermark.style_number("font_size"), Some(48.0));
    assert_eq!(watermark.style_str("color"), Some("#CCCCCC"));
    assert_eq!(watermark.style_number("rotation"), Some(45.0));
    assert_eq!(watermark.style_number("opacity"), Some(0.3));
}

#[test]
fn snippet_properties_override_defaults() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    let mut header = snippet(Some(SnippetKind::Header), "ACME");
    header.properties = properties(json!({ "y": 700, "size": 18, "color": "#112233" }));

    let ids = EditorService::new(&mut doc, &generator)
        .apply_snippet(&header, 2, SnippetPosition::default())
        .unwrap();
    let element = doc.element(ids[0]).unwrap();
    assert_eq!(element.page_number, 2);
    assert_eq!((element.x, element.y), (50.0, 700.0));
    assert_eq!(element.style_number("font_size"), Some(18.0));
    assert_eq!(element.style_str("color"), Some("#112233"));
}

#[test]
fn general_snippets_expand_element_lists() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    let content = json!([
        { "type": "line", "x": 10, "y": 20, "width": 100 },
        { "properties": { "content": "Total" } },
        { "type": "sparkle" }
    ])
    .to_string();

    let ids = EditorService::new(&mut doc, &generator)
        .apply_snippet(
            &snippet(Some(SnippetKind::Table), &content),
            1,
            SnippetPosition {
                x: Some(300.0),
                y: None,
            },
        )
        .unwrap();

    assert_eq!(ids.len(), 2);
    let line = doc.element(ids[0]).unwrap();
    assert_eq!(line.kind, ElementKind::Line);
    assert_eq!((line.x, line.y), (300.0, 20.0));
    assert_eq!(line.width, Some(100.0));
    let label = doc.element(ids[1]).unwrap();
    assert_eq!(label.kind, ElementKind::Text);
    assert_eq!((label.x, label.y), (300.0, 50.0));
    assert_eq!(label.text_content(), "Total");
}

#[test]
fn unparseable_general_snippets_become_text() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(None);
    let mut plain = snippet(None, "Thank you for your business");
    plain.properties = properties(json!({ "font_size": 9 }));

    let ids = EditorService::new(&mut doc, &generator)
        .apply_snippet(&plain, 1, SnippetPosition::default())
        .unwrap();
    assert_eq!(ids.len(), 1);
    let element = doc.element(ids[0]).unwrap();
    assert_eq!(element.kind, ElementKind::Text);
    assert_eq!(element.text_content(), "Thank you for your business");
    assert_eq!(element.style_number("font_size"), Some(9.0));
}

#[test]
fn export_formats() {
    let harness = Harness::new();
    let generator = harness.generator();
    let mut doc = Document::new(Some("Export me".into()));
    doc.push_element(text(1, "x"));
    let mut editor = EditorService::new(&mut doc, &generator);

    let attachment = editor.export(ExportFormat::Pdf).unwrap();
    assert_eq!(attachment.filename, "export-me.pdf");
    assert!(matches!(
        editor.export(ExportFormat::Png),
        Err(Error::NotImplemented(_))
    ));
    assert_eq!("png".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
    assert!(matches!(
        "docx".parse::<ExportFormat>(),
        Err(Error::UnsupportedFormat(_))
    ));
}
