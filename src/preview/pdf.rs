use crate::canvas::{PdfCanvas, circle_path};
use crate::config::{PageSetup, PageSize};
use crate::fonts::FontCatalog;
use crate::model::{Document, Element, ElementKind};
use crate::render::{DEFAULT_FONT_SIZE, font_choice};

/// Reduced PDF: only text and shape elements, black strokes, no interpolation.
pub(crate) fn render(document: &Document, pages: &[u32]) -> Vec<u8> {
    let fonts = FontCatalog::standard_only();
    let mut canvas = PdfCanvas::new(
        PageSetup::new(PageSize::A4),
        pages.len() as u32,
        &fonts,
    );

    for (index, &page) in pages.iter().enumerate() {
        for element in document.elements_on_page(page) {
            match element.kind {
                ElementKind::Text => text(&mut canvas, index, element),
                ElementKind::Shape => shape(&mut canvas, index, element),
                ElementKind::Image
                | ElementKind::Line
                | ElementKind::Table
                | ElementKind::Signature => {}
            }
        }
    }

    canvas.finish()
}

fn text(canvas: &mut PdfCanvas, page: usize, element: &Element) {
    let (family, bold, italic) = font_choice(element);
    let size = element.style_number("font_size").unwrap_or(DEFAULT_FONT_SIZE);
    let font = canvas.font(page, family, bold, italic);
    canvas.content(page).save_state();
    canvas.text(page, &font, size, element.x, element.y, &element.text_content());
    canvas.content(page).restore_state();
}

fn shape(canvas: &mut PdfCanvas, page: usize, element: &Element) {
    let content = canvas.content(page);
    match element.style_str("shape_type") {
        Some("rectangle") => {
            content
                .save_state()
                .set_stroke_rgb(0.0, 0.0, 0.0)
                .rect(
                    element.x,
                    element.y,
                    element.width.unwrap_or(100.0),
                    element.height.unwrap_or(100.0),
                )
                .stroke()
                .restore_state();
        }
        Some("circle") => {
            let radius = element.width.unwrap_or(50.0).min(element.height.unwrap_or(50.0)) / 2.0;
            content.save_state().set_stroke_rgb(0.0, 0.0, 0.0);
            circle_path(content, element.x + radius, element.y + radius, radius);
            content.stroke().restore_state();
        }
        _ => {}
    }
}
