//! Per-type painters used by the full generator.
//!
//! Every painter reads its properties defensively: any missing value falls
//! back to a fixed default and nothing here can fail the whole document.
//! Image problems are logged and the element is skipped.

use pdf_writer::Name;
use serde_json::Value;

use crate::canvas::{PdfCanvas, circle_path, set_fill, set_stroke};
use crate::color::Color;
use crate::images;
use crate::interpolate::interpolate;
use crate::model::{Element, ElementKind, Properties, display_value};
use crate::services::ImageFetcher;

pub(crate) const DEFAULT_FONT: &str = "Helvetica";
pub(crate) const DEFAULT_FONT_SIZE: f32 = 12.0;
const DEFAULT_LINE_WIDTH: f32 = 1.0;
const DEFAULT_ROW_HEIGHT: f32 = 20.0;
const LINE_LEADING: f32 = 1.2;

pub(crate) struct RenderContext<'a> {
    pub(crate) content_data: &'a Properties,
    pub(crate) fetcher: &'a dyn ImageFetcher,
}

pub(crate) fn paint(canvas: &mut PdfCanvas, page: usize, element: &Element, ctx: &RenderContext) {
    match element.kind {
        ElementKind::Text => paint_text(canvas, page, element, ctx.content_data),
        ElementKind::Image => paint_image(canvas, page, element, ctx.fetcher),
        ElementKind::Shape => paint_shape(canvas, page, element),
        ElementKind::Line => paint_line(canvas, page, element),
        ElementKind::Table => paint_table(canvas, page, element),
        ElementKind::Signature => paint_signature(canvas, page, element),
    }
}

/// Font family plus bold/italic flags from `font_family`/`font`, `bold`/`font_weight`
/// and `italic`/`font_style`.
pub(crate) fn font_choice(element: &Element) -> (&str, bool, bool) {
    let family = element
        .style_str("font_family")
        .or_else(|| element.style_str("font"))
        .unwrap_or(DEFAULT_FONT);
    let bold = element.style("bold").and_then(Value::as_bool).unwrap_or(false)
        || element
            .style_str("font_weight")
            .is_some_and(|w| w.eq_ignore_ascii_case("bold"));
    let italic = element.style("italic").and_then(Value::as_bool).unwrap_or(false)
        || element
            .style_str("font_style")
            .is_some_and(|s| s.eq_ignore_ascii_case("italic"));
    (family, bold, italic)
}

fn paint_text(canvas: &mut PdfCanvas, page: usize, element: &Element, data: &Properties) {
    if element.is_hidden() {
        log::debug!("element {} is a hidden placeholder", element.id);
        return;
    }
    let (family, bold, italic) = font_choice(element);
    let size = element.style_number("font_size").unwrap_or(DEFAULT_FONT_SIZE);
    let color = element.style_str("color").map(Color::parse).unwrap_or(Color::BLACK);
    let text = interpolate(&element.text_content(), data);

    let font = canvas.font(page, family, bold, italic);
    let state = element
        .style_number("opacity")
        .filter(|o| *o < 1.0)
        .map(|o| canvas.opacity_state(page, o));
    let rotation = element.style_number("rotation").filter(|r| *r != 0.0);

    let content = canvas.content(page);
    content.save_state();
    if let Some(state) = &state {
        content.set_parameters(Name(state.as_bytes()));
    }
    set_fill(content, color);
    let (x, y) = match rotation {
        Some(degrees) => {
            let (sin, cos) = degrees.to_radians().sin_cos();
            content.transform([cos, sin, -sin, cos, element.x, element.y]);
            (0.0, 0.0)
        }
        None => (element.x, element.y),
    };
    for (i, line) in text.lines().enumerate() {
        let line_y = y - i as f32 * size * LINE_LEADING;
        canvas.text(page, &font, size, x, line_y, line);
    }
    canvas.content(page).restore_state();
}

fn paint_image(canvas: &mut PdfCanvas, page: usize, element: &Element, fetcher: &dyn ImageFetcher) {
    let bytes = match images::resolve_source(element, fetcher) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            log::debug!("image element {} has no source", element.id);
            return;
        }
        Err(e) => {
            log::warn!("Failed to load image for element {}: {e}", element.id);
            return;
        }
    };
    let decoded = match images::decode(&bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            log::warn!("Failed to decode image for element {}: {e}", element.id);
            return;
        }
    };

    let (px_w, px_h) = (decoded.width as f32, decoded.height as f32);
    let (width, height) = match (element.width, element.height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * px_h / px_w),
        (None, Some(h)) => (h * px_w / px_h, h),
        (None, None) => (px_w, px_h),
    };

    let name = canvas.image(page, &decoded);
    canvas
        .content(page)
        .save_state()
        .transform([width, 0.0, 0.0, height, element.x, element.y])
        .x_object(Name(name.as_bytes()))
        .restore_state();
}

fn paint_shape(canvas: &mut PdfCanvas, page: usize, element: &Element) {
    let fill = element.style_str("fill_color").map(Color::parse);
    let stroke = element.style_str("stroke_color").map(Color::parse);
    let line_width = element
        .style_number("line_width")
        .or_else(|| element.style_number("stroke_width"))
        .unwrap_or(DEFAULT_LINE_WIDTH);
    let width = element.width.unwrap_or(100.0);
    let height = element.height.unwrap_or(100.0);

    let content = canvas.content(page);
    content.save_state();
    if let Some(color) = stroke {
        set_stroke(content, color);
    }
    if let Some(color) = fill {
        set_fill(content, color);
    }
    content.set_line_width(line_width);

    match element.style_str("shape_type").unwrap_or("rectangle") {
        "circle" => {
            let radius = width.min(height) / 2.0;
            circle_path(content, element.x + radius, element.y + radius, radius);
        }
        "rectangle" => {
            content.rect(element.x, element.y, width, height);
        }
        other => {
            log::debug!("element {} has unsupported shape '{other}'", element.id);
            content.restore_state();
            return;
        }
    }

    match (fill, stroke) {
        (Some(_), Some(_)) => content.fill_nonzero_and_stroke(),
        (Some(_), None) => content.fill_nonzero(),
        (None, _) => content.stroke(),
    };
    content.restore_state();
}

fn paint_line(canvas: &mut PdfCanvas, page: usize, element: &Element) {
    let stroke = element.style_str("stroke_color").map(Color::parse);
    let line_width = element
        .style_number("line_width")
        .or_else(|| element.style_number("stroke_width"))
        .unwrap_or(DEFAULT_LINE_WIDTH);

    let content = canvas.content(page);
    content.save_state();
    if let Some(color) = stroke {
        set_stroke(content, color);
    }
    content
        .set_line_width(line_width)
        .move_to(element.x, element.y)
        .line_to(
            element.x + element.width.unwrap_or(100.0),
            element.y + element.height.unwrap_or(0.0),
        )
        .stroke()
        .restore_state();
}

/// Rows of `data` (or array `content`), one text run per cell.
fn paint_table(canvas: &mut PdfCanvas, page: usize, element: &Element) {
    let rows = match element.style("data").or_else(|| element.content()) {
        Some(Value::Array(rows)) => rows,
        _ => {
            log::debug!("table element {} has no row data", element.id);
            return;
        }
    };
    let (family, bold, italic) = font_choice(element);
    let size = element.style_number("font_size").unwrap_or(DEFAULT_FONT_SIZE);
    let row_height = element.style_number("row_height").unwrap_or(DEFAULT_ROW_HEIGHT);
    let table_width = element.width.unwrap_or(100.0);
    let font = canvas.font(page, family, bold, italic);

    canvas.content(page).save_state();
    let mut y = element.y;
    for row in rows {
        if let Value::Array(cells) = row {
            let column_width = table_width / cells.len().max(1) as f32;
            let mut x = element.x;
            for cell in cells {
                canvas.text(page, &font, size, x, y, &display_value(cell));
                x += column_width;
            }
        }
        y -= row_height;
    }
    canvas.content(page).restore_state();
}

/// Grey bordered box with an optional label above it.
fn paint_signature(canvas: &mut PdfCanvas, page: usize, element: &Element) {
    let width = element.width.unwrap_or(200.0);
    let height = element.height.unwrap_or(50.0);

    canvas
        .content(page)
        .save_state()
        .set_stroke_gray(0.5)
        .set_line_width(0.5)
        .rect(element.x, element.y, width, height)
        .stroke();

    if let Some(label) = element.style_str("label").filter(|l| !l.is_empty()) {
        let font = canvas.font(page, DEFAULT_FONT, false, false);
        canvas.content(page).set_fill_gray(0.3);
        canvas.text(page, &font, 10.0, element.x + 5.0, element.y + height + 5.0, label);
    }
    canvas.content(page).restore_state();
}
