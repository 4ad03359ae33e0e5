use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::model::{Document, Element, ElementKind};

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
    .pdf-page {
      width: 595px;
      height: 842px;
      margin: 20px auto;
      background: white;
      box-shadow: 0 0 10px rgba(0,0,0,0.1);
      position: relative;
      page-break-after: always;
    }
    .pdf-element {
      position: absolute;
    }
    .pdf-text {
      font-family: Helvetica, Arial, sans-serif;
    }
    .pdf-shape {
      border: 1px solid #000;
    }
  </style>
</head>
<body style="background: #f5f5f5;">
"#;

const TAIL: &str = "</body>\n</html>\n";

/// Self-contained HTML page with one absolutely positioned box per element.
pub fn render(document: &Document, pages: &[u32]) -> String {
    let mut html = String::from(HEAD);
    for &page in pages {
        html.push_str(&format!(r#"<div class="pdf-page" data-page="{page}">"#));
        for element in document.elements_on_page(page) {
            html.push_str(&render_element(element));
        }
        html.push_str("</div>\n");
    }
    html.push_str(TAIL);
    html
}

/// Markup for one element; kinds without an HTML form produce nothing.
pub fn render_element(element: &Element) -> String {
    let mut style = format!(
        "left: {}px; top: {}px; z-index: {};",
        element.x, element.y, element.z_index
    );

    match element.kind {
        ElementKind::Text => {
            let font_size = element.style_number("font_size").unwrap_or(12.0);
            let color = element.style_str("color").unwrap_or("#000000");
            style.push_str(&format!(" font-size: {font_size}px; color: {color};"));
            format!(
                r#"<div class="pdf-element pdf-text" style="{}">{}</div>"#,
                encode_double_quoted_attribute(&style),
                encode_text(&element.text_content())
            )
        }
        ElementKind::Shape => {
            push_box_size(&mut style, element);
            if element.style_str("shape_type") == Some("circle") {
                style.push_str(" border-radius: 50%;");
            }
            if let Some(fill) = element.style_str("fill_color") {
                style.push_str(&format!(" background-color: {fill};"));
            }
            if let Some(stroke) = element.style_str("stroke_color") {
                style.push_str(&format!(" border-color: {stroke};"));
            }
            format!(
                r#"<div class="pdf-element pdf-shape" style="{}"></div>"#,
                encode_double_quoted_attribute(&style)
            )
        }
        ElementKind::Image => {
            push_box_size(&mut style, element);
            let src = match (element.style_str("image_url"), element.style_str("image_data")) {
                (Some(url), _) => url.to_string(),
                (None, Some(data)) if data.starts_with("data:") => data.to_string(),
                (None, data) => format!("data:image/png;base64,{}", data.unwrap_or_default()),
            };
            format!(
                r#"<img class="pdf-element pdf-image" src="{}" style="{}" />"#,
                encode_double_quoted_attribute(&src),
                encode_double_quoted_attribute(&style)
            )
        }
        ElementKind::Line | ElementKind::Table | ElementKind::Signature => String::new(),
    }
}

fn push_box_size(style: &mut String, element: &Element) {
    style.push_str(&format!(
        " width: {}px; height: {}px;",
        element.width.unwrap_or(100.0),
        element.height.unwrap_or(100.0)
    ));
}
