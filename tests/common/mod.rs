#![allow(dead_code)]

use lopdf::{Document as PdfDocument, Object};
use pagecraft::services::{MemoryStorage, StaticFetcher};
use pagecraft::{Generator, GeneratorConfig};
use serde_json::Value;

pub fn load(pdf: &[u8]) -> PdfDocument {
    PdfDocument::load_mem(pdf).expect("output should parse as PDF")
}

pub fn page_count(pdf: &[u8]) -> usize {
    load(pdf).get_pages().len()
}

/// Operator names of one page's content stream, in order.
pub fn operators(pdf: &[u8], page: u32) -> Vec<String> {
    let doc = load(pdf);
    let page_id = doc.get_pages()[&page];
    doc.get_and_decode_page_content(page_id)
        .expect("page content should decode")
        .operations
        .into_iter()
        .map(|op| op.operator)
        .collect()
}

/// Every string shown with `Tj` on a page.
pub fn shown_text(pdf: &[u8], page: u32) -> Vec<String> {
    let doc = load(pdf);
    let page_id = doc.get_pages()[&page];
    doc.get_and_decode_page_content(page_id)
        .expect("page content should decode")
        .operations
        .into_iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        })
        .collect()
}

/// `BaseFont` names of the fonts a page's resources refer to.
pub fn font_names(pdf: &[u8], page: u32) -> Vec<String> {
    let doc = load(pdf);
    let page_id = doc.get_pages()[&page];
    let fonts = doc
        .get_dictionary(page_id)
        .and_then(|page| page.get(b"Resources"))
        .and_then(Object::as_dict)
        .and_then(|resources| resources.get(b"Font"))
        .and_then(Object::as_dict);
    let Ok(fonts) = fonts else {
        return Vec::new();
    };
    fonts
        .iter()
        .filter_map(|(_, font)| {
            let font = match font {
                Object::Reference(id) => doc.get_dictionary(*id).ok()?,
                Object::Dictionary(dict) => dict,
                _ => return None,
            };
            match font.get(b"BaseFont").ok()? {
                Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
                _ => None,
            }
        })
        .collect()
}

pub fn info_entry(pdf: &[u8], key: &str) -> Option<String> {
    let doc = load(pdf);
    let info_id = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let dict = doc.get_dictionary(info_id).ok()?;
    match dict.get(key.as_bytes()).ok()? {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// `[x1, y1, x2, y2]` of a page box such as `MediaBox`.
pub fn page_box(pdf: &[u8], page: u32, key: &str) -> Option<Vec<f32>> {
    let doc = load(pdf);
    let page_id = doc.get_pages()[&page];
    let dict = doc.get_dictionary(page_id).ok()?;
    let values = dict.get(key.as_bytes()).ok()?.as_array().ok()?;
    values.iter().map(|v| v.as_float().ok()).collect()
}

pub fn properties(value: Value) -> pagecraft::Properties {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Collaborators for a generator with no network access and in-memory storage.
pub struct Harness {
    pub fetcher: StaticFetcher,
    pub storage: MemoryStorage,
}

impl Harness {
    pub fn new() -> Self {
        Harness {
            fetcher: StaticFetcher::new(),
            storage: MemoryStorage::new(),
        }
    }

    pub fn with_fetcher(fetcher: StaticFetcher) -> Self {
        Harness {
            fetcher,
            storage: MemoryStorage::new(),
        }
    }

    pub fn generator(&self) -> Generator<'_> {
        Generator::new(GeneratorConfig::default(), &self.fetcher, &self.storage)
    }
}
