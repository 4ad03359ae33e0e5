//! Cheap previews of a document: a reduced PDF, a JSON projection and an HTML page.
//!
//! All three select elements the same way: a single page when one is asked
//! for, otherwise every page up to the highest page number in use.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::model::Document;

pub mod html;
pub mod json;
mod pdf;

pub use json::{Dimensions, DocumentSummary, ElementProjection, JsonPreview, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewFormat {
    Pdf,
    Json,
    Html,
}

impl FromStr for PreviewFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(PreviewFormat::Pdf),
            "json" => Ok(PreviewFormat::Json),
            "html" => Ok(PreviewFormat::Html),
            other => Err(Error::UnsupportedFormat(format!("preview format '{other}'"))),
        }
    }
}

impl fmt::Display for PreviewFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PreviewFormat::Pdf => "pdf",
            PreviewFormat::Json => "json",
            PreviewFormat::Html => "html",
        })
    }
}

#[derive(Debug)]
pub enum Preview {
    Pdf(Vec<u8>),
    Json(JsonPreview),
    Html(String),
}

impl Preview {
    /// Serialised output as written to a file or HTTP body.
    pub fn into_bytes(self) -> Result<Vec<u8>, Error> {
        match self {
            Preview::Pdf(bytes) => Ok(bytes),
            Preview::Json(json) => Ok(serde_json::to_vec_pretty(&json)?),
            Preview::Html(html) => Ok(html.into_bytes()),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Preview::Pdf(_) => "application/pdf",
            Preview::Json(_) => "application/json",
            Preview::Html(_) => "text/html; charset=utf-8",
        }
    }
}

pub struct PreviewGenerator<'a> {
    document: &'a Document,
}

impl<'a> PreviewGenerator<'a> {
    pub fn new(document: &'a Document) -> Self {
        PreviewGenerator { document }
    }

    pub fn generate_preview(
        &self,
        format: PreviewFormat,
        page: Option<u32>,
    ) -> Result<Preview, Error> {
        log::debug!(
            "building {format} preview of document {} (page {page:?})",
            self.document.id
        );
        let pages = self.pages(page);
        match format {
            PreviewFormat::Pdf => Ok(Preview::Pdf(pdf::render(self.document, &pages))),
            PreviewFormat::Json => Ok(Preview::Json(json::project(self.document, page))),
            PreviewFormat::Html => Ok(Preview::Html(html::render(self.document, &pages))),
        }
    }

    fn pages(&self, page: Option<u32>) -> Vec<u32> {
        match page {
            Some(page) => vec![page],
            None => (1..=self.document.page_count()).collect(),
        }
    }
}
