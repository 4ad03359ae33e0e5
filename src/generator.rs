use chrono::Utc;
use serde_json::Value;

use crate::canvas::{Info, PdfCanvas};
use crate::config::{GeneratorConfig, Margins, PageSetup, PageSize};
use crate::error::Error;
use crate::fonts::FontCatalog;
use crate::interpolate::deep_merge;
use crate::model::{Attachment, Document, DocumentStatus};
use crate::render::{RenderContext, paint};
use crate::services::{ImageFetcher, Storage};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Renders documents to PDF and attaches the result through the storage collaborator.
pub struct Generator<'a> {
    config: GeneratorConfig,
    fonts: FontCatalog,
    fetcher: &'a dyn ImageFetcher,
    storage: &'a dyn Storage,
}

impl<'a> Generator<'a> {
    pub fn new(
        config: GeneratorConfig,
        fetcher: &'a dyn ImageFetcher,
        storage: &'a dyn Storage,
    ) -> Self {
        let fonts = FontCatalog::new(&config.font_dirs);
        Generator {
            config,
            fonts,
            fetcher,
            storage,
        }
    }

    /// Render `document`, attach the bytes and mark it completed.
    ///
    /// On any failure the document is left `failed` and the error is returned;
    /// nothing is retried here.
    pub fn generate(&self, document: &mut Document) -> Result<Vec<u8>, Error> {
        document.transition_to(DocumentStatus::Processing)?;
        match self.build(document) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                document.mark_failed();
                log::error!("PDF generation failed for document {}: {e}", document.id);
                Err(e)
            }
        }
    }

    fn build(&self, document: &mut Document) -> Result<Vec<u8>, Error> {
        let setup = self.apply_template(document);
        let page_count = document.page_count();
        let mut canvas = PdfCanvas::new(setup, page_count, &self.fonts);

        let ctx = RenderContext {
            content_data: &document.content_data,
            fetcher: self.fetcher,
        };
        for element in document.ordered_elements() {
            let Some(page) = canvas.page_index(element.page_number) else {
                log::debug!(
                    "skipping element {} on page {} of {}",
                    element.id,
                    element.page_number,
                    canvas.page_count()
                );
                continue;
            };
            paint(&mut canvas, page, element, &ctx);
        }

        canvas.set_info(self.info(document));
        let bytes = canvas.finish();

        let filename = format!("{}.pdf", document.file_stem());
        let reference = self.storage.attach(&bytes, &filename, PDF_CONTENT_TYPE)?;
        document.generated_file = Some(Attachment {
            reference,
            filename,
            content_type: PDF_CONTENT_TYPE.to_string(),
            byte_size: bytes.len(),
        });
        document.transition_to(DocumentStatus::Completed)?;
        document.generated_at = Some(Utc::now());

        if let Some(template) = document.template.as_ref().filter(|t| t.has_structure()) {
            let count = template.increment_usage();
            log::debug!("template '{}' used {count} times", template.name);
        }

        log::info!(
            "generated document {} ({} pages, {} bytes)",
            document.id,
            page_count,
            bytes.len()
        );
        Ok(bytes)
    }

    /// Page setup from the template, with its default data merged under the document's.
    fn apply_template(&self, document: &mut Document) -> PageSetup {
        let mut setup = self.config.default_page_setup();
        let Some(template) = document.template.clone() else {
            return setup;
        };
        if !template.has_structure() {
            return setup;
        }

        if let Some(value) = template.page_size() {
            match PageSize::from_value(value) {
                Some(size) => setup.size = size,
                None => log::warn!("ignoring unknown page size {value} in template '{}'", template.name),
            }
        }
        if let Some(value) = template.margins() {
            setup.margins = Some(Margins::from_value(value, self.config.default_margin));
        }
        if !template.default_data.is_empty() {
            document.content_data = deep_merge(&template.default_data, &document.content_data);
        }
        setup
    }

    fn info(&self, document: &Document) -> Info {
        let meta_text = |key: &str| match document.metadata.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Array(items)) if !items.is_empty() => Some(
                items
                    .iter()
                    .map(crate::model::display_value)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        };
        Info {
            title: document.title.clone().filter(|t| !t.is_empty()),
            author: document.owner.as_ref().map(|o| o.display_name().to_string()),
            subject: meta_text("subject"),
            keywords: meta_text("keywords"),
            creator: self.config.creator.clone(),
            producer: self.config.producer.clone(),
            created: Utc::now(),
        }
    }
}
