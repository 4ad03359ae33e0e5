mod canvas;
mod color;
pub mod config;
pub mod editor;
mod error;
mod fonts;
mod generator;
mod images;
pub mod interpolate;
pub mod model;
pub mod preview;
mod render;
pub mod services;
mod template;

pub use color::Color;
pub use config::{GeneratorConfig, Margins, PageSetup, PageSize};
pub use editor::{
    BoxOptions, EditorService, ElementUpdate, ExportFormat, ImageSource, ShapeOptions,
    SnippetPosition, TextOptions,
};
pub use error::Error;
pub use generator::{Generator, PDF_CONTENT_TYPE};
pub use model::{
    Attachment, Document, DocumentId, DocumentStatus, Element, ElementId, ElementKind, Owner,
    Properties, Snippet, SnippetKind, Template, Version,
};
pub use preview::{Preview, PreviewFormat, PreviewGenerator};
pub use services::{ImageFetcher, JobQueue, Storage, perform_generation};
pub use template::TemplateProcessor;
