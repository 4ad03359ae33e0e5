//! Boundaries to the world outside the engine: file storage, remote image
//! fetching and the background job queue.
//!
//! The engine only ever talks to these traits. In-memory implementations are
//! provided for tests and the command line; an HTTP image fetcher is available
//! behind the `http` feature.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Error;
use crate::generator::Generator;
use crate::model::{Document, DocumentId};

/// Stores generated files and hands them back by reference.
pub trait Storage {
    /// Store `bytes` and return a reference that `download` accepts.
    fn attach(&self, bytes: &[u8], filename: &str, content_type: &str) -> Result<String, Error>;
    fn download(&self, reference: &str) -> Result<Vec<u8>, Error>;
}

/// Retrieves remote image bytes. Any error is a per-element skip for the caller.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, Error>;
}

/// Accepts document ids for asynchronous generation (at-least-once delivery).
pub trait JobQueue {
    fn enqueue(&self, document_id: DocumentId) -> Result<(), Error>;
}

#[derive(Clone, Debug)]
pub struct StoredFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, StoredFile>>,
    next_id: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reference: &str) -> Option<StoredFile> {
        self.files.lock().ok()?.get(reference).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn attach(&self, bytes: &[u8], filename: &str, content_type: &str) -> Result<String, Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = format!("mem://{id}/{filename}");
        let mut files = self
            .files
            .lock()
            .map_err(|_| Error::Storage("storage lock poisoned".into()))?;
        files.insert(
            reference.clone(),
            StoredFile {
                filename: filename.to_string(),
                content_type: content_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        Ok(reference)
    }

    fn download(&self, reference: &str) -> Result<Vec<u8>, Error> {
        let files = self
            .files
            .lock()
            .map_err(|_| Error::Storage("storage lock poisoned".into()))?;
        files
            .get(reference)
            .map(|f| f.bytes.clone())
            .ok_or_else(|| Error::Storage(format!("no stored file at {reference}")))
    }
}

/// Serves images from a fixed URL map; every other URL fails.
#[derive(Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), bytes);
        self
    }
}

impl ImageFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Fetch(format!("no response for {url}")))
    }
}

#[cfg(feature = "http")]
pub struct HttpImageFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpImageFetcher {
    pub fn new(timeout: std::time::Duration) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pagecraft/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(HttpImageFetcher { client })
    }
}

#[cfg(feature = "http")]
impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Fetch(format!("unsupported scheme: {url}")));
        }
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Fetch(e.to_string()))?;
        let bytes = response.bytes().map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Default)]
pub struct MemoryQueue {
    jobs: Mutex<VecDeque<DocumentId>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&self) -> Option<DocumentId> {
        self.jobs.lock().ok()?.pop_front()
    }

    pub fn pending(&self) -> Vec<DocumentId> {
        self.jobs
            .lock()
            .map(|jobs| jobs.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl JobQueue for MemoryQueue {
    fn enqueue(&self, document_id: DocumentId) -> Result<(), Error> {
        self.jobs
            .lock()
            .map_err(|_| Error::Storage("queue lock poisoned".into()))?
            .push_back(document_id);
        Ok(())
    }
}

/// Job entry point. Safe to retry: each run rebuilds from the current elements.
pub fn perform_generation(generator: &Generator, document: &mut Document) -> Result<(), Error> {
    log::info!("Starting PDF generation for document {}", document.id);
    match generator.generate(document) {
        Ok(bytes) => {
            log::info!(
                "Completed PDF generation for document {} ({} bytes)",
                document.id,
                bytes.len()
            );
            Ok(())
        }
        Err(e) => {
            log::error!("PDF generation job failed for document {}: {e}", document.id);
            document.mark_failed();
            Err(e)
        }
    }
}
