use std::fmt;

use crate::model::{DocumentStatus, ElementId};

#[derive(Debug)]
pub enum Error {
    Base64(base64::DecodeError),
    Json(serde_json::Error),
    Image(image::ImageError),
    Fetch(String),
    Storage(String),
    Io(std::io::Error),
    InvalidTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },
    ElementNotFound(ElementId),
    InvalidPageOrder(String),
    UnsupportedFormat(String),
    NotImplemented(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Base64(e) => write!(f, "invalid base64 data: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Image(e) => write!(f, "image error: {e}"),
            Error::Fetch(e) => write!(f, "fetch error: {e}"),
            Error::Storage(e) => write!(f, "storage error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::InvalidTransition { from, to } => {
                write!(f, "cannot move document from {from} to {to}")
            }
            Error::ElementNotFound(id) => write!(f, "element {id} not found"),
            Error::InvalidPageOrder(reason) => write!(f, "invalid page order: {reason}"),
            Error::UnsupportedFormat(format) => write!(f, "unsupported format: {format}"),
            Error::NotImplemented(what) => write!(f, "{what} not yet implemented"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Base64(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Image(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Base64(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
