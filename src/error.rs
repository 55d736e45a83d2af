//! Error types for headcount operations.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons an archive cannot be counted, or a scan cannot start.
///
/// Every per-archive variant ends up in [`HeadingTally::Unknown`], so callers
/// can tell a missing spine apart from a corrupt zip even though the report
/// treats them the same.
///
/// [`HeadingTally::Unknown`]: crate::HeadingTally::Unknown
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed XML: {0}")]
    Malformed(String),

    #[error("No package document (.opf) in archive")]
    MissingPackageDocument,

    #[error("Package document has no spine")]
    MissingSpine,

    #[error("Spine has no itemref entries")]
    EmptySpine,

    #[error("Package document has no manifest")]
    MissingManifest,

    #[error("Spine resolves to no content documents")]
    NoContentDocuments,

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
