//! # headcount
//!
//! Finds EPUB files with few structural headings, a cheap signal for books
//! that were badly converted or carry no usable navigation.
//!
//! ## How counting works
//!
//! - The first `.opf` entry in the archive is the package document
//! - Its spine is resolved through the manifest to XHTML/HTML documents
//! - `h1`..`h6` elements are counted in each document and summed
//!
//! Archives that cannot be counted (no package document, no spine, nothing
//! resolvable) yield [`HeadingTally::Unknown`] rather than a zero count.
//! Content documents that are not well-formed XML count as zero.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use headcount::{HeadingTally, ScanOptions, scan, tally_epub};
//!
//! // A single book
//! if let HeadingTally::Known(n) = tally_epub("book.epub") {
//!     println!("{n} headings");
//! }
//!
//! // A whole library
//! let report = scan(Path::new("/srv/books"), &ScanOptions::default())?;
//! report.write_text(&mut std::io::stdout())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod epub;
pub mod error;
pub mod headings;
pub mod scan;
pub(crate) mod util;

pub use epub::{HeadingTally, count_headings_from_reader, count_headings_in_epub, tally_epub};
pub use error::{Error, Result};
pub use headings::{XHTML_NS, count_headings, effective_namespace};
pub use scan::{Report, ScanEntry, ScanOptions, find_archives, scan};
