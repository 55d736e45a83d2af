use std::collections::HashSet;
use std::io::{Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use super::parser::parse_opf;
use crate::error::{Error, Result};
use crate::headings::count_headings;
use crate::util::{decode_xml, entry_name_for_href, is_markup_href, is_package_document};

/// Heading count for one archive, or the reason it could not be counted.
#[derive(Debug)]
pub enum HeadingTally {
    /// Total `h1`..`h6` elements across the archive's content documents.
    Known(usize),
    /// The archive could not be counted.
    Unknown(Error),
}

impl HeadingTally {
    /// The count, if known.
    pub fn count(&self) -> Option<usize> {
        match self {
            HeadingTally::Known(count) => Some(*count),
            HeadingTally::Unknown(_) => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, HeadingTally::Unknown(_))
    }

    /// True if the count is known and at most `threshold`.
    pub fn is_at_most(&self, threshold: usize) -> bool {
        self.count().is_some_and(|count| count <= threshold)
    }
}

impl From<Result<usize>> for HeadingTally {
    fn from(result: Result<usize>) -> Self {
        match result {
            Ok(count) => HeadingTally::Known(count),
            Err(e) => HeadingTally::Unknown(e),
        }
    }
}

/// Count headings in an EPUB file on disk, folding any failure into
/// [`HeadingTally::Unknown`].
///
/// # Example
///
/// ```no_run
/// use headcount::tally_epub;
///
/// match tally_epub("path/to/book.epub") {
///     headcount::HeadingTally::Known(n) => println!("{n} headings"),
///     headcount::HeadingTally::Unknown(e) => println!("cannot count: {e}"),
/// }
/// ```
pub fn tally_epub<P: AsRef<Path>>(path: P) -> HeadingTally {
    let path = path.as_ref();
    let tally = HeadingTally::from(count_headings_in_epub(path));
    if let HeadingTally::Unknown(e) = &tally {
        tracing::debug!(path = %path.display(), error = %e, "archive not countable");
    }
    tally
}

/// Count headings in an EPUB file on disk.
pub fn count_headings_in_epub<P: AsRef<Path>>(path: P) -> Result<usize> {
    let file = std::fs::File::open(path)?;
    count_headings_from_reader(file)
}

/// Count headings in an EPUB read from any [`Read`] + [`Seek`] source.
///
/// The spine is resolved through the manifest of the first `.opf` entry;
/// every resolvable XHTML/HTML document present in the archive is counted.
/// Content documents that are not well-formed count as zero.
///
/// # Example
///
/// ```no_run
/// use std::io::Cursor;
/// use headcount::count_headings_from_reader;
///
/// let epub_data: Vec<u8> = std::fs::read("book.epub")?;
/// let headings = count_headings_from_reader(Cursor::new(epub_data))?;
/// # Ok::<(), headcount::Error>(())
/// ```
pub fn count_headings_from_reader<R: Read + Seek>(reader: R) -> Result<usize> {
    let mut archive = ZipArchive::new(reader)?;

    // 1. Entry names, in archive order
    let entry_names: Vec<String> = (0..archive.len())
        .filter_map(|i| archive.name_for_index(i).map(str::to_owned))
        .collect();

    // 2. Find and parse the package document
    let opf_path = entry_names
        .iter()
        .find(|name| is_package_document(name))
        .cloned()
        .ok_or(Error::MissingPackageDocument)?;
    let opf_bytes = read_entry(&mut archive, &opf_path)?;
    let package = parse_opf(&decode_xml(&opf_bytes)?)?;

    // 3. Resolve the spine to content documents present in the archive
    let present: HashSet<&str> = entry_names.iter().map(String::as_str).collect();
    let mut content_paths = Vec::new();

    for href in package.spine_hrefs()? {
        if !is_markup_href(href) {
            tracing::debug!(href, "spine item is not a markup document, skipping");
            continue;
        }
        let full_path = entry_name_for_href(&opf_path, href);
        if !present.contains(full_path.as_str()) {
            tracing::debug!(path = %full_path, "spine item missing from archive, skipping");
            continue;
        }
        content_paths.push(full_path);
    }

    if content_paths.is_empty() {
        return Err(Error::NoContentDocuments);
    }

    // 4. Count headings in each content document
    let mut total = 0;
    for path in &content_paths {
        let bytes = read_entry(&mut archive, path)?;
        match count_headings(&bytes) {
            Ok(count) => total += count,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "content document not well-formed, counting zero");
            }
        }
    }

    Ok(total)
}

/// Read and decompress a ZIP entry by name.
fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut file = archive.by_name(name)?;
    // The declared size comes from the archive and is not trusted
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_from_result() {
        assert!(matches!(HeadingTally::from(Ok(3)), HeadingTally::Known(3)));
        assert!(matches!(
            HeadingTally::from(Err(Error::MissingSpine)),
            HeadingTally::Unknown(Error::MissingSpine)
        ));
    }

    #[test]
    fn test_tally_threshold() {
        assert!(HeadingTally::Known(0).is_at_most(2));
        assert!(HeadingTally::Known(2).is_at_most(2));
        assert!(!HeadingTally::Known(3).is_at_most(2));
        assert!(!HeadingTally::Unknown(Error::EmptySpine).is_at_most(2));
        assert_eq!(HeadingTally::Unknown(Error::EmptySpine).count(), None);
        assert!(HeadingTally::Unknown(Error::NoContentDocuments).is_unknown());
    }

    #[test]
    fn test_not_a_zip() {
        let result = count_headings_from_reader(std::io::Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(result, Err(Error::Zip(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = count_headings_in_epub("/nonexistent/book.epub");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
