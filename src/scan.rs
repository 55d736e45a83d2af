//! Directory scanning and reporting of sparsely structured archives.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::epub::{HeadingTally, tally_epub};
use crate::error::{Error, Result};

/// File name suffix of archives picked up by a scan.
pub const ARCHIVE_EXTENSION: &str = ".epub";

/// Archives with at most this many headings are reported by default.
pub const DEFAULT_THRESHOLD: usize = 2;

/// Options for [`scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Inclusive upper bound on the heading count of reported archives.
    pub threshold: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// One scanned archive.
#[derive(Debug)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub tally: HeadingTally,
}

impl ScanEntry {
    /// The archive's base file name.
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_else(|| self.path.to_string_lossy())
    }
}

/// Result of scanning a directory tree.
#[derive(Debug)]
pub struct Report {
    pub root: PathBuf,
    pub threshold: usize,
    /// Every archive found, in traversal order.
    pub entries: Vec<ScanEntry>,
}

impl Report {
    /// Archives whose heading count is known and at most the threshold.
    pub fn flagged(&self) -> impl Iterator<Item = &ScanEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.tally.is_at_most(self.threshold))
    }

    /// Number of archives that could not be counted.
    pub fn unknown_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.tally.is_unknown())
            .count()
    }

    /// Write the plain-text report.
    ///
    /// ```text
    /// Scanning EPUB files in: /books
    /// Files with 2 or fewer headings (h1–h6):
    /// flat.epub
    /// ```
    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Scanning EPUB files in: {}", self.root.display())?;
        writeln!(
            out,
            "Files with {} or fewer headings (h1–h6):",
            self.threshold
        )?;

        let mut found = false;
        for entry in self.flagged() {
            writeln!(out, "{}", entry.file_name())?;
            found = true;
        }

        if !found {
            writeln!(
                out,
                "No EPUB files with {} or fewer headings found.",
                self.threshold
            )?;
        }

        Ok(())
    }
}

/// Find archive files below `root`, sorted by path.
///
/// Hidden files are included and symlinks are not followed. Entries that
/// cannot be read are skipped.
pub fn find_archives(root: &Path) -> Vec<PathBuf> {
    let mut archives: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(ARCHIVE_EXTENSION))
        })
        .map(|entry| entry.into_path())
        .collect();

    archives.sort();
    archives
}

/// Count headings in every archive below `root`.
pub fn scan(root: &Path, options: &ScanOptions) -> Result<Report> {
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let archives = find_archives(root);
    tracing::info!(root = %root.display(), archives = archives.len(), "scanning");

    let entries: Vec<ScanEntry> = archives
        .into_iter()
        .map(|path| {
            let tally = tally_epub(&path);
            ScanEntry { path, tally }
        })
        .collect();

    let report = Report {
        root: root.to_path_buf(),
        threshold: options.threshold,
        entries,
    };

    tracing::info!(
        archives = report.entries.len(),
        flagged = report.flagged().count(),
        unknown = report.unknown_count(),
        "scan complete"
    );

    Ok(report)
}
