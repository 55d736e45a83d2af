//! In-memory EPUB construction for integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Builds a zip archive entry by entry, in insertion order.
pub struct EpubBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl EpubBuilder {
    /// An archive holding only `mimetype` and `META-INF/container.xml`.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
            .entry("mimetype", "application/epub+zip")
            .entry("META-INF/container.xml", CONTAINER_XML)
    }

    pub fn entry(mut self, name: &str, data: impl AsRef<[u8]>) -> Self {
        self.entries.push((name.to_string(), data.as_ref().to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflate =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (name, data) in &self.entries {
            let options = if name == "mimetype" { stored } else { deflate };
            zip.start_file(name.as_str(), options).expect("start zip entry");
            zip.write_all(data).expect("write zip entry");
        }

        zip.finish().expect("finish zip").into_inner()
    }

    pub fn write_to(self, path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directory");
        }
        std::fs::write(path, self.build()).expect("write epub");
    }
}

/// An EPUB 3 package document with the given manifest `(id, href)` pairs and
/// spine idrefs.
pub fn opf(manifest: &[(&str, &str)], spine: &[&str]) -> String {
    let items: String = manifest
        .iter()
        .map(|(id, href)| {
            format!("    <item id=\"{id}\" href=\"{href}\" media-type=\"application/xhtml+xml\"/>\n")
        })
        .collect();
    let itemrefs: String = spine
        .iter()
        .map(|idref| format!("    <itemref idref=\"{idref}\"/>\n"))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:00000000-0000-0000-0000-000000000000</dc:identifier>
    <dc:title>Test Book</dc:title>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
{items}  </manifest>
  <spine>
{itemrefs}  </spine>
</package>"#
    )
}

/// An XHTML chapter with `headings` heading elements cycling through h1..h6.
pub fn chapter(headings: usize) -> String {
    let body: String = (0..headings)
        .map(|i| {
            let level = i % 6 + 1;
            format!("  <h{level}>Heading {i}</h{level}>\n  <p>Text.</p>\n")
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Chapter</title></head>
<body>
  <p>Opening paragraph.</p>
{body}</body>
</html>"#
    )
}

/// A standard EPUB with one chapter per entry of `headings`, stored under
/// `OEBPS/text/` and listed in spine order.
pub fn book(headings: &[usize]) -> Vec<u8> {
    let ids: Vec<String> = (0..headings.len()).map(|i| format!("c{i}")).collect();
    let hrefs: Vec<String> = (0..headings.len())
        .map(|i| format!("text/ch{i}.xhtml"))
        .collect();
    let manifest: Vec<(&str, &str)> = ids
        .iter()
        .zip(&hrefs)
        .map(|(id, href)| (id.as_str(), href.as_str()))
        .collect();
    let spine: Vec<&str> = ids.iter().map(String::as_str).collect();

    let mut builder = EpubBuilder::new().entry("OEBPS/content.opf", opf(&manifest, &spine));
    for (href, count) in hrefs.iter().zip(headings) {
        builder = builder.entry(&format!("OEBPS/{href}"), chapter(*count));
    }
    builder.build()
}
