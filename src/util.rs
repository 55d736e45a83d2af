//! Text decoding, XML and entry-name helpers shared by the parsers.

use std::borrow::Cow;
use std::collections::HashSet;

use quick_xml::escape::unescape_with;
use quick_xml::events::BytesStart;
use quick_xml::name::{Namespace, ResolveResult};

use crate::error::{Error, Result};

/// Extensions of content documents worth counting.
const MARKUP_EXTENSIONS: [&str; 3] = [".xhtml", ".html", ".htm"];

/// Decode an XML document for parsing.
///
/// Valid UTF-8 (or UTF-16 with a BOM) is used as is. Otherwise the bytes are
/// decoded with the encoding named in the XML declaration. A document that
/// declares UTF-8 or nothing at all must be valid UTF-8, and an encoding
/// label encoding_rs does not know is an error.
pub fn decode_xml(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let (text, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return Ok(text);
    }

    let label = extract_xml_encoding(bytes).unwrap_or("UTF-8");
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| Error::Malformed(format!("unsupported encoding {label:?}")))?;
    if encoding == encoding_rs::UTF_8 {
        return Err(Error::Malformed("invalid UTF-8 byte sequence".into()));
    }

    let (text, _, malformed) = encoding.decode(bytes);
    if malformed {
        return Err(Error::Malformed(format!(
            "invalid {} byte sequence",
            encoding.name()
        )));
    }
    Ok(text)
}

/// Extract the `encoding` pseudo-attribute from an XML declaration.
///
/// Only the first 100 bytes are inspected.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let quote = *after_enc.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;

    std::str::from_utf8(&after_enc[1..value_end]).ok()
}

/// True if `name` ends in `.opf`, ignoring case.
pub fn is_package_document(name: &str) -> bool {
    name.to_lowercase().ends_with(".opf")
}

/// True if `href` names an XHTML/HTML content document, ignoring case.
pub fn is_markup_href(href: &str) -> bool {
    let href_lower = href.to_lowercase();
    MARKUP_EXTENSIONS.iter().any(|ext| href_lower.ends_with(ext))
}

/// Join a manifest href onto the directory holding the package document.
///
/// `OEBPS/content.opf` + `text/ch1.xhtml` gives `OEBPS/text/ch1.xhtml`; a
/// package document at the archive root leaves the href unchanged. The href
/// is otherwise used verbatim.
pub fn entry_name_for_href(opf_path: &str, href: &str) -> String {
    match opf_path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => format!("{dir}/{href}"),
        _ => href.to_string(),
    }
}

// ----------------------------------------------------------------------------
// XML helpers
// ----------------------------------------------------------------------------

/// Tracks element nesting while streaming a document.
///
/// quick-xml checks that end tags match, but not that every element is
/// closed at end of input or that there is exactly one root element.
#[derive(Debug, Default)]
pub struct Nesting {
    depth: usize,
    roots: usize,
}

impl Nesting {
    /// Record a start tag. Returns the element's depth (0 for the root).
    pub fn open(&mut self) -> Result<usize> {
        let depth = self.enter()?;
        self.depth += 1;
        Ok(depth)
    }

    /// Record a self-closing tag. Returns the element's depth.
    pub fn empty(&mut self) -> Result<usize> {
        self.enter()
    }

    /// Record an end tag.
    pub fn close(&mut self) -> Result<()> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or_else(|| Error::Malformed("unmatched end tag".into()))?;
        Ok(())
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Check the document ended cleanly.
    pub fn finish(self) -> Result<()> {
        if self.roots == 0 {
            return Err(Error::Malformed("no root element".into()));
        }
        if self.depth > 0 {
            return Err(Error::Malformed(format!(
                "{} element(s) left open at end of document",
                self.depth
            )));
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<usize> {
        if self.depth == 0 {
            self.roots += 1;
            if self.roots > 1 {
                return Err(Error::Malformed("more than one root element".into()));
            }
        }
        Ok(self.depth)
    }
}

/// True if a resolved element name is bound to namespace `uri`.
pub fn in_namespace(ns: &ResolveResult, uri: &str) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(n)) if *n == uri.as_bytes())
}

/// The entities a document may reference.
///
/// Without a document type only the five predefined entities and character
/// references are defined; an internal subset can declare more. A document
/// type with an external identifier (`PUBLIC` or `SYSTEM`) may declare
/// anything, so any name is accepted.
#[derive(Debug, Default)]
pub struct Entities {
    declared: HashSet<String>,
    external: bool,
}

impl Entities {
    /// Read the declarations in the content of a `<!DOCTYPE ...>`.
    pub fn from_doctype(content: &str) -> Self {
        let (head, subset) = content.split_once('[').unwrap_or((content, ""));
        let external = head
            .split_whitespace()
            .any(|word| word == "PUBLIC" || word == "SYSTEM");

        let declared = subset
            .split("<!ENTITY")
            .skip(1)
            .filter_map(|decl| match decl.split_whitespace().next()? {
                "%" => None,
                name => Some(name.to_string()),
            })
            .collect();

        Self { declared, external }
    }

    /// Unescape text or an attribute value, failing on undefined entities.
    pub fn unescape<'a>(&self, raw: &'a str) -> Result<Cow<'a, str>> {
        unescape_with(raw, |name| self.resolve(name))
            .map_err(|e| quick_xml::Error::from(e).into())
    }

    /// Check a `&name;` reference met in text.
    pub fn check_reference(&self, name: &[u8]) -> Result<()> {
        let name = String::from_utf8_lossy(name);
        self.unescape(&format!("&{name};"))?;
        Ok(())
    }

    fn resolve(&self, name: &str) -> Option<&'static str> {
        match name {
            "lt" => Some("<"),
            "gt" => Some(">"),
            "amp" => Some("&"),
            "apos" => Some("'"),
            "quot" => Some("\""),
            // Replacement text never matters for counting elements
            _ if self.external || self.declared.contains(name) => Some(""),
            _ => None,
        }
    }
}

/// The attributes of one element, checked and unescaped.
#[derive(Debug, Default)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Read every attribute of `e`.
    ///
    /// Fails on unquoted values, missing `=`, duplicate names and references
    /// to undefined entities.
    pub fn parse(e: &BytesStart, entities: &Entities) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = entities.unescape(&raw)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self(attributes))
    }

    /// Value of the attribute with qualified name `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}
