//! Heading element counting for XHTML content documents.

use quick_xml::events::{BytesStart, Event};
use quick_xml::NsReader;

use crate::error::Result;
use crate::util::{Attributes, Entities, Nesting, decode_xml, in_namespace};

/// The XHTML namespace, assumed when a document declares no default.
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

const HEADING_NAMES: [&[u8]; 6] = [b"h1", b"h2", b"h3", b"h4", b"h5", b"h6"];

/// The namespace headings are looked up in, given the root element's
/// default namespace declaration (if any).
///
/// An absent or empty declaration falls back to [`XHTML_NS`].
///
/// ```
/// use headcount::{XHTML_NS, effective_namespace};
///
/// assert_eq!(effective_namespace(None), XHTML_NS);
/// assert_eq!(effective_namespace(Some("urn:example")), "urn:example");
/// ```
pub fn effective_namespace(declared: Option<&str>) -> &str {
    match declared {
        Some(ns) if !ns.is_empty() => ns,
        _ => XHTML_NS,
    }
}

/// Count `h1`..`h6` elements in a content document.
///
/// Headings are matched anywhere below the root element, in the document's
/// effective namespace only. Fails if the document is not well-formed XML,
/// which includes bytes invalid in its encoding, malformed attributes and
/// references to undefined entities.
pub fn count_headings(bytes: &[u8]) -> Result<usize> {
    let content = decode_xml(bytes)?;
    let mut reader = NsReader::from_str(&content);

    let mut nesting = Nesting::default();
    let mut entities = Entities::default();
    let mut namespace = String::new();
    let mut count = 0;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let (depth, e) = match event {
            Event::Start(e) => (nesting.open()?, e),
            Event::Empty(e) => (nesting.empty()?, e),
            Event::End(_) => {
                nesting.close()?;
                continue;
            }
            Event::DocType(e) => {
                entities = Entities::from_doctype(&String::from_utf8_lossy(e.as_ref()));
                continue;
            }
            Event::GeneralRef(e) => {
                entities.check_reference(e.as_ref())?;
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        let attributes = Attributes::parse(&e, &entities)?;
        if depth == 0 {
            namespace = effective_namespace(attributes.get("xmlns")).to_string();
        } else if is_heading(&e) && in_namespace(&ns, &namespace) {
            count += 1;
        }
    }
    nesting.finish()?;

    Ok(count)
}

fn is_heading(e: &BytesStart) -> bool {
    HEADING_NAMES.contains(&e.local_name().as_ref())
}
