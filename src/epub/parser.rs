//! OPF package document parsing.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::error::{Error, Result};
use crate::util::{Attributes, Entities, Nesting, in_namespace};

/// The OPF package namespace.
pub const OPF_NS: &str = "http://www.idpf.org/2007/opf";

/// The parts of an OPF package document needed to find content documents.
///
/// `None` means the element is absent from the package, which is not the
/// same as present but empty.
#[derive(Debug, Default)]
pub struct PackageDocument {
    /// Maps manifest id -> href, for items having both.
    pub manifest: Option<HashMap<String, String>>,
    /// `itemref` children of the spine, in reading order.
    pub spine: Option<Vec<SpineItem>>,
}

/// One `<itemref>` of the spine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    pub idref: Option<String>,
}

impl PackageDocument {
    /// Resolve the spine through the manifest, in reading order.
    ///
    /// Itemrefs that do not resolve are skipped. Fails only when the spine or
    /// manifest is missing, or the spine has no itemrefs.
    pub fn spine_hrefs(&self) -> Result<Vec<&str>> {
        let spine = self.spine.as_deref().ok_or(Error::MissingSpine)?;
        if spine.is_empty() {
            return Err(Error::EmptySpine);
        }
        let manifest = self.manifest.as_ref().ok_or(Error::MissingManifest)?;

        let hrefs = spine
            .iter()
            .filter_map(|item| {
                let idref = item.idref.as_deref()?;
                let href = manifest.get(idref);
                if href.is_none() {
                    tracing::debug!(idref, "spine itemref not in manifest, skipping");
                }
                href.map(String::as_str)
            })
            .collect();

        Ok(hrefs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Manifest,
    Spine,
}

/// Parse an OPF package document.
///
/// Only the first `manifest` and first `spine` children of the root element
/// in the OPF namespace are read. Fails if the document is not well-formed.
pub fn parse_opf(content: &str) -> Result<PackageDocument> {
    let mut reader = NsReader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut package = PackageDocument::default();
    let mut nesting = Nesting::default();
    let mut entities = Entities::default();
    let mut section: Option<Section> = None;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        match event {
            Event::Start(e) => {
                let depth = nesting.open()?;
                let attributes = Attributes::parse(&e, &entities)?;
                let opened = package.visit(depth, &ns, &e, &attributes, section);
                if depth == 1 {
                    section = opened;
                }
            }
            Event::Empty(e) => {
                let depth = nesting.empty()?;
                let attributes = Attributes::parse(&e, &entities)?;
                package.visit(depth, &ns, &e, &attributes, section);
            }
            Event::End(_) => {
                nesting.close()?;
                if nesting.depth() == 1 {
                    section = None;
                }
            }
            Event::DocType(e) => {
                entities = Entities::from_doctype(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) => entities.check_reference(e.as_ref())?,
            Event::Eof => break,
            _ => {}
        }
    }
    nesting.finish()?;

    Ok(package)
}

impl PackageDocument {
    /// Handle an element. Returns the section it opens, if any.
    fn visit(
        &mut self,
        depth: usize,
        ns: &ResolveResult,
        e: &BytesStart,
        attributes: &Attributes,
        section: Option<Section>,
    ) -> Option<Section> {
        if !in_namespace(ns, OPF_NS) {
            return None;
        }

        match (depth, section, e.local_name().as_ref()) {
            (1, _, b"spine") if self.spine.is_none() => {
                self.spine = Some(Vec::new());
                Some(Section::Spine)
            }
            (1, _, b"manifest") if self.manifest.is_none() => {
                self.manifest = Some(HashMap::new());
                Some(Section::Manifest)
            }
            (2, Some(Section::Spine), b"itemref") => {
                if let Some(spine) = self.spine.as_mut() {
                    spine.push(SpineItem {
                        idref: attributes.get("idref").map(str::to_owned),
                    });
                }
                None
            }
            (2, Some(Section::Manifest), b"item") => {
                let id = attributes.get("id").filter(|id| !id.is_empty());
                let href = attributes.get("href").filter(|href| !href.is_empty());
                match (id, href, self.manifest.as_mut()) {
                    (Some(id), Some(href), Some(manifest)) => {
                        manifest.insert(id.to_owned(), href.to_owned());
                    }
                    (id, href, _) => {
                        tracing::debug!(?id, ?href, "manifest item lacks id or href, skipping");
                    }
                }
                None
            }
            _ => None,
        }
    }
}
