//! EPUB package resolution: locate the OPF, walk its spine, count headings.

mod parser;
mod reader;

pub use parser::{OPF_NS, PackageDocument, SpineItem, parse_opf};
pub use reader::{HeadingTally, count_headings_from_reader, count_headings_in_epub, tally_epub};
