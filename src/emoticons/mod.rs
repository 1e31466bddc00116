// Emoticon catalog and the message formatter built on it

pub mod catalog;
pub mod formatter;

pub use catalog::{Emoticon, EmoticonCategory};
pub use formatter::{extract_occurrences, render_plain, render_with_glyphs, RenderedSegment};
