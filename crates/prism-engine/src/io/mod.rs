//! File access used by shader compilation.

mod source;

pub use source::{FsSourceReader, SourceReader};
