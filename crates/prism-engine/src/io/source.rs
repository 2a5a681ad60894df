use std::io;
use std::path::Path;

/// Reads shader source text.
///
/// Called on every compile, including hot reloads, so edits on disk are picked
/// up without restarting.
pub trait SourceReader {
    fn read_text_file(&self, path: &Path) -> io::Result<String>;
}

/// Reads from the local filesystem.
#[derive(Debug, Default, Copy, Clone)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
    fn read_text_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}
