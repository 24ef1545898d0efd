use std::io::Read;

use crate::error::ParserError;

/// Create a reader for a local path or HTTP(S) URL, transparently
/// decompressing `.gz` and `.bz2` content.
pub fn get_reader(path: &str) -> Result<Box<dyn Read>, ParserError> {
    Ok(oneio::get_reader(path)?)
}
