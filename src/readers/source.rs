use crate::error::Result;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use encoding_rs::UTF_8;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read a sounding file as text. Bytes that are not valid UTF-8 are dropped
/// rather than failing the file.
pub fn read_sounding_text(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(decode_lossy(&bytes))
}

pub fn decode_lossy(bytes: &[u8]) -> String {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        text.chars().filter(|c| *c != char::REPLACEMENT_CHARACTER).collect()
    } else {
        text.into_owned()
    }
}
