use crate::core::error::{LoomError, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const READ_BUFFER: usize = 256 * 1024;

/// Open a possibly gzip-compressed file for buffered reading.
///
/// Compression is detected from the leading magic bytes, so `quants_mat.mtx`
/// holding gzip data still decodes. Concatenated gzip members (BGZF) are read
/// through to the end.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            LoomError::FileNotFound(path.display().to_string())
        } else {
            LoomError::Io(err)
        }
    })?;

    let mut reader = BufReader::with_capacity(READ_BUFFER, file);
    let compressed = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

    if compressed {
        Ok(Box::new(BufReader::with_capacity(
            READ_BUFFER,
            MultiGzDecoder::new(reader),
        )))
    } else {
        Ok(Box::new(reader))
    }
}

/// Open a possibly gzip-compressed file as a raw byte stream.
pub fn open_binary<P: AsRef<Path>>(path: P) -> Result<Box<dyn Read>> {
    let reader = open_input(path)?;
    Ok(Box::new(reader))
}
