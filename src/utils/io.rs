use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use log::debug;
use crate::error::Result;

const BUFFER_SIZE: usize = 1 << 20;

pub fn open_input<P: AsRef<Path>>(path: P) -> Result<BufReader<File>> {
    debug!("Opening input {:?}", path.as_ref());
    Ok(BufReader::with_capacity(BUFFER_SIZE, File::open(path)?))
}

pub fn open_output<P: AsRef<Path>>(path: P) -> Result<BufWriter<File>> {
    debug!("Opening output {:?}", path.as_ref());
    Ok(BufWriter::with_capacity(BUFFER_SIZE, File::create(path)?))
}

/// Strips a trailing `\r` left by CRLF input.
pub fn trim_line_end(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
