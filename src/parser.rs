use crate::config::READ_BUFFER_SIZE;
use crate::error::ImportError;
use crate::models::RawLine;
use bzip2::read::MultiBzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Lazy, forward-only reader over the lines of a (usually bz2) dump.
///
/// Holds one line at a time; the decompressed dump is never materialized.
pub struct DumpReader {
    reader: Box<dyn BufRead>,
    lines: u64,
    failed: bool,
}

impl DumpReader {
    /// Opens `path`, decompressing with bzip2 when it ends in `.bz2`.
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        let file = File::open(path).map_err(|source| ImportError::Input {
            path: path.to_path_buf(),
            source,
        })?;

        let compressed = path.extension().is_some_and(|ext| ext == "bz2");
        debug!(path = %path.display(), compressed, "Opening dump");

        if compressed {
            // Parallel bzip2 writes concatenated streams, so read all of them
            Ok(Self::from_reader(MultiBzDecoder::new(file)))
        } else {
            Ok(Self::from_reader(file))
        }
    }

    /// Wraps an already-decompressed byte stream.
    pub fn from_reader<R: Read + 'static>(inner: R) -> Self {
        Self {
            reader: Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, inner)),
            lines: 0,
            failed: false,
        }
    }
}

impl Iterator for DumpReader {
    type Item = Result<RawLine, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                self.lines += 1;
                Some(Ok(buf))
            }
            Err(source) => {
                self.failed = true;
                Some(Err(ImportError::Decompression {
                    lines: self.lines,
                    source,
                }))
            }
        }
    }
}
