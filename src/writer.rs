use crate::config::WRITE_BUFFER_SIZE;
use crate::error::ImportError;
use crate::project::{ProjectedRow, Schema};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefixed to every tab, line feed or carriage return inside a cell.
const ESCAPE: char = '\n';

/// Escapes bytes that would otherwise split a cell or a row.
pub fn escape_cell(cell: &str) -> Cow<'_, str> {
    if !cell.contains(['\t', '\n', '\r']) {
        return Cow::Borrowed(cell);
    }
    let mut out = String::with_capacity(cell.len() + 4);
    for c in cell.chars() {
        if matches!(c, '\t' | '\n' | '\r') {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    Cow::Owned(out)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriterStats {
    pub rows_written: u64,
    pub flushes: u64,
}

/// Buffers rows and appends them to the TSV sink in batches.
///
/// The sink is only open for the duration of a flush, so everything flushed
/// so far survives if the process dies mid-run. A row is either in the batch
/// or fully written, never half of each.
pub struct BatchWriter {
    path: PathBuf,
    batch: Vec<ProjectedRow>,
    flush_interval: u64,
    consumed: u64,
    stats: WriterStats,
}

impl BatchWriter {
    /// Truncates `path` and writes the header row.
    pub fn create(path: &Path, schema: &Schema, flush_interval: u64) -> Result<Self, ImportError> {
        if flush_interval == 0 {
            return Err(ImportError::Config(
                "flush interval must be at least 1".to_string(),
            ));
        }

        let writer = Self {
            path: path.to_path_buf(),
            batch: Vec::new(),
            flush_interval,
            consumed: 0,
            stats: WriterStats::default(),
        };

        let file = File::create(path).map_err(|e| writer.sink_error(e))?;
        writer
            .write_rows(file, std::iter::once(schema.header()))
            .map_err(|e| writer.sink_error(e))?;

        debug!(path = %path.display(), columns = schema.len(), "Header written");
        Ok(writer)
    }

    pub fn push(&mut self, row: ProjectedRow) {
        self.batch.push(row);
    }

    /// Counts one source record, flushing once every `flush_interval` records
    /// whether or not any of them produced a row.
    pub fn record_consumed(&mut self) -> Result<(), ImportError> {
        self.consumed += 1;
        if self.consumed % self.flush_interval == 0 {
            self.flush()?;
        }
        Ok(())
    }

    /// Appends the buffered rows in arrival order and clears the batch.
    pub fn flush(&mut self) -> Result<(), ImportError> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.sink_error(e))?;
        self.write_rows(file, self.batch.iter())
            .map_err(|e| self.sink_error(e))?;

        let rows = self.batch.len() as u64;
        self.batch.clear();
        self.stats.rows_written += rows;
        self.stats.flushes += 1;
        debug!(rows, total = self.stats.rows_written, "Flushed batch");
        Ok(())
    }

    /// Flushes the remainder, however small.
    pub fn finish(mut self) -> Result<WriterStats, ImportError> {
        self.flush()?;
        Ok(self.stats)
    }

    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    fn write_rows<I, R, S>(&self, file: File, rows: I) -> io::Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut wtr = WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .has_headers(false)
            .from_writer(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file));

        for row in rows {
            let cells: Vec<_> = row
                .into_iter()
                .map(|cell| escape_cell(cell.as_ref()).into_owned())
                .collect();
            wtr.write_record(&cells)?;
        }
        wtr.flush()
    }

    fn sink_error(&self, source: impl Into<io::Error>) -> ImportError {
        ImportError::SinkWrite {
            path: self.path.clone(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(cells: &[&str]) -> ProjectedRow {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn escape_cell_passthrough() {
        assert!(matches!(escape_cell("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn escape_cell_prefixes_line_feed() {
        assert_eq!(escape_cell("a\tb"), "a\n\tb");
        assert_eq!(escape_cell("a\nb"), "a\n\nb");
        assert_eq!(escape_cell("a\r\nb"), "a\n\r\n\nb");
    }

    #[test]
    fn header_then_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tsv");
        let mut writer = BatchWriter::create(&path, &Schema::default(), 100).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "id\tlabel\ttype\tdescriptions\taliases\tdocument_id\n"
        );

        writer.push(row(&["Q1", "'U'@en", "item", "", "", "doc"]));
        let stats = writer.finish().unwrap();
        assert_eq!(stats.rows_written, 1);
        assert_eq!(stats.flushes, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().nth(1), Some("Q1\t'U'@en\titem\t\t\tdoc"));
    }

    #[test]
    fn quotes_are_written_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tsv");
        let schema = Schema::parse("id,label,type").unwrap();
        let mut writer = BatchWriter::create(&path, &schema, 10).unwrap();
        writer.push(row(&["Q1", "'say \"hi\"'@en", "item"]));
        writer.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("Q1\t'say \"hi\"'@en\titem\n"));
    }

    #[test]
    fn flushes_on_consumed_records_not_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tsv");
        let schema = Schema::parse("id,type").unwrap();
        let mut writer = BatchWriter::create(&path, &schema, 3).unwrap();

        writer.push(row(&["Q1", "item"]));
        writer.record_consumed().unwrap();
        writer.record_consumed().unwrap();
        assert_eq!(writer.pending(), 1);
        writer.record_consumed().unwrap();
        assert_eq!(writer.pending(), 0);
        assert_eq!(writer.stats().flushes, 1);

        // Nothing buffered: the interval passes without touching the sink
        for _ in 0..3 {
            writer.record_consumed().unwrap();
        }
        assert_eq!(writer.stats().flushes, 1);
    }

    #[test]
    fn zero_interval_rejected() {
        let dir = TempDir::new().unwrap();
        let err = BatchWriter::create(&dir.path().join("o.tsv"), &Schema::default(), 0)
            .err()
            .unwrap();
        assert!(matches!(err, ImportError::Config(_)));
    }

    #[test]
    fn unwritable_sink_is_fatal() {
        let err = BatchWriter::create(
            Path::new("/definitely/not/a/dir/out.tsv"),
            &Schema::default(),
            10,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ImportError::SinkWrite { .. }));
    }
}
