use crate::writer::WriterStats;

/// Counters collected during one import run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub records_examined: u64,
    pub framing_lines: u64,
    pub malformed_lines: u64,
    pub wrong_kind: u64,
    pub excluded_by_rule: u64,
    pub rows_emitted: u64,
    pub rows_written: u64,
    pub flushes: u64,
}

impl ImportStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_examined(&mut self) {
        self.records_examined += 1;
    }

    pub fn inc_framing(&mut self) {
        self.framing_lines += 1;
    }

    pub fn inc_malformed(&mut self) {
        self.malformed_lines += 1;
    }

    pub fn inc_wrong_kind(&mut self) {
        self.wrong_kind += 1;
    }

    pub fn inc_excluded(&mut self) {
        self.excluded_by_rule += 1;
    }

    pub fn inc_emitted(&mut self) {
        self.rows_emitted += 1;
    }

    /// Records examined that produced no row, for any reason.
    pub fn skipped(&self) -> u64 {
        self.framing_lines + self.malformed_lines + self.wrong_kind + self.excluded_by_rule
    }

    pub fn record_writer(&mut self, writer: WriterStats) {
        self.rows_written = writer.rows_written;
        self.flushes = writer.flushes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_zero() {
        let stats = ImportStats::new();
        assert_eq!(stats.records_examined, 0);
        assert_eq!(stats.rows_emitted, 0);
        assert_eq!(stats.skipped(), 0);
    }

    #[test]
    fn skipped_sums_every_reason() {
        let mut stats = ImportStats::new();
        stats.inc_framing();
        stats.inc_framing();
        stats.inc_malformed();
        stats.inc_wrong_kind();
        stats.inc_excluded();
        stats.inc_emitted();
        assert_eq!(stats.skipped(), 5);
        assert_eq!(stats.rows_emitted, 1);
    }

    #[test]
    fn record_writer_copies_counts() {
        let mut stats = ImportStats::new();
        stats.record_writer(WriterStats {
            rows_written: 12,
            flushes: 3,
        });
        assert_eq!(stats.rows_written, 12);
        assert_eq!(stats.flushes, 3);
    }
}
