use crate::config::{
    DEFAULT_DOC_ID, DEFAULT_LANG, FLUSH_INTERVAL, PROGRESS_INTERVAL, SPINNER_INTERVAL,
};
use crate::decode::decode_line;
use crate::error::ImportError;
use crate::filter::{EntityFilter, Verdict};
use crate::parser::DumpReader;
use crate::project::{Projector, Schema};
use crate::stats::ImportStats;
use crate::writer::BatchWriter;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::PathBuf;
use tracing::{debug, info, trace};

/// Parameters for one import run
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Stop after examining this many source records
    pub limit: Option<u64>,
    pub lang: String,
    pub doc_id: String,
    pub schema: Schema,
    pub filter: EntityFilter,
    pub flush_interval: u64,
    pub progress_interval: u64,
    /// Draw a spinner on stderr
    pub show_progress: bool,
}

impl ImportConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            limit: None,
            lang: DEFAULT_LANG.to_string(),
            doc_id: DEFAULT_DOC_ID.to_string(),
            schema: Schema::default(),
            filter: EntityFilter::default(),
            flush_interval: FLUSH_INTERVAL,
            progress_interval: PROGRESS_INTERVAL,
            show_progress: false,
        }
    }
}

/// Streams `config.input` into a TSV node table at `config.output`.
///
/// One record at a time: read, decode, filter, project, buffer. Malformed
/// lines are counted and skipped; decompression and sink failures abort.
pub fn run_import(config: &ImportConfig) -> Result<ImportStats, ImportError> {
    if config.progress_interval == 0 {
        return Err(ImportError::Config(
            "progress interval must be at least 1".to_string(),
        ));
    }

    let mut reader = DumpReader::open(&config.input)?;
    let projector = Projector::new(config.schema.clone(), &config.lang, &config.doc_id);
    let mut writer =
        BatchWriter::create(&config.output, projector.schema(), config.flush_interval)?;
    let mut stats = ImportStats::new();

    let pb = make_spinner(config.show_progress);
    info!(
        input = %config.input.display(),
        output = %config.output.display(),
        lang = %config.lang,
        limit = ?config.limit,
        rules = config.filter.rules().len(),
        "Processing dump"
    );

    loop {
        // Checked before pulling so the record past the limit is never read
        if config.limit.is_some_and(|limit| stats.records_examined >= limit) {
            debug!(limit = ?config.limit, "Record limit reached");
            break;
        }
        let Some(line) = reader.next() else {
            break;
        };
        let line = line?;
        stats.inc_examined();
        let lineno = stats.records_examined;

        match decode_line(&line) {
            Ok(None) => stats.inc_framing(),
            Ok(Some(record)) => match config.filter.verdict(&record) {
                Verdict::Keep => {
                    writer.push(projector.project(&record));
                    stats.inc_emitted();
                }
                Verdict::WrongKind => {
                    trace!(id = %record.id, kind = record.kind.as_str(), "Skipping entity kind");
                    stats.inc_wrong_kind();
                }
                Verdict::Excluded { relation } => {
                    trace!(id = %record.id, relation, "Excluded by filter rule");
                    stats.inc_excluded();
                }
            },
            Err(e) => {
                debug!(line = lineno, error = %e, "Skipping malformed line");
                stats.inc_malformed();
            }
        }

        writer.record_consumed()?;

        if lineno % SPINNER_INTERVAL == 0 {
            pb.set_message(format!("{} records, {} rows", lineno, stats.rows_emitted));
            pb.tick();
        }
        if lineno % config.progress_interval == 0 {
            info!(
                records = lineno,
                rows = stats.rows_emitted,
                skipped = stats.skipped(),
                "Progress"
            );
        }
    }

    let writer_stats = writer.finish()?;
    stats.record_writer(writer_stats);
    pb.finish_and_clear();

    info!(
        records = stats.records_examined,
        rows = stats.rows_written,
        malformed = stats.malformed_lines,
        flushes = stats.flushes,
        "Import complete"
    );
    Ok(stats)
}

fn make_spinner(visible: bool) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if !visible {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        return pb;
    }
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.cyan} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message("processing wikidata file");
    pb
}
