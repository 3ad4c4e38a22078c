use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;
use wdnodes::config::{DEFAULT_DOC_ID, DEFAULT_LANG, FLUSH_INTERVAL, PROGRESS_INTERVAL};
use wdnodes::filter::EntityFilter;
use wdnodes::project::Schema;
use wdnodes::ImportConfig;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wdnodes")]
#[command(about = "Import Wikidata nodes into a KGTK node file")]
struct Cli {
    /// Path to the Wikidata JSON dump (.json.bz2)
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Output TSV file
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Stop after this many dump lines (for testing)
    #[arg(short = 'l', long)]
    limit: Option<u64>,

    /// Language for labels, descriptions and aliases
    #[arg(short = 'L', long, default_value = DEFAULT_LANG)]
    lang: String,

    /// Document id stamped on every row
    #[arg(short = 's', long, default_value = DEFAULT_DOC_ID)]
    doc_id: String,

    /// Output columns; id and type are required
    #[arg(long, default_value = "id,label,type,descriptions,aliases,document_id")]
    columns: String,

    /// Append buffered rows every N dump lines
    #[arg(long, default_value_t = FLUSH_INTERVAL)]
    flush_interval: u64,

    /// JSON file mapping relation ids to excluded target ids
    #[arg(long)]
    filter_rules: Option<PathBuf>,

    /// Drop Wikimedia meta items, punctuation and letters (P31/P279)
    #[arg(long)]
    exclude_meta: bool,

    /// Hide the progress spinner; without -v, log warnings only
    #[arg(long)]
    quiet: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn build_config(cli: &Cli) -> Result<ImportConfig> {
    let schema = Schema::parse(&cli.columns)?;

    let mut filter = EntityFilter::default();
    if cli.exclude_meta {
        filter = filter.with_rules(EntityFilter::meta_exclusions());
    }
    if let Some(path) = &cli.filter_rules {
        filter = filter.with_rules(EntityFilter::load_rules(path)?);
    }

    Ok(ImportConfig {
        limit: cli.limit,
        lang: cli.lang.clone(),
        doc_id: cli.doc_id.clone(),
        schema,
        filter,
        flush_interval: cli.flush_interval,
        progress_interval: PROGRESS_INTERVAL,
        show_progress: !cli.quiet,
        ..ImportConfig::new(&cli.input, &cli.output)
    })
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    let start = Instant::now();
    let stats = wdnodes::run_import(&config).with_context(|| {
        format!(
            "Failed to import {} into {}",
            cli.input.display(),
            cli.output.display()
        )
    })?;
    let duration = start.elapsed();

    println!();
    println!("=== Summary ===");
    println!("Import time:        {:.2}s", duration.as_secs_f64());
    println!("Lines examined:     {}", stats.records_examined);
    println!("Rows written:       {}", stats.rows_written);
    println!("Framing lines:      {}", stats.framing_lines);
    println!("Malformed lines:    {}", stats.malformed_lines);
    println!("Other entity kinds: {}", stats.wrong_kind);
    println!("Excluded by rules:  {}", stats.excluded_by_rule);
    println!("Flushes:            {}", stats.flushes);

    Ok(())
}

/// Progress and completion messages are `info!`, so they show by default.
fn log_level(verbose: u8, quiet: bool) -> Level {
    match verbose {
        0 if quiet => Level::WARN,
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = log_level(cli.verbose, cli.quiet);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
