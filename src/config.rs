/// Flush the output batch every N source records consumed
pub const FLUSH_INTERVAL: u64 = 50_000;

/// Progress log interval (every N source records)
pub const PROGRESS_INTERVAL: u64 = 500_000;

/// Spinner tick interval, finer than the log cadence
pub const SPINNER_INTERVAL: u64 = 10_000;

/// Language code used for labels, descriptions and aliases
pub const DEFAULT_LANG: &str = "en";

/// Dataset tag stamped on every row
pub const DEFAULT_DOC_ID: &str = "wikidata-20200203";

/// Read buffer for the decompressed dump
pub const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Write buffer for each append flush
pub const WRITE_BUFFER_SIZE: usize = 128 * 1024;

/// Separator between rendered aliases in one cell
pub const ALIAS_SEPARATOR: &str = "|";
