//! wdnodes: Wikidata JSON dump to KGTK-style node table
//!
//! This crate streams a bz2-compressed Wikidata JSON dump (one entity per
//! line inside a top-level array) into a tab-separated node table with one
//! row per item or property:
//!
//! ```text
//! id	label	type	descriptions	aliases	document_id
//! Q1	'Universe'@en	item	'everything'@en		wikidata-20200203
//! ```
//!
//! # Architecture
//!
//! A single sequential pass, one record at a time:
//!
//! - **Streaming decompression** -- The dump is read line by line through a
//!   multi-stream bzip2 decoder and is never held in memory
//! - **Tolerant decoding** -- Array framing lines are ignored, malformed lines
//!   are counted and skipped, missing maps mean "no value"
//! - **Kind filtering** -- Only items and properties are kept; optional
//!   relation rules drop entities by their `P31`/`P279` (or any) claims
//! - **Batched appends** -- Rows are buffered and appended every N source
//!   records, opening the output only for the duration of each flush
//!
//! # Key Modules
//!
//! - [`parser`] -- Line reader over the (bz2) dump
//! - [`decode`] -- Framing-line detection and JSON decoding
//! - [`models`] -- Entity record types
//! - [`filter`] -- Kind filter and relation exclusion rules
//! - [`project`] -- Output schema and localized value rendering
//! - [`writer`] -- Batched TSV appends with line-feed escaping
//! - [`pipeline`] -- The driver tying it together
//! - [`stats`] -- Per-run counters
//! - [`error`] -- Error taxonomy
//! - [`config`] -- Defaults and constants
//!
//! # Example Usage
//!
//! ```bash
//! wdnodes -i latest-all.json.bz2 -o nodes.tsv -L en -s wikidata-20200203 -v
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod filter;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod project;
pub mod stats;
pub mod writer;

pub use error::ImportError;
pub use pipeline::{run_import, ImportConfig};
