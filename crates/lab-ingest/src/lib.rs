//! Instrument CSV ingestion.
//!
//! This crate reads tabular instrument exports into a raw [`CsvTable`],
//! handling the encodings and formatting quirks those exports carry.
//!
//! # Features
//!
//! - **Encoding Fallback**: UTF-8 first, then the Western single-byte code pages
//! - **Cleaning**: Empty rows and summary footers (`Mean`, `SD`, ...) are dropped
//! - **Column Hints**: Numeric column detection
//! - **Discovery**: Sorted CSV listing for batch runs
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use lab_ingest::{is_numeric_column, list_csv_files, read_csv_table};
//!
//! for path in list_csv_files(Path::new("exports"))? {
//!     let table = read_csv_table(&path)?;
//!     let numeric = (0..table.width()).filter(|&idx| is_numeric_column(&table, idx)).count();
//! }
//! ```

mod decode;
mod discovery;
mod error;
mod hints;
mod table;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use decode::{TextEncoding, decode_bytes};
pub use table::{CsvTable, UNNAMED_FIRST_COLUMN, is_footer_label, parse_csv_text, read_csv_table};

// === File Discovery ===
pub use discovery::{is_generated_output, list_csv_files};

// === Column Hints ===
pub use hints::is_numeric_column;
