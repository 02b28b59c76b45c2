//! Field extraction for delimited text files.
//!
//! Reads input one line at a time, splits each line on a literal delimiter
//! and writes the selected field of every line that has one. Lines that are
//! blank, too short, or whose field is empty are skipped without error.

pub mod error;
pub mod extractor;
pub mod field;

pub use {
    error::{Error, Result},
    extractor::{ExtractStats, extract_fields, extract_file},
    field::{DEFAULT_DELIMITER, DEFAULT_FIELD_INDEX, Delimiter, FieldSpec, select_field},
};
