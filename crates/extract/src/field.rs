use std::{fmt, ops::Deref};

use crate::error::{Error, Result};

/// Field index used when a user has not configured one (the sixth field).
pub const DEFAULT_FIELD_INDEX: usize = 5;

/// Delimiter used when a user has not configured one.
pub const DEFAULT_DELIMITER: &str = ":";

/// A literal, non-empty separator string. Construct with [`Delimiter::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiter(String);

impl Delimiter {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(Error::EmptyDelimiter);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self(DEFAULT_DELIMITER.to_string())
    }
}

impl Deref for Delimiter {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Delimiter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Delimiter {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

/// Which field to pull out of each line, and how lines are split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Zero-based position of the field.
    pub field_index: usize,
    pub delimiter: Delimiter,
}

impl FieldSpec {
    #[must_use]
    pub fn new(field_index: usize, delimiter: Delimiter) -> Self {
        Self {
            field_index,
            delimiter,
        }
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self {
            field_index: DEFAULT_FIELD_INDEX,
            delimiter: Delimiter::default(),
        }
    }
}

/// Why a line produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Skip {
    Blank,
    MissingField,
    EmptyField,
}

pub(crate) fn classify<'a>(line: &'a str, spec: &FieldSpec) -> std::result::Result<&'a str, Skip> {
    let line = line.trim();
    if line.is_empty() {
        return Err(Skip::Blank);
    }
    let value = line
        .split(spec.delimiter.as_str())
        .nth(spec.field_index)
        .ok_or(Skip::MissingField)?
        .trim();
    if value.is_empty() {
        return Err(Skip::EmptyField);
    }
    Ok(value)
}

/// Apply the per-line extraction rule to a single line.
///
/// Returns the trimmed field, or `None` when the line is blank, has fewer
/// than `field_index + 1` parts, or the field itself is blank.
pub fn select_field<'a>(line: &'a str, spec: &FieldSpec) -> Option<&'a str> {
    classify(line, spec).ok()
}
