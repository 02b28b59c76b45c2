use std::num::IntErrorKind;

use fieldex_extract::{DEFAULT_FIELD_INDEX, Delimiter, FieldSpec};

use crate::error::{InvalidArgument, Result};

/// Extraction settings for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Zero-based index of the field to extract.
    pub field_index: usize,
    pub delimiter: Delimiter,
}

impl Session {
    /// Build a session from raw values, validating both.
    pub fn new(field_index: i64, delimiter: &str) -> Result<Self> {
        Ok(Self {
            field_index: checked_index(field_index)?,
            delimiter: checked_delimiter(delimiter)?,
        })
    }

    /// 1-based position of the configured field, as shown to users.
    pub fn ordinal(&self) -> usize {
        self.field_index.saturating_add(1)
    }

    #[must_use]
    pub fn field_spec(&self) -> FieldSpec {
        FieldSpec::new(self.field_index, self.delimiter.clone())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            field_index: DEFAULT_FIELD_INDEX,
            delimiter: Delimiter::default(),
        }
    }
}

/// Parse the argument of a "set index" command into a field index.
///
/// Non-integers and negative integers are rejected with distinct reasons.
/// Integers too large for `usize` saturate to `usize::MAX`, which matches no
/// line.
pub fn parse_field_index(raw: &str) -> Result<usize> {
    let trimmed = raw.trim();
    let not_an_integer = || InvalidArgument::NotAnInteger(trimmed.to_string());
    match trimmed.strip_prefix('-').filter(|m| !m.starts_with('+')) {
        Some(magnitude) => match parse_magnitude(magnitude) {
            Some(0) => Ok(0),
            Some(_) => Err(InvalidArgument::Negative(trimmed.to_string()).into()),
            None => Err(not_an_integer().into()),
        },
        None => parse_magnitude(trimmed).ok_or_else(|| not_an_integer().into()),
    }
}

/// Parse an optionally `+`-signed run of decimal digits, saturating on
/// overflow.
fn parse_magnitude(s: &str) -> Option<usize> {
    match s.parse::<usize>() {
        Ok(value) => Some(value),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(usize::MAX),
        Err(_) => None,
    }
}

pub(crate) fn checked_index(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| InvalidArgument::Negative(value.to_string()).into())
}

pub(crate) fn checked_delimiter(value: &str) -> Result<Delimiter> {
    Delimiter::new(value).map_err(|_| InvalidArgument::EmptyDelimiter.into())
}
