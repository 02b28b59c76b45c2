use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use tracing::debug;

use crate::{
    error::{Error, Result},
    field::{FieldSpec, Skip, classify},
};

/// Counters for a single extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Lines consumed from the input, including skipped ones.
    pub lines_read: usize,
    /// Lines written to the output. Zero means nothing matched.
    pub written: usize,
    pub blank: usize,
    /// Lines with fewer than `field_index + 1` parts.
    pub missing_field: usize,
    /// Lines whose selected field was blank.
    pub empty_field: usize,
}

impl ExtractStats {
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    fn record(&mut self, skip: Skip) {
        match skip {
            Skip::Blank => self.blank += 1,
            Skip::MissingField => self.missing_field += 1,
            Skip::EmptyField => self.empty_field += 1,
        }
    }
}

/// Stream `reader` line by line and write the selected field of each line
/// to `writer`, one value per `\n`-terminated line.
///
/// Invalid UTF-8 is replaced with U+FFFD rather than rejected. Lines that
/// do not yield a value are skipped. Only I/O errors are returned.
pub fn extract_fields<R, W>(mut reader: R, mut writer: W, spec: &FieldSpec) -> Result<ExtractStats>
where
    R: BufRead,
    W: Write,
{
    let mut stats = ExtractStats::default();
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        stats.lines_read += 1;

        let line = String::from_utf8_lossy(&buf);
        match classify(&line, spec) {
            Ok(value) => {
                writer.write_all(value.as_bytes())?;
                writer.write_all(b"\n")?;
                stats.written += 1;
            },
            Err(skip) => stats.record(skip),
        }
    }

    writer.flush()?;
    Ok(stats)
}

/// Run [`extract_fields`] from the file at `input` into a new file at
/// `output`, truncating `output` if it exists.
pub fn extract_file(input: &Path, output: &Path, spec: &FieldSpec) -> Result<ExtractStats> {
    let reader = File::open(input)
        .map(BufReader::new)
        .map_err(|e| Error::file(format!("failed to open {}", input.display()), e))?;
    let writer = File::create(output)
        .map(BufWriter::new)
        .map_err(|e| Error::file(format!("failed to create {}", output.display()), e))?;

    let stats = extract_fields(reader, writer, spec)?;
    debug!(
        input = %input.display(),
        output = %output.display(),
        field_index = spec.field_index,
        delimiter = %spec.delimiter,
        lines_read = stats.lines_read,
        written = stats.written,
        blank = stats.blank,
        missing_field = stats.missing_field,
        empty_field = stats.empty_field,
        "extracted fields"
    );
    Ok(stats)
}
