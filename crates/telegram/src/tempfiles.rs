use std::{io, path::Path};

use tempfile::{Builder, NamedTempFile};

/// Input and output scratch files for one upload.
///
/// Both files are deleted when this value is dropped, whether or not the
/// request succeeded. [`RequestFiles::close`] does the same but reports
/// removal errors.
#[derive(Debug)]
pub struct RequestFiles {
    input: NamedTempFile,
    output: NamedTempFile,
}

impl RequestFiles {
    /// Create both files in `dir`, creating the directory if needed.
    pub fn create(dir: &Path, user_id: u64, message_id: i32) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let input = Builder::new()
            .prefix(&format!("input_{user_id}_{message_id}_"))
            .suffix(".txt")
            .tempfile_in(dir)?;
        let output = Builder::new()
            .prefix(&format!("output_{user_id}_{message_id}_"))
            .suffix(".txt")
            .tempfile_in(dir)?;
        Ok(Self { input, output })
    }

    pub fn input(&self) -> &Path {
        self.input.path()
    }

    pub fn output(&self) -> &Path {
        self.output.path()
    }

    /// Remove both files now.
    pub fn close(self) -> io::Result<()> {
        let input = self.input.close();
        let output = self.output.close();
        input.and(output)
    }
}
