use super::LogWriter;
use crate::{util::io_err, FieldLogError};
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Appends each rendered event as a line to a single file, and syncs it to disk.
///
/// For files that are rotated on a time schedule, use
/// [`TimeRotatedFileWriter`](crate::writers::TimeRotatedFileWriter).
#[derive(Debug)]
pub struct FileWriter {
    path: PathBuf,
    file: Mutex<File>,
}
impl FileWriter {
    /// Opens (or creates) the file in append mode.
    ///
    /// # Errors
    ///
    /// `FieldLogError::Io` if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FieldLogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// The path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
impl LogWriter for FileWriter {
    fn write(&self, content: &[u8]) -> std::io::Result<()> {
        let mut line = Vec::with_capacity(content.len() + 1);
        line.extend_from_slice(content);
        line.push(b'\n');
        let mut file = self.file.lock().map_err(|_e| io_err("Poison"))?;
        file.write_all(&line)?;
        file.sync_data()
    }

    fn flush(&self) -> std::io::Result<()> {
        self.file.lock().map_err(|_e| io_err("Poison"))?.flush()
    }
}

#[cfg(test)]
mod test {
    use super::FileWriter;
    use crate::writers::LogWriter;

    #[test]
    fn test_file_writer_appends_lines() {
        let dir = temp_dir::TempDir::new().unwrap();
        let path = dir.child("plain.log");
        {
            let writer = FileWriter::open(&path).unwrap();
            writer.write(b"first").unwrap();
        }
        // reopening appends
        let writer = FileWriter::open(&path).unwrap();
        writer.write(b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
