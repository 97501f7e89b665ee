use super::LogWriter;
use crate::util::io_err;
use std::sync::{Arc, Mutex};

/// Collects the written lines in memory.
///
/// Clones share the same buffer, so a clone can be handed to a handler while the original
/// is kept to inspect the output.
#[derive(Clone, Debug, Default)]
pub struct BufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}
impl BufferWriter {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything that was written so far.
    #[must_use]
    pub fn content(&self) -> Vec<u8> {
        match self.buffer.lock() {
            Ok(buffer) => buffer.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The written lines, without line endings.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.content())
            .lines()
            .map(ToString::to_string)
            .collect()
    }
}
impl LogWriter for BufferWriter {
    fn write(&self, content: &[u8]) -> std::io::Result<()> {
        let mut buffer = self.buffer.lock().map_err(|_e| io_err("Poison"))?;
        buffer.extend_from_slice(content);
        buffer.push(b'\n');
        Ok(())
    }
}
