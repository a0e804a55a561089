use lojavoz_common::{LojavozError, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Container extension every transient file carries, regardless of what
/// the client named its upload
const AUDIO_EXTENSION: &str = "wav";

/// Scoped transient audio file.
///
/// Created once under a generated name and deleted on drop, so every exit
/// path of the upload handler releases the file exactly once. The
/// client-supplied filename is never consulted.
pub struct TempAudio {
    path: PathBuf,
    file: Option<File>,
}

impl TempAudio {
    /// Create an empty transient file in the given directory
    pub fn create(dir: &Path) -> Result<Self> {
        let path = dir.join(format!("{}.{}", uuid::Uuid::new_v4(), AUDIO_EXTENSION));
        let file = File::create(&path).map_err(|e| {
            LojavozError::file_system(format!(
                "Failed to persist upload to {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Append one chunk of uploaded bytes
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| LojavozError::internal("Transient file already closed"))?;

        file.write_all(data).map_err(|e| {
            LojavozError::file_system(format!(
                "Failed to write upload to {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Path of the transient file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudio {
    fn drop(&mut self) {
        // Close before removing
        self.file.take();

        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Failed to remove transient file {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_write() {
        let dir = tempfile::tempdir().unwrap();

        let mut temp = TempAudio::create(dir.path()).unwrap();
        temp.write_chunk(b"RIFF").unwrap();
        temp.write_chunk(b"rest").unwrap();

        assert!(temp.path().exists());
        assert_eq!(temp.path().extension().unwrap(), "wav");

        let path = temp.path().to_path_buf();
        drop(temp);
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();

        let path = {
            let temp = TempAudio::create(dir.path()).unwrap();
            temp.path().to_path_buf()
        };

        assert!(!path.exists());
    }

    #[test]
    fn test_drop_tolerates_already_removed() {
        let dir = tempfile::tempdir().unwrap();

        let temp = TempAudio::create(dir.path()).unwrap();
        std::fs::remove_file(temp.path()).unwrap();
        // Drop must swallow the missing-file error
        drop(temp);
    }

    #[test]
    fn test_generated_names_are_distinct() {
        let dir = tempfile::tempdir().unwrap();

        let a = TempAudio::create(dir.path()).unwrap();
        let b = TempAudio::create(dir.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
