//! Offset-addressed byte sources backing an [`Elf32File`](crate::Elf32File).

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::Result;

/// Random-access byte source.
///
/// Reads are exact: fewer than `len` bytes available is an
/// [`io::ErrorKind::UnexpectedEof`] error, never a short buffer.
pub trait ByteSource {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Io`](crate::ElfError::Io) if the source cannot be
    /// read or holds fewer than `offset + len` bytes.
    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Human-readable origin, used in log events.
    fn describe(&self) -> String;
}

/// File on disk, reopened and reseeked for every read.
///
/// Holds no file handle between reads.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        let file_len = file.metadata()?.len();
        let end = u64::try_from(len).ok().and_then(|len| offset.checked_add(len));
        if end.is_none_or(|end| end > file_len) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("read of {len} bytes at offset {offset} exceeds file of {file_len} bytes"),
            )
            .into());
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Whole image held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    #[must_use]
    pub const fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Read an entire file into memory once.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Io`](crate::ElfError::Io) if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(std::fs::read(path)?))
    }
}

impl ByteSource for MemorySource {
    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        usize::try_from(offset)
            .ok()
            .and_then(|start| Some((start, start.checked_add(len)?)))
            .and_then(|(start, end)| self.data.get(start..end))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "read of {len} bytes at offset {offset} exceeds image of {} bytes",
                        self.data.len()
                    ),
                )
                .into()
            })
    }

    fn describe(&self) -> String {
        format!("<memory: {} bytes>", self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::ElfError;

    #[test]
    fn test_memory_source_exact_reads() {
        let source = MemorySource::new(vec![10, 11, 12, 13]);
        assert_eq!(source.read_at(1, 2).unwrap(), vec![11, 12]);
        assert_eq!(source.read_at(4, 0).unwrap(), Vec::<u8>::new());
        let err = source.read_at(3, 2).unwrap_err();
        assert!(matches!(err, ElfError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_file_source_reopens_per_read() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&[1, 2, 3, 4, 5]).unwrap();
        tmp.flush().unwrap();

        let source = FileSource::new(tmp.path());
        assert_eq!(source.read_at(2, 3).unwrap(), vec![3, 4, 5]);
        assert_eq!(source.read_at(0, 1).unwrap(), vec![1]);
        assert!(source.read_at(4, 2).is_err());
    }

    #[test]
    fn test_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("missing.o"));
        assert!(matches!(source.read_at(0, 1), Err(ElfError::Io(_))));
    }
}
