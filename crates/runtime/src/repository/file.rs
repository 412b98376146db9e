//! Append-only action log file.
//!
//! # File Format
//!
//! ```text
//! [u32 length][bincode LogRecord]
//! [u32 length][bincode LogRecord]
//! ...
//! ```
//!
//! A record is either an `Entry` (action plus the pointer after it) or an
//! `Anchor`, which may only appear first and sets the pointer preceding the
//! first entry. Anchors are written by compaction.
//!
//! The pointer index is not persisted. Opening a log replays every record,
//! re-hashing the chain, so a file whose stored pointers disagree with its
//! actions is rejected as corrupted.
//!
//! A dispatch whose write or flush fails truncates the file back to the
//! last complete record, so a failed append never leaves a partial frame.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use rollup_core::{Action, ChainPointer};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::index::ChainIndex;
use super::types::{LogEntry, PendingActions};
use super::{ActionRepository, RepositoryError, Result};

#[derive(Debug, Serialize, Deserialize)]
enum LogRecord<A> {
    Anchor(ChainPointer),
    Entry(LogEntry<A>),
}

type Sink = Box<dyn Write + Send + Sync>;

struct FileLogInner<A> {
    index: ChainIndex<A>,
    writer: BufWriter<Sink>,
    /// File length covered by complete, flushed records.
    committed_len: u64,
}

impl<A> FileLogInner<A> {
    fn new(index: ChainIndex<A>, file: File, committed_len: u64) -> Self {
        let sink: Sink = Box::new(file);
        Self {
            index,
            writer: BufWriter::new(sink),
            committed_len,
        }
    }

    /// Discards unflushed bytes and truncates `path` to the committed length.
    fn rollback(&mut self, path: &Path) -> io::Result<()> {
        OpenOptions::new()
            .write(true)
            .open(path)?
            .set_len(self.committed_len)?;
        let sink: Sink = Box::new(OpenOptions::new().append(true).open(path)?);
        let stale = std::mem::replace(&mut self.writer, BufWriter::new(sink));
        let (_, _unwritten) = stale.into_parts();
        Ok(())
    }
}

/// File-backed implementation of [`ActionRepository`].
///
/// Entries are held in memory for lookups and mirrored to disk; each
/// dispatch is flushed before it becomes visible.
pub struct FileActionLog<A> {
    path: PathBuf,
    inner: RwLock<FileLogInner<A>>,
}

impl<A> FileActionLog<A>
where
    A: Action + Serialize + DeserializeOwned,
{
    /// Create a new empty log.
    ///
    /// # Errors
    ///
    /// Returns error if the file already exists (prevents accidental overwrites).
    pub fn create(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir)?;

        let path = base_dir.join(filename.as_ref());
        if path.exists() {
            return Err(RepositoryError::LogAlreadyExists(
                path.display().to_string(),
            ));
        }

        let file = OpenOptions::new().create_new(true).append(true).open(&path)?;
        tracing::debug!("Created action log: {}", path.display());

        Ok(Self {
            path,
            inner: RwLock::new(FileLogInner::new(
                ChainIndex::new(ChainPointer::INITIAL),
                file,
                0,
            )),
        })
    }

    /// Open an existing log, rebuilding the pointer index.
    pub fn open(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let path = base_dir.as_ref().join(filename.as_ref());
        let (index, committed_len) = Self::replay(&path)?;
        let file = OpenOptions::new().append(true).open(&path)?;

        tracing::debug!(
            "Opened action log: {} ({} entries, tail {})",
            path.display(),
            index.len(),
            index.tail().short()
        );

        Ok(Self {
            path,
            inner: RwLock::new(FileLogInner::new(index, file, committed_len)),
        })
    }

    /// Open the log if it exists, otherwise create it.
    pub fn open_or_create(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let filename = filename.as_ref();
        if base_dir.join(filename).exists() {
            Self::open(base_dir, filename)
        } else {
            Self::create(base_dir, filename)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pointer preceding the first retained entry.
    pub fn base(&self) -> Result<ChainPointer> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(inner.index.base())
    }

    /// Copy of the retained entries, oldest first.
    pub fn entries(&self) -> Result<Vec<LogEntry<A>>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(inner.index.entries().to_vec())
    }

    /// Flush buffered writes to disk.
    pub fn flush(&self) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        inner.writer.flush()?;
        Ok(())
    }

    /// Rebuilds the index and returns it with the length of the records read.
    fn replay(path: &Path) -> Result<(ChainIndex<A>, u64)> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut index: Option<ChainIndex<A>> = None;
        let mut offset = 0u64;

        while let Some((record, len)) = read_record::<A>(&mut reader, offset)? {
            match record {
                LogRecord::Anchor(base) if index.is_none() => {
                    index = Some(ChainIndex::new(base));
                }
                LogRecord::Anchor(_) => {
                    return Err(RepositoryError::CorruptedData(format!(
                        "anchor record at offset {offset} is not the first record"
                    )));
                }
                LogRecord::Entry(entry) => {
                    index
                        .get_or_insert_with(|| ChainIndex::new(ChainPointer::INITIAL))
                        .push_verified(entry)?;
                }
            }
            offset += len;
        }

        let index = index.unwrap_or_else(|| ChainIndex::new(ChainPointer::INITIAL));
        Ok((index, offset))
    }
}

fn encode_record<A: Serialize>(record: &LogRecord<A>) -> Result<Vec<u8>> {
    let bytes =
        bincode::serialize(record).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    let len = u32::try_from(bytes.len())
        .map_err(|_| RepositoryError::Serialization("record exceeds u32 length".to_string()))?;

    let mut framed = Vec::with_capacity(4 + bytes.len());
    framed.extend_from_slice(&len.to_le_bytes());
    framed.extend_from_slice(&bytes);
    Ok(framed)
}

/// Reads one framed record; `None` at a clean end of file.
fn read_record<A: DeserializeOwned>(
    reader: &mut impl Read,
    offset: u64,
) -> Result<Option<(LogRecord<A>, u64)>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_le_bytes(len_bytes) as usize;

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            RepositoryError::CorruptedData(format!(
                "truncated record at offset {offset}: expected {len} bytes"
            ))
        } else {
            e.into()
        }
    })?;

    let record = bincode::deserialize(&data).map_err(|e| {
        RepositoryError::CorruptedData(format!("undecodable record at offset {offset}: {e}"))
    })?;

    Ok(Some((record, 4 + len as u64)))
}

impl<A> ActionRepository<A> for FileActionLog<A>
where
    A: Action + Serialize + DeserializeOwned,
{
    fn dispatch(&self, action: A) -> Result<ChainPointer> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        let entry = inner.index.next_entry(action);
        let framed = encode_record(&LogRecord::Entry(entry.clone()))?;
        let written = inner
            .writer
            .write_all(&framed)
            .and_then(|()| inner.writer.flush());
        if let Err(e) = written {
            tracing::warn!(
                "Append to action log '{}' failed, truncating to {} bytes: {}",
                self.path.display(),
                inner.committed_len,
                e
            );
            if let Err(rollback) = inner.rollback(&self.path) {
                tracing::error!(
                    "Failed to roll back action log '{}': {}",
                    self.path.display(),
                    rollback
                );
            }
            return Err(e.into());
        }

        let pointer = entry.pointer;
        inner.committed_len += framed.len() as u64;
        inner.index.push(entry);

        tracing::debug!(pointer = %pointer.short(), len = inner.index.len(), "action dispatched");
        Ok(pointer)
    }

    fn actions_since(&self, pointer: &ChainPointer) -> Result<PendingActions<A>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        inner.index.actions_since(pointer)
    }

    fn tail(&self) -> Result<ChainPointer> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(inner.index.tail())
    }

    fn len(&self) -> Result<usize> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(inner.index.len())
    }

    /// Rewrites the file as an anchor followed by the retained entries and
    /// atomically swaps it in.
    fn compact(&self, through: &ChainPointer) -> Result<usize> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        let position = inner.index.position(through)?;
        if position == 0 {
            return Ok(0);
        }

        let staging = self.path.with_extension("compact");
        let mut staged_len = 0u64;
        {
            let mut out = BufWriter::new(File::create(&staging)?);
            let anchor = encode_record::<A>(&LogRecord::Anchor(*through))?;
            out.write_all(&anchor)?;
            staged_len += anchor.len() as u64;
            for entry in &inner.index.entries()[position..] {
                let framed = encode_record(&LogRecord::Entry(entry.clone()))?;
                out.write_all(&framed)?;
                staged_len += framed.len() as u64;
            }
            out.flush()?;
        }

        inner.writer.flush()?;
        fs::rename(&staging, &self.path)?;
        let sink: Sink = Box::new(OpenOptions::new().append(true).open(&self.path)?);
        inner.writer = BufWriter::new(sink);
        inner.committed_len = staged_len;

        let removed = inner.index.compact(through)?;
        tracing::info!(
            "Compacted action log {}: dropped {} entries, base {}",
            self.path.display(),
            removed,
            through.short()
        );
        Ok(removed)
    }
}

impl<A> Drop for FileActionLog<A> {
    fn drop(&mut self) {
        let Ok(inner) = self.inner.get_mut() else {
            return;
        };
        if let Err(e) = inner.writer.flush() {
            tracing::warn!(
                "Failed to flush action log '{}' on drop: {}",
                self.path.display(),
                e
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
