//! The store file and its atomic replacement.

use crate::error::{StorageError, StorageResult};
use crate::lines::{LineReader, DEFAULT_CHUNK_SIZE, LINE_TERMINATOR};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;
use uuid::Uuid;

/// Handle to a flat store file: one serialized record per line.
///
/// The handle does not keep the file open. Reads open the current file,
/// writes go through an [`AtomicWriter`] which renames a finished temporary
/// file over the store path, so a reader sees either the old or the new
/// contents and never a partial file.
///
/// # Example
///
/// ```no_run
/// # async fn demo() -> viewstore_storage::StorageResult<()> {
/// use viewstore_storage::StoreFile;
///
/// let store = StoreFile::new("data/datastore.psv");
/// let mut writer = store.begin_write().await?;
/// writer.write_line("{\"STB\":\"stb1\"}").await?;
/// writer.commit().await?;
///
/// let mut lines = store.open_lines().await?;
/// while let Some(line) = lines.next_line().await? {
///     println!("{}", line.text);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StoreFile {
    path: PathBuf,
    chunk_size: usize,
    sync_on_write: bool,
}

impl StoreFile {
    /// Creates a handle for the store at `path`. The file need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            sync_on_write: true,
        }
    }

    /// Sets the size of each read issued against the store.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Sets whether committed writes are synced to disk before the rename.
    #[must_use]
    pub fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Returns the store path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the store file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined.
    pub async fn exists(&self) -> StorageResult<bool> {
        Ok(fs::try_exists(&self.path).await?)
    }

    /// Opens the store for line-by-line reading.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if there is no store file.
    pub async fn open_lines(&self) -> StorageResult<LineReader<File>> {
        LineReader::open(&self.path, self.chunk_size).await
    }

    /// Starts writing a replacement for the store.
    ///
    /// Nothing is visible at the store path until [`AtomicWriter::commit`].
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub async fn begin_write(&self) -> StorageResult<AtomicWriter> {
        AtomicWriter::create(&self.path, self.sync_on_write).await
    }

    /// Removes the store file.
    ///
    /// Returns `false` if there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn remove(&self) -> StorageResult<bool> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// Writes a new version of a file next to it, then renames it into place.
///
/// The rename replaces the target in a single step; there is no window in
/// which the target path is missing. Dropping the writer without committing
/// leaves the temporary file behind, [`AtomicWriter::abort`] removes it.
#[derive(Debug)]
pub struct AtomicWriter {
    target: PathBuf,
    temp_path: PathBuf,
    writer: BufWriter<File>,
    lines: u64,
    sync: bool,
}

impl AtomicWriter {
    /// Creates a temporary sibling of `target`, creating parent directories
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub async fn create(target: &Path, sync: bool) -> StorageResult<Self> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        let temp_path = target.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        let file = File::create(&temp_path).await?;
        debug!(temp = %temp_path.display(), "opened temporary store file");

        Ok(Self {
            target: target.to_path_buf(),
            temp_path,
            writer: BufWriter::new(file),
            lines: 0,
            sync,
        })
    }

    /// Appends one line followed by the line terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_line(&mut self, line: &str) -> StorageResult<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(LINE_TERMINATOR.as_bytes()).await?;
        self.lines += 1;
        Ok(())
    }

    /// Returns the number of lines written so far.
    #[must_use]
    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    /// Returns the temporary file path.
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flushes the temporary file and renames it over the target.
    ///
    /// Returns the number of lines written.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing, syncing or renaming fails. The temporary
    /// file is removed in that case.
    pub async fn commit(self) -> StorageResult<u64> {
        let Self {
            target,
            temp_path,
            mut writer,
            lines,
            sync,
        } = self;

        let result = async {
            writer.flush().await?;
            let file = writer.into_inner();
            if sync {
                file.sync_all().await?;
            }
            drop(file);
            fs::rename(&temp_path, &target).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        debug!(path = %target.display(), lines, "replaced store file");
        Ok(lines)
    }

    /// Discards everything written and removes the temporary file.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be removed.
    pub async fn abort(self) -> StorageResult<()> {
        let Self {
            temp_path, writer, ..
        } = self;
        drop(writer);
        match fs::remove_file(&temp_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
