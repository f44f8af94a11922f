//! Chunk-safe line framing.
//!
//! Files are read as arbitrary byte chunks. A chunk may end in the middle of
//! a line, or between the `\r` and `\n` of a CRLF terminator, so the
//! [`LineSplitter`] keeps the unterminated tail and prepends it to the next
//! chunk. Only complete lines are ever handed out, except for the final
//! unterminated line which is released by [`LineSplitter::finish`].

use crate::error::{StorageError, StorageResult};
use bytes::BytesMut;
use std::collections::VecDeque;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Line terminator written between records.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Default size of a single read, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A single decoded line, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// One-based line number within the source.
    pub number: u64,
    /// Line contents.
    pub text: String,
}

/// Incremental splitter turning byte chunks into complete lines.
///
/// Lines end at `\n`; a `\r` directly before it is dropped, so both CRLF and
/// LF files frame identically.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: BytesMut,
    // Bytes of `pending` already known to contain no '\n'.
    scanned: usize,
    line_no: u64,
}

impl LineSplitter {
    /// Creates an empty splitter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every line completed by it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidUtf8`] if a completed line is not UTF-8.
    pub fn push(&mut self, chunk: &[u8]) -> StorageResult<Vec<Line>> {
        self.push_lines(chunk).into_iter().collect()
    }

    /// Feeds a chunk and decodes each completed line on its own.
    ///
    /// A line that is not UTF-8 yields an error in its slot; the lines around
    /// it are still returned and the splitter stays usable.
    pub fn push_lines(&mut self, chunk: &[u8]) -> Vec<StorageResult<Line>> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending[self.scanned..]
            .iter()
            .position(|&b| b == b'\n')
        {
            let end = self.scanned + pos;
            let mut raw = self.pending.split_to(end + 1);
            raw.truncate(end);
            lines.push(self.decode(raw));
            self.scanned = 0;
        }
        self.scanned = self.pending.len();

        lines
    }

    /// Releases the trailing unterminated line, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidUtf8`] if the tail is not UTF-8.
    pub fn finish(&mut self) -> StorageResult<Option<Line>> {
        self.scanned = 0;
        if self.pending.is_empty() {
            return Ok(None);
        }
        let raw = self.pending.split();
        self.decode(raw).map(Some)
    }

    /// Returns the number of buffered bytes not yet part of a complete line.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    fn decode(&mut self, mut raw: BytesMut) -> StorageResult<Line> {
        self.line_no += 1;
        if raw.last() == Some(&b'\r') {
            raw.truncate(raw.len() - 1);
        }
        let text = String::from_utf8(raw.to_vec())
            .map_err(|_| StorageError::InvalidUtf8 { line: self.line_no })?;
        Ok(Line {
            number: self.line_no,
            text,
        })
    }
}

/// Async line reader over any byte source, reading in fixed-size chunks.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    splitter: LineSplitter,
    ready: VecDeque<StorageResult<Line>>,
    chunk: Vec<u8>,
    eof: bool,
}

impl LineReader<File> {
    /// Opens a file for line reading.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the file does not exist.
    pub async fn open(path: &Path, chunk_size: usize) -> StorageResult<Self> {
        let file = File::open(path)
            .await
            .map_err(|e| StorageError::from_open(e, path))?;
        Ok(Self::with_chunk_size(file, chunk_size))
    }
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Creates a reader with the default chunk size.
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    /// Creates a reader issuing reads of at most `chunk_size` bytes.
    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            splitter: LineSplitter::new(),
            ready: VecDeque::new(),
            chunk: vec![0; chunk_size.max(1)],
            eof: false,
        }
    }

    /// Returns the next line, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails or a line is not UTF-8.
    /// After [`StorageError::InvalidUtf8`] the reader moves on to the next
    /// line.
    pub async fn next_line(&mut self) -> StorageResult<Option<Line>> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return line.map(Some);
            }
            if self.eof {
                return Ok(None);
            }

            let n = self.inner.read(&mut self.chunk).await?;
            if n == 0 {
                self.eof = true;
                if let Some(line) = self.splitter.finish()? {
                    return Ok(Some(line));
                }
            } else {
                self.ready.extend(self.splitter.push_lines(&self.chunk[..n]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn splits_whole_chunk() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"a|b\r\nc|d\r\n").unwrap();
        assert_eq!(texts(&lines), vec!["a|b", "c|d"]);
        assert_eq!(splitter.buffered(), 0);
        assert!(splitter.finish().unwrap().is_none());
    }

    #[test]
    fn carries_partial_line_across_chunks() {
        let mut splitter = LineSplitter::new();
        assert_eq!(texts(&splitter.push(b"stb1|the ma").unwrap()), Vec::<&str>::new());
        assert_eq!(splitter.buffered(), 11);

        let lines = splitter.push(b"trix\r\nstb2").unwrap();
        assert_eq!(texts(&lines), vec!["stb1|the matrix"]);

        let tail = splitter.finish().unwrap().unwrap();
        assert_eq!(tail.text, "stb2");
        assert_eq!(tail.number, 2);
    }

    #[test]
    fn crlf_split_between_chunks() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"one\r").unwrap().is_empty());
        let lines = splitter.push(b"\ntwo\r\n").unwrap();
        assert_eq!(texts(&lines), vec!["one", "two"]);
    }

    #[test]
    fn keeps_empty_lines() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"a\r\n\r\nb\r\n").unwrap();
        assert_eq!(texts(&lines), vec!["a", "", "b"]);
        assert_eq!(lines[2].number, 3);
    }

    #[test]
    fn multibyte_char_split_across_chunks() {
        let bytes = "caf\u{e9}\r\n".as_bytes();
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(&bytes[..4]).unwrap().is_empty());
        let lines = splitter.push(&bytes[4..]).unwrap();
        assert_eq!(texts(&lines), vec!["caf\u{e9}"]);
    }

    #[test]
    fn invalid_utf8_reports_line() {
        let mut splitter = LineSplitter::new();
        let err = splitter.push(b"ok\r\n\xff\xfe\r\n").unwrap_err();
        assert!(matches!(err, StorageError::InvalidUtf8 { line: 2 }));
    }

    #[test]
    fn invalid_line_keeps_its_neighbours() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push_lines(b"ok\r\n\xff\xfe\r\nalso ok\r\npart");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].as_ref().unwrap().text, "ok");
        assert!(matches!(lines[1], Err(StorageError::InvalidUtf8 { line: 2 })));
        assert_eq!(lines[2].as_ref().unwrap().text, "also ok");

        let tail = splitter.finish().unwrap().unwrap();
        assert_eq!((tail.number, tail.text.as_str()), (4, "part"));
    }

    #[tokio::test]
    async fn reader_continues_after_invalid_line() {
        let data: &[u8] = b"first\r\n\xff garbage\r\nthird\r\n";
        for chunk_size in [1, 4, 64] {
            let mut reader = LineReader::with_chunk_size(data, chunk_size);
            assert_eq!(reader.next_line().await.unwrap().unwrap().text, "first");
            assert!(matches!(
                reader.next_line().await,
                Err(StorageError::InvalidUtf8 { line: 2 })
            ));
            let third = reader.next_line().await.unwrap().unwrap();
            assert_eq!((third.number, third.text.as_str()), (3, "third"));
            assert!(reader.next_line().await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn reader_with_tiny_chunks() {
        let data: &[u8] = b"STB|TITLE\r\nstb1|the matrix\r\nstb2|unbreakable";
        let mut reader = LineReader::with_chunk_size(data, 3);

        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().await.unwrap() {
            lines.push(line.text);
        }
        assert_eq!(lines, vec!["STB|TITLE", "stb1|the matrix", "stb2|unbreakable"]);
        assert!(reader.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn open_missing_file() {
        let dir = tempdir().unwrap();
        let err = LineReader::open(&dir.path().join("missing.psv"), 16)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    fn split_all(data: &[u8], cuts: &[usize]) -> Vec<String> {
        let mut splitter = LineSplitter::new();
        let mut out = Vec::new();
        let mut start = 0;
        for &cut in cuts {
            let cut = cut.min(data.len()).max(start);
            out.extend(splitter.push(&data[start..cut]).unwrap());
            start = cut;
        }
        out.extend(splitter.push(&data[start..]).unwrap());
        out.extend(splitter.finish().unwrap());
        out.into_iter().map(|l| l.text).collect()
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_lines(
            rows in prop::collection::vec("[a-z0-9 |:.-]{0,12}", 0..8),
            mut cuts in prop::collection::vec(0usize..120, 0..10),
        ) {
            let data = rows.join("\r\n");
            cuts.sort_unstable();

            let whole = split_all(data.as_bytes(), &[]);
            let chunked = split_all(data.as_bytes(), &cuts);
            prop_assert_eq!(whole, chunked);
        }
    }
}
