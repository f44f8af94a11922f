//! Delimited import file parsing.
//!
//! An import file is a header row followed by data rows:
//!
//! ```text
//! STB|TITLE|PROVIDER|DATE|REV|VIEW_TIME
//! stb1|the matrix|warner bros|2014-04-01|4.00|1:30
//! ```
//!
//! Each data row is split on the delimiter and zipped against the header
//! names. Values are not validated here; that happens on insert.

use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use std::path::Path;
use tokio::io::AsyncRead;
use tracing::debug;
use viewstore_storage::LineReader;

/// Reads and parses an import file.
///
/// # Errors
///
/// Returns [`CoreError::NotFound`] if `path` does not exist and
/// [`CoreError::MalformedImport`] if a row's column count differs from the
/// header's.
pub async fn read_import_file(
    path: &Path,
    delimiter: char,
    chunk_size: usize,
) -> CoreResult<Vec<Record>> {
    let reader = LineReader::open(path, chunk_size).await?;
    let records = parse_lines(reader, delimiter).await?;
    debug!(path = %path.display(), records = records.len(), "parsed import file");
    Ok(records)
}

/// Parses import rows from any byte source.
///
/// # Errors
///
/// Returns [`CoreError::MalformedImport`] if a row's column count differs
/// from the header's, or a storage error if reading fails.
pub async fn parse_import<R: AsyncRead + Unpin>(
    reader: R,
    delimiter: char,
    chunk_size: usize,
) -> CoreResult<Vec<Record>> {
    parse_lines(LineReader::with_chunk_size(reader, chunk_size), delimiter).await
}

async fn parse_lines<R: AsyncRead + Unpin>(
    mut lines: LineReader<R>,
    delimiter: char,
) -> CoreResult<Vec<Record>> {
    let headers: Vec<String> = match lines.next_line().await? {
        Some(header) => header
            .text
            .trim_start_matches('\u{feff}')
            .split(delimiter)
            .map(str::to_string)
            .collect(),
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.text.is_empty() {
            continue;
        }

        let values: Vec<&str> = line.text.split(delimiter).collect();
        if values.len() != headers.len() {
            return Err(CoreError::malformed_import(
                line.number,
                format!(
                    "expected {} columns, found {}",
                    headers.len(),
                    values.len()
                ),
            ));
        }

        records.push(headers.iter().map(String::as_str).zip(values).collect());
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = "STB|TITLE|PROVIDER|DATE|REV|VIEW_TIME\r\n\
        stb1|the matrix|warner bros|2014-04-01|4.00|1:30\r\n\
        stb1|unbreakable|buena vista|2014-04-03|6.00|2:05";

    #[tokio::test]
    async fn parses_rows_against_header() {
        let records = parse_import(SAMPLE.as_bytes(), '|', 64).await.unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        let names: Vec<_> = first.iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec!["STB", "TITLE", "PROVIDER", "DATE", "REV", "VIEW_TIME"]
        );
        assert_eq!(first.get("TITLE"), Some("the matrix"));
        assert_eq!(records[1].get("VIEW_TIME"), Some("2:05"));
    }

    #[tokio::test]
    async fn chunk_size_does_not_matter() {
        let whole = parse_import(SAMPLE.as_bytes(), '|', 1 << 16).await.unwrap();
        for chunk_size in [1, 2, 5, 17, 40] {
            let chunked = parse_import(SAMPLE.as_bytes(), '|', chunk_size).await.unwrap();
            assert_eq!(chunked, whole, "chunk size {chunk_size}");
        }
    }

    #[tokio::test]
    async fn skips_blank_lines_and_trailing_terminator() {
        let data = "STB|TITLE\r\n\r\nstb1|the hobbit\r\n\r\n";
        let records = parse_import(data.as_bytes(), '|', 8).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("TITLE"), Some("the hobbit"));
    }

    #[tokio::test]
    async fn header_only_and_empty_input() {
        assert!(parse_import(&b"STB|TITLE\r\n"[..], '|', 8).await.unwrap().is_empty());
        assert!(parse_import(&b""[..], '|', 8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn column_mismatch_is_reported_with_line() {
        let data = "STB|TITLE\r\nstb1|the hobbit\r\nstb2|a|b";
        let err = parse_import(data.as_bytes(), '|', 8).await.unwrap_err();
        assert!(matches!(err, CoreError::MalformedImport { line: 3, .. }));
    }

    #[tokio::test]
    async fn strips_byte_order_mark() {
        let data = "\u{feff}STB|TITLE\r\nstb1|the hobbit";
        let records = parse_import(data.as_bytes(), '|', 8).await.unwrap();
        assert_eq!(records[0].get("STB"), Some("stb1"));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = read_import_file(&dir.path().join("nope.psv"), '|', 64)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nope.psv"));
    }

    #[tokio::test]
    async fn reads_file_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("views.psv");
        std::fs::write(&path, SAMPLE).unwrap();

        let records = read_import_file(&path, '|', 16).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("PROVIDER"), Some("buena vista"));
    }
}
