//! Headered CSV files as rows of optional strings

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One CSV row keyed by header. Cells are trimmed; empty cells are `None`.
pub type Row = HashMap<String, Option<String>>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV parse error in '{path}': {message}")]
    Parse { path: PathBuf, message: String },
}

/// Streaming reader over one CSV file
pub struct CsvSource {
    path: PathBuf,
    headers: Vec<String>,
    reader: csv::Reader<BufReader<File>>,
}

impl CsvSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| SourceError::Open {
            path: path.clone(),
            source: e,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let headers = reader
            .headers()
            .map_err(|e| SourceError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        Ok(Self {
            path,
            headers,
            reader,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Read every remaining row. The first malformed row aborts the read.
    pub fn read_all(self) -> Result<Vec<Row>, SourceError> {
        self.collect()
    }
}

impl Iterator for CsvSource {
    type Item = Result<Row, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.reader.records().next()? {
            Ok(r) => r,
            Err(e) => {
                return Some(Err(SourceError::Parse {
                    path: self.path.clone(),
                    message: e.to_string(),
                }))
            }
        };

        let row = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = record
                    .get(i)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string);
                (header.clone(), value)
            })
            .collect();
        Some(Ok(row))
    }
}

/// Value of `column`, if the row has a non-empty cell for it
pub fn cell<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(|v| v.as_deref())
}
