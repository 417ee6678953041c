use std::path::Path;

use mnp_replay_parser::Record;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

#[derive(Debug)]
pub struct FileInput<'a> {
    pub path: &'a str,
    pub contents: &'a [u8],
}

/// A posts file that could not be turned into a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct IngestionBatch {
    pub records: Vec<Record>,
    pub failures: Vec<FailedFile>,
}

impl IngestionBatch {
    pub fn total_files(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    fn push(&mut self, path: &str, contents: std::result::Result<Vec<u8>, String>) {
        let parsed = contents.and_then(|bytes| {
            let text = std::str::from_utf8(&bytes)
                .map_err(|_| "file contents were not valid UTF-8".to_string())?;
            Record::from_json(path, text).map_err(|err| err.to_string())
        });

        match parsed {
            Ok(record) => self.records.push(record),
            Err(message) => {
                debug!(file = path, %message, "failed to parse post");
                self.failures.push(FailedFile {
                    path: path.to_string(),
                    message,
                });
            }
        }
    }
}

/// Parses in-memory post files. Files are taken in the order given.
pub fn ingest_files(inputs: &[FileInput<'_>]) -> IngestionBatch {
    let mut batch = IngestionBatch::default();
    for input in inputs {
        batch.push(input.path, Ok(input.contents.to_vec()));
    }
    batch
}

/// Loads every file in the posts directory, in file-name order, into memory.
///
/// An unreadable directory is fatal; an unreadable or malformed file is only a parse error.
pub fn load_posts(posts_dir: &Path) -> Result<IngestionBatch> {
    let entries = std::fs::read_dir(posts_dir).map_err(|source| PipelineError::PostsDirectory {
        path: posts_dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<(String, std::path::PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PipelineError::PostsDirectory {
            path: posts_dir.to_path_buf(),
            source,
        })?;
        files.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
    }
    files.sort();

    let mut batch = IngestionBatch::default();
    for (name, path) in &files {
        let contents = std::fs::read(path).map_err(|err| err.to_string());
        batch.push(name, contents);
    }

    info!(
        posts_dir = %posts_dir.display(),
        files = batch.total_files(),
        parse_errors = batch.failures.len(),
        "loaded posts"
    );
    Ok(batch)
}
