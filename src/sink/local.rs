//! Local folder sink
//!
//! Writes one UTF-8 text file per entry into a configured folder. Existing
//! files with the same name are overwritten; unrelated files in the folder
//! are left alone.

use crate::sink::{Sink, SinkError, SinkResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub struct LocalDirSink {
    folder: PathBuf,
}

impl LocalDirSink {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

#[async_trait]
impl Sink for LocalDirSink {
    async fn write(&self, _site: &str, files: &BTreeMap<String, String>) -> SinkResult<()> {
        std::fs::create_dir_all(&self.folder).map_err(|source| SinkError::CreateDir {
            path: self.folder.display().to_string(),
            source,
        })?;

        for (key, body) in files {
            let name = format!("{}.txt", key);
            let path = self.folder.join(&name);
            std::fs::write(&path, body)
                .map_err(|source| SinkError::Write { name, source })?;
            tracing::debug!(path = %path.display(), "wrote page file");
        }

        tracing::info!(
            count = files.len(),
            folder = %self.folder.display(),
            "local sink write complete"
        );
        Ok(())
    }
}
