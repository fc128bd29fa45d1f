use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::error::{IndexerError, Result};

/// Documents larger than this are skipped outright.
pub(crate) const MAX_FILE_SIZE_BYTES: u64 = 1_048_576; // 1 MiB

/// Filename globs treated as markdown documents.
const MARKDOWN_GLOBS: &[&str] = &["*.md", "*.markdown", "*.mdx"];

/// Finds markdown documents under a corpus root (.gitignore aware).
pub struct CorpusScanner {
    root: PathBuf,
    markdown: GlobSet,
}

impl CorpusScanner {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(IndexerError::InvalidPath(root.display().to_string()));
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in MARKDOWN_GLOBS {
            let glob = Glob::new(pattern)
                .map_err(|e| IndexerError::Other(format!("bad glob '{pattern}': {e}")))?;
            builder.add(glob);
        }
        let markdown = builder
            .build()
            .map_err(|e| IndexerError::Other(format!("glob set: {e}")))?;

        Ok(Self { root, markdown })
    }

    /// Walk the corpus and return matching document paths, sorted for a
    /// stable indexing order.
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            // Honor .gitignore files even when the corpus is not a repo.
            .require_git(false);

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if !self.is_markdown(path) {
                        continue;
                    }

                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > MAX_FILE_SIZE_BYTES {
                            log::debug!(
                                "Skipping oversized document {} ({} bytes)",
                                path.display(),
                                meta.len()
                            );
                            continue;
                        }
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!(
            "Found {} markdown documents under {}",
            files.len(),
            self.root.display()
        );
        files
    }

    fn is_markdown(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.markdown.is_match(name))
            .unwrap_or(false)
    }
}
