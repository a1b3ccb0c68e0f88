//! Filesystem access for content sources and build artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::InfraError;

const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Directory that receives rendered artifacts.
#[derive(Debug)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Open the output directory, creating it if necessary.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, InfraError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| InfraError::path(&root, err))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `contents` to `name` inside the output directory and return the
    /// full path.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf, InfraError> {
        let path = self.root.join(name);
        write_file(&path, contents)?;
        Ok(path)
    }
}

pub fn read_to_string(path: &Path) -> Result<String, InfraError> {
    fs::read_to_string(path).map_err(|err| InfraError::path(path, err))
}

pub fn write_file(path: &Path, contents: &str) -> Result<(), InfraError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| InfraError::path(parent, err))?;
    }
    fs::write(path, contents).map_err(|err| InfraError::path(path, err))
}

/// Markdown sources below `root`, sorted by path.
pub fn markdown_sources(root: &Path) -> Result<Vec<PathBuf>, InfraError> {
    let mut sources = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            InfraError::path(path, std::io::Error::other(err.to_string()))
        })?;
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            sources.push(entry.into_path());
        }
    }

    Ok(sources)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
