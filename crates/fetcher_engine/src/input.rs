use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fetch_logging::{fetch_info, fetch_warn};
use fetcher_core::parse_lines;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("directory does not exist: {0:?}")]
    NotADirectory(PathBuf),
    #[error("no entries found in {0:?}")]
    Empty(PathBuf),
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads a newline-delimited list of domains or URLs.
pub fn load_lines(path: &Path) -> Result<Vec<String>, InputError> {
    let entries = read_entries(path)?;
    if entries.is_empty() {
        return Err(InputError::Empty(path.to_path_buf()));
    }
    fetch_info!("Loaded {} entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Merges the domain lists of every `*.txt` file in `dir`.
///
/// Files are read in file-name order. A file that cannot be read is skipped
/// with a warning.
pub fn load_domain_directory(dir: &Path) -> Result<Vec<String>, InputError> {
    if !dir.is_dir() {
        return Err(InputError::NotADirectory(dir.to_path_buf()));
    }
    let listing = fs::read_dir(dir).map_err(|source| InputError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let paths = listing.map(|entry| entry.map(|entry| entry.path()));
    let mut files: Vec<PathBuf> = readable_entries(dir, paths)
        .into_iter()
        .filter(|path| path.is_file() && has_txt_extension(path))
        .collect();
    files.sort();

    let mut domains = Vec::new();
    for file in files {
        match read_entries(&file) {
            Ok(entries) => {
                fetch_info!("Loaded {} domains from {:?}", entries.len(), file);
                domains.extend(entries);
            }
            Err(err) => fetch_warn!("Skipping {:?}: {}", file, err),
        }
    }

    if domains.is_empty() {
        return Err(InputError::Empty(dir.to_path_buf()));
    }
    Ok(domains)
}

fn read_entries(path: &Path) -> Result<Vec<String>, InputError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(parse_lines(&text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(InputError::NotFound(path.to_path_buf()))
        }
        Err(source) => Err(InputError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn readable_entries(
    dir: &Path,
    entries: impl Iterator<Item = io::Result<PathBuf>>,
) -> Vec<PathBuf> {
    entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                fetch_warn!("Skipping unreadable entry in {:?}: {}", dir, err);
                None
            }
        })
        .collect()
}

fn has_txt_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "txt")
}
