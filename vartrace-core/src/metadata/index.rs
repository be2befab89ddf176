//! Scheme-file index
//!
//! Maps every scheme name declared in a metadata directory to the `.meta` file
//! declaring it. Files are visited in sorted path order; when two files declare
//! the same scheme the later one wins and a warning is logged.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrackError};

use super::parser::find_scheme_names;

/// Scheme name -> metadata file, built once per invocation
#[derive(Debug, Clone, Default)]
pub struct SchemeFileIndex {
    /// Directory the index was built from
    root: PathBuf,

    /// Scheme name to declaring file
    files: BTreeMap<String, PathBuf>,

    /// Number of metadata files scanned
    file_count: usize,
}

impl SchemeFileIndex {
    /// Scan `dir` for `*.meta` files and index the schemes they declare
    pub fn build<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let directory_error = |reason: String| TrackError::MetadataDirectory {
            path: dir.to_path_buf(),
            reason,
        };

        if !dir.is_dir() {
            return Err(directory_error("not a directory".to_string()));
        }

        let pattern = dir.join("*.meta");
        let pattern = pattern
            .to_str()
            .ok_or_else(|| directory_error("path is not valid UTF-8".to_string()))?;
        let escaped = glob::Pattern::escape(pattern.trim_end_matches("*.meta"));
        let pattern = format!("{}*.meta", escaped);

        let mut paths = vec![];
        for entry in glob::glob(&pattern).map_err(|e| directory_error(e.to_string()))? {
            let path = entry.map_err(|e| directory_error(e.to_string()))?;
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(directory_error("no metadata files (*.meta) found".to_string()));
        }

        tracing::debug!("reading {} .meta files in {}", paths.len(), dir.display());

        let mut index = SchemeFileIndex {
            root: dir.to_path_buf(),
            files: BTreeMap::new(),
            file_count: paths.len(),
        };

        for path in paths {
            let content = fs::read_to_string(&path)
                .map_err(|e| TrackError::metadata_read(&path, e.to_string()))?;
            for scheme in find_scheme_names(&content) {
                index.insert(scheme, path.clone());
            }
        }

        Ok(index)
    }

    /// Build an index from known pairs, e.g. for in-memory metadata
    pub fn from_entries<I, S, P>(root: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        let mut index = SchemeFileIndex {
            root: root.into(),
            ..Default::default()
        };
        for (scheme, path) in entries {
            index.insert(scheme.into(), path.into());
        }
        index.file_count = {
            let mut files: Vec<&PathBuf> = index.files.values().collect();
            files.sort();
            files.dedup();
            files.len()
        };
        index
    }

    fn insert(&mut self, scheme: String, path: PathBuf) {
        if let Some(previous) = self.files.get(&scheme) {
            if previous != &path {
                tracing::warn!(
                    "scheme {} declared in both {} and {}; using {}",
                    scheme,
                    previous.display(),
                    path.display(),
                    path.display()
                );
            }
        }
        self.files.insert(scheme, path);
    }

    /// Metadata file declaring `scheme`
    pub fn get(&self, scheme: &str) -> Option<&Path> {
        self.files.get(scheme).map(PathBuf::as_path)
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.files.contains_key(scheme)
    }

    /// Indexed scheme names, sorted
    pub fn schemes(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of `.meta` files the index was built from
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
