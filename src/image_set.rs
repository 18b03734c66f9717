use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use tracing::info;

use crate::error::{Result, ViewerError};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Ordered, fixed list of panorama paths. Never changes once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageSet {
    paths: Vec<PathBuf>,
}

impl ImageSet {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Collects every image file in `dir_path`, sorted by file name.
    pub fn from_dir(dir_path: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        let entries = fs::read_dir(dir_path).map_err(|source| ViewerError::Io {
            path: dir_path.to_path_buf(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| ViewerError::Io {
                path: dir_path.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && is_image(&path) {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        if paths.is_empty() {
            return Err(ViewerError::NoImages(dir_path.to_path_buf()));
        }
        info!(count = paths.len(), dir = ?dir_path, "found panoramas");
        Ok(Self { paths })
    }

    /// Randomises the order. Only meant to be called while configuring.
    pub fn shuffled(mut self) -> Self {
        self.paths.shuffle(&mut rand::rng());
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
