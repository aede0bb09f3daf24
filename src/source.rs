//! Where Dockerfile text comes from
//!
//! The tree builder only needs two things: the names of images that have a
//! Dockerfile, and the text of a given image's Dockerfile. [`FsSource`] reads
//! them from a repository checkout; [`MemorySource`] holds them in memory.

use crate::error::{AppError, IoError, TreeError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name that marks an image directory
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Trait for supplying Dockerfiles to the tree builder
pub trait DockerfileSource {
    /// Names of all images with a Dockerfile, in discovery order
    fn image_names(&self) -> Vec<String>;

    /// Dockerfile text for `image`, or None when the image has no directory
    /// of its own (an externally provided base image)
    fn read(&self, image: &str) -> Result<Option<String>, AppError>;
}

/// Dockerfiles found by scanning a directory tree
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
    /// Image name to Dockerfile path, first discovery wins
    dockerfiles: Vec<(String, PathBuf)>,
}

impl FsSource {
    /// Recursively find every file named `Dockerfile` under `root`
    ///
    /// Hidden directories (`.git`, `.github`, ...) are skipped. The image name
    /// is the name of the directory containing the Dockerfile.
    pub fn scan(root: &Path) -> Result<Self, AppError> {
        if !root.is_dir() {
            return Err(IoError::directory_not_found(root).into());
        }

        let mut dockerfiles: Vec<(String, PathBuf)> = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
            });

        for entry in walker {
            let entry = entry.map_err(|e| TreeError::Walk {
                path: root.to_path_buf(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() || entry.file_name() != DOCKERFILE_NAME {
                continue;
            }

            let Some(name) = entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };

            if dockerfiles.iter().any(|(known, _)| *known == name) {
                tracing::warn!(image = %name, path = %entry.path().display(), "duplicate image directory name, ignoring");
                continue;
            }
            tracing::debug!(image = %name, path = %entry.path().display(), "found Dockerfile");
            dockerfiles.push((name, entry.path().to_path_buf()));
        }

        Ok(Self {
            root: root.to_path_buf(),
            dockerfiles,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the Dockerfile for `image`, if it has one
    pub fn dockerfile_path(&self, image: &str) -> Option<PathBuf> {
        self.dockerfiles
            .iter()
            .find(|(name, _)| name == image)
            .map(|(_, path)| path.clone())
            .or_else(|| {
                let dir = self.root.join(image);
                dir.is_dir().then(|| dir.join(DOCKERFILE_NAME))
            })
    }
}

impl DockerfileSource for FsSource {
    fn image_names(&self) -> Vec<String> {
        self.dockerfiles.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read(&self, image: &str) -> Result<Option<String>, AppError> {
        let Some(path) = self.dockerfile_path(image) else {
            return Ok(None);
        };
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| IoError::generic(path, e).into())
    }
}

/// Dockerfiles held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    order: Vec<String>,
    dockerfiles: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a Dockerfile for `image` (builder pattern)
    pub fn with_dockerfile(mut self, image: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(image, text);
        self
    }

    pub fn insert(&mut self, image: impl Into<String>, text: impl Into<String>) {
        let image = image.into();
        if !self.dockerfiles.contains_key(&image) {
            self.order.push(image.clone());
        }
        self.dockerfiles.insert(image, text.into());
    }
}

impl DockerfileSource for MemorySource {
    fn image_names(&self) -> Vec<String> {
        self.order.clone()
    }

    fn read(&self, image: &str) -> Result<Option<String>, AppError> {
        Ok(self.dockerfiles.get(image).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_dockerfile(root: &Path, dir: &str, text: &str) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(DOCKERFILE_NAME), text).unwrap();
    }

    #[test]
    fn test_scan_finds_dockerfiles() {
        let temp = tempfile::tempdir().unwrap();
        write_dockerfile(temp.path(), "cdl-base", "FROM debian\n");
        write_dockerfile(temp.path(), "cdl-python", "FROM contextlab/cdl-base\n");
        fs::create_dir_all(temp.path().join("docs")).unwrap();

        let source = FsSource::scan(temp.path()).unwrap();
        assert_eq!(source.image_names(), vec!["cdl-base", "cdl-python"]);
    }

    #[test]
    fn test_scan_skips_hidden_directories() {
        let temp = tempfile::tempdir().unwrap();
        write_dockerfile(temp.path(), ".github/actions/build", "FROM alpine\n");
        write_dockerfile(temp.path(), "cdl-base", "FROM debian\n");

        let source = FsSource::scan(temp.path()).unwrap();
        assert_eq!(source.image_names(), vec!["cdl-base"]);
    }

    #[test]
    fn test_scan_nested_directories() {
        let temp = tempfile::tempdir().unwrap();
        write_dockerfile(temp.path(), "images/cdl-base", "FROM debian\n");

        let source = FsSource::scan(temp.path()).unwrap();
        assert_eq!(source.image_names(), vec!["cdl-base"]);
        assert_eq!(source.read("cdl-base").unwrap().as_deref(), Some("FROM debian\n"));
    }

    #[test]
    fn test_scan_missing_directory() {
        let temp = tempfile::tempdir().unwrap();
        let err = FsSource::scan(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, AppError::Io(IoError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_read_external_image() {
        let temp = tempfile::tempdir().unwrap();
        write_dockerfile(temp.path(), "cdl-base", "FROM debian\n");

        let source = FsSource::scan(temp.path()).unwrap();
        assert!(source.read("debian").unwrap().is_none());
    }

    #[test]
    fn test_read_directory_without_dockerfile_is_error() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("scripts")).unwrap();

        let source = FsSource::scan(temp.path()).unwrap();
        assert!(source.read("scripts").is_err());
    }

    #[test]
    fn test_memory_source_keeps_order() {
        let source = MemorySource::new()
            .with_dockerfile("b", "FROM a\n")
            .with_dockerfile("c", "FROM b\n")
            .with_dockerfile("b", "FROM z\n");
        assert_eq!(source.image_names(), vec!["b", "c"]);
        assert_eq!(source.read("b").unwrap().as_deref(), Some("FROM z\n"));
        assert!(source.read("a").unwrap().is_none());
    }
}
