//! Application error types using thiserror
//!
//! Error hierarchy:
//! - DockerfileError: Issues with reading or interpreting a Dockerfile
//! - TreeError: Issues with the image dependency forest
//! - PackageError: Malformed package specifiers and duplicate entries
//! - EnvironmentError: Malformed package-manager JSON documents
//! - IoError: File system operation failures

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Dockerfile related errors
    #[error(transparent)]
    Dockerfile(#[from] DockerfileError),

    /// Dependency forest related errors
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Package specifier related errors
    #[error(transparent)]
    Package(#[from] PackageError),

    /// Environment document related errors
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors related to Dockerfile parsing
#[derive(Error, Debug)]
pub enum DockerfileError {
    /// No `FROM` directive in the Dockerfile
    #[error("Dockerfile for image '{image}' has no FROM line")]
    MissingFrom { image: String },

    /// `FROM $VAR` without a matching `ARG VAR=...` declaration
    #[error("Dockerfile for image '{image}' references ${variable} but never declares 'ARG {variable}='")]
    MissingArg { image: String, variable: String },

    /// `FROM` line without an image reference
    #[error("Dockerfile for image '{image}' has an empty FROM line")]
    EmptyFrom { image: String },
}

/// Errors related to the image dependency forest
#[derive(Error, Debug)]
pub enum TreeError {
    /// Edited image name is not part of the tree
    #[error("couldn't find an image named \"{name}\" in: {known}")]
    ImageNotFound { name: String, known: String },

    /// Linking would close a loop in the parent chain
    #[error("image '{image}' cannot be built FROM '{parent}': the parent chain loops back to it")]
    Cycle { image: String, parent: String },

    /// Directory walk failed
    #[error("failed to scan {path} for Dockerfiles: {message}")]
    Walk { path: PathBuf, message: String },
}

/// Errors related to package specifiers and package mappings
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PackageError {
    /// Specifier contains the chosen delimiter more than once
    #[error("received unexpected package spec format '{spec}': delimiter '{delimiter}' appears more than once")]
    MalformedSpec { spec: String, delimiter: String },

    /// A package mapping already holds an entry for this name
    #[error("entry for {name} already exists")]
    Duplicate { name: String },
}

/// Errors related to package-manager JSON documents
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// Document is not valid JSON or has the wrong shape
    #[error("failed to parse {document} JSON: {message}")]
    Json { document: String, message: String },

    /// Package specifier inside a document is malformed
    #[error("in {document}: {source}")]
    Package {
        document: String,
        #[source]
        source: PackageError,
    },
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// Directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Generic {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DockerfileError {
    /// Creates a new MissingFrom error
    pub fn missing_from(image: impl Into<String>) -> Self {
        DockerfileError::MissingFrom {
            image: image.into(),
        }
    }

    /// Creates a new MissingArg error
    pub fn missing_arg(image: impl Into<String>, variable: impl Into<String>) -> Self {
        DockerfileError::MissingArg {
            image: image.into(),
            variable: variable.into(),
        }
    }
}

impl TreeError {
    /// Creates a new ImageNotFound error listing every known image
    pub fn image_not_found<'a>(
        name: impl Into<String>,
        known: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        TreeError::ImageNotFound {
            name: name.into(),
            known: known.into_iter().collect::<Vec<_>>().join(", "),
        }
    }

    /// Creates a new Cycle error
    pub fn cycle(image: impl Into<String>, parent: impl Into<String>) -> Self {
        TreeError::Cycle {
            image: image.into(),
            parent: parent.into(),
        }
    }
}

impl PackageError {
    /// Creates a new MalformedSpec error
    pub fn malformed_spec(spec: impl Into<String>, delimiter: impl Into<String>) -> Self {
        PackageError::MalformedSpec {
            spec: spec.into(),
            delimiter: delimiter.into(),
        }
    }

    /// Creates a new Duplicate error
    pub fn duplicate(name: impl Into<String>) -> Self {
        PackageError::Duplicate { name: name.into() }
    }
}

impl EnvironmentError {
    /// Creates a new Json error
    pub fn json(document: impl Into<String>, message: impl Into<String>) -> Self {
        EnvironmentError::Json {
            document: document.into(),
            message: message.into(),
        }
    }

    /// Wraps a package error raised while reading a document
    pub fn package(document: impl Into<String>, source: PackageError) -> Self {
        EnvironmentError::Package {
            document: document.into(),
            source,
        }
    }
}

impl IoError {
    /// Creates a new DirectoryNotFound error
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        IoError::DirectoryNotFound { path: path.into() }
    }

    /// Creates a new Generic IO error
    pub fn generic(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Generic {
            path: path.into(),
            source,
        }
    }
}
