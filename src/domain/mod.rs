//! Core domain models for imgdep
//!
//! This module contains the fundamental types used throughout the application:
//! - Version specifications and PEP 440 comparison
//! - Packages and insert-once package mappings
//! - Image nodes of the dependency forest
//! - Check report structures

mod image;
mod package;
mod package_map;
pub mod pep440;
mod report;
mod version_spec;

pub use image::{Image, ImageId, LinkState};
pub use package::{Installer, Package};
pub use package_map::PackageMap;
pub use report::{CheckKind, CheckReport, Finding, FindingStatus};
pub use version_spec::{split_specifier, Operator, RawSpecifier, VersionSpec};
