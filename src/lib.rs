//! imgdep - Docker image dependency planner library
//!
//! This library provides the core functionality for CI of a repository
//! holding many Docker images that build on each other:
//! - Dependency forest built from `FROM` lines, with rebuild ordering
//! - conda/pip package specifier parsing and version matching
//! - conda environment, apt history, and build-attribute inspection

pub mod cli;
pub mod domain;
pub mod environment;
pub mod error;
pub mod image_tree;
pub mod orchestrator;
pub mod output;
pub mod parser;
pub mod selection;
pub mod source;
