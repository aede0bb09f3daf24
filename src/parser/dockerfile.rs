//! Dockerfile directive parser
//!
//! Only the directives that matter for lineage are read:
//! - `FROM <image>[:tag]` (first occurrence wins)
//! - `FROM $VAR` / `FROM ${VAR}` resolved through `ARG VAR=<image>`
//! - `ARG name[=value]` build parameters

use crate::error::DockerfileError;

/// A build-time `ARG` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArg {
    pub name: String,
    pub value: Option<String>,
}

/// The image a Dockerfile builds on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    /// Bare image name, registry and namespace stripped
    pub name: String,
    /// Tag after `:`, if any
    pub tag: Option<String>,
}

impl ParentRef {
    /// Parse `[registry/][namespace/]name[:tag][@digest]`
    pub fn parse(reference: &str) -> Self {
        let reference = reference.trim();
        let reference = reference
            .split_once('@')
            .map_or(reference, |(image, _digest)| image);
        let bare = reference.rsplit('/').next().unwrap_or(reference);

        match bare.split_once(':') {
            Some((name, tag)) => Self {
                name: name.to_string(),
                tag: (!tag.is_empty()).then(|| tag.to_string()),
            },
            None => Self {
                name: bare.to_string(),
                tag: None,
            },
        }
    }

    /// True when the tag pins a Python version other than `target`
    ///
    /// Only tags starting with a digit are treated as version pins. With no
    /// target configured nothing is considered pinned away.
    pub fn pins_other_version(&self, target: Option<&str>) -> bool {
        match (self.tag.as_deref(), target) {
            (Some(tag), Some(target)) => tag.starts_with(|c: char| c.is_ascii_digit()) && tag != target,
            _ => false,
        }
    }
}

/// Every `ARG` line, in file order
pub fn build_args(dockerfile: &str) -> Vec<BuildArg> {
    dockerfile
        .lines()
        .filter_map(|line| line.strip_prefix("ARG "))
        .map(|decl| {
            let decl = decl.trim();
            match decl.split_once('=') {
                Some((name, value)) => BuildArg {
                    name: name.trim().to_string(),
                    value: Some(value.trim().trim_matches('"').to_string()),
                },
                None => BuildArg {
                    name: decl.to_string(),
                    value: None,
                },
            }
        })
        .collect()
}

/// Default value of a build arg declared as `ARG name=value`
pub fn arg_value(dockerfile: &str, name: &str) -> Option<String> {
    build_args(dockerfile)
        .into_iter()
        .find(|arg| arg.name == name && arg.value.is_some())
        .and_then(|arg| arg.value)
}

/// The raw image reference of the first `FROM` line, with `ARG` indirection resolved
pub fn from_reference(image: &str, dockerfile: &str) -> Result<String, DockerfileError> {
    let from_line = dockerfile
        .lines()
        .find_map(|line| line.strip_prefix("FROM "))
        .ok_or_else(|| DockerfileError::missing_from(image))?;

    // skip flags such as --platform=linux/amd64; `AS stage` follows the reference
    let reference = from_line
        .split_whitespace()
        .find(|token| !token.starts_with("--"))
        .ok_or_else(|| DockerfileError::EmptyFrom {
            image: image.to_string(),
        })?;

    match reference.strip_prefix('$') {
        Some(variable) => {
            let variable = variable.trim_start_matches('{').trim_end_matches('}');
            arg_value(dockerfile, variable)
                .ok_or_else(|| DockerfileError::missing_arg(image, variable))
        }
        None => Ok(reference.to_string()),
    }
}

/// Parse the parent image of `image` from its Dockerfile text
pub fn parse_parent(image: &str, dockerfile: &str) -> Result<ParentRef, DockerfileError> {
    from_reference(image, dockerfile).map(|reference| ParentRef::parse(&reference))
}
