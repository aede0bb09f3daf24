//! Expected image attributes derived from build parameters
//!
//! An image's Dockerfile `ARG` defaults describe what a default build should
//! contain (Python version, working directory, packages). Custom builds
//! override them through `export NAME=value` lines in `ci/custom-args.sh`.

use super::dockerfile::build_args;
use serde::Serialize;
use std::collections::BTreeMap;

/// Build args that configure the build itself rather than the result
const IGNORED_ATTRS: [&str; 3] = ["base_image", "debian_frontend", "notebook_ip"];

/// Tag suffix marking an image built with custom args
const CUSTOM_TAG_SUFFIX: &str = "custom";

/// Value of one expected attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

impl AttrValue {
    fn is_empty(&self) -> bool {
        match self {
            AttrValue::Text(text) => text.is_empty(),
            AttrValue::List(items) => items.is_empty(),
            AttrValue::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Items of a list value; a single text value counts as one item
    pub fn as_list(&self) -> Vec<String> {
        match self {
            AttrValue::List(items) => items.clone(),
            AttrValue::Text(text) => vec![text.clone()],
            AttrValue::Bool(_) => Vec::new(),
        }
    }
}

fn convert_bool(value: String) -> AttrValue {
    match value.as_str() {
        "true" => AttrValue::Bool(true),
        "false" => AttrValue::Bool(false),
        _ => AttrValue::Text(value),
    }
}

/// Attributes a built image is expected to have, keyed by lowercase name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExpectedAttrs {
    attrs: BTreeMap<String, AttrValue>,
}

impl ExpectedAttrs {
    /// Collect `ARG name=value` defaults from a Dockerfile
    pub fn from_dockerfile(dockerfile: &str) -> Self {
        let attrs = build_args(dockerfile)
            .into_iter()
            .map(|arg| {
                let value = arg.value.unwrap_or_default();
                (arg.name.to_lowercase(), convert_bool(value))
            })
            .collect();
        Self { attrs }
    }

    /// Override with `export NAME=value` lines from a custom-args script
    pub fn merge_custom_args(&mut self, script: &str) {
        for line in script.lines() {
            let Some(assignment) = line.strip_prefix("export ") else {
                continue;
            };
            let Some((name, value)) = assignment.split_once('=') else {
                continue;
            };

            let value = value.trim().trim_matches('"');
            let value = if value.contains(' ') {
                AttrValue::List(value.split_whitespace().map(str::to_string).collect())
            } else {
                convert_bool(value.to_string())
            };
            self.attrs.insert(name.trim().to_lowercase(), value);
        }
    }

    /// Drop build-only args and attributes with empty values
    pub fn finalize(mut self) -> Self {
        for ignored in IGNORED_ATTRS {
            self.attrs.remove(ignored);
        }
        self.attrs.retain(|_, value| !value.is_empty());
        self
    }

    /// Full expected attribute set for an image
    pub fn load(dockerfile: &str, custom_args: Option<&str>) -> Self {
        let mut attrs = Self::from_dockerfile(dockerfile);
        if let Some(script) = custom_args {
            attrs.merge_custom_args(script);
        }
        attrs.finalize()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Remove and return an attribute (used to track which ones were checked)
    pub fn pop(&mut self, name: &str) -> Option<AttrValue> {
        self.attrs.remove(name)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Whether an image tag marks a custom build
pub fn is_custom_tag(tag: &str) -> bool {
    tag.ends_with(CUSTOM_TAG_SUFFIX)
}
