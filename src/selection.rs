//! Which image tests run against which image
//!
//! Each image directory carries its own test suite, and an image's tests also
//! run against every image built from it. Markers on a test narrow that.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker: run only against the image the test belongs to
pub const NO_INHERIT_MARKER: &str = "no_inherit_test";

/// Marker: run only for custom builds
pub const CUSTOM_BUILD_MARKER: &str = "custom_build_test";

/// Build style of a custom build
pub const CUSTOM_BUILD_STYLE: &str = "custom";

/// Reason a test is skipped for an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The test belongs to an image further down the tree
    ChildImage,
    /// The test is marked `no_inherit_test` and belongs to an ancestor
    NoInherit,
    /// The test is marked `custom_build_test` and this is not a custom build
    CustomBuildOnly,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ChildImage => write!(f, "test intended for child image"),
            SkipReason::NoInherit => write!(f, "test restricted to parent image only"),
            SkipReason::CustomBuildOnly => write!(f, "test restricted to custom-build tests"),
        }
    }
}

/// Whether to run a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum TestDecision {
    Run,
    Skip(SkipReason),
}

impl fmt::Display for TestDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestDecision::Run => write!(f, "run"),
            TestDecision::Skip(reason) => write!(f, "skip: {}", reason),
        }
    }
}

/// Decide whether a test from `test_image`'s suite runs against `image`
///
/// `ancestors` is the image's root-exclusive ancestor chain, including the
/// image itself.
pub fn select_test<S: AsRef<str>>(
    ancestors: &[S],
    image: &str,
    test_image: &str,
    markers: &[S],
    build_style: Option<&str>,
) -> TestDecision {
    let has_marker = |name: &str| markers.iter().any(|m| m.as_ref() == name);

    if !ancestors.iter().any(|a| a.as_ref() == test_image) {
        TestDecision::Skip(SkipReason::ChildImage)
    } else if test_image != image && has_marker(NO_INHERIT_MARKER) {
        TestDecision::Skip(SkipReason::NoInherit)
    } else if build_style != Some(CUSTOM_BUILD_STYLE) && has_marker(CUSTOM_BUILD_MARKER) {
        TestDecision::Skip(SkipReason::CustomBuildOnly)
    } else {
        TestDecision::Run
    }
}
