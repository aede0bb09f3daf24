//! Text parsers for the files an image build leaves behind
//!
//! This module provides parsers for:
//! - Dockerfiles (`FROM` lineage and `ARG` build parameters)
//! - Expected attributes from build args and custom-build scripts
//! - apt `history.log` installation records

mod apt_history;
pub mod dockerfile;
mod expected_attrs;

pub use apt_history::{check_apt_packages, parse_apt_history, InstallMethod};
pub use dockerfile::{build_args, parse_parent, BuildArg, ParentRef};
pub use expected_attrs::{is_custom_tag, AttrValue, ExpectedAttrs};
