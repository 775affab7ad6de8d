// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for the report normalizer.
//!
//! Configuration is layered: the embedded default config ([`NormalizerConfig::DEFAULT_CONFIG`])
//! comes first, and a project-specific file (by default
//! [`NormalizerConfig::CONFIG_PATH`] under the project root) is layered on top of it.

mod elements;
mod imp;

pub use elements::*;
pub use imp::*;
