// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ErrorClassification, NamingStrategy};
use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::Utf8Path;
use config::{
    Config, ConfigError, File, FileFormat, FileSourceFile,
    builder::{ConfigBuilder, DefaultState},
};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Overall configuration for the report normalizer.
///
/// This is the root data structure for normalizer configuration. Most users will want to call
/// [`NormalizerConfig::from_sources`] to read the embedded defaults along with a project config
/// file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizerConfig {
    naming_strategy: NamingStrategy,
    error_classification: ErrorClassification,
    skip_markers: Vec<String>,
    coverage_enabled: bool,
    report_name: String,
}

impl NormalizerConfig {
    /// The default location of the config within the project root: `.config/report-normalizer.toml`.
    pub const CONFIG_PATH: &'static str = ".config/report-normalizer.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Project-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the normalizer config from the given file, or if not specified from
    /// `.config/report-normalizer.toml` under the project root.
    ///
    /// An explicitly specified file must exist. The default location is optional.
    ///
    /// `unknown_callback` is called with the set of keys that were present in the config but not
    /// understood, if any.
    pub fn from_sources(
        project_root: impl AsRef<Utf8Path>,
        config_file: Option<&Utf8Path>,
        mut unknown_callback: impl FnMut(&Utf8Path, &BTreeSet<String>),
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), Self::file_source(file, true)),
            None => {
                let file = project_root.as_ref().join(Self::CONFIG_PATH);
                let source = Self::file_source(&file, false);
                (file, source)
            }
        };
        debug!("reading normalizer config from `{config_file}`");

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        if !unknown.is_empty() {
            unknown_callback(&config_file, &unknown);
        }

        Ok(config.into_config())
    }

    /// Parses the normalizer config from a TOML string, layered on top of the default config.
    ///
    /// `config_file` is only used for error reporting.
    pub fn from_toml_str(
        config_file: impl AsRef<Utf8Path>,
        toml: &str,
        mut unknown_callback: impl FnMut(&Utf8Path, &BTreeSet<String>),
    ) -> Result<Self, ConfigParseError> {
        let config_file = config_file.as_ref();
        let builder =
            Self::make_default_config().add_source(File::from_str(toml, FileFormat::Toml));
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;

        if !unknown.is_empty() {
            unknown_callback(config_file, &unknown);
        }

        Ok(config.into_config())
    }

    /// Returns the strategy used to derive display names.
    pub fn naming_strategy(&self) -> NamingStrategy {
        self.naming_strategy
    }

    /// Sets the strategy used to derive display names.
    pub fn set_naming_strategy(&mut self, naming_strategy: NamingStrategy) -> &mut Self {
        self.naming_strategy = naming_strategy;
        self
    }

    /// Returns how error messages are matched against skip markers.
    pub fn error_classification(&self) -> ErrorClassification {
        self.error_classification
    }

    /// Sets how error messages are matched against skip markers.
    pub fn set_error_classification(
        &mut self,
        error_classification: ErrorClassification,
    ) -> &mut Self {
        self.error_classification = error_classification;
        self
    }

    /// Returns the messages that mark an errored test as skipped.
    pub fn skip_markers(&self) -> &[String] {
        &self.skip_markers
    }

    /// Sets the messages that mark an errored test as skipped.
    pub fn set_skip_markers(
        &mut self,
        skip_markers: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.skip_markers = skip_markers.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if coverage should be synthesized when a coverage report is available.
    pub fn coverage_enabled(&self) -> bool {
        self.coverage_enabled
    }

    /// Sets whether coverage is synthesized.
    pub fn set_coverage_enabled(&mut self, coverage_enabled: bool) -> &mut Self {
        self.coverage_enabled = coverage_enabled;
        self
    }

    /// Returns the name of the JUnit report.
    pub fn report_name(&self) -> &str {
        &self.report_name
    }

    /// Sets the name of the JUnit report.
    pub fn set_report_name(&mut self, report_name: impl Into<String>) -> &mut Self {
        self.report_name = report_name.into();
        self
    }

    // ---
    // Helper methods
    // ---

    fn file_source(file: &Utf8Path, required: bool) -> File<FileSourceFile, FileFormat> {
        File::new(file.as_str(), FileFormat::Toml).required(required)
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(NormalizerConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: NormalizerConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // The path is tracked by serde_path_to_error, so drop it from the config error.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            naming_strategy: NamingStrategy::StripDatasetSuffix,
            error_classification: ErrorClassification::Contains,
            skip_markers: vec!["Skipped Test".to_owned(), "Incomplete Test".to_owned()],
            coverage_enabled: true,
            report_name: "phpunit".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct NormalizerConfigDeserialize {
    naming: NamingConfigDeserialize,
    classification: ClassificationConfigDeserialize,
    coverage: CoverageConfigDeserialize,
    junit: JunitConfigDeserialize,
}

impl NormalizerConfigDeserialize {
    fn into_config(self) -> NormalizerConfig {
        NormalizerConfig {
            naming_strategy: self.naming.strategy,
            error_classification: self.classification.error_mode,
            skip_markers: self.classification.skip_markers,
            coverage_enabled: self.coverage.enabled,
            report_name: self.junit.report_name,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct NamingConfigDeserialize {
    strategy: NamingStrategy,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ClassificationConfigDeserialize {
    error_mode: ErrorClassification,
    skip_markers: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CoverageConfigDeserialize {
    enabled: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct JunitConfigDeserialize {
    report_name: String,
}
