//! Document front matter and per-test configuration
//!
//! Markdown documents may start with TOML front matter between `+++` lines:
//!
//! ```markdown
//! +++
//! shell = "/bin/bash"
//! total_timeout = "5m"
//!
//! [defaults]
//! timeout = "10s"
//! environment = { LANG = "C" }
//! +++
//! ```
//!
//! A single test block can override the defaults with an inline table after
//! the language tag: ```` ```scrut {timeout = "3s", output_stream = "stderr"} ````.
//!
//! The executing harness is the consumer of most settings; the validator
//! itself only looks at [`TestCaseConfig::output_stream`] and
//! [`TestCaseConfig::keep_crlf`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::Error;

/// Exit code with which a test signals it wants to be skipped
pub const DEFAULT_SKIP_DOCUMENT_CODE: i32 = 80;

/// Upper bound for running all tests of one document
pub const DEFAULT_TOTAL_TIMEOUT: Duration = Duration::from_secs(900);

/// Settings that apply to a whole document
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct DocumentConfig {
    /// Documents whose tests run after the tests of this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub append: Vec<PathBuf>,

    /// Documents whose tests run before the tests of this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prepend: Vec<PathBuf>,

    /// Applied to every test case unless the test case sets its own value
    #[serde(default, skip_serializing_if = "TestCaseConfig::is_empty")]
    pub defaults: TestCaseConfig,

    /// Shell that executes the test cases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<PathBuf>,

    /// Upper bound for running all tests of the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(with = "humantime_serde")]
    #[cfg_attr(feature = "schema", schemars(with = "Option<String>"))]
    pub total_timeout: Option<Duration>,
}

impl DocumentConfig {
    /// Parse the TOML content of a front matter block
    pub fn from_toml(raw: &str) -> crate::Result<Self> {
        toml_edit::de::from_str(raw)
            .map_err(|err| Error::new(format!("invalid document configuration: {err}")))
    }

    /// Parse the YAML content of a `---` front matter block
    pub fn from_yaml(raw: &str) -> crate::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
            .map_err(|err| Error::new(format!("invalid document configuration: {err}")))
    }

    /// Effective total timeout of the document
    pub fn total_timeout(&self) -> Duration {
        self.total_timeout.unwrap_or(DEFAULT_TOTAL_TIMEOUT)
    }

    /// Set values of `overrides` win, everything else is kept
    pub fn with_overrides_from(&self, overrides: &Self) -> Self {
        Self {
            append: if overrides.append.is_empty() {
                self.append.clone()
            } else {
                overrides.append.clone()
            },
            prepend: if overrides.prepend.is_empty() {
                self.prepend.clone()
            } else {
                overrides.prepend.clone()
            },
            defaults: overrides.defaults.with_defaults_from(&self.defaults),
            shell: overrides.shell.clone().or_else(|| self.shell.clone()),
            total_timeout: overrides.total_timeout.or(self.total_timeout),
        }
    }
}

/// Which captured stream the expectations of a test case describe
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub enum OutputStreamControl {
    Stdout,
    Stderr,
    /// The harness captures both streams into stdout
    Combined,
}

/// Wait for a detached process before running a test case
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct TestCaseWait {
    #[serde(with = "humantime_serde")]
    #[cfg_attr(feature = "schema", schemars(with = "String"))]
    pub timeout: Duration,

    /// Wait until this path exists instead of the full timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Settings of a single test case
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct TestCaseConfig {
    /// Run the command in the background and do not wait for it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detached: Option<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    /// Compare output with `\r\n` intact instead of normalized to `\n`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_crlf: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_stream: Option<OutputStreamControl>,

    /// Exit code that marks the test (and the rest of the document) as skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_document_code: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(with = "humantime_serde")]
    #[cfg_attr(feature = "schema", schemars(with = "Option<String>"))]
    pub timeout: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<TestCaseWait>,
}

impl TestCaseConfig {
    /// Defaults of test cases in Markdown documents
    pub fn default_markdown() -> Self {
        Self {
            output_stream: Some(OutputStreamControl::Stdout),
            skip_document_code: Some(DEFAULT_SKIP_DOCUMENT_CODE),
            ..Default::default()
        }
    }

    /// Defaults of test cases in Cram documents
    pub fn default_cram() -> Self {
        Self {
            keep_crlf: Some(true),
            output_stream: Some(OutputStreamControl::Combined),
            skip_document_code: Some(DEFAULT_SKIP_DOCUMENT_CODE),
            ..Default::default()
        }
    }

    /// Parse an inline TOML table like `{timeout = "3s"}`
    pub fn from_inline_table(raw: &str) -> crate::Result<Self> {
        #[derive(serde::Deserialize)]
        struct Inline {
            config: TestCaseConfig,
        }

        let inline: Inline = toml_edit::de::from_str(&format!("config = {raw}"))
            .map_err(|err| Error::new(format!("invalid test case configuration: {err}")))?;
        Ok(inline.config)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Unset values are taken from `defaults`; environments are merged
    pub fn with_defaults_from(&self, defaults: &Self) -> Self {
        let mut environment = defaults.environment.clone();
        environment.extend(
            self.environment
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Self {
            detached: self.detached.or(defaults.detached),
            environment,
            keep_crlf: self.keep_crlf.or(defaults.keep_crlf),
            output_stream: self.output_stream.or(defaults.output_stream),
            skip_document_code: self.skip_document_code.or(defaults.skip_document_code),
            timeout: self.timeout.or(defaults.timeout),
            wait: self.wait.clone().or_else(|| defaults.wait.clone()),
        }
    }

    /// Set values of `overrides` win
    pub fn with_overrides_from(&self, overrides: &Self) -> Self {
        overrides.with_defaults_from(self)
    }
}
